use budget_phases::{
    config::{budgets, database},
    core::{budget, seed},
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the budget seed configuration
    let seed_config = budgets::load_config(budgets::config_path())
        .inspect_err(|e| error!("Failed to load budget configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed configured budgets
    seed::seed_budgets(&db, &seed_config)
        .await
        .inspect_err(|e| error!("Failed to seed budgets: {}", e))?;

    // 6. Report the phase state of every public budget
    let today = chrono::Local::now().date_naive();
    for model in budget::list_public_budgets(&db).await? {
        let loaded = match budget::load_budget(&db, model.id).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(budget_id = model.id, "Skipping budget: {}", e);
                continue;
            }
        };
        let phase_name = loaded
            .current_phase()
            .map_or_else(|| loaded.phase.default_name(), |p| p.name("en"));
        info!(
            budget = %loaded.name,
            phase = %phase_name,
            timing = ?loaded.current_phase_timing(today),
            step = ?loaded.current_enabled_phase_number(),
            of = loaded.enabled_phases_amount(),
            prices = loaded.has_published_prices(),
            "Budget phase"
        );
    }

    Ok(())
}
