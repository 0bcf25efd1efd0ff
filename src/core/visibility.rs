//! Phase-driven visibility rules for public budget pages.
//!
//! Everything here is derived from the budget's current phase. Pages ask these
//! rules which widgets to render instead of comparing phase names themselves.

use crate::core::{budget::Budget, phase_kind::PhaseKind};
use serde::Serialize;

/// Filter applied by the "See all investments" link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentsFilter {
    /// Everything not marked unfeasible
    NotUnfeasible,
    /// Investments selected for balloting
    Selected,
    /// Winning investments
    Winners,
}

impl InvestmentsFilter {
    /// Query value used in investment list links.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotUnfeasible => "not_unfeasible",
            Self::Selected => "selected",
            Self::Winners => "winners",
        }
    }
}

/// Which investments get a marker on the budget map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerPolicy {
    /// Every investment with a valid location
    All,
    /// Only selected investments, or all of them when none is selected
    SelectedWhenAny,
}

/// Widgets shown on a budget page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    /// List of investments on the budget page
    pub investments_list: bool,
    /// Support counts next to investments
    pub supports: bool,
    /// Investment prices
    pub prices: bool,
    /// "See results" button
    pub results: bool,
    /// "It's time to support projects" call to action
    pub support_call_to_action: bool,
    /// Headings link to their investment lists
    pub heading_links: bool,
    /// Budget map
    pub map: bool,
    /// Target of the "See all investments" link, None hides the link
    pub investments_filter: Option<InvestmentsFilter>,
    /// Marker selection on the map
    pub markers: MarkerPolicy,
}

impl Visibility {
    /// Nothing visible; used for drafting budgets.
    #[must_use]
    pub const fn hidden() -> Self {
        Self {
            investments_list: false,
            supports: false,
            prices: false,
            results: false,
            support_call_to_action: false,
            heading_links: false,
            map: false,
            investments_filter: None,
            markers: MarkerPolicy::All,
        }
    }

    /// Rules for a budget whose current phase is `kind`.
    #[must_use]
    pub fn for_phase(kind: PhaseKind) -> Self {
        let edges = matches!(kind, PhaseKind::Informing | PhaseKind::Finished);
        let investments_filter = match kind {
            PhaseKind::Informing => None,
            PhaseKind::Finished => Some(InvestmentsFilter::Winners),
            k if k.is_published_prices() => Some(InvestmentsFilter::Selected),
            _ => Some(InvestmentsFilter::NotUnfeasible),
        };

        Self {
            investments_list: !edges,
            supports: kind == PhaseKind::Valuating,
            prices: kind.is_published_prices(),
            results: kind == PhaseKind::Finished,
            support_call_to_action: kind == PhaseKind::Selecting,
            heading_links: !edges,
            map: kind != PhaseKind::Informing,
            investments_filter,
            markers: if kind.is_at_or_later(PhaseKind::PublishingPrices) {
                MarkerPolicy::SelectedWhenAny
            } else {
                MarkerPolicy::All
            },
        }
    }

    /// Rules for `budget`, hidden while it is drafted.
    #[must_use]
    pub fn for_budget(budget: &Budget) -> Self {
        if budget.is_drafting() {
            Self::hidden()
        } else {
            Self::for_phase(budget.phase)
        }
    }
}

/// Whether a published budget in `kind` appears in the welcome page feed.
#[must_use]
pub fn shows_in_feed(kind: PhaseKind) -> bool {
    !matches!(kind, PhaseKind::Valuating | PhaseKind::Finished)
}

/// An investment as seen by the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentMarker {
    /// Investment id
    pub investment_id: i64,
    /// Selected for balloting
    pub selected: bool,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
}

impl InvestmentMarker {
    fn has_valid_location(&self) -> bool {
        matches!(
            (self.latitude, self.longitude),
            (Some(lat), Some(lng))
                if lat.is_finite()
                    && lng.is_finite()
                    && (-90.0..=90.0).contains(&lat)
                    && (-180.0..=180.0).contains(&lng)
        )
    }
}

/// Markers to draw under `policy`. Invalid locations are skipped.
#[must_use]
pub fn map_markers(policy: MarkerPolicy, investments: &[InvestmentMarker]) -> Vec<&InvestmentMarker> {
    let located = investments.iter().filter(|i| i.has_valid_location());
    match policy {
        MarkerPolicy::SelectedWhenAny if investments.iter().any(|i| i.selected) => {
            located.filter(|i| i.selected).collect()
        }
        _ => located.collect(),
    }
}
