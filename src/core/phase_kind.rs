//! Phase kind catalog - the closed, totally ordered list of budget stages.
//!
//! Position in [`PhaseKind::ALL`] is the only notion of "later than" used anywhere
//! in the crate. The enum doubles as the stored column type of `budget_phases.kind`
//! and `budgets.phase`.

use crate::errors::{Error, Result};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// Stage identifier of a participatory budget.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PhaseKind {
    /// Budget is announced, nothing can be submitted yet
    #[sea_orm(string_value = "informing")]
    Informing,
    /// Citizens submit investment proposals
    #[sea_orm(string_value = "accepting")]
    Accepting,
    /// Administrators review submitted proposals
    #[sea_orm(string_value = "reviewing")]
    Reviewing,
    /// Citizens support proposals to move them forward
    #[sea_orm(string_value = "selecting")]
    Selecting,
    /// Selected proposals are valuated and priced
    #[sea_orm(string_value = "valuating")]
    Valuating,
    /// Prices of selected proposals are made public
    #[sea_orm(string_value = "publishing_prices")]
    PublishingPrices,
    /// Citizens vote
    #[sea_orm(string_value = "balloting")]
    Balloting,
    /// Ballots are counted and reviewed
    #[sea_orm(string_value = "reviewing_ballots")]
    ReviewingBallots,
    /// Results are final
    #[sea_orm(string_value = "finished")]
    Finished,
}

impl PhaseKind {
    /// The catalog, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Informing,
        Self::Accepting,
        Self::Reviewing,
        Self::Selecting,
        Self::Valuating,
        Self::PublishingPrices,
        Self::Balloting,
        Self::ReviewingBallots,
        Self::Finished,
    ];

    /// Kinds in which investment prices are visible.
    pub const PUBLISHED_PRICES: [Self; 4] = [
        Self::PublishingPrices,
        Self::Balloting,
        Self::ReviewingBallots,
        Self::Finished,
    ];

    /// Position of this kind in [`PhaseKind::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|k| *k == self)
            .unwrap_or(Self::ALL.len())
    }

    /// Every kind from `self` through the end of the catalog, inclusive.
    #[must_use]
    pub fn or_later(self) -> &'static [Self] {
        &Self::ALL[self.index()..]
    }

    /// True iff `self` appears in `target.or_later()`.
    #[must_use]
    pub fn is_at_or_later(self, target: Self) -> bool {
        target.or_later().contains(&self)
    }

    /// True for the tail of the catalog where prices are public.
    #[must_use]
    pub fn is_published_prices(self) -> bool {
        Self::PUBLISHED_PRICES.contains(&self)
    }

    /// Stored identifier, e.g. `"publishing_prices"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Informing => "informing",
            Self::Accepting => "accepting",
            Self::Reviewing => "reviewing",
            Self::Selecting => "selecting",
            Self::Valuating => "valuating",
            Self::PublishingPrices => "publishing_prices",
            Self::Balloting => "balloting",
            Self::ReviewingBallots => "reviewing_ballots",
            Self::Finished => "finished",
        }
    }

    /// Label used for a freshly created phase before an administrator renames it.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Informing => "Information",
            Self::Accepting => "Accepting projects",
            Self::Reviewing => "Reviewing projects",
            Self::Selecting => "Selecting projects",
            Self::Valuating => "Valuating projects",
            Self::PublishingPrices => "Publishing projects prices",
            Self::Balloting => "Voting projects",
            Self::ReviewingBallots => "Reviewing voting",
            Self::Finished => "Finished budget",
        }
    }
}

/// Catalog suffix starting at the kind named `name`.
///
/// Fails with [`Error::InvalidKind`] when `name` is not in the catalog rather than
/// returning an empty slice.
pub fn kind_or_later(name: &str) -> Result<&'static [PhaseKind]> {
    let kind: PhaseKind = name.parse()?;
    Ok(kind.or_later())
}

impl FromStr for PhaseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::InvalidKind {
                kind: s.to_string(),
            })
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for PhaseKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PhaseKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index().cmp(&other.index())
    }
}
