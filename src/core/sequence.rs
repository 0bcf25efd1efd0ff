//! Phase sequence - the ordered arena of a budget's phases.
//!
//! All phases of one budget live in a single `Vec` ordered by catalog position.
//! The stored `next_phase_id` links become indices into that `Vec`; the backward
//! links are derived once at construction. Navigation only ever visits enabled
//! phases and gives up after a bounded number of steps, so a corrupted chain is
//! reported instead of looping.
//!
//! Navigation is asymmetric on purpose: `prev_enabled_phase(next_enabled_phase(p))`
//! returns `p` when `p` is enabled, however many disabled phases sit in between,
//! but never returns `p` when `p` is itself disabled.

use crate::{
    core::{
        phase::Phase,
        phase_kind::PhaseKind,
        validation::{PhaseField, ValidationErrors},
    },
    errors::{Error, Result},
};
use chrono::{Months, NaiveDate};
use std::collections::HashMap;
use tracing::error;

/// Enabled neighbours of a phase, for "Previous phase" / "Next phase" links.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseNavigation<'a> {
    /// Closest enabled phase before
    pub prev: Option<&'a Phase>,
    /// Closest enabled phase after
    pub next: Option<&'a Phase>,
}

/// The phases of one budget with their chain links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSequence {
    budget_id: i64,
    phases: Vec<Phase>,
    next: Vec<Option<usize>>,
    prev: Vec<Option<usize>>,
}

impl PhaseSequence {
    /// One enabled phase per catalog kind, linked in catalog order.
    ///
    /// Each phase lasts one month; the first starts on `starts_on` and every
    /// following one starts on the previous phase's end date.
    #[must_use]
    pub fn for_new_budget(budget_id: i64, starts_on: NaiveDate) -> Self {
        // Out-of-range dates end up equal and fail validation on insert.
        let month = |n: usize| {
            u32::try_from(n)
                .ok()
                .and_then(|n| starts_on.checked_add_months(Months::new(n)))
                .unwrap_or(NaiveDate::MAX)
        };
        let phases: Vec<Phase> = PhaseKind::ALL
            .iter()
            .enumerate()
            .map(|(i, &kind)| Phase {
                starts_at: Some(month(i)),
                ends_at: Some(month(i + 1)),
                ..Phase::new(kind)
            })
            .collect();
        let len = phases.len();
        let next = (0..len).map(|i| (i + 1 < len).then_some(i + 1)).collect();
        let prev = (0..len).map(|i| i.checked_sub(1)).collect();
        Self {
            budget_id,
            phases,
            next,
            prev,
        }
    }

    /// Builds the arena from stored phases and their `next_phase_id`.
    ///
    /// Fails validation on `kind` when two phases share a kind, and with
    /// [`Error::CorruptPhaseChain`] when a link points outside the budget, two
    /// phases claim the same successor, or the links form a cycle.
    pub fn from_rows(budget_id: i64, mut rows: Vec<(Phase, Option<i64>)>) -> Result<Self> {
        rows.sort_by_key(|(phase, _)| phase.kind);

        if rows.windows(2).any(|w| w[0].0.kind == w[1].0.kind) {
            return Err(ValidationErrors::single(PhaseField::Kind, "has already been taken").into());
        }

        let index_by_id: HashMap<i64, usize> = rows
            .iter()
            .enumerate()
            .filter_map(|(i, (phase, _))| phase.id.map(|id| (id, i)))
            .collect();

        let mut next = Vec::with_capacity(rows.len());
        let mut prev = vec![None; rows.len()];
        for (i, (phase, next_id)) in rows.iter().enumerate() {
            let link = match next_id {
                None => None,
                Some(id) => Some(*index_by_id.get(id).ok_or_else(|| Error::CorruptPhaseChain {
                    budget_id,
                    reason: format!("phase {} links to unknown phase {id}", phase.kind),
                })?),
            };
            if let Some(j) = link {
                if prev[j].is_some() {
                    return Err(Error::CorruptPhaseChain {
                        budget_id,
                        reason: format!("phase {} has more than one predecessor", rows[j].0.kind),
                    });
                }
                prev[j] = Some(i);
            }
            next.push(link);
        }

        // With at most one predecessor each, a phase that no chain head reaches
        // sits on a cycle.
        let mut reached = vec![false; rows.len()];
        for head in (0..rows.len()).filter(|&i| prev[i].is_none()) {
            let mut cursor = Some(head);
            while let Some(i) = cursor {
                reached[i] = true;
                cursor = next[i];
            }
        }
        if let Some(i) = reached.iter().position(|r| !r) {
            return Err(Error::CorruptPhaseChain {
                budget_id,
                reason: format!("phase {} is part of a cycle", rows[i].0.kind),
            });
        }

        Ok(Self {
            budget_id,
            phases: rows.into_iter().map(|(phase, _)| phase).collect(),
            next,
            prev,
        })
    }

    /// Budget owning these phases.
    #[must_use]
    pub const fn budget_id(&self) -> i64 {
        self.budget_id
    }

    /// All phases in catalog order.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Number of phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// True when the budget has no phases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Phase of the given kind.
    #[must_use]
    pub fn phase(&self, kind: PhaseKind) -> Option<&Phase> {
        self.position(kind).map(|i| &self.phases[i])
    }

    /// Mutable access for administrator edits. Kind must not be changed.
    pub fn phase_mut(&mut self, kind: PhaseKind) -> Option<&mut Phase> {
        self.position(kind).map(move |i| &mut self.phases[i])
    }

    /// Direct successor in the chain, enabled or not.
    #[must_use]
    pub fn next_phase(&self, kind: PhaseKind) -> Option<&Phase> {
        self.position(kind)
            .and_then(|i| self.next[i])
            .map(|j| &self.phases[j])
    }

    /// Direct predecessor in the chain, enabled or not.
    #[must_use]
    pub fn prev_phase(&self, kind: PhaseKind) -> Option<&Phase> {
        self.position(kind)
            .and_then(|i| self.prev[i])
            .map(|j| &self.phases[j])
    }

    /// First enabled phase after `kind`, following `next_phase` links.
    pub fn next_enabled_phase(&self, kind: PhaseKind) -> Result<Option<&Phase>> {
        let start = self.require(kind)?;
        self.walk(start, &self.next)
    }

    /// First enabled phase before `kind`, following the derived backward links.
    pub fn prev_enabled_phase(&self, kind: PhaseKind) -> Result<Option<&Phase>> {
        let start = self.require(kind)?;
        self.walk(start, &self.prev)
    }

    /// Enabled neighbours of `kind`.
    ///
    /// A corrupted chain is logged and rendered as a missing link.
    #[must_use]
    pub fn navigation(&self, kind: PhaseKind) -> PhaseNavigation<'_> {
        PhaseNavigation {
            prev: self.or_log(kind, self.prev_enabled_phase(kind)),
            next: self.or_log(kind, self.next_enabled_phase(kind)),
        }
    }

    fn or_log<'a>(&self, kind: PhaseKind, result: Result<Option<&'a Phase>>) -> Option<&'a Phase> {
        result
            .inspect_err(|e| error!(budget_id = self.budget_id, kind = %kind, "{e}"))
            .unwrap_or_default()
    }

    /// Enabled phases in catalog order.
    pub fn enabled_phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter().filter(|p| p.enabled)
    }

    /// Number of enabled phases.
    #[must_use]
    pub fn enabled_phases_amount(&self) -> usize {
        self.enabled_phases().count()
    }

    /// 1-based position of `kind` among enabled phases, None if it is disabled
    /// or missing.
    #[must_use]
    pub fn enabled_phase_number(&self, kind: PhaseKind) -> Option<usize> {
        self.enabled_phases()
            .position(|p| p.kind == kind)
            .map(|i| i + 1)
    }

    fn position(&self, kind: PhaseKind) -> Option<usize> {
        self.phases.iter().position(|p| p.kind == kind)
    }

    fn require(&self, kind: PhaseKind) -> Result<usize> {
        self.position(kind).ok_or_else(|| Error::PhaseNotFound {
            budget_id: self.budget_id,
            kind: kind.to_string(),
        })
    }

    fn walk(&self, start: usize, links: &[Option<usize>]) -> Result<Option<&Phase>> {
        let limit = PhaseKind::ALL.len().max(self.phases.len());
        let mut cursor = links[start];
        let mut steps = 0;

        while let Some(i) = cursor {
            steps += 1;
            if steps > limit {
                error!(
                    budget_id = self.budget_id,
                    from = %self.phases[start].kind,
                    limit,
                    "Phase chain traversal exceeded bound"
                );
                return Err(Error::CorruptPhaseChain {
                    budget_id: self.budget_id,
                    reason: format!(
                        "traversal from {} exceeded {limit} steps",
                        self.phases[start].kind
                    ),
                });
            }
            if self.phases[i].enabled {
                return Ok(Some(&self.phases[i]));
            }
            cursor = links[i];
        }

        Ok(None)
    }
}
