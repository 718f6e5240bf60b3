use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Per-user, per-course learning progress.
///
/// Values are replaced wholesale by the evaluator rather than edited in place,
/// so a stored copy never reflects a half-applied submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub current_section: u32,
    #[serde(default)]
    pub completed_sections: BTreeSet<u32>,
    /// Latest attempt per section, as a percentage in `0..=100`.
    #[serde(default)]
    pub quiz_scores: BTreeMap<u32, f64>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl UserProgress {
    /// Progress for a learner who has just opened a course.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_section: 1,
            completed_sections: BTreeSet::new(),
            quiz_scores: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_completed(&self, section: u32) -> bool {
        self.completed_sections.contains(&section)
    }

    #[must_use]
    pub fn score(&self, section: u32) -> Option<f64> {
        self.quiz_scores.get(&section).copied()
    }

    /// Lowest section in `1..=total` not yet completed, or `total` when every
    /// section is done.
    #[must_use]
    pub fn first_incomplete(&self, total: u32) -> u32 {
        (1..=total)
            .find(|idx| !self.completed_sections.contains(idx))
            .unwrap_or_else(|| total.max(1))
    }

    /// Number of completed sections that exist in a course of `total` sections.
    #[must_use]
    pub fn completed_within(&self, total: u32) -> usize {
        self.completed_sections.range(1..=total).count()
    }
}
