//! Derived view state for a course given a learner's progress.
//!
//! Nothing here fails: stale or corrupt progress is clamped into range so the
//! surrounding UI always has something to render.

use serde::Serialize;

use crate::model::{Course, UserProgress};

/// Per-section flags for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionState {
    pub index: u32,
    pub is_completed: bool,
    pub is_current: bool,
    pub is_locked: bool,
}

/// Share of completed sections. Keeps the exact value; round only for display.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct ProgressPercent(f64);

impl ProgressPercent {
    #[must_use]
    pub fn exact(self) -> f64 {
        self.0
    }

    /// Nearest whole percent.
    #[must_use]
    pub fn rounded(self) -> u32 {
        // Always within 0..=100, so the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = self.0.round() as u32;
        value
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.0 >= 100.0
    }
}

/// Whether the learner may move away from the active section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub active_section: u32,
    pub can_go_next: bool,
    pub can_go_previous: bool,
}

/// Computes lock/current/completed flags for every section.
///
/// Section 1 is never locked. Section `n > 1` is locked unless section `n - 1`
/// or section `n` itself is completed, so finished sections stay reviewable.
#[must_use]
pub fn compute_section_states(course: &Course, progress: &UserProgress) -> Vec<SectionState> {
    let current = course.clamp_index(progress.current_section);
    course
        .sections()
        .iter()
        .map(|section| {
            let index = section.index();
            let is_completed = progress.is_completed(index);
            let is_locked = index > 1 && !is_completed && !progress.is_completed(index - 1);
            SectionState {
                index,
                is_completed,
                is_current: index == current,
                is_locked,
            }
        })
        .collect()
}

/// `100 * completed / sections`, ignoring completed indexes the course lacks.
#[must_use]
pub fn overall_progress(course: &Course, progress: &UserProgress) -> ProgressPercent {
    let total = course.section_count();
    let done = progress.completed_within(total);
    #[allow(clippy::cast_precision_loss)]
    let ratio = done as f64 / f64::from(total);
    ProgressPercent(100.0 * ratio)
}

/// "Next" needs the active section completed; "previous" needs a section
/// before it.
#[must_use]
pub fn navigation(course: &Course, progress: &UserProgress) -> Navigation {
    let active = course.clamp_index(progress.current_section);
    Navigation {
        active_section: active,
        can_go_next: progress.is_completed(active),
        can_go_previous: active > 1,
    }
}

/// Everything a course page needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseView {
    pub sections: Vec<SectionState>,
    pub progress: ProgressPercent,
    pub navigation: Navigation,
}

impl CourseView {
    #[must_use]
    pub fn build(course: &Course, progress: &UserProgress) -> Self {
        Self {
            sections: compute_section_states(course, progress),
            progress: overall_progress(course, progress),
            navigation: navigation(course, progress),
        }
    }

    #[must_use]
    pub fn section(&self, index: u32) -> Option<&SectionState> {
        self.sections.iter().find(|s| s.index == index)
    }
}
