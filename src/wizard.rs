//! Step controller for the multi-stage editing wizards.
//!
//! Drives a finite sequence of named steps, gates forward navigation on
//! completion of the preceding step, and switches into a terminal read-only
//! preview once the last step is advanced past. Preview is one-directional:
//! there is no path back to an editable step within a session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardError {
    /// Forward jump blocked by an incomplete prerequisite step. Step numbers
    /// in the message are 1-based because they are shown to the user.
    #[error("Please complete step {} before proceeding to step {}.", required + 1, target + 1)]
    StepIncomplete { required: usize, target: usize },

    #[error("Step {target} does not exist.")]
    NoSuchStep { target: usize },

    #[error("The wizard has no steps configured.")]
    Empty,
}

/// One named stage of the wizard. The sequence is fixed at construction;
/// position is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub index: usize,
    pub label: String,
}

impl Step {
    /// Anchor id of this step's section in the preview document,
    /// e.g. "Final Closure" -> "section-final-closure".
    #[must_use]
    pub fn anchor(&self) -> String {
        let slug: String = self
            .label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        format!("section-{}", slug.trim_matches('-'))
    }
}

/// What a successful navigation asks the view layer to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavOutcome {
    /// The visible step changed; scroll back to the top of the form.
    MovedTo { step: usize },
    /// Advancing from the last step rendered the preview document.
    EnteredPreview,
    /// Preview mode: all steps are rendered in one document, so step clicks
    /// scroll to the section anchor instead of switching steps.
    ScrollTo { anchor: String },
    /// Draft save from the last step stays put for review before submission.
    Stayed { step: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wizard {
    steps: Vec<Step>,
    current: usize,
    completed: BTreeSet<usize>,
    preview: bool,
}

impl Wizard {
    #[must_use]
    pub fn new<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        let steps = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| Step {
                index,
                label: label.into(),
            })
            .collect();

        Self {
            steps,
            current: 0,
            completed: BTreeSet::new(),
            preview: false,
        }
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed
    }

    #[must_use]
    pub fn is_completed(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    #[must_use]
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    #[must_use]
    pub fn is_last_step(&self) -> bool {
        !self.steps.is_empty() && self.current == self.steps.len() - 1
    }

    /// A step is reachable by direct click when it is already visited or the
    /// step immediately before it has been completed.
    #[must_use]
    pub fn is_reachable(&self, target: usize) -> bool {
        target <= self.current || (target > 0 && self.completed.contains(&(target - 1)))
    }

    /// Jump directly to `target`. Backward jumps always succeed and leave
    /// `completed` untouched. Forward jumps require the step immediately
    /// before `target` to be completed; otherwise no state changes and the
    /// error names the first incomplete prerequisite.
    pub fn go_to(&mut self, target: usize) -> Result<NavOutcome, WizardError> {
        if self.steps.is_empty() {
            return Err(WizardError::Empty);
        }
        if target >= self.steps.len() {
            return Err(WizardError::NoSuchStep { target });
        }

        if !self.is_reachable(target) {
            let required = (0..target)
                .find(|i| !self.completed.contains(i))
                .unwrap_or(target - 1);
            return Err(WizardError::StepIncomplete { required, target });
        }

        self.current = target;
        Ok(NavOutcome::MovedTo { step: target })
    }

    /// The "proceed" action: mark the current step completed (idempotent,
    /// set semantics), then either move to the next step or, from the last
    /// step, enter preview.
    pub fn advance(&mut self) -> Result<NavOutcome, WizardError> {
        if self.steps.is_empty() {
            return Err(WizardError::Empty);
        }

        self.completed.insert(self.current);

        if self.current == self.steps.len() - 1 {
            self.preview = true;
            Ok(NavOutcome::EnteredPreview)
        } else {
            self.current += 1;
            Ok(NavOutcome::MovedTo { step: self.current })
        }
    }

    /// Same completion-marking and advancement as [`advance`](Self::advance),
    /// but never enters preview: a draft save from the last step stays on it
    /// so the user can review before final submission. The caller owns the
    /// draft-persistence side effect.
    pub fn advance_for_draft(&mut self) -> Result<NavOutcome, WizardError> {
        if self.steps.is_empty() {
            return Err(WizardError::Empty);
        }

        self.completed.insert(self.current);

        if self.current == self.steps.len() - 1 {
            Ok(NavOutcome::Stayed { step: self.current })
        } else {
            self.current += 1;
            Ok(NavOutcome::MovedTo { step: self.current })
        }
    }

    /// Step-indicator click. In preview the whole form is one scrollable
    /// document, so this resolves to the section anchor without changing
    /// `current`; otherwise it behaves exactly like [`go_to`](Self::go_to).
    pub fn step_click(&mut self, target: usize) -> Result<NavOutcome, WizardError> {
        if target >= self.steps.len() {
            return Err(WizardError::NoSuchStep { target });
        }

        if self.preview {
            return Ok(NavOutcome::ScrollTo {
                anchor: self.steps[target].anchor(),
            });
        }

        self.go_to(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn three_step() -> Wizard {
        Wizard::new(["Report", "Investigate", "Final Closure"])
    }

    #[test]
    fn starts_at_first_step_with_nothing_completed() {
        let w = three_step();
        assert_eq!(w.current_step(), 0);
        assert!(w.completed_steps().is_empty());
        assert!(!w.is_preview());
    }

    #[test]
    fn forward_skip_is_rejected_without_state_change() {
        let mut w = three_step();
        let before = w.clone();

        let err = w.go_to(2).unwrap_err();
        assert_eq!(err, WizardError::StepIncomplete { required: 0, target: 2 });
        assert_eq!(w, before);
    }

    #[test]
    fn rejection_message_names_the_prerequisite_step() {
        let mut w = three_step();
        let err = w.go_to(2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please complete step 1 before proceeding to step 3."
        );
    }

    #[test]
    fn advance_marks_completed_and_moves_forward() {
        let mut w = three_step();
        assert_eq!(w.advance().unwrap(), NavOutcome::MovedTo { step: 1 });
        assert_eq!(w.current_step(), 1);
        assert!(w.is_completed(0));
        assert!(!w.is_completed(1));
    }

    #[test]
    fn advance_is_idempotent_on_completed_set() {
        let mut w = three_step();
        w.advance().unwrap();
        w.go_to(0).unwrap();
        w.advance().unwrap();
        assert_eq!(w.completed_steps().len(), 1);
        assert!(w.is_completed(0));
    }

    #[test]
    fn advance_from_last_step_enters_preview_without_moving() {
        let mut w = three_step();
        w.advance().unwrap();
        w.advance().unwrap();
        assert_eq!(w.advance().unwrap(), NavOutcome::EnteredPreview);
        assert!(w.is_preview());
        assert_eq!(w.current_step(), 2);
    }

    #[test]
    fn draft_advance_never_enters_preview() {
        let mut w = three_step();
        w.advance().unwrap();
        w.advance().unwrap();
        assert_eq!(w.advance_for_draft().unwrap(), NavOutcome::Stayed { step: 2 });
        assert!(!w.is_preview());
        assert!(w.is_completed(2));
    }

    #[test]
    fn step_click_in_preview_scrolls_to_anchor() {
        let mut w = three_step();
        w.advance().unwrap();
        w.advance().unwrap();
        w.advance().unwrap();

        let outcome = w.step_click(2).unwrap();
        assert_eq!(
            outcome,
            NavOutcome::ScrollTo { anchor: "section-final-closure".into() }
        );
        assert_eq!(w.current_step(), 2);
    }

    #[test]
    fn scenario_a_full_three_step_session() {
        let mut w = three_step();

        assert_eq!(w.advance().unwrap(), NavOutcome::MovedTo { step: 1 });
        assert_eq!(w.current_step(), 1);
        assert_eq!(w.completed_steps().iter().copied().collect::<Vec<_>>(), [0]);

        let before = w.clone();
        assert!(w.go_to(2).is_err());
        assert_eq!(w, before);

        assert_eq!(w.advance().unwrap(), NavOutcome::MovedTo { step: 2 });
        assert_eq!(w.completed_steps().iter().copied().collect::<Vec<_>>(), [0, 1]);

        assert_eq!(w.go_to(0).unwrap(), NavOutcome::MovedTo { step: 0 });
        assert_eq!(w.go_to(2).unwrap(), NavOutcome::MovedTo { step: 2 });
    }

    #[test]
    fn no_such_step_is_rejected() {
        let mut w = three_step();
        assert_eq!(w.go_to(7).unwrap_err(), WizardError::NoSuchStep { target: 7 });
        assert_eq!(w.step_click(7).unwrap_err(), WizardError::NoSuchStep { target: 7 });
    }

    #[test]
    fn empty_wizard_rejects_everything() {
        let mut w = Wizard::default();
        assert_eq!(w.advance().unwrap_err(), WizardError::Empty);
        assert_eq!(w.go_to(0).unwrap_err(), WizardError::NoSuchStep { target: 0 });
    }

    #[test]
    fn anchor_slugs_are_stable() {
        let w = three_step();
        assert_eq!(w.steps()[0].anchor(), "section-report");
        assert_eq!(w.steps()[2].anchor(), "section-final-closure");
    }

    proptest! {
        /// Backward navigation always succeeds and never touches `completed`.
        #[test]
        fn backward_jumps_always_succeed(advances in 0usize..5, target_frac in 0.0f64..1.0) {
            let mut w = Wizard::new(["a", "b", "c", "d", "e", "f"]);
            for _ in 0..advances {
                w.advance().unwrap();
            }
            prop_assume!(!w.is_preview());

            let completed_before = w.completed_steps().clone();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let target = (target_frac * w.current_step() as f64) as usize;

            prop_assert_eq!(w.go_to(target).unwrap(), NavOutcome::MovedTo { step: target });
            prop_assert_eq!(w.current_step(), target);
            prop_assert_eq!(w.completed_steps(), &completed_before);
        }

        /// A rejected forward jump leaves the whole wizard bit-identical.
        #[test]
        fn rejected_jump_mutates_nothing(steps in 2usize..8, target in 1usize..8) {
            let labels: Vec<String> = (0..steps).map(|i| format!("step {i}")).collect();
            let mut w = Wizard::new(labels);
            prop_assume!(target < steps && !w.is_reachable(target));

            let before = w.clone();
            prop_assert!(w.go_to(target).is_err());
            prop_assert_eq!(w, before);
        }
    }
}
