//! Unlock predicates
//!
//! These are pure functions of the catalog and the snapshot. The reducer uses
//! them to refuse locked navigation, and the curriculum panel uses them to draw
//! lock and check marks, so both always agree.

use crate::curriculum::Curriculum;

use super::snapshot::ProgressSnapshot;

/// How a phase appears in the curriculum tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Locked,
    Open,
    Current,
    Completed,
}

/// How a step appears in the curriculum tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Locked,
    Open,
    Current,
}

/// Read-only view answering unlock questions
#[derive(Debug, Clone, Copy)]
pub struct Gate<'a> {
    curriculum: &'a Curriculum,
    snapshot: &'a ProgressSnapshot,
}

impl<'a> Gate<'a> {
    pub fn new(curriculum: &'a Curriculum, snapshot: &'a ProgressSnapshot) -> Self {
        Self { curriculum, snapshot }
    }

    /// Every phase id in the catalog is completed
    pub fn all_phases_completed(&self) -> bool {
        self.curriculum.phase_ids().all(|id| self.snapshot.is_completed(id))
    }

    /// The first phase is always open; any other opens once its predecessor is completed
    pub fn is_phase_unlocked(&self, phase_index: usize) -> bool {
        if phase_index >= self.curriculum.phase_count() {
            return false;
        }
        if phase_index == 0 || self.all_phases_completed() {
            return true;
        }
        self.curriculum
            .phase(phase_index - 1)
            .is_some_and(|prev| self.snapshot.is_completed(prev.id))
    }

    /// A step is open once visited, or when its whole phase is completed
    pub fn is_step_unlocked(&self, phase_index: usize, step_index: usize) -> bool {
        let Some(phase) = self.curriculum.phase(phase_index) else {
            return false;
        };
        if step_index >= phase.steps.len() {
            return false;
        }
        self.snapshot.is_completed(phase.id) || step_index <= self.snapshot.max_step(phase_index)
    }

    /// A step can be jumped to: its phase and the step itself are unlocked
    pub fn is_step_reachable(&self, phase_index: usize, step_index: usize) -> bool {
        self.is_phase_unlocked(phase_index) && self.is_step_unlocked(phase_index, step_index)
    }

    pub fn phase_status(&self, phase_index: usize) -> PhaseStatus {
        let completed =
            self.curriculum.phase(phase_index).is_some_and(|p| self.snapshot.is_completed(p.id));

        if phase_index == self.snapshot.current_phase_index {
            PhaseStatus::Current
        } else if completed {
            PhaseStatus::Completed
        } else if self.is_phase_unlocked(phase_index) {
            PhaseStatus::Open
        } else {
            PhaseStatus::Locked
        }
    }

    pub fn step_status(&self, phase_index: usize, step_index: usize) -> StepStatus {
        if phase_index == self.snapshot.current_phase_index
            && step_index == self.snapshot.current_step_index
        {
            StepStatus::Current
        } else if self.is_step_reachable(phase_index, step_index) {
            StepStatus::Open
        } else {
            StepStatus::Locked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::model::fixtures::curriculum;

    #[test]
    fn first_phase_always_unlocked() {
        let c = curriculum();
        let s = ProgressSnapshot::default();
        let gate = Gate::new(&c, &s);
        assert!(gate.is_phase_unlocked(0));
        assert!(!gate.is_phase_unlocked(1));
        assert!(!gate.is_phase_unlocked(2));
    }

    #[test]
    fn completing_predecessor_unlocks_phase() {
        let c = curriculum();
        let mut s = ProgressSnapshot::default();
        s.completed_phase_ids.insert(10);
        let gate = Gate::new(&c, &s);
        assert!(gate.is_phase_unlocked(1));
        assert!(!gate.is_phase_unlocked(2));
    }

    #[test]
    fn all_completed_unlocks_everything() {
        let c = curriculum();
        let mut s = ProgressSnapshot::default();
        s.completed_phase_ids.extend([10, 20, 30]);
        let gate = Gate::new(&c, &s);
        assert!(gate.all_phases_completed());
        assert!((0..3).all(|p| gate.is_phase_unlocked(p)));
    }

    #[test]
    fn out_of_range_is_locked() {
        let c = curriculum();
        let s = ProgressSnapshot::default();
        let gate = Gate::new(&c, &s);
        assert!(!gate.is_phase_unlocked(3));
        assert!(!gate.is_step_unlocked(0, 4));
        assert!(!gate.is_step_unlocked(7, 0));
    }

    #[test]
    fn steps_follow_high_water_mark() {
        let c = curriculum();
        let mut s = ProgressSnapshot::default();
        s.raise_max_step(0, 2);
        let gate = Gate::new(&c, &s);
        assert!(gate.is_step_unlocked(0, 0));
        assert!(gate.is_step_unlocked(0, 2));
        assert!(!gate.is_step_unlocked(0, 3));
    }

    #[test]
    fn completed_phase_opens_every_step() {
        let c = curriculum();
        let mut s = ProgressSnapshot::default();
        s.completed_phase_ids.insert(10);
        let gate = Gate::new(&c, &s);
        assert!(gate.is_step_unlocked(0, 3));
    }

    #[test]
    fn locked_phase_makes_steps_unreachable() {
        let c = curriculum();
        let mut s = ProgressSnapshot::default();
        // A stale high-water mark does not open a locked phase
        s.raise_max_step(1, 5);
        let gate = Gate::new(&c, &s);
        assert!(gate.is_step_unlocked(1, 5));
        assert!(!gate.is_step_reachable(1, 5));
    }

    #[test]
    fn statuses_for_presentation() {
        let c = curriculum();
        let mut s = ProgressSnapshot::default();
        s.completed_phase_ids.insert(10);
        s.current_phase_index = 1;
        s.current_step_index = 0;
        s.raise_max_step(1, 0);
        let gate = Gate::new(&c, &s);

        assert_eq!(gate.phase_status(0), PhaseStatus::Completed);
        assert_eq!(gate.phase_status(1), PhaseStatus::Current);
        assert_eq!(gate.phase_status(2), PhaseStatus::Locked);

        assert_eq!(gate.step_status(1, 0), StepStatus::Current);
        assert_eq!(gate.step_status(1, 1), StepStatus::Locked);
        assert_eq!(gate.step_status(0, 2), StepStatus::Open);
    }
}
