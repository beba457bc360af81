//! The persisted learner snapshot

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::curriculum::{Curriculum, PhaseId};

/// Everything needed to restore a learner's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub current_phase_index: usize,
    pub current_step_index: usize,

    /// Ids of phases the learner has completed
    #[serde(default)]
    pub completed_phase_ids: BTreeSet<PhaseId>,

    /// Last quiz percentage per phase id
    #[serde(default)]
    pub quiz_scores: BTreeMap<PhaseId, f64>,

    #[serde(default)]
    pub is_quiz_mode: bool,

    /// Highest step index visited, per phase index
    #[serde(default)]
    pub max_step_reached: BTreeMap<usize, usize>,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            current_phase_index: 0,
            current_step_index: 0,
            completed_phase_ids: BTreeSet::new(),
            quiz_scores: BTreeMap::new(),
            is_quiz_mode: false,
            max_step_reached: BTreeMap::from([(0, 0)]),
        }
    }
}

impl ProgressSnapshot {
    /// Highest visited step in a phase (0 when never entered)
    pub fn max_step(&self, phase_index: usize) -> usize {
        self.max_step_reached.get(&phase_index).copied().unwrap_or(0)
    }

    /// Raise the high-water mark of a phase, never lowering it
    pub fn raise_max_step(&mut self, phase_index: usize, step_index: usize) {
        let entry = self.max_step_reached.entry(phase_index).or_insert(0);
        *entry = (*entry).max(step_index);
    }

    pub fn is_completed(&self, id: PhaseId) -> bool {
        self.completed_phase_ids.contains(&id)
    }

    /// Last recorded score for a phase
    pub fn score(&self, id: PhaseId) -> Option<f64> {
        self.quiz_scores.get(&id).copied()
    }

    /// Whether every index and id in this snapshot refers to something in `curriculum`
    pub fn resolves_against(&self, curriculum: &Curriculum) -> bool {
        if curriculum.step(self.current_phase_index, self.current_step_index).is_none() {
            return false;
        }

        let ids_known = self
            .completed_phase_ids
            .iter()
            .chain(self.quiz_scores.keys())
            .all(|id| curriculum.phase_index_of(*id).is_some());

        let marks_in_range = self.max_step_reached.iter().all(|(&phase, &step)| {
            curriculum.phase(phase).is_some_and(|p| step <= p.last_step_index())
        });

        let scores_in_range = self.quiz_scores.values().all(|s| (0.0..=100.0).contains(s));

        ids_known && marks_in_range && scores_in_range
    }
}
