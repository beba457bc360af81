//! Badges earned along the way
//!
//! Badges are derived from progress events and the snapshot. They live in
//! their own file next to `progress.json` and are wiped by a reset.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::curriculum::{Curriculum, PhaseId};

use super::machine::Outcome;
use super::snapshot::ProgressSnapshot;

/// File name of the persisted badges inside the data directory
pub const ACHIEVEMENTS_FILE: &str = "achievements.json";

/// Tutor requests needed for the Curious badge
pub const CURIOUS_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Badge {
    /// Finished the phase with this id
    PhaseCompleted(PhaseId),
    /// Scored 100% on a quiz
    Perfect,
    /// Asked the tutor for help enough times
    Curious,
    /// Finished the whole curriculum
    Master,
    /// Passed every quiz on the first try
    Prodigy,
}

impl Badge {
    pub fn title(&self) -> String {
        match self {
            Badge::PhaseCompleted(id) => format!("Phase {id} complete"),
            Badge::Perfect => "Perfectionist".to_string(),
            Badge::Curious => "Curious Mind".to_string(),
            Badge::Master => "Master".to_string(),
            Badge::Prodigy => "Prodigy".to_string(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Badge::PhaseCompleted(_) => "Passed the phase quiz and moved on",
            Badge::Perfect => "Answered every question of a quiz correctly",
            Badge::Curious => "Asked the tutor for five explanations",
            Badge::Master => "Completed every phase of the curriculum",
            Badge::Prodigy => "Passed every quiz on the first attempt",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Achievements {
    #[serde(default)]
    pub unlocked: BTreeSet<Badge>,

    /// Most recent badge, shown once in the status line
    #[serde(skip)]
    pub last_unlocked: Option<Badge>,

    #[serde(default)]
    pub tutor_uses: u32,

    /// Whether the first submitted attempt at each phase quiz passed
    #[serde(default)]
    pub first_attempts: BTreeMap<PhaseId, bool>,
}

impl Achievements {
    /// Load from `path`, starting empty when the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read achievements from {:?}", path))?;
        serde_json::from_str(&contents).with_context(|| "Failed to parse achievements.json")
    }

    /// Like [`Achievements::load`], but an unreadable file means no badges
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Starting with no badges: {:#}", e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }
        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize achievements")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write achievements to {:?}", path))?;
        Ok(())
    }

    /// Fold a machine outcome into the record
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::QuizSubmitted { phase_id, score } => {
                self.first_attempts.entry(*phase_id).or_insert(score.passed());
            }
            Outcome::PhaseAdvanced { .. } => {}
            Outcome::Reset => *self = Self::default(),
        }
    }

    pub fn record_tutor_use(&mut self) {
        self.tutor_uses = self.tutor_uses.saturating_add(1);
    }

    /// Unlock whatever badges are now earned. Returns the new ones.
    pub fn evaluate(
        &mut self,
        curriculum: &Curriculum,
        snapshot: &ProgressSnapshot,
        finished: bool,
    ) -> Vec<Badge> {
        let mut earned: Vec<Badge> =
            snapshot.completed_phase_ids.iter().map(|id| Badge::PhaseCompleted(*id)).collect();

        if snapshot.quiz_scores.values().any(|s| *s >= 100.0) {
            earned.push(Badge::Perfect);
        }
        if self.tutor_uses >= CURIOUS_THRESHOLD {
            earned.push(Badge::Curious);
        }
        if finished {
            earned.push(Badge::Master);
        }

        let mut quiz_phases = curriculum.phases.iter().filter(|p| p.has_quiz()).peekable();
        if quiz_phases.peek().is_some()
            && quiz_phases.all(|p| self.first_attempts.get(&p.id) == Some(&true))
        {
            earned.push(Badge::Prodigy);
        }

        let fresh: Vec<Badge> =
            earned.into_iter().filter(|badge| self.unlocked.insert(*badge)).collect();

        for badge in &fresh {
            tracing::info!("Badge unlocked: {}", badge.title());
        }
        if let Some(last) = fresh.last() {
            self.last_unlocked = Some(*last);
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::curriculum::model::fixtures::curriculum;
    use crate::progress::quiz::QuizScore;

    fn submitted(phase_id: PhaseId, correct: usize) -> Outcome {
        Outcome::QuizSubmitted { phase_id, score: QuizScore { correct, total: 4 } }
    }

    #[test]
    fn completed_phases_earn_badges_once() {
        let c = curriculum();
        let mut a = Achievements::default();
        let mut s = ProgressSnapshot::default();
        s.completed_phase_ids.insert(10);

        assert_eq!(a.evaluate(&c, &s, false), vec![Badge::PhaseCompleted(10)]);
        assert!(a.evaluate(&c, &s, false).is_empty());
        assert_eq!(a.last_unlocked, Some(Badge::PhaseCompleted(10)));
    }

    #[test]
    fn perfect_score_badge() {
        let c = curriculum();
        let mut a = Achievements::default();
        let mut s = ProgressSnapshot::default();
        s.quiz_scores.insert(10, 100.0);
        assert_eq!(a.evaluate(&c, &s, false), vec![Badge::Perfect]);
    }

    #[test]
    fn curious_after_five_tutor_uses() {
        let c = curriculum();
        let s = ProgressSnapshot::default();
        let mut a = Achievements::default();
        for _ in 0..4 {
            a.record_tutor_use();
        }
        assert!(a.evaluate(&c, &s, false).is_empty());
        a.record_tutor_use();
        assert_eq!(a.evaluate(&c, &s, false), vec![Badge::Curious]);
    }

    #[test]
    fn prodigy_needs_every_first_attempt_passed() {
        let c = curriculum();
        let s = ProgressSnapshot::default();
        let mut a = Achievements::default();

        a.record(&submitted(10, 4));
        a.record(&submitted(20, 2));
        a.record(&submitted(20, 4));
        a.record(&submitted(30, 3));
        assert!(!a.evaluate(&c, &s, true).contains(&Badge::Prodigy));

        let mut b = Achievements::default();
        for id in [10, 20, 30] {
            b.record(&submitted(id, 3));
        }
        let earned = b.evaluate(&c, &s, true);
        assert!(earned.contains(&Badge::Prodigy));
        assert!(earned.contains(&Badge::Master));
    }

    #[test]
    fn reset_forgets_everything() {
        let c = curriculum();
        let mut a = Achievements::default();
        a.record_tutor_use();
        a.record(&submitted(10, 4));
        let mut s = ProgressSnapshot::default();
        s.completed_phase_ids.insert(10);
        a.evaluate(&c, &s, false);

        a.record(&Outcome::Reset);
        assert_eq!(a, Achievements::default());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ACHIEVEMENTS_FILE);
        assert_eq!(Achievements::load(&path).unwrap(), Achievements::default());

        let mut a = Achievements::default();
        a.unlocked.insert(Badge::PhaseCompleted(1));
        a.unlocked.insert(Badge::Perfect);
        a.tutor_uses = 3;
        a.save(&path).unwrap();

        let loaded = Achievements::load(&path).unwrap();
        assert_eq!(loaded.unlocked, a.unlocked);
        assert_eq!(loaded.tutor_uses, 3);
    }

    #[test]
    fn unreadable_file_means_no_badges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ACHIEVEMENTS_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Achievements::load(&path).is_err());
        assert_eq!(Achievements::load_or_default(&path), Achievements::default());
    }
}
