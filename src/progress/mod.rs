//! Learner progress: snapshot, unlock rules, quizzes and the state machine

pub mod achievements;
pub mod gating;
pub mod machine;
pub mod quiz;
pub mod snapshot;
pub mod store;

pub use achievements::{Achievements, Badge};
pub use gating::{Gate, PhaseStatus, StepStatus};
pub use machine::{Action, Effect, LearnerState, Outcome, ProgressMachine, Transition, reduce};
pub use quiz::{PASSING_SCORE, QuizAttempt, QuizScore};
pub use snapshot::ProgressSnapshot;
pub use store::{JsonFileStore, MemoryStore, ProgressStore, StoreError};
