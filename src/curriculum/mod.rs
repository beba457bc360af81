//! Curriculum catalog: phases, steps and quizzes

pub mod loader;
pub mod markdown;
pub mod model;

pub use markdown::ContentBlock;
pub use model::{Curriculum, CurriculumError, Phase, PhaseId, QuizQuestion, Step, StepKind};
