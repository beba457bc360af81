//! Trailhead - a terminal curriculum runner
//!
//! Trailhead walks a learner through a phased curriculum. Phases unlock as
//! quizzes are passed, progress survives restarts, and an AI tutor can offer
//! a second explanation of any step.

pub mod app;
pub mod config;
pub mod curriculum;
pub mod progress;
pub mod report;
pub mod sim;
pub mod theme;
pub mod tutor;
pub mod ui;

pub use app::App;
pub use config::Config;
pub use theme::Theme;
