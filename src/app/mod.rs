//! Terminal application: owns the terminal and runs the event loop

pub mod command;
pub mod controller;
pub mod input;
pub mod state;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::Config;
use crate::curriculum::Curriculum;
use crate::progress::{Achievements, JsonFileStore, ProgressMachine};
use crate::theme::Theme;
use crate::tutor::{ClaudeClient, Tutor};
pub use controller::{Controller, Flow};

/// Frame budget for input polling
const TICK: Duration = Duration::from_millis(16);

/// The main application
pub struct App {
    config: Config,
    theme: Theme,
    controller: Controller<JsonFileStore, ClaudeClient>,
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl App {
    /// Restore progress for `curriculum` and take over the terminal
    pub fn new(config: Config, curriculum: Curriculum) -> Result<Self> {
        let data_dir = Config::data_dir()?;
        let machine = ProgressMachine::restore(curriculum, JsonFileStore::in_dir(&data_dir));

        let achievements_path = Config::achievements_path()?;
        let achievements = Achievements::load_or_default(&achievements_path);

        let tutor = Tutor::connect(config.tutor_model);
        let mut controller = Controller::new(
            machine,
            achievements,
            Some(achievements_path),
            tutor,
            config.tutor_model,
        );
        controller.state.panel_visibility.curriculum = config.show_curriculum;

        let theme = config.active_theme();
        let terminal = Self::setup_terminal()?;

        Ok(Self { config, theme, controller, terminal })
    }

    /// Set up the terminal for TUI rendering
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore the terminal to its original state
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Run the application main loop
    pub async fn run(&mut self) -> Result<()> {
        // Set up panic hook to restore terminal
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        loop {
            let Self { controller, terminal, theme, .. } = self;
            terminal.draw(|frame| controller.draw(frame, theme))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.controller.handle_key(key) {
                            Flow::Quit => break,
                            Flow::ReconnectTutor => self.reconnect_tutor(),
                            Flow::Continue => {}
                        }
                    }
                }
            }

            self.controller.drain_tutor_updates();

            // Let the spawned tutor task make progress between frames
            tokio::task::yield_now().await;
        }

        tracing::info!("Quitting");
        self.restore_terminal()?;
        Ok(())
    }

    /// Rebuild the tutor with the current key and model, and remember the model
    fn reconnect_tutor(&mut self) {
        let model = self.controller.tutor_model();
        self.controller.set_tutor(Tutor::connect(model));

        if self.config.tutor_model != model {
            self.config.tutor_model = model;
            if let Err(e) = self.config.save().context("Failed to save tutor model") {
                tracing::warn!("{:#}", e);
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}
