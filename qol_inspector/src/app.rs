use std::io;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use qol_core::{DashboardConfig, DataBundle, InterventionState};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use tracing::{debug, info};

use crate::ui::{draw_ui, Screen, UiState};

/// Clears the screen and hides the cursor before switching to raw mode, so a
/// failure never leaves the terminal raw.
fn prepare_terminal<B: Backend>(
    terminal: &mut Terminal<B>,
    enable_raw_mode: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    terminal.clear()?;
    terminal.hide_cursor()?;
    enable_raw_mode()
}

pub struct SandboxApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    log_receiver: Receiver<String>,
    bundle: Option<DataBundle>,
    config: Arc<DashboardConfig>,
}

impl SandboxApp {
    pub fn new(
        bundle: Option<DataBundle>,
        config: Arc<DashboardConfig>,
        log_receiver: Receiver<String>,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        prepare_terminal(&mut terminal, crossterm::terminal::enable_raw_mode)?;
        let ui_state = UiState::new(bundle.as_ref(), &config);
        Ok(Self {
            terminal,
            ui_state,
            log_receiver,
            bundle,
            config,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let result = self.event_loop();
        self.terminal.clear()?;
        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut last_draw: Option<Instant> = None;

        loop {
            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            if last_draw.map_or(true, |at| at.elapsed() >= Duration::from_millis(100)) {
                self.terminal.draw(|frame| draw_ui(frame, &self.ui_state))?;
                last_draw = Some(Instant::now());
            }

            if !event::poll(Duration::from_millis(50))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Tab | KeyCode::BackTab => self.ui_state.toggle_screen(),
                _ => match self.ui_state.screen {
                    Screen::Scenario => self.handle_scenario_key(key.code),
                    Screen::Dashboard => self.handle_dashboard_key(key.code),
                },
            }
            last_draw = None;
        }

        info!(target: "qol::scenario", "sandbox.closed");
        Ok(())
    }

    fn handle_scenario_key(&mut self, code: KeyCode) {
        let before = self.ui_state.run.state.magnitude();
        match code {
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                self.ui_state.update_intervention(InterventionState::increment)
            }
            KeyCode::Left | KeyCode::Char('-') | KeyCode::Char('_') => {
                self.ui_state.update_intervention(InterventionState::decrement)
            }
            KeyCode::Char('0') => self.ui_state.update_intervention(InterventionState::reset),
            _ => return,
        }
        let run = &self.ui_state.run;
        if run.state.magnitude() == before {
            debug!(target: "qol::scenario", magnitude = before, "scenario.at_bound");
        } else {
            info!(
                target: "qol::scenario",
                magnitude = run.state.magnitude(),
                total = run.outcome.total,
                "scenario.updated"
            );
        }
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Down | KeyCode::Char('j') => self.change_variable(1),
            KeyCode::Up | KeyCode::Char('k') => self.change_variable(-1),
            KeyCode::Char('s') => {
                self.ui_state.cycle_sort();
                info!(target: "qol::data", order = %self.ui_state.sort, "comparison.sorted");
            }
            _ => {}
        }
    }

    fn change_variable(&mut self, step: isize) {
        if !self.ui_state.select_variable(step) {
            return;
        }
        self.ui_state
            .refresh_comparison(self.bundle.as_ref(), &self.config);
        if let Some(definition) = self.ui_state.selected_variable() {
            info!(
                target: "qol::data",
                dimension = %definition.dimension,
                variable = %definition.label,
                "variable.selected"
            );
        }
        if let Some(message) = self.ui_state.comparison.as_ref().err().cloned() {
            self.ui_state.push_log(format!("comparison unavailable: {message}"));
        }
    }
}
