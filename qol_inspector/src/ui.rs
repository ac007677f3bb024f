use std::collections::VecDeque;

use qol_core::scenario::MAX_MAGNITUDE;
use qol_core::{
    gauge_bound, propagate, Comparison, DashboardConfig, DataBundle, Dimension, Group,
    IndicatorDefinition, InterventionState, ScenarioRun, SortOrder,
};
use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::report::{bar_cells, bar_rows};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Scenario,
    Dashboard,
}

impl Screen {
    fn title(self) -> &'static str {
        match self {
            Screen::Scenario => "Bench scenario",
            Screen::Dashboard => "Dashboard",
        }
    }
}

pub struct UiState {
    pub screen: Screen,
    pub run: ScenarioRun,
    pub variables: Vec<IndicatorDefinition>,
    pub selected: usize,
    pub sort: SortOrder,
    pub comparison: Result<Comparison, String>,
    pub reference_label: String,
    pub logs: VecDeque<String>,
    pub max_logs: usize,
}

impl UiState {
    pub fn new(bundle: Option<&DataBundle>, config: &DashboardConfig) -> Self {
        let variables = bundle
            .map(|bundle| bundle.catalog.iter().cloned().collect())
            .unwrap_or_default();
        let mut state = Self {
            screen: Screen::Scenario,
            run: ScenarioRun::evaluate(InterventionState::default()),
            variables,
            selected: 0,
            sort: SortOrder::default(),
            comparison: Err("no data loaded".to_string()),
            reference_label: config.reference_label().to_string(),
            logs: VecDeque::new(),
            max_logs: 8,
        };
        state.refresh_comparison(bundle, config);
        state
    }

    pub fn push_log<S: Into<String>>(&mut self, line: S) {
        let mut text: String = line.into();
        while text.ends_with('\n') || text.ends_with('\r') {
            text.pop();
        }
        if text.is_empty() {
            return;
        }
        self.logs.push_front(text);
        while self.logs.len() > self.max_logs {
            self.logs.pop_back();
        }
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Scenario => Screen::Dashboard,
            Screen::Dashboard => Screen::Scenario,
        };
    }

    /// Apply a change to the intervention and re-evaluate it.
    pub fn update_intervention(&mut self, change: impl FnOnce(&mut InterventionState)) {
        let mut state = self.run.state;
        change(&mut state);
        if state != self.run.state {
            self.run = ScenarioRun::evaluate(state);
        }
    }

    /// Move the variable cursor by `step`, wrapping at both ends.
    pub fn select_variable(&mut self, step: isize) -> bool {
        let count = self.variables.len();
        if count == 0 {
            return false;
        }
        let next = (self.selected as isize + step).rem_euclid(count as isize) as usize;
        let changed = next != self.selected;
        self.selected = next;
        changed
    }

    pub fn selected_variable(&self) -> Option<&IndicatorDefinition> {
        self.variables.get(self.selected)
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        if let Ok(comparison) = self.comparison.as_mut() {
            comparison.resort(self.sort);
        }
    }

    pub fn refresh_comparison(&mut self, bundle: Option<&DataBundle>, config: &DashboardConfig) {
        self.comparison = match (bundle, self.variables.get(self.selected)) {
            (Some(bundle), Some(definition)) => Comparison::build(
                &bundle.neighbourhoods,
                bundle.municipal_reference(&definition.column_key),
                definition,
                config.groups(),
                self.sort,
                config.chart().headroom(),
            )
            .map_err(|err| err.to_string()),
            (None, _) => Err("no data loaded".to_string()),
            (Some(_), None) => Err("catalog is empty".to_string()),
        };
    }
}

pub fn draw_ui(frame: &mut Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(4),
            Constraint::Length(7),
        ])
        .split(frame.size());

    draw_header(frame, chunks[0], state);
    match state.screen {
        Screen::Scenario => draw_scenario(frame, chunks[1], state),
        Screen::Dashboard => draw_dashboard(frame, chunks[1], state),
    }
    draw_commands(frame, chunks[2], state.screen);
    draw_logs(frame, chunks[3], state);
}

fn inner(area: Rect) -> Rect {
    area.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    })
}

fn draw_header(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Ede-Veldhuizen QoL sandbox");
    let tabs: Vec<Span> = [Screen::Scenario, Screen::Dashboard]
        .into_iter()
        .flat_map(|screen| {
            let style = if screen == state.screen {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [Span::styled(screen.title(), style), Span::raw("   ")]
        })
        .collect();
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(Line::from(tabs)), inner(area));
}

fn draw_scenario(frame: &mut Frame, area: Rect, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6)])
        .split(area);

    let bound = gauge_bound();
    let total = state.run.outcome.total;
    let ratio = (f64::from(total.clamp(-bound, bound) + bound) / f64::from(2 * bound)).clamp(0.0, 1.0);
    let gauge_color = if total >= 0 { Color::Green } else { Color::Red };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("QoL score (benches {:+})", state.run.state.magnitude())),
        )
        .gauge_style(Style::default().fg(gauge_color))
        .ratio(ratio)
        .label(format!("{total:+} / ±{bound}"));
    frame.render_widget(gauge, chunks[0]);

    let half_width = usize::from(chunks[1].width.saturating_sub(40) / 2).max(4);
    // Bars share one scale: the largest delta reachable at full magnitude.
    let scale = propagate(MAX_MAGNITUDE)
        .iter()
        .map(|(_, delta)| delta.unsigned_abs())
        .max()
        .unwrap_or(0)
        .max(1) as usize;
    let lines: Vec<Line> = Dimension::ALL
        .into_iter()
        .map(|dimension| {
            let delta = state.run.deltas.get(dimension);
            let cells = (delta.unsigned_abs() as usize * half_width) / scale;
            let (left, right) = if delta < 0 {
                (format!("{:>half_width$}", "█".repeat(cells)), " ".repeat(half_width))
            } else {
                (" ".repeat(half_width), format!("{:<half_width$}", "█".repeat(cells)))
            };
            let color = if delta < 0 { Color::Red } else { Color::Green };
            Line::from(vec![
                Span::styled(format!("{:<14}", dimension.label()), Style::default().fg(Color::Yellow)),
                Span::styled(left, Style::default().fg(color)),
                Span::raw("│"),
                Span::styled(right, Style::default().fg(color)),
                Span::raw(format!(
                    " {delta:>+4}  weighted {:>+4}",
                    state.run.outcome.contribution(dimension)
                )),
            ])
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title("Factor deltas");
    frame.render_widget(block, chunks[1]);
    frame.render_widget(Paragraph::new(lines), inner(chunks[1]));
}

fn draw_dashboard(frame: &mut Frame, area: Rect, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let items: Vec<ListItem> = state
        .variables
        .iter()
        .map(|definition| ListItem::new(format!("{} · {}", definition.dimension, definition.label)))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Variables"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(list, chunks[0], &mut list_state);

    let title = format!("Comparison ({})", state.sort);
    let block = Block::default().borders(Borders::ALL).title(title);
    let lines = match &state.comparison {
        Ok(comparison) => comparison_lines(comparison, chunks[1], &state.reference_label),
        Err(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        ))],
    };
    frame.render_widget(block, chunks[1]);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        inner(chunks[1]),
    );
}

fn comparison_lines(comparison: &Comparison, area: Rect, reference_label: &str) -> Vec<Line<'static>> {
    let name_width = comparison
        .rows
        .iter()
        .map(|row| row.display_name.chars().count())
        .max()
        .unwrap_or(0);
    let width = usize::from(area.width)
        .saturating_sub(name_width + 14)
        .max(8);
    let (rows, marker) = bar_rows(comparison, width);

    let mut lines = vec![Line::from(Span::styled(
        comparison.definition.axis_label(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    lines.extend(rows.iter().map(|row| {
        let color = match row.group {
            Group::A => Color::LightRed,
            Group::B => Color::Red,
        };
        Line::from(vec![
            Span::raw(format!("{:<name_width$} ", row.label)),
            Span::styled(bar_cells(row, width, marker), Style::default().fg(color)),
            Span::raw(format!(" {}", row.value_text)),
        ])
    }));
    lines.push(Line::from(Span::styled(
        format!("│ {reference_label}: {}", comparison.format(comparison.reference)),
        Style::default().fg(Color::Cyan),
    )));
    lines
}

fn draw_commands(frame: &mut Frame, area: Rect, screen: Screen) {
    let key = |text: &'static str| Span::styled(text, Style::default().fg(Color::Yellow));
    let line = match screen {
        Screen::Scenario => Line::from(vec![
            key("←/→"),
            Span::raw(" benches  "),
            key("0"),
            Span::raw(" reset  "),
            key("tab"),
            Span::raw(" dashboard  "),
            key("q"),
            Span::raw(" exit"),
        ]),
        Screen::Dashboard => Line::from(vec![
            key("↑/↓"),
            Span::raw(" variable  "),
            key("s"),
            Span::raw(" sort order  "),
            key("tab"),
            Span::raw(" scenario  "),
            key("q"),
            Span::raw(" exit"),
        ]),
    };
    let block = Block::default().borders(Borders::ALL).title("Commands");
    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: false }), inner(area));
}

fn draw_logs(frame: &mut Frame, area: Rect, state: &UiState) {
    let block = Block::default().borders(Borders::ALL).title("Logs");
    let lines: Vec<Line> = state
        .logs
        .iter()
        .map(|entry| Line::from(Span::raw(entry.as_str())))
        .collect();
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(block, area);
    frame.render_widget(paragraph, inner(area));
}
