use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use tracing::warn;

use crate::db::{ApplicationFilter, Database};
use crate::models::{Application, ApplicationStatus, Interview};
use crate::truncate;

struct AppState {
    applications: Vec<Application>,
    selected: usize,
    scroll_offset: u16,
    interviews: Vec<Interview>,
    message: Option<String>,
}

impl AppState {
    fn new(applications: Vec<Application>) -> Self {
        Self {
            applications,
            selected: 0,
            scroll_offset: 0,
            interviews: Vec::new(),
            message: None,
        }
    }

    fn current(&self) -> Option<&Application> {
        self.applications.get(self.selected)
    }

    fn load_interviews(&mut self, db: &Database) {
        let Some(app) = self.current() else { return };
        self.interviews = db.interviews_for_application(&app.id).unwrap_or_default();
    }

    fn next(&mut self) {
        if !self.applications.is_empty() && self.selected < self.applications.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn set_status(&mut self, db: &Database, status: ApplicationStatus) {
        let Some(app) = self.applications.get_mut(self.selected) else { return };
        match db.set_application_status(&app.id, status) {
            Ok(()) => {
                app.status = status;
                self.message = Some(format!("{} -> {}", app.company_name, status));
            }
            Err(e) => {
                warn!("failed to update status for {}: {:#}", app.id, e);
                self.message = Some(format!("Update failed: {}", e));
            }
        }
    }
}

fn status_for_key(key: char) -> Option<ApplicationStatus> {
    match key {
        't' => Some(ApplicationStatus::Target),
        'h' => Some(ApplicationStatus::Hunting),
        'a' => Some(ApplicationStatus::Applied),
        'i' => Some(ApplicationStatus::Interviewing),
        'o' => Some(ApplicationStatus::Offer),
        'x' => Some(ApplicationStatus::Rejected),
        'w' => Some(ApplicationStatus::Withdrawn),
        _ => None,
    }
}

pub fn run_browse(db: &Database, filter: &ApplicationFilter) -> Result<()> {
    let applications = db.list_applications(filter)?;
    if applications.is_empty() {
        println!("No applications found.");
        return Ok(());
    }

    let mut state = AppState::new(applications);
    state.load_interviews(db);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let prev_selected = state.selected;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char(c) => {
                    if let Some(status) = status_for_key(c) {
                        state.set_status(db, status);
                    }
                }
                _ => {}
            }
            if state.selected != prev_selected {
                list_state.select(Some(state.selected));
                state.message = None;
                state.load_interviews(db);
            }
        }
    }
    Ok(())
}

fn status_icon(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Target => " ",
        ApplicationStatus::Hunting => ".",
        ApplicationStatus::Applied => "+",
        ApplicationStatus::Interviewing => "*",
        ApplicationStatus::Offer => "$",
        ApplicationStatus::Accepted => "!",
        ApplicationStatus::Rejected => "x",
        ApplicationStatus::Withdrawn => "-",
    }
}

fn status_style(status: ApplicationStatus) -> Style {
    match status {
        ApplicationStatus::Target | ApplicationStatus::Hunting => Style::default().fg(Color::Blue),
        ApplicationStatus::Applied => Style::default().fg(Color::Cyan),
        ApplicationStatus::Interviewing => Style::default().fg(Color::Yellow),
        ApplicationStatus::Offer | ApplicationStatus::Accepted => Style::default().fg(Color::Green),
        ApplicationStatus::Rejected => Style::default().fg(Color::Red),
        ApplicationStatus::Withdrawn => Style::default().fg(Color::DarkGray),
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .split(rows[0]);

    // Left panel: application list
    let items: Vec<ListItem> = state
        .applications
        .iter()
        .map(|app| {
            ListItem::new(format!(
                "{} {} | {}",
                status_icon(app.status),
                truncate(&app.position, 32),
                app.company_name
            ))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Applications ({}) ", state.applications.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: application detail
    let detail = build_detail(state, chunks[1].width.saturating_sub(4) as usize);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    let footer = match &state.message {
        Some(message) => format!(" {}", message),
        None => " j/k:navigate  J/K:scroll  t/h/a/i/o:status  x:rejected w:withdrawn  q:quit".to_string(),
    };
    let help = Paragraph::new(footer).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[1]);
}

fn build_detail(state: &AppState, width: usize) -> Text<'_> {
    let Some(app) = state.current() else {
        return Text::raw("No application selected");
    };
    let width = width.max(20);

    let mut lines: Vec<Line> = Vec::new();

    // Header
    lines.push(Line::from(Span::styled(
        app.position.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", app.company_name)));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", app.status),
        status_style(app.status),
    )));

    if let Some(priority) = app.priority {
        lines.push(Line::from(format!("Priority: {}", priority)));
    }
    if let Some(location) = &app.location {
        let work_type = app.work_type.map(|w| format!(" ({})", w)).unwrap_or_default();
        lines.push(Line::from(format!("Location: {}{}", location, work_type)));
    }
    if let Some(salary) = &app.salary {
        lines.push(Line::from(format!("Salary: {}", salary.display())));
    }
    if let Some(applied) = app.applied_date {
        lines.push(Line::from(format!("Applied: {}", applied.format("%Y-%m-%d"))));
    }
    if let Some(url) = &app.job_url {
        lines.push(Line::from(format!("URL: {}", url)));
    }
    if !app.tags.is_empty() {
        lines.push(Line::from(format!("Tags: {}", app.tags.join(", "))));
    }

    lines.push(Line::from(""));

    if !state.interviews.is_empty() {
        lines.push(Line::from(Span::styled(
            "INTERVIEWS",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for interview in &state.interviews {
            let when = interview
                .scheduled_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unscheduled".to_string());
            lines.push(Line::from(format!(
                "  #{} {} - {} ({})",
                interview.round, interview.kind, when, interview.status
            )));
        }
        lines.push(Line::from(""));
    }

    if let Some(notes) = &app.notes {
        lines.push(Line::from(Span::styled(
            "NOTES",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in textwrap::fill(notes, width).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    match &app.job_description {
        Some(description) => {
            lines.push(Line::from(Span::styled(
                "DESCRIPTION",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for line in textwrap::fill(description, width).lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        None => {
            lines.push(Line::from(Span::styled(
                "(No description saved)",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Repository;

    fn state_with(n: usize) -> AppState {
        AppState::new(
            (0..n)
                .map(|i| Application::new(&format!("Company {}", i), "Engineer", ApplicationStatus::Applied))
                .collect(),
        )
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut state = state_with(2);
        state.prev();
        assert_eq!(state.selected, 0);
        state.next();
        state.next();
        assert_eq!(state.selected, 1);

        state.scroll_down();
        assert_eq!(state.scroll_offset, 3);
        state.prev();
        assert_eq!(state.scroll_offset, 0);
    }

    #[test]
    fn test_status_hotkeys() {
        assert_eq!(status_for_key('o'), Some(ApplicationStatus::Offer));
        assert_eq!(status_for_key('w'), Some(ApplicationStatus::Withdrawn));
        assert_eq!(status_for_key('j'), None);
    }

    #[test]
    fn test_set_status_updates_store_and_row() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        let mut state = state_with(1);
        let app = state.applications[0].clone();
        db.applications().insert(&app).unwrap();

        state.set_status(&db, ApplicationStatus::Interviewing);
        assert_eq!(state.applications[0].status, ApplicationStatus::Interviewing);
        let stored = db.applications().get(&app.id).unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Interviewing);
    }

    #[test]
    fn test_set_status_failure_keeps_row() {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        let mut state = state_with(1);

        state.set_status(&db, ApplicationStatus::Offer);
        assert_eq!(state.applications[0].status, ApplicationStatus::Applied);
        assert!(state.message.unwrap().starts_with("Update failed"));
    }
}
