//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Table, Row, Cell},
};
use std::io::{stdout, Stdout};

use crate::db::{Database, ProgressRecord, User};
use crate::plan::DayPlan;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// App state for TUI
pub struct App {
    db: Database,
    tg_id: i64,
    user: User,
    plan: DayPlan,
    progress: Vec<ProgressRecord>,
    should_quit: bool,
}

impl App {
    pub fn new(mut db: Database, tg_id: i64) -> Result<Self> {
        let plan = db.day_plan(tg_id)?;
        let user = db.get_or_create_user(tg_id)?;
        let progress = db.user_progress(tg_id)?;
        Ok(Self {
            db,
            tg_id,
            user,
            plan,
            progress,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        self.plan = self.db.day_plan(self.tg_id)?;
        self.user = self.db.get_or_create_user(self.tg_id)?;
        self.progress = self.db.user_progress(self.tg_id)?;
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(format!(
            "gymbot - день {} | шаг {:.1} кг",
            self.user.day, self.user.step
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Today's plan
        let plan_rows: Vec<Row> = self.plan.entries.iter().map(|e| {
            Row::new(vec![
                Cell::from(e.spec.name),
                Cell::from(format!("{}×{}", e.spec.sets, e.spec.reps)),
                Cell::from(format!("{:.1}", e.weight)),
                Cell::from(format!("{:.1}", e.spec.min_step)),
            ])
        }).collect();

        let plan_table = Table::new(
            plan_rows,
            [
                Constraint::Min(28),
                Constraint::Length(8),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(Row::new(vec!["Exercise", "Sets", "Weight", "Min step"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title(format!("День {}", self.plan.day)));
        frame.render_widget(plan_table, chunks[1]);

        // All stored progress
        let rows: Vec<Row> = self.progress.iter().map(|p| {
            let fails_style = if p.fails > 0 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(p.exercise.clone()),
                Cell::from(format!("{:.1}", p.weight)),
                Cell::from(p.fails.to_string()).style(fails_style),
                Cell::from(
                    p.updated_at
                        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(28),
                Constraint::Length(10),
                Constraint::Length(6),
                Constraint::Length(18),
            ],
        )
        .header(Row::new(vec!["Exercise", "Weight", "Fails", "Updated"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Progress"));
        frame.render_widget(table, chunks[2]);

        // Footer
        let footer = Paragraph::new("q: quit | s: next day | r: refresh")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    self.handle_key(key.code)?;
                }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('s') => {
                self.db.rotate_day(self.tg_id)?;
                self.refresh()?;
            }
            KeyCode::Char('r') => self.refresh()?,
            _ => {}
        }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
