//! TUI module - Terminal dashboard with ratatui

use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use rand::Rng;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::info;

use crate::config::AppConfig;
use crate::db::Database;
use crate::loader::{spawn_load, LoadError, LoadState};
use crate::plan::{display_date, WorkoutPlan};
use crate::selection::Direction as Step;
use crate::view::ViewState;

type Tui = Terminal<CrosstermBackend<Stdout>>;

const CONFETTI: &[&str] = &["*", "+", "o", "•", "✦", "❖"];
const CONFETTI_COLORS: &[Color] = &[
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::LightBlue,
];

/// Open drop-down menu
enum Menu {
    Date(ListState),
    Title(ListState),
}

/// App state for TUI
pub struct App {
    db: Database,
    config: AppConfig,
    view: ViewState,
    pending: Option<oneshot::Receiver<Result<WorkoutPlan, LoadError>>>,
    menu: Option<Menu>,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database, config: AppConfig) -> Result<Self> {
        let counts = db.load_counts();
        let view = ViewState::new(counts, config.policy, config.swipe_threshold);
        Ok(Self {
            db,
            config,
            view,
            pending: None,
            menu: None,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        self.reload();
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            self.poll_load();
            self.view.tick(Instant::now());
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    /// Re-read counts and start loading the plan again
    fn reload(&mut self) {
        self.menu = None;
        self.view.start_reload(self.db.load_counts());
        match self.config.identifier() {
            Ok(identifier) => {
                info!("Loading plan for {}", identifier);
                self.pending = Some(spawn_load(self.config.source.clone(), identifier));
            }
            Err(e) => {
                self.pending = None;
                self.view.on_loaded(Err(e), self.config.today());
            }
        }
    }

    fn poll_load(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => Err(LoadError::Interrupted(
                self.config.workout.clone().unwrap_or_default(),
            )),
        };
        self.pending = None;
        self.view.on_loaded(result, self.config.today());
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        match &self.view.load {
            LoadState::Loading => {
                frame.render_widget(Paragraph::new("Loading...").alignment(Alignment::Center), area);
                return;
            }
            LoadState::Error(message) => {
                let text = Paragraph::new(message.as_str())
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(text, area);
                return;
            }
            LoadState::Ready(_) => {}
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new("Workout Plan")
            .style(Style::default().fg(Color::Cyan).bold())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Session info
        let session = self.view.current_session();
        let info_lines = match session {
            Some(s) => vec![
                Line::from(format!("Started at {}", s.display_date())).bold(),
                Line::from(s.notes.clone()),
            ],
            None => vec![],
        };
        frame.render_widget(
            Paragraph::new(info_lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL)),
            chunks[1],
        );

        // Menus
        let date_label = self.view.selected_date.map(display_date).unwrap_or_default();
        let title_label = self.view.selected_title.clone().unwrap_or_default();
        let menubar = Line::from(vec![
            Span::styled("[d] ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("Date: {}", date_label)),
            Span::raw("    "),
            Span::styled("[t] ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("Group: {}", title_label)),
        ]);
        frame.render_widget(
            Paragraph::new(menubar).block(Block::default().borders(Borders::ALL)),
            chunks[2],
        );

        let faded = if self.view.is_fading() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        // Counter
        if let Some((count, frequency)) = self.view.current_count() {
            let counter = Paragraph::new(format!("[-]  {} / {}  [+]", count, frequency))
                .style(faded)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Frequency control"));
            frame.render_widget(counter, chunks[3]);
        }

        // Exercises
        if let Some(group) = self.view.current_group() {
            let rows: Vec<Row> = group
                .exercises
                .iter()
                .map(|e| {
                    Row::new(vec![
                        Cell::from(e.name.clone()),
                        Cell::from(e.series.to_string()),
                        Cell::from(e.repetitions.to_string()),
                        Cell::from(e.weight.to_string()),
                    ])
                })
                .collect();

            let table = Table::new(
                rows,
                [
                    Constraint::Min(20),
                    Constraint::Length(8),
                    Constraint::Length(12),
                    Constraint::Length(12),
                ],
            )
            .header(
                Row::new(vec!["Exercise", "Series", "Repetitions", "Weight"])
                    .style(Style::default().bold()),
            )
            .style(faded)
            .block(Block::default().borders(Borders::ALL).title(group.title.as_str()));

            frame.render_widget(table, chunks[4]);
        }

        // Footer
        let footer = Paragraph::new(
            "q: quit | d: date | t: group | +/-: count | ←/→ or swipe: group | r: refresh",
        )
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[5]);

        self.render_menu(frame, area);

        if self.view.is_celebrating() {
            render_confetti(frame, area);
        }
    }

    fn render_menu(&mut self, frame: &mut Frame, area: Rect) {
        let Some(menu) = self.menu.as_mut() else {
            return;
        };

        let (title, items, state): (&str, Vec<ListItem>, &mut ListState) = match menu {
            Menu::Date(state) => (
                "Date",
                self.view
                    .plan()
                    .iter()
                    .map(|s| ListItem::new(format!("Started at {}", s.display_date())))
                    .collect(),
                state,
            ),
            Menu::Title(state) => (
                "Group",
                self.view
                    .current_session()
                    .map(|s| s.groups.iter().map(|g| ListItem::new(g.title.clone())).collect())
                    .unwrap_or_default(),
                state,
            ),
        };

        let popup = centered(area, 40, items.len() as u16 + 2);
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
            .highlight_symbol("> ");

        frame.render_widget(Clear, popup);
        frame.render_stateful_widget(list, popup, state);
    }

    fn handle_events(&mut self) -> Result<()> {
        if !event::poll(Duration::from_millis(100))? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if self.menu.is_some() {
                    self.handle_menu_key(key.code);
                } else {
                    self.handle_key(key.code);
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        let now = Instant::now();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.view.increment_selected(&self.db, now);
            }
            KeyCode::Char('-') => self.view.decrement_selected(&self.db),
            KeyCode::Right => self.view.step(Step::Next, now),
            KeyCode::Left => self.view.step(Step::Previous, now),
            KeyCode::Char('d') if self.view.load.plan().is_some() => {
                let index = self
                    .view
                    .selected_date
                    .and_then(|d| self.view.plan().iter().position(|s| s.date == d));
                self.menu = Some(Menu::Date(ListState::default().with_selected(index.or(Some(0)))));
            }
            KeyCode::Char('t') => {
                if let Some(session) = self.view.current_session() {
                    let index = self
                        .view
                        .selected_title
                        .as_deref()
                        .and_then(|t| session.groups.iter().position(|g| g.title == t));
                    self.menu =
                        Some(Menu::Title(ListState::default().with_selected(index.or(Some(0)))));
                }
            }
            _ => {}
        }
    }

    fn handle_menu_key(&mut self, code: KeyCode) {
        let Some(menu) = self.menu.as_mut() else {
            return;
        };
        let state = match menu {
            Menu::Date(state) | Menu::Title(state) => state,
        };

        match code {
            KeyCode::Esc | KeyCode::Char('q') => self.menu = None,
            KeyCode::Up => state.select_previous(),
            KeyCode::Down => state.select_next(),
            KeyCode::Enter => {
                let picked = state.selected();
                if let Some(menu) = self.menu.take() {
                    self.apply_menu(menu, picked);
                }
            }
            _ => {}
        }
    }

    fn apply_menu(&mut self, menu: Menu, picked: Option<usize>) {
        let Some(index) = picked else {
            return;
        };
        match menu {
            Menu::Date(_) => {
                let date: Option<NaiveDate> = self.view.plan().get(index).map(|s| s.date);
                if let Some(date) = date {
                    self.view.select_date(date);
                }
            }
            Menu::Title(_) => {
                let title = self
                    .view
                    .current_session()
                    .and_then(|s| s.groups.get(index))
                    .map(|g| g.title.clone());
                if let Some(title) = title {
                    self.view.select_title(&title);
                }
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let x = i32::from(mouse.column);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.view.touch_start(x),
            MouseEventKind::Drag(MouseButton::Left) => self.view.touch_move(x),
            MouseEventKind::Up(MouseButton::Left) => self.view.touch_end(Instant::now()),
            _ => {}
        }
    }
}

/// Scatter confetti glyphs over the whole screen
fn render_confetti(frame: &mut Frame, area: Rect) {
    let mut rng = rand::thread_rng();
    let pieces = (area.width as usize * area.height as usize) / 12;
    let buf = frame.buffer_mut();

    for _ in 0..pieces {
        let x = area.x + rng.gen_range(0..area.width.max(1));
        let y = area.y + rng.gen_range(0..area.height.max(1));
        let glyph = CONFETTI[rng.gen_range(0..CONFETTI.len())];
        let color = CONFETTI_COLORS[rng.gen_range(0..CONFETTI_COLORS.len())];
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_symbol(glyph).set_fg(color);
        }
    }

    let banner = centered(area, 24, 3);
    frame.render_widget(Clear, banner);
    frame.render_widget(
        Paragraph::new("Target reached!")
            .style(Style::default().fg(Color::Yellow).bold())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        banner,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(DisableMouseCapture)?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
