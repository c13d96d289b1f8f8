use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use log::{debug, warn};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tokio::sync::mpsc::{self, UnboundedSender};

use fitapp::session::{HistoryRecord, SetField};
use fitapp::timer::{Ticker, format_elapsed, format_rest};

use crate::Manager;

const INPUT_POLL: Duration = Duration::from_millis(200);

pub enum Outcome {
    Finished(HistoryRecord),
    Discarded,
    Left,
}

#[derive(Debug, Clone, Copy)]
enum Tick {
    Elapsed,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InputMode {
    Normal,
    Editing(SetField),
}

struct ActiveWorkoutView<'a> {
    manager: &'a mut Manager,
    selected_set: usize,
    input_mode: InputMode,
    input_buffer: String,
    status_message: String,
}

/// Reads key presses on a plain thread and forwards them until the receiver
/// goes away.
fn spawn_key_reader(tx: UnboundedSender<KeyEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        if tx.send(key).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to poll terminal events: {}", e);
                    break;
                }
            }
        }
    })
}

pub async fn run_active_workout(mut terminal: DefaultTerminal, manager: &mut Manager) -> Result<Outcome> {
    let (tick_tx, mut ticks) = mpsc::unbounded_channel();
    let (key_tx, mut keys) = mpsc::unbounded_channel();
    let reader = spawn_key_reader(key_tx);

    // Both tickers stop when dropped, whichever way this function returns.
    let _elapsed_ticker = Ticker::every_second(Tick::Elapsed, tick_tx.clone());
    let mut rest_ticker: Option<Ticker> = None;

    let mut view = ActiveWorkoutView::new(manager);
    let outcome = loop {
        if view.manager.rest_timer_running() {
            if rest_ticker.is_none() {
                rest_ticker = Some(Ticker::every_second(Tick::Rest, tick_tx.clone()));
            }
        } else {
            rest_ticker = None;
        }

        terminal.draw(|frame| view.render(frame))?;

        tokio::select! {
            Some(tick) = ticks.recv() => {
                debug!("Tick: {:?}", tick);
            }
            key = keys.recv() => match key {
                Some(key) => {
                    if let Some(outcome) = view.handle_key(key) {
                        break outcome;
                    }
                }
                None => break Outcome::Left,
            },
        }
    };

    drop(keys);
    if reader.join().is_err() {
        warn!("Key reader thread panicked");
    }
    Ok(outcome)
}

impl<'a> ActiveWorkoutView<'a> {
    fn new(manager: &'a mut Manager) -> Self {
        Self {
            manager,
            selected_set: 0,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            status_message: "j/k set · h/l exercise · space done · w/r edit · a add · J/K move · t rest · f finish · x discard · q quit".to_string(),
        }
    }

    fn current_exercise(&self) -> Option<usize> {
        let session = self.manager.active()?;
        session.current_exercise().map(|_| session.current_exercise_index)
    }

    fn set_count(&self) -> usize {
        self.manager
            .active()
            .and_then(|s| s.current_exercise())
            .map_or(0, |e| e.sets.len())
    }

    fn clamp_selection(&mut self) {
        let count = self.set_count();
        if self.selected_set >= count {
            self.selected_set = count.saturating_sub(1);
        }
    }

    fn report<E: std::fmt::Display>(&mut self, result: std::result::Result<(), E>, ok: &str) {
        match result {
            Ok(_) => self.status_message = ok.to_string(),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    fn step_exercise(&mut self, forward: bool) {
        let Some(session) = self.manager.active() else {
            return;
        };
        let len = session.exercises.len();
        let index = session.current_exercise_index;
        let target = if forward {
            if index + 1 >= len {
                return;
            }
            index + 1
        } else {
            match index.checked_sub(1) {
                Some(i) => i,
                None => return,
            }
        };
        let result = self.manager.select_exercise(target).map(|_| ());
        self.report(result, "");
        self.selected_set = 0;
    }

    fn toggle_selected(&mut self) {
        let Some(exercise) = self.current_exercise() else {
            return;
        };
        let set = self.selected_set;
        let result = self
            .manager
            .toggle_set_completion(exercise, set)
            .map(|s| s.exercises[exercise].sets[set].completed);
        match result {
            Ok(true) => self.status_message = "Set done, rest timer started".to_string(),
            Ok(false) => self.status_message = "Set reopened".to_string(),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    fn add_set(&mut self) {
        let Some(exercise) = self.current_exercise() else {
            return;
        };
        let result = self.manager.add_set(exercise).map(|_| ());
        self.report(result, "Set added");
        self.selected_set = self.set_count().saturating_sub(1);
    }

    fn move_selected(&mut self, down: bool) {
        let Some(exercise) = self.current_exercise() else {
            return;
        };
        let to = if down {
            self.selected_set + 1
        } else {
            match self.selected_set.checked_sub(1) {
                Some(i) => i,
                None => return,
            }
        };
        if to >= self.set_count() {
            return;
        }
        let result = self
            .manager
            .move_set(exercise, self.selected_set, to)
            .map(|_| ());
        if result.is_ok() {
            self.selected_set = to;
        }
        self.report(result, "Set moved");
    }

    fn commit_edit(&mut self, field: SetField) {
        let Some(exercise) = self.current_exercise() else {
            return;
        };
        let raw = std::mem::take(&mut self.input_buffer);
        let result = self
            .manager
            .update_set_field(exercise, self.selected_set, field, &raw)
            .map(|_| ());
        self.report(result, "Saved");
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Outcome> {
        if let InputMode::Editing(field) = self.input_mode {
            match key.code {
                KeyCode::Enter => {
                    self.input_mode = InputMode::Normal;
                    self.commit_edit(field);
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.input_buffer.clear();
                    self.status_message = "Edit cancelled".to_string();
                }
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                }
                KeyCode::Char(c) => self.input_buffer.push(c),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(Outcome::Left),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_set + 1 < self.set_count() {
                    self.selected_set += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_set = self.selected_set.saturating_sub(1);
            }
            KeyCode::Char('l') | KeyCode::Right => self.step_exercise(true),
            KeyCode::Char('h') | KeyCode::Left => self.step_exercise(false),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('w') | KeyCode::Char('r') if self.set_count() > 0 => {
                let field = if key.code == KeyCode::Char('w') {
                    SetField::Weight
                } else {
                    SetField::Reps
                };
                self.input_mode = InputMode::Editing(field);
                self.input_buffer.clear();
            }
            KeyCode::Char('a') => self.add_set(),
            KeyCode::Char('J') => self.move_selected(true),
            KeyCode::Char('K') => self.move_selected(false),
            KeyCode::Char('t') => {
                self.manager.reset_rest_timer();
                self.status_message = "Rest timer cleared".to_string();
            }
            KeyCode::Char('f') => match self.manager.finish() {
                Ok(record) => return Some(Outcome::Finished(record)),
                Err(e) => self.status_message = format!("Error finishing workout: {}", e),
            },
            KeyCode::Char('x') => match self.manager.discard() {
                Ok(()) => return Some(Outcome::Discarded),
                Err(e) => self.status_message = format!("Error discarding workout: {}", e),
            },
            _ => {}
        }
        self.clamp_selection();
        None
    }

    fn render(&self, frame: &mut Frame) {
        let Some(session) = self.manager.active() else {
            return;
        };
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

        let elapsed = self.manager.elapsed_time().unwrap_or_default();
        let mut header = format!("{}  ·  {}", session.workout_id, format_elapsed(elapsed));
        if self.manager.rest_timer_running() {
            header.push_str(&format!("  ·  rest {}", format_rest(self.manager.rest_elapsed())));
        }
        frame.render_widget(
            Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("Workout")),
            chunks[0],
        );

        let carousel: Vec<Span> = session
            .exercises
            .iter()
            .enumerate()
            .flat_map(|(idx, entry)| {
                let mut style = Style::default();
                if entry.is_completed() {
                    style = style.fg(Color::Green);
                }
                if idx == session.current_exercise_index {
                    style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
                }
                let label = if entry.is_completed() {
                    format!("{} ✓", entry.exercise.name)
                } else {
                    entry.exercise.name.clone()
                };
                [Span::styled(label, style), Span::raw("  ")]
            })
            .collect();
        frame.render_widget(
            Paragraph::new(Line::from(carousel))
                .block(Block::default().borders(Borders::ALL).title("Exercises")),
            chunks[1],
        );

        let (title, items) = match session.current_exercise() {
            Some(entry) => {
                let items: Vec<ListItem> = entry
                    .sets
                    .iter()
                    .enumerate()
                    .map(|(idx, set)| {
                        let weight = set
                            .actual_weight
                            .map(|w| format!("{}kg", w))
                            .unwrap_or_else(|| "—".to_string());
                        let reps = set
                            .actual_reps
                            .map(|r| r.to_string())
                            .unwrap_or_else(|| format!("({})", set.rep_placeholder()));
                        let line = format!(
                            "[{}] Set {}  {} x {}",
                            if set.completed { "x" } else { " " },
                            idx + 1,
                            weight,
                            reps
                        );
                        let style = if set.completed {
                            Style::default().fg(Color::Green)
                        } else {
                            Style::default()
                        };
                        ListItem::new(line).style(style)
                    })
                    .collect();
                (
                    format!(
                        "{} ({}) · {}",
                        entry.exercise.name,
                        entry.exercise.muscle_group,
                        entry.set_progress()
                    ),
                    items,
                )
            }
            None => ("No exercises".to_string(), Vec::new()),
        };
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(self.selected_set));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[2], &mut state);

        let footer = match self.input_mode {
            InputMode::Editing(SetField::Weight) => format!("Weight (kg): {}", self.input_buffer),
            InputMode::Editing(SetField::Reps) => format!("Reps: {}", self.input_buffer),
            InputMode::Normal => self.status_message.clone(),
        };
        frame.render_widget(
            Paragraph::new(footer).block(Block::default().borders(Borders::ALL)),
            chunks[3],
        );
    }
}
