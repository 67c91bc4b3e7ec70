use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::{io, time::Duration};
use textwrap::wrap;
use tui_input::{backend::crossterm::EventHandler, Input};

use murmur::chat::ChatState;
use murmur::config::Settings;
use murmur::models::{Message, UserId, UserStatus};
use murmur::view::{self, ContactRow, ErrorToast, PanelMode};

// Export types needed by main module
pub use ratatui::backend::CrosstermBackend;
pub use ratatui::Terminal;

const CONTACTS_WIDTH: u16 = 28;

/// What the user asked for. The composition root turns these into store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Select(UserId),
    Send { recipient: UserId, text: String },
    DismissError,
    UpdateStatus { id: UserId, status: UserStatus },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Composer,
    Contacts,
}

pub struct ChatUI {
    input: Input,
    focus: Focus,
    highlighted: usize,
    drawer_open: bool,
    viewport_width: u16,
    narrow_breakpoint: u16,
    error_display_secs: u64,
    toast: Option<ErrorToast>,
}

impl ChatUI {
    pub fn new(settings: &Settings) -> Self {
        ChatUI {
            input: Input::default(),
            focus: Focus::Composer,
            highlighted: 0,
            drawer_open: false,
            viewport_width: u16::MAX,
            narrow_breakpoint: settings.narrow_breakpoint,
            error_display_secs: settings.error_display_secs,
            toast: None,
        }
    }

    pub fn set_viewport_width(&mut self, width: u16) {
        self.viewport_width = width;
    }

    fn panel_mode(&self) -> PanelMode {
        PanelMode::for_width(self.viewport_width, self.narrow_breakpoint)
    }

    fn contacts_visible(&self) -> bool {
        self.panel_mode() == PanelMode::Docked || self.drawer_open
    }

    #[cfg(test)]
    pub fn input_value(&self) -> &str {
        self.input.value()
    }

    /// Keeps the error toast in step with the snapshot and reports when it
    /// has been on screen long enough to dismiss itself.
    pub fn tick(&mut self, state: &ChatState, now: DateTime<Utc>) -> Option<Intent> {
        self.toast = ErrorToast::sync(self.toast.take(), state.error.as_deref(), now);
        match &self.toast {
            Some(toast) if toast.expired(now, self.error_display_secs) => {
                debug!("UI: Auto-dismissing error toast: {}", toast.message);
                self.toast = None;
                Some(Intent::DismissError)
            }
            _ => None,
        }
    }

    pub fn poll_input(&mut self, state: &ChatState) -> Result<Option<Intent>> {
        if event::poll(Duration::from_millis(10))? {
            match event::read()? {
                Event::Key(key) => return Ok(self.handle_key(key, state)),
                Event::Resize(width, _) => self.set_viewport_width(width),
                _ => {}
            }
        }
        Ok(None)
    }

    pub fn handle_key(&mut self, key: KeyEvent, state: &ChatState) -> Option<Intent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => Some(Intent::Quit),
            KeyCode::Esc => {
                if self.toast.take().is_some() {
                    Some(Intent::DismissError)
                } else if self.drawer_open {
                    self.close_drawer();
                    None
                } else {
                    Some(Intent::Quit)
                }
            }
            KeyCode::Char('e') if ctrl => self.toast.take().map(|_| Intent::DismissError),
            KeyCode::Char('b') if ctrl => {
                if self.panel_mode() == PanelMode::Overlay {
                    if self.drawer_open {
                        self.close_drawer();
                    } else {
                        self.drawer_open = true;
                        self.focus = Focus::Contacts;
                    }
                }
                None
            }
            KeyCode::Tab => {
                if self.contacts_visible() {
                    self.focus = match self.focus {
                        Focus::Composer => Focus::Contacts,
                        Focus::Contacts => Focus::Composer,
                    };
                }
                None
            }
            _ if self.focus == Focus::Contacts && self.contacts_visible() => self.handle_contacts_key(key, ctrl, state),
            _ => self.handle_composer_key(key, state),
        }
    }

    fn handle_contacts_key(&mut self, key: KeyEvent, ctrl: bool, state: &ChatState) -> Option<Intent> {
        let count = state.users.len();
        if count == 0 {
            return None;
        }
        self.highlighted = self.highlighted.min(count - 1);

        match key.code {
            KeyCode::Up => {
                self.highlighted = (self.highlighted + count - 1) % count;
                None
            }
            KeyCode::Down => {
                self.highlighted = (self.highlighted + 1) % count;
                None
            }
            KeyCode::Enter => {
                let id = state.users[self.highlighted].id;
                if self.panel_mode() == PanelMode::Overlay {
                    self.drawer_open = false;
                }
                self.focus = Focus::Composer;
                Some(Intent::Select(id))
            }
            KeyCode::Char('p') if ctrl => {
                let user = &state.users[self.highlighted];
                Some(Intent::UpdateStatus {
                    id: user.id,
                    status: user.status.toggled(),
                })
            }
            _ => None,
        }
    }

    fn handle_composer_key(&mut self, key: KeyEvent, state: &ChatState) -> Option<Intent> {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => None,
            KeyCode::Enter => {
                let recipient = state.active_conversation?;
                if state.is_sending() {
                    return None;
                }
                // Blank drafts go through too so the store can reject them
                let text = self.input.value().to_string();
                // Cleared on dispatch, whatever the send ends up doing
                self.input = Input::default();
                Some(Intent::Send { recipient, text })
            }
            _ => {
                if !state.is_sending() && state.active_conversation.is_some() {
                    self.input.handle_event(&Event::Key(key));
                }
                None
            }
        }
    }

    fn close_drawer(&mut self) {
        self.drawer_open = false;
        self.focus = Focus::Composer;
    }

    pub fn draw(&self, frame: &mut Frame, state: &ChatState) {
        let size = frame.size();
        let mode = PanelMode::for_width(size.width, self.narrow_breakpoint);

        let (contacts_area, chat_area) = match mode {
            PanelMode::Docked => {
                let chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Length(CONTACTS_WIDTH), // Contacts panel
                        Constraint::Min(20),                // Chat panel
                    ])
                    .split(size);
                (Some(chunks[0]), chunks[1])
            }
            PanelMode::Overlay => (None, size),
        };

        let chat_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(3),    // Messages area
                Constraint::Length(3), // Composer
                Constraint::Length(1), // Help line
            ])
            .split(chat_area);

        self.draw_header(frame, state, mode, chat_chunks[0]);
        draw_messages(frame, state.active_messages(), chat_chunks[1]);
        self.draw_composer(frame, state, chat_chunks[2]);

        let help = Paragraph::new(Line::from(vec![Span::styled(
            "Esc quit | Tab focus | Enter send/select | Ctrl+B contacts | Ctrl+P presence | Ctrl+E dismiss",
            Style::default().fg(Color::Gray),
        )]));
        frame.render_widget(help, chat_chunks[3]);

        if self.focus == Focus::Composer {
            frame.set_cursor(
                chat_chunks[2].x + self.input.cursor() as u16 + 1,
                chat_chunks[2].y + 1,
            );
        }

        let rows = view::contact_rows(state);
        if let Some(area) = contacts_area {
            self.draw_contacts(frame, &rows, area);
        } else if self.drawer_open {
            let width = CONTACTS_WIDTH.min(size.width);
            let area = Rect::new(size.x, size.y, width, size.height);
            frame.render_widget(Clear, area);
            self.draw_contacts(frame, &rows, area);
        }

        if let Some(toast) = &self.toast {
            draw_error_toast(frame, toast, size);
        }
    }

    fn draw_header(&self, frame: &mut Frame, state: &ChatState, mode: PanelMode, area: Rect) {
        let mut spans = Vec::new();
        if mode == PanelMode::Overlay {
            let menu = if state.active_conversation.is_some() { "< " } else { "= " };
            spans.push(Span::styled(menu, Style::default().fg(Color::Yellow)));
        }
        spans.push(Span::styled(
            view::header_title(state),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        if state.is_sending() {
            spans.push(Span::styled("  sending...", Style::default().fg(Color::Blue)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_contacts(&self, frame: &mut Frame, rows: &[ContactRow], area: Rect) {
        let items: Vec<ListItem> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let marker = if i == self.highlighted && self.focus == Focus::Contacts { "> " } else { "  " };
                let (dot, dot_style) = match row.status {
                    UserStatus::Online => ("● ", Style::default().fg(Color::Green)),
                    UserStatus::Offline => ("○ ", Style::default().fg(Color::DarkGray)),
                };
                let name_style = if row.selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                let mut spans = vec![
                    Span::raw(marker),
                    Span::styled(dot, dot_style),
                    Span::styled(row.name.clone(), name_style),
                ];
                if row.unread > 0 {
                    spans.push(Span::styled(
                        format!(" ({})", row.unread),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ));
                }
                spans.push(Span::styled(
                    format!(" {}", row.status.as_str()),
                    Style::default().fg(Color::Gray),
                ));
                ListItem::new(Line::from(spans))
            })
            .collect();

        let contacts_list = List::new(items).block(
            Block::default()
                .title("Contacts")
                .borders(Borders::ALL)
                .border_style(match self.focus {
                    Focus::Contacts => Style::default().fg(Color::Yellow),
                    Focus::Composer => Style::default(),
                }),
        );
        frame.render_widget(contacts_list, area);
    }

    fn composer_title(&self, state: &ChatState) -> String {
        if view::composer_enabled(state, self.input.value()) {
            "Message (Enter to send)".to_string()
        } else {
            "Message".to_string()
        }
    }

    fn draw_composer(&self, frame: &mut Frame, state: &ChatState, area: Rect) {
        // Errors double as inline feedback on the input box
        let (title, border_style) = match &state.error {
            Some(error) => (error.clone(), Style::default().fg(Color::Red)),
            None if self.focus == Focus::Composer => (self.composer_title(state), Style::default().fg(Color::Yellow)),
            None => (self.composer_title(state), Style::default()),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);

        let disabled = state.is_sending() || state.active_conversation.is_none();
        let paragraph = if self.input.value().is_empty() {
            Paragraph::new(view::composer_placeholder(state)).style(Style::default().fg(Color::DarkGray))
        } else if disabled {
            Paragraph::new(self.input.value()).style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(self.input.value())
        };
        frame.render_widget(paragraph.block(block), area);
    }
}

fn draw_messages(f: &mut Frame, messages: &[Message], area: Rect) {
    let wrap_width = area.width.saturating_sub(2).max(1) as usize; // Account for borders

    let items: Vec<ListItem> = messages
        .iter()
        .flat_map(|m| {
            let full_content = format!("[{}] {}: {}", view::format_time_of_day(&m.timestamp), m.sender, m.text);
            let wrapped_lines: Vec<String> = wrap(&full_content, wrap_width)
                .into_iter()
                .map(|l| l.into_owned())
                .collect();
            wrapped_lines.into_iter().map(|line| ListItem::new(Text::from(line)))
        })
        .collect();

    // Keep the newest message in view
    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(items.len() - 1));
    }

    let messages_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Messages"))
        .highlight_style(Style::default());
    f.render_stateful_widget(messages_list, area, &mut list_state);
}

fn draw_error_toast(f: &mut Frame, toast: &ErrorToast, area: Rect) {
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = 4.min(area.height.saturating_sub(2));
    let popup_x = area.width.saturating_sub(popup_width + 2);
    let popup_y = 1.min(area.height.saturating_sub(popup_height));
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    let body = Paragraph::new(vec![
        Line::from(Span::styled(toast.message.as_str(), Style::default().fg(Color::Red))),
        Line::from(Span::styled("Esc to dismiss", Style::default().fg(Color::Gray))),
    ])
    .block(
        Block::default()
            .title("Error")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );

    f.render_widget(Clear, popup_area);
    f.render_widget(body, popup_area);
}

pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
