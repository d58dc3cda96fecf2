use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by the picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
  /// Option chosen (returns its id)
  Selected(i64),
  /// Picker cancelled
  Cancelled,
}

/// Overlay list for choosing one of a set of records, e.g. a task owner
#[derive(Debug, Clone, Default)]
pub struct Picker {
  active: bool,
  options: Vec<(i64, String)>,
  selected: usize,
  title: String,
}

impl Picker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if picker is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker with `(id, label)` options, preselecting `current` if present
  pub fn show(&mut self, title: &str, options: Vec<(i64, String)>, current: Option<i64>) {
    self.selected = current
      .and_then(|id| options.iter().position(|(o, _)| *o == id))
      .unwrap_or(0);
    self.active = true;
    self.options = options;
    self.title = title.to_string();
  }

  /// Hide the picker
  pub fn hide(&mut self) {
    self.active = false;
    self.options.clear();
    self.selected = 0;
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(PickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let event = match self.options.get(self.selected) {
          Some((id, _)) => PickerEvent::Selected(*id),
          None => PickerEvent::Cancelled,
        };
        self.hide();
        KeyResult::Event(event)
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.options.is_empty() {
          self.selected = (self.selected + 1) % self.options.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.options.is_empty() {
          self.selected = if self.selected == 0 {
            self.options.len() - 1
          } else {
            self.selected - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let max_label_len = self
      .options
      .iter()
      .map(|(_, label)| label.chars().count())
      .max()
      .unwrap_or(10)
      .max(self.title.chars().count() + 2);
    let width = (max_label_len as u16 + 6).clamp(20, area.width.saturating_sub(4).max(20));
    let rows = self.options.len().max(1) as u16;
    let height = (rows + 2).min(area.height.saturating_sub(4)).max(3);

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width.min(area.width), height.min(area.height));

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = if self.options.is_empty() {
      vec![ListItem::new(Span::styled(
        "Nothing to choose from",
        Style::default().fg(Color::DarkGray),
      ))]
    } else {
      self
        .options
        .iter()
        .map(|(_, label)| ListItem::new(Span::styled(label.as_str(), Style::default().fg(Color::Cyan))))
        .collect()
    };

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    if !self.options.is_empty() {
      state.select(Some(self.selected));
    }

    frame.render_stateful_widget(list, inner, &mut state);
  }
}
