use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
  Confirmed,
  Cancelled,
}

/// Yes/no prompt shown over the view, used before deletes
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  active: bool,
  message: String,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn show(&mut self, message: impl Into<String>) {
    self.active = true;
    self.message = message.into();
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
        self.active = false;
        KeyResult::Event(ConfirmEvent::Confirmed)
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
        self.active = false;
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (self.message.chars().count() as u16 + 4).clamp(30, 60).min(area.width);
    let height = 5.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirm ");

    let text = vec![
      Line::from(self.message.as_str()),
      Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" yes   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" no", Style::default().fg(Color::DarkGray)),
      ]),
    ];

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, overlay_area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_confirm_and_cancel() {
    let mut dialog = ConfirmDialog::new();
    assert_eq!(dialog.handle_key(key(KeyCode::Char('y'))), KeyResult::NotHandled);

    dialog.show("Delete task?");
    assert_eq!(dialog.handle_key(key(KeyCode::Char('x'))), KeyResult::Handled);
    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(ConfirmEvent::Confirmed)
    );
    assert!(!dialog.is_active());

    dialog.show("Delete task?");
    assert_eq!(
      dialog.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(ConfirmEvent::Cancelled)
    );
  }
}
