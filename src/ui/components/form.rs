use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Events emitted by a form that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Ctrl-S, or Enter on the last text field
  Submitted,
  /// Esc
  Cancelled,
  /// Enter on a choice field; the parent opens its picker for this field index
  Choose(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
  Text,
  Secret,
  Choice,
}

#[derive(Debug, Clone)]
struct Field {
  label: &'static str,
  kind: FieldKind,
  input: TextInput,
  error: Option<String>,
}

/// Vertical stack of labelled inputs with per-field errors and a general error line
#[derive(Debug, Clone, Default)]
pub struct Form {
  fields: Vec<Field>,
  focus: usize,
  error: Option<String>,
}

impl Form {
  pub fn new() -> Self {
    Self::default()
  }

  fn push(mut self, label: &'static str, kind: FieldKind, value: &str) -> Self {
    self.fields.push(Field {
      label,
      kind,
      input: TextInput::with_value(value),
      error: None,
    });
    self
  }

  pub fn text(self, label: &'static str, value: &str) -> Self {
    self.push(label, FieldKind::Text, value)
  }

  /// A text field rendered masked
  pub fn secret(self, label: &'static str) -> Self {
    self.push(label, FieldKind::Secret, "")
  }

  /// A field whose value is set by the parent through `set_value`
  pub fn choice(self, label: &'static str, value: &str) -> Self {
    self.push(label, FieldKind::Choice, value)
  }

  pub fn value(&self, index: usize) -> &str {
    self.fields.get(index).map(|f| f.input.value()).unwrap_or("")
  }

  pub fn set_value(&mut self, index: usize, value: &str) {
    if let Some(field) = self.fields.get_mut(index) {
      field.input.set_value(value);
      field.error = None;
    }
  }

  pub fn focus(&self) -> usize {
    self.focus
  }

  pub fn field_error(&self, index: usize) -> Option<&str> {
    self.fields.get(index).and_then(|f| f.error.as_deref())
  }

  pub fn set_field_error(&mut self, index: usize, error: impl Into<String>) {
    if let Some(field) = self.fields.get_mut(index) {
      field.error = Some(error.into());
    }
  }

  /// General error, not tied to a field (e.g. the backend's message)
  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  pub fn clear_errors(&mut self) {
    self.error = None;
    for field in &mut self.fields {
      field.error = None;
    }
  }

  pub fn has_errors(&self) -> bool {
    self.error.is_some() || self.fields.iter().any(|f| f.error.is_some())
  }

  fn next(&mut self) {
    if !self.fields.is_empty() {
      self.focus = (self.focus + 1) % self.fields.len();
    }
  }

  fn previous(&mut self) {
    if !self.fields.is_empty() {
      self.focus = self.focus.checked_sub(1).unwrap_or(self.fields.len() - 1);
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
      return KeyResult::Event(FormEvent::Submitted);
    }

    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancelled),
      KeyCode::Tab | KeyCode::Down => {
        self.next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.previous();
        return KeyResult::Handled;
      }
      _ => {}
    }

    let focus = self.focus;
    let is_last = focus + 1 == self.fields.len();
    let Some(field) = self.fields.get_mut(focus) else {
      return KeyResult::NotHandled;
    };

    if field.kind == FieldKind::Choice {
      return match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => KeyResult::Event(FormEvent::Choose(focus)),
        _ => KeyResult::Handled,
      };
    }

    match field.input.handle_key(key) {
      InputResult::Consumed => {
        field.error = None;
        KeyResult::Handled
      }
      InputResult::Submitted(_) if is_last => KeyResult::Event(FormEvent::Submitted),
      InputResult::Submitted(_) => {
        self.next();
        KeyResult::Handled
      }
      InputResult::Cancelled => KeyResult::Event(FormEvent::Cancelled),
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let mut constraints: Vec<Constraint> = self
      .fields
      .iter()
      .map(|f| Constraint::Length(if f.error.is_some() { 4 } else { 3 }))
      .collect();
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints(constraints)
      .split(area);

    for (i, field) in self.fields.iter().enumerate() {
      let focused = i == self.focus;
      let border = if field.error.is_some() {
        Color::Red
      } else if focused {
        Color::Yellow
      } else {
        Color::DarkGray
      };

      let value = match field.kind {
        FieldKind::Secret => "*".repeat(field.input.value().chars().count()),
        FieldKind::Choice if field.input.is_empty() => "(press Enter to choose)".to_string(),
        _ => field.input.value().to_string(),
      };
      let mut spans = vec![Span::raw(value)];
      if focused && field.kind != FieldKind::Choice {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }

      let mut lines = vec![Line::from(spans)];
      if let Some(error) = &field.error {
        lines.push(Line::from(Span::styled(
          error.as_str(),
          Style::default().fg(Color::Red),
        )));
      }

      let block = Block::default()
        .title(format!(" {} ", field.label))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

      frame.render_widget(Paragraph::new(lines).block(block), chunks[i]);
    }

    let rest = chunks[self.fields.len()];
    let mut footer = Vec::new();
    if let Some(error) = &self.error {
      footer.push(Line::from(Span::styled(
        error.as_str(),
        Style::default().fg(Color::Red).bold(),
      )));
    }
    footer.push(Line::from(vec![
      Span::styled("<ctrl-s>", Style::default().fg(Color::Cyan)),
      Span::styled(" save   ", Style::default().fg(Color::DarkGray)),
      Span::styled("<tab>", Style::default().fg(Color::Cyan)),
      Span::styled(" next field   ", Style::default().fg(Color::DarkGray)),
      Span::styled("<esc>", Style::default().fg(Color::Cyan)),
      Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
    ]));
    frame.render_widget(Paragraph::new(footer).wrap(Wrap { trim: true }), rest);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(form: &mut Form, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_enter_advances_then_submits() {
    let mut form = Form::new().text("Username", "").secret("Password");
    type_str(&mut form, "alice");
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert_eq!(form.focus(), 1);

    type_str(&mut form, "secret");
    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submitted)
    );
    assert_eq!(form.value(0), "alice");
    assert_eq!(form.value(1), "secret");
  }

  #[test]
  fn test_ctrl_s_submits_from_any_field() {
    let mut form = Form::new().text("Title", "Old").text("Description", "");
    assert_eq!(
      form.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)),
      KeyResult::Event(FormEvent::Submitted)
    );
    assert_eq!(form.value(0), "Old");
  }

  #[test]
  fn test_typing_clears_field_error() {
    let mut form = Form::new().text("Email", "");
    form.set_field_error(0, "Email is required");
    assert!(form.has_errors());

    type_str(&mut form, "a");
    assert_eq!(form.field_error(0), None);
    assert!(!form.has_errors());
  }

  #[test]
  fn test_choice_field_asks_parent() {
    let mut form = Form::new().text("Title", "").choice("Owner", "");
    form.handle_key(key(KeyCode::Tab));
    assert_eq!(form.handle_key(key(KeyCode::Char('x'))), KeyResult::Handled);
    assert_eq!(form.value(1), "");
    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Choose(1))
    );
  }
}
