use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: view breadcrumb on the left, a transient message on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], message: Option<&str>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i + 1 == breadcrumb.len() {
      // Current view
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let style = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(Line::from(spans)).style(style), area);

  if let Some(message) = message {
    let right = Paragraph::new(Span::styled(
      format!("{} ", message),
      Style::default().fg(Color::Yellow),
    ))
    .alignment(Alignment::Right);
    frame.render_widget(right, area);
  }
}
