//! Sign-in screen — centered panel with a student and an admin mode.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::Paragraph,
};

use crate::{
  app::{App, LoginMode},
  ui::{label_span, pane},
};

/// Render the sign-in panel into `area`.
pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let panel = centered(area, 56, 11);
  let block = pane(" Sign in ".to_string());
  let inner = block.inner(panel);
  f.render_widget(block, panel);

  let mut lines = vec![
    Line::from(vec![
      mode_tab("Student", app.login.mode == LoginMode::Student),
      Span::raw("  "),
      mode_tab("Admin", app.login.mode == LoginMode::Admin),
    ]),
    Line::from(""),
  ];

  match app.login.mode {
    LoginMode::Student => {
      lines.push(field_line("Roll number", &app.login.roll, true));
      lines.push(Line::from(""));
      lines.push(hint("The letter D followed by six digits, e.g. D234105."));
      lines.push(hint("Your account stays bound to this device."));
    }
    LoginMode::Admin => {
      lines.push(field_line("Email", &app.login.email, app.login.focus == 0));
      lines.push(field_line(
        "Password",
        &"*".repeat(app.login.password.chars().count()),
        app.login.focus == 1,
      ));
    }
  }

  if app.busy {
    lines.push(Line::from(""));
    lines.push(hint("Signing in…"));
  }

  f.render_widget(Paragraph::new(lines), inner);
}

fn mode_tab(label: &str, selected: bool) -> Span<'static> {
  let style = if selected {
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  Span::styled(format!("  {label}  "), style)
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
  let cursor = if focused { "_" } else { "" };
  Line::from(vec![label_span(label), Span::raw(format!("{value}{cursor}"))])
}

fn hint(text: &str) -> Line<'static> {
  Line::from(Span::styled(
    text.to_string(),
    Style::default().fg(Color::DarkGray),
  ))
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
