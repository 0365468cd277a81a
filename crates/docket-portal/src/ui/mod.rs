//! TUI rendering — orchestrates all panes.

pub mod admin;
pub mod login;
pub mod student;

use chrono::Local;
use docket_core::{notice::{Notice, NoticeScope}, submission::{Submission, SubmissionStatus}};
use docket_session::ToastLevel;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Paragraph},
};

use crate::app::{App, Screen, StudentTab};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S>(f: &mut Frame, app: &App<S>) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Login => login::draw(f, rows[1], app),
    Screen::StudentHome => student::draw(f, rows[1], app),
    Screen::AdminHome => admin::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let date = Local::now().format("%Y-%m-%d").to_string();
  let who = app
    .identity
    .as_ref()
    .map(|id| format!("{}  ", id.label()))
    .unwrap_or_default();

  let left = Span::styled(
    " docket — project proposals",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right =
    Span::styled(format!("{who}{date} "), Style::default().fg(Color::Gray));

  // Simple left-right header: pad the middle. Char counts, not byte
  // lengths — the title contains a non-ASCII dash.
  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line =
    Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let (mode_label, hints) = match app.screen {
    Screen::Login => ("SIGN IN", "Tab student/admin  Enter submit  Esc quit"),
    Screen::StudentHome if app.student_tab == StudentTab::Compose => {
      ("COMPOSE", "Tab/Enter next field  Ctrl-S submit  Esc back")
    }
    Screen::StudentHome => (
      "STUDENT",
      "1/2/3 tabs  ↑↓/jk move  Enter mark read  Ctrl-L sign out  q quit",
    ),
    Screen::AdminHome if app.review.is_some() => {
      ("REVIEW", "Type remarks  Enter save  Esc cancel")
    }
    Screen::AdminHome if app.notice_draft.is_some() => {
      ("NOTICE", "Tab next field  Ctrl-S post  Esc cancel")
    }
    Screen::AdminHome if app.filter_active => {
      ("SEARCH", "Type to filter  Esc clear  Enter keep")
    }
    Screen::AdminHome => (
      "ADMIN",
      "1/2 tabs  ↑↓/jk move  a approve  x reject  f status  / search  Ctrl-L sign out  q quit",
    ),
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );

  let line = if let Some(toast) = &app.toast {
    let style = match toast.level {
      ToastLevel::Info => Style::default().fg(Color::Black).bg(Color::Cyan),
      ToastLevel::Warning => Style::default().fg(Color::Black).bg(Color::Yellow),
      ToastLevel::Error => Style::default().fg(Color::White).bg(Color::Red),
    };
    Line::from(vec![
      mode_span,
      Span::raw(" "),
      Span::styled(format!(" {} ", toast.message), style),
    ])
  } else {
    let status = if app.busy { "Working…" } else { hints };
    Line::from(vec![
      mode_span,
      Span::styled(format!("  {status}"), Style::default().fg(Color::DarkGray)),
    ])
  };

  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Shared detail formatting ─────────────────────────────────────────────────

pub(crate) fn label_span(label: &str) -> Span<'static> {
  Span::styled(
    format!("{label:<12}"),
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
  )
}

pub(crate) fn row(label: &str, value: &str) -> Line<'static> {
  Line::from(vec![label_span(label), Span::raw(value.to_string())])
}

pub(crate) fn status_span(status: SubmissionStatus) -> Span<'static> {
  let color = match status {
    SubmissionStatus::Pending => Color::Yellow,
    SubmissionStatus::Approved => Color::Green,
    SubmissionStatus::Rejected => Color::Red,
  };
  Span::styled(status.as_str().to_string(), Style::default().fg(color))
}

/// Detail lines for one submission, shared by the student and admin
/// panes. The description goes last so `Paragraph::wrap` can flow it.
pub(crate) fn submission_lines(s: &Submission) -> Vec<Line<'static>> {
  let mut lines = vec![
    row("Title", &s.title),
    row("By", &format!("{} ({})", s.student_name, s.roll_number)),
    Line::from(vec![label_span("Status"), status_span(s.status)]),
    row(
      "Team",
      &format!("{} ({})", s.team_members.join(", "), s.team_size),
    ),
  ];
  if !s.technologies.is_empty() {
    lines.push(row("Stack", &s.technologies.join(", ")));
  }
  if let Some(cost) = s.estimated_cost {
    lines.push(row("Cost", &format!("{cost}")));
  }
  if let Some(requirements) = &s.requirements {
    lines.push(row("Needs", requirements));
  }
  lines.push(row(
    "Submitted",
    &s.submitted_at.format("%Y-%m-%d %H:%M").to_string(),
  ));
  if let Some(remarks) = &s.remarks {
    lines.push(row("Remarks", remarks));
  }
  lines.push(Line::from(""));
  lines.push(Line::raw(s.description.clone()));
  lines
}

/// Detail lines for one notice.
pub(crate) fn notice_lines(n: &Notice) -> Vec<Line<'static>> {
  let to = match n.scope {
    NoticeScope::Broadcast => "all students".to_string(),
    NoticeScope::Student(roll) => {
      let read = if n.read { "read" } else { "unread" };
      format!("{roll} ({read})")
    }
  };
  vec![
    row("Title", &n.title),
    row("From", &n.posted_by),
    row("To", &to),
    row("Posted", &n.created_at.format("%Y-%m-%d %H:%M").to_string()),
    Line::from(""),
    Line::raw(n.message.clone()),
  ]
}

/// A bordered pane with the usual dark border.
pub(crate) fn pane(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .borders(ratatui::widgets::Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}
