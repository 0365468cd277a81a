//! Student home — own submissions, notices, and the proposal form.

use docket_core::notice::NoticeScope;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
  app::{App, ProposalForm, StudentTab},
  ui::{notice_lines, pane, status_span, submission_lines},
};

/// Render the student home into `area`.
pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(area);

  draw_tabs(f, rows[0], app);
  match app.student_tab {
    StudentTab::Submissions => draw_submissions(f, rows[1], app),
    StudentTab::Notices => draw_notices(f, rows[1], app),
    StudentTab::Compose => draw_compose(f, rows[1], app),
  }
}

fn draw_tabs<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let tab = |n: &str, label: &str, selected: bool| {
    let style = if selected {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {n} {label} "), style)
  };
  let line = Line::from(vec![
    Span::raw(" "),
    tab("1", "My submissions", app.student_tab == StudentTab::Submissions),
    Span::raw(" "),
    tab("2", "Notices", app.student_tab == StudentTab::Notices),
    Span::raw(" "),
    tab("3", "New proposal", app.student_tab == StudentTab::Compose),
  ]);
  f.render_widget(Paragraph::new(line), area);
}

fn draw_submissions<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  // Left: one line per submission.
  let items: Vec<ListItem> = app
    .submissions
    .iter()
    .map(|s| {
      ListItem::new(Line::from(vec![
        status_span(s.status),
        Span::raw("  "),
        Span::raw(s.title.clone()),
      ]))
    })
    .collect();

  let block = pane(format!(" My submissions ({}) ", app.submissions.len()));
  let inner = block.inner(cols[0]);
  f.render_widget(block, cols[0]);

  let mut state = ListState::default();
  state.select((!app.submissions.is_empty()).then_some(app.list_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );

  // Right: the cursor submission in full.
  let block = pane(" Detail ".to_string());
  let inner = block.inner(cols[1]);
  f.render_widget(block, cols[1]);
  match app.submissions.get(app.list_cursor) {
    Some(submission) => f.render_widget(
      Paragraph::new(submission_lines(submission)).wrap(Wrap { trim: false }),
      inner,
    ),
    None => f.render_widget(
      Paragraph::new("No submissions yet. Press 3 to write one.")
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    ),
  }
}

fn draw_notices<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  let items: Vec<ListItem> = app
    .notices
    .iter()
    .map(|n| {
      // Unread targeted notices get a marker; broadcasts never do.
      let marker = match n.scope {
        NoticeScope::Student(_) if !n.read => {
          Span::styled("● ", Style::default().fg(Color::Yellow))
        }
        _ => Span::raw("  "),
      };
      ListItem::new(Line::from(vec![marker, Span::raw(n.title.clone())]))
    })
    .collect();

  let block = pane(format!(" Notices ({}) ", app.notices.len()));
  let inner = block.inner(cols[0]);
  f.render_widget(block, cols[0]);

  let mut state = ListState::default();
  state.select((!app.notices.is_empty()).then_some(app.list_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );

  let block = pane(" Notice ".to_string());
  let inner = block.inner(cols[1]);
  f.render_widget(block, cols[1]);
  match app.notices.get(app.list_cursor) {
    Some(notice) => f.render_widget(
      Paragraph::new(notice_lines(notice)).wrap(Wrap { trim: false }),
      inner,
    ),
    None => f.render_widget(
      Paragraph::new("No notices.").style(Style::default().fg(Color::DarkGray)),
      inner,
    ),
  }
}

fn draw_compose<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let block = pane(" New proposal ".to_string());
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = Vec::new();
  for (index, label) in ProposalForm::LABELS.iter().enumerate() {
    let focused = index == app.proposal.focus;
    let label_style = if focused {
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::DarkGray)
    };
    let cursor = if focused { "_" } else { "" };
    lines.push(Line::from(vec![
      Span::styled(format!("{label:<34}"), label_style),
      Span::raw(format!("{}{cursor}", app.proposal.field(index))),
    ]));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "Ctrl-S submits. Title, description, and at least one team member are required.",
    Style::default().fg(Color::DarkGray),
  )));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
