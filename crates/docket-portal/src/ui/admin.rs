//! Admin home — the full submission queue and the notice board.

use docket_core::{notice::NoticeScope, submission::SubmissionStatus};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{
  app::{AdminTab, App, NoticeDraft},
  ui::{label_span, notice_lines, pane, status_span, submission_lines},
};

/// Render the admin home into `area`.
pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(0)])
    .split(area);

  draw_tabs(f, rows[0], app);
  match app.admin_tab {
    AdminTab::Submissions => draw_submissions(f, rows[1], app),
    AdminTab::Notices => draw_notices(f, rows[1], app),
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
    tab("1", "Submissions", app.admin_tab == AdminTab::Submissions),
    Span::raw(" "),
    tab("2", "Notices", app.admin_tab == AdminTab::Notices),
  ]);
  f.render_widget(Paragraph::new(line), area);
}

fn draw_submissions<S>(f: &mut Frame, area: Rect, app: &App<S>) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
    .split(area);

  let visible = app.filtered_submissions();
  let items: Vec<ListItem> = visible
    .iter()
    .map(|s| {
      ListItem::new(Line::from(vec![
        Span::styled(
          s.roll_number.to_string(),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::raw(s.title.clone()),
        Span::raw("  "),
        status_span(s.status),
      ]))
    })
    .collect();

  let scope = match app.status_filter {
    Some(status) => format!(" [{}]", status.as_str()),
    None => String::new(),
  };
  let block = pane(format!(
    " Submissions ({}/{}){scope} ",
    visible.len(),
    app.all_submissions.len()
  ));
  let inner = block.inner(cols[0]);
  f.render_widget(block, cols[0]);

  // The filter line borrows the bottom row of the list pane while a
  // search is active.
  let show_filter = app.filter_active || !app.filter.is_empty();
  let (list_area, filter_area) = if show_filter && inner.height > 1 {
    let parts = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(0), Constraint::Length(1)])
      .split(inner);
    (parts[0], Some(parts[1]))
  } else {
    (inner, None)
  };

  let mut state = ListState::default();
  state.select((!visible.is_empty()).then_some(app.list_cursor));
  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    list_area,
    &mut state,
  );

  if let Some(filter_area) = filter_area {
    let cursor = if app.filter_active { "_" } else { "" };
    f.render_widget(
      Paragraph::new(Line::from(vec![
        Span::styled(
          "/",
          Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{}{cursor}", app.filter)),
      ])),
      filter_area,
    );
  }

  let block = pane(" Detail ".to_string());
  let inner = block.inner(cols[1]);
  f.render_widget(block, cols[1]);
  match visible.get(app.list_cursor) {
    Some(submission) => {
      let mut lines = submission_lines(submission);
      if let Some(draft) = &app.review {
        lines.push(Line::from(""));
        let color = match draft.status {
          SubmissionStatus::Approved => Color::Green,
          SubmissionStatus::Rejected => Color::Red,
          SubmissionStatus::Pending => Color::Yellow,
        };
        lines.push(Line::from(Span::styled(
          format!("Mark \"{}\" as {}", draft.title, draft.status.as_str()),
          Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![
          label_span("Remarks"),
          Span::raw(format!("{}_", draft.remarks)),
        ]));
        lines.push(Line::from(Span::styled(
          "Enter saves, Esc cancels.",
          Style::default().fg(Color::DarkGray),
        )));
      }
      f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }),
        inner,
      );
    }
    None => f.render_widget(
      Paragraph::new("No submissions match.")
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
      let audience = match &n.scope {
        NoticeScope::Broadcast => "  (all)".to_string(),
        NoticeScope::Student(roll) => format!("  ({roll})"),
      };
      ListItem::new(Line::from(vec![
        Span::raw(n.title.clone()),
        Span::styled(audience, Style::default().fg(Color::DarkGray)),
      ]))
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

  if let Some(draft) = &app.notice_draft {
    draw_notice_draft(f, cols[1], draft);
    return;
  }

  let block = pane(" Notice ".to_string());
  let inner = block.inner(cols[1]);
  f.render_widget(block, cols[1]);
  match app.notices.get(app.list_cursor) {
    Some(notice) => f.render_widget(
      Paragraph::new(notice_lines(notice)).wrap(Wrap { trim: false }),
      inner,
    ),
    None => f.render_widget(
      Paragraph::new("No notices posted yet. Press n to write one.")
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    ),
  }
}

fn draw_notice_draft(f: &mut Frame, area: Rect, draft: &NoticeDraft) {
  let block = pane(" Post notice ".to_string());
  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines = Vec::new();
  for (index, label) in NoticeDraft::LABELS.iter().enumerate() {
    let focused = index == draft.focus;
    let label_style = if focused {
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::DarkGray)
    };
    let cursor = if focused { "_" } else { "" };
    lines.push(Line::from(vec![
      Span::styled(format!("{label:<34}"), label_style),
      Span::raw(format!("{}{cursor}", draft.field(index))),
    ]));
  }
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "Ctrl-S posts, Esc cancels.",
    Style::default().fg(Color::DarkGray),
  )));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
