//! Application state machine and event dispatcher.
//!
//! Keyboard handling is synchronous; everything that touches the data
//! service runs as a spawned task that reports back through the
//! [`AppMsg`] channel. Each task carries the generation that spawned
//! it, and a result is applied only while that generation is still
//! current — changing screens strands every continuation spawned
//! before the change instead of letting it mutate a view that no
//! longer exists.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use docket_core::{
  identity::Identity,
  notice::{NewNotice, Notice, NoticeScope},
  roll::RollNumber,
  service::DataService,
  submission::{NewSubmission, Submission, SubmissionStatus},
};
use docket_session::{Toast, auth::AuthFlow};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use tokio::sync::mpsc;
use uuid::Uuid;

// ─── Messages ─────────────────────────────────────────────────────────────────

/// Completed background work, stamped with the generation that
/// spawned it.
pub enum AppMsg {
  LoginDone {
    generation: u64,
    result:     Result<Identity, Toast>,
  },
  SubmissionsLoaded {
    generation: u64,
    result:     Result<Vec<Submission>, Toast>,
  },
  NoticesLoaded {
    generation: u64,
    result:     Result<Vec<Notice>, Toast>,
  },
  ProposalSubmitted {
    generation: u64,
    result:     Result<Submission, Toast>,
  },
  ReviewSaved {
    generation: u64,
    result:     Result<Submission, Toast>,
  },
  NoticePosted {
    generation: u64,
    result:     Result<Notice, Toast>,
  },
  NoticeRead {
    generation: u64,
    result:     Result<Notice, Toast>,
  },
  /// A committed row change arrived on the feed. Treated as a refresh
  /// hint for whichever list is visible.
  RowChanged { table: &'static str },
  /// The session store's identity changed — sign-in, sign-out, or an
  /// external edit picked up by a refresh.
  SessionChanged(Option<Identity>),
}

// ─── Screens and forms ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Login,
  StudentHome,
  AdminHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
  #[default]
  Student,
  Admin,
}

/// State of the sign-in screen.
#[derive(Default)]
pub struct LoginForm {
  pub mode:     LoginMode,
  pub roll:     String,
  pub email:    String,
  pub password: String,
  /// Admin mode: 0 = email, 1 = password.
  pub focus:    usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentTab {
  Submissions,
  Notices,
  Compose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminTab {
  Submissions,
  Notices,
}

/// The new-proposal form. All fields are edited as plain text; list
/// fields are comma-separated and parsed on submit.
#[derive(Default)]
pub struct ProposalForm {
  pub student_name:   String,
  pub title:          String,
  pub description:    String,
  pub technologies:   String,
  pub team_members:   String,
  pub estimated_cost: String,
  pub requirements:   String,
  pub focus:          usize,
}

impl ProposalForm {
  pub const FIELDS: usize = 7;
  pub const LABELS: [&'static str; Self::FIELDS] = [
    "Your name",
    "Title",
    "Description",
    "Technologies (comma-separated)",
    "Team members (comma-separated)",
    "Estimated cost",
    "Requirements",
  ];

  pub fn field(&self, index: usize) -> &str {
    match index {
      0 => &self.student_name,
      1 => &self.title,
      2 => &self.description,
      3 => &self.technologies,
      4 => &self.team_members,
      5 => &self.estimated_cost,
      _ => &self.requirements,
    }
  }

  pub fn field_mut(&mut self) -> &mut String {
    match self.focus {
      0 => &mut self.student_name,
      1 => &mut self.title,
      2 => &mut self.description,
      3 => &mut self.technologies,
      4 => &mut self.team_members,
      5 => &mut self.estimated_cost,
      _ => &mut self.requirements,
    }
  }

  fn build(&self, roll: RollNumber) -> NewSubmission {
    let name = self.student_name.trim().to_string();
    let mut team = split_list(&self.team_members);
    if team.is_empty() && !name.is_empty() {
      team = vec![name.clone()];
    }
    NewSubmission {
      roll_number:    roll,
      student_name:   name,
      title:          self.title.trim().to_string(),
      description:    self.description.trim().to_string(),
      technologies:   split_list(&self.technologies),
      team_members:   team,
      estimated_cost: self.estimated_cost.trim().parse().ok(),
      requirements:   non_empty(&self.requirements),
    }
  }
}

/// Remarks prompt opened by an approve/reject keypress.
pub struct ReviewDraft {
  pub submission_id: Uuid,
  pub title:         String,
  pub status:        SubmissionStatus,
  pub remarks:       String,
}

/// The admin notice composer. An empty roll field means a broadcast.
#[derive(Default)]
pub struct NoticeDraft {
  pub title:   String,
  pub message: String,
  pub roll:    String,
  pub focus:   usize,
}

impl NoticeDraft {
  pub const FIELDS: usize = 3;
  pub const LABELS: [&'static str; Self::FIELDS] =
    ["Title", "Message", "Roll number (empty = all students)"];

  pub fn field(&self, index: usize) -> &str {
    match index {
      0 => &self.title,
      1 => &self.message,
      _ => &self.roll,
    }
  }

  pub fn field_mut(&mut self) -> &mut String {
    match self.focus {
      0 => &mut self.title,
      1 => &mut self.message,
      _ => &mut self.roll,
    }
  }
}

fn split_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|part| !part.is_empty())
    .map(String::from)
    .collect()
}

fn non_empty(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App<S> {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Who is signed in, mirroring the session store.
  pub identity: Option<Identity>,

  pub login: LoginForm,

  // Student home.
  pub student_tab: StudentTab,
  pub submissions: Vec<Submission>,
  pub proposal:    ProposalForm,

  // Admin home.
  pub admin_tab:       AdminTab,
  pub all_submissions: Vec<Submission>,
  pub status_filter:   Option<SubmissionStatus>,
  pub filter:          String,
  pub filter_active:   bool,
  pub review:          Option<ReviewDraft>,
  pub notice_draft:    Option<NoticeDraft>,

  /// Notices for whichever home screen is active.
  pub notices: Vec<Notice>,

  /// Cursor position within the visible list.
  pub list_cursor: usize,

  /// One-line notification shown in the status bar.
  pub toast: Option<Toast>,

  /// A submit-like operation is in flight; re-triggers are ignored.
  pub busy: bool,

  generation: u64,
  service:    S,
  auth:       Arc<AuthFlow<S>>,
  tx:         mpsc::UnboundedSender<AppMsg>,
}

impl<S: DataService + Clone + 'static> App<S> {
  pub fn new(
    service: S,
    auth: Arc<AuthFlow<S>>,
    tx: mpsc::UnboundedSender<AppMsg>,
  ) -> Self {
    Self {
      screen: Screen::Login,
      identity: None,
      login: LoginForm::default(),
      student_tab: StudentTab::Submissions,
      submissions: Vec::new(),
      proposal: ProposalForm::default(),
      admin_tab: AdminTab::Submissions,
      all_submissions: Vec::new(),
      status_filter: None,
      filter: String::new(),
      filter_active: false,
      review: None,
      notice_draft: None,
      notices: Vec::new(),
      list_cursor: 0,
      toast: None,
      busy: false,
      generation: 0,
      service,
      auth,
      tx,
    }
  }

  // ── Routing ───────────────────────────────────────────────────────────────

  /// Route to the home screen for `identity` and load its data.
  pub fn enter_home(&mut self, identity: Identity) {
    self.generation += 1;
    self.busy = false;
    self.toast = None;
    self.list_cursor = 0;
    self.login = LoginForm::default();
    if identity.is_admin() {
      self.screen = Screen::AdminHome;
      self.admin_tab = AdminTab::Submissions;
      self.status_filter = None;
      self.filter.clear();
    } else {
      self.screen = Screen::StudentHome;
      self.student_tab = StudentTab::Submissions;
    }
    self.identity = Some(identity);
    self.reload_visible();
  }

  /// Route back to the sign-in screen, dropping everything loaded for
  /// the previous identity.
  pub fn enter_login(&mut self) {
    self.generation += 1;
    self.busy = false;
    self.identity = None;
    self.screen = Screen::Login;
    self.login = LoginForm::default();
    self.submissions.clear();
    self.all_submissions.clear();
    self.notices.clear();
    self.proposal = ProposalForm::default();
    self.review = None;
    self.notice_draft = None;
    self.filter.clear();
    self.filter_active = false;
    self.list_cursor = 0;
  }

  // ── Cursor ────────────────────────────────────────────────────────────────

  fn move_cursor(&mut self, delta: isize) {
    let len = self.visible_len();
    if len == 0 {
      self.list_cursor = 0;
      return;
    }
    let moved = self.list_cursor as isize + delta;
    self.list_cursor = moved.clamp(0, len as isize - 1) as usize;
  }

  fn clamp_cursor(&mut self) {
    let len = self.visible_len();
    if self.list_cursor >= len {
      self.list_cursor = len.saturating_sub(1);
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL)
      && key.code == KeyCode::Char('c')
    {
      return false;
    }

    match self.screen {
      Screen::Login => self.handle_login_key(key),
      Screen::StudentHome => self.handle_student_key(key),
      Screen::AdminHome => self.handle_admin_key(key),
    }
  }

  fn handle_login_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => return false,
      KeyCode::Tab => {
        self.login.mode = match self.login.mode {
          LoginMode::Student => LoginMode::Admin,
          LoginMode::Admin => LoginMode::Student,
        };
        self.login.focus = 0;
      }
      KeyCode::Up | KeyCode::Down if self.login.mode == LoginMode::Admin => {
        self.login.focus ^= 1;
      }
      KeyCode::Enter => match self.login.mode {
        LoginMode::Student => self.spawn_login_student(),
        // Enter on the email line moves to the password line.
        LoginMode::Admin if self.login.focus == 0 => self.login.focus = 1,
        LoginMode::Admin => self.spawn_login_admin(),
      },
      KeyCode::Backspace => {
        self.login_field_mut().pop();
      }
      KeyCode::Char(c) => self.login_field_mut().push(c),
      _ => {}
    }
    true
  }

  fn login_field_mut(&mut self) -> &mut String {
    match (self.login.mode, self.login.focus) {
      (LoginMode::Student, _) => &mut self.login.roll,
      (LoginMode::Admin, 0) => &mut self.login.email,
      (LoginMode::Admin, _) => &mut self.login.password,
    }
  }

  fn handle_student_key(&mut self, key: KeyEvent) -> bool {
    if is_sign_out(key) {
      self.sign_out();
      return true;
    }
    if self.student_tab == StudentTab::Compose {
      return self.handle_compose_key(key);
    }
    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Char('1') => self.set_student_tab(StudentTab::Submissions),
      KeyCode::Char('2') => self.set_student_tab(StudentTab::Notices),
      KeyCode::Char('3') => self.set_student_tab(StudentTab::Compose),
      KeyCode::Right => self.set_student_tab(match self.student_tab {
        StudentTab::Submissions => StudentTab::Notices,
        _ => StudentTab::Compose,
      }),
      KeyCode::Left => self.set_student_tab(match self.student_tab {
        StudentTab::Compose => StudentTab::Notices,
        _ => StudentTab::Submissions,
      }),
      KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
      KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
      KeyCode::Enter if self.student_tab == StudentTab::Notices => {
        self.mark_cursor_notice_read();
      }
      _ => {}
    }
    true
  }

  fn handle_compose_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
      && key.code == KeyCode::Char('s')
    {
      self.spawn_submit_proposal();
      return true;
    }
    match key.code {
      KeyCode::Esc => self.set_student_tab(StudentTab::Submissions),
      KeyCode::Tab | KeyCode::Down | KeyCode::Enter => {
        self.proposal.focus = (self.proposal.focus + 1) % ProposalForm::FIELDS;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.proposal.focus =
          (self.proposal.focus + ProposalForm::FIELDS - 1) % ProposalForm::FIELDS;
      }
      KeyCode::Backspace => {
        self.proposal.field_mut().pop();
      }
      KeyCode::Char(c) => self.proposal.field_mut().push(c),
      _ => {}
    }
    true
  }

  fn handle_admin_key(&mut self, key: KeyEvent) -> bool {
    if is_sign_out(key) {
      self.sign_out();
      return true;
    }
    // Text-entry modes swallow keys first.
    if self.review.is_some() {
      return self.handle_review_key(key);
    }
    if self.notice_draft.is_some() {
      return self.handle_notice_draft_key(key);
    }
    if self.filter_active {
      return self.handle_filter_key(key);
    }

    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Char('1') => self.set_admin_tab(AdminTab::Submissions),
      KeyCode::Char('2') => self.set_admin_tab(AdminTab::Notices),
      KeyCode::Left | KeyCode::Right => self.set_admin_tab(match self.admin_tab {
        AdminTab::Submissions => AdminTab::Notices,
        AdminTab::Notices => AdminTab::Submissions,
      }),
      KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
      KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
      KeyCode::Char('/') if self.admin_tab == AdminTab::Submissions => {
        self.filter_active = true;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Char('f') if self.admin_tab == AdminTab::Submissions => {
        self.cycle_status_filter();
      }
      KeyCode::Char('a') if self.admin_tab == AdminTab::Submissions => {
        self.open_review(SubmissionStatus::Approved);
      }
      KeyCode::Char('x') if self.admin_tab == AdminTab::Submissions => {
        self.open_review(SubmissionStatus::Rejected);
      }
      KeyCode::Char('n') if self.admin_tab == AdminTab::Notices => {
        self.notice_draft = Some(NoticeDraft::default());
      }
      _ => {}
    }
    true
  }

  fn handle_filter_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
        self.list_cursor = 0;
      }
      KeyCode::Enter => self.filter_active = false,
      KeyCode::Backspace => {
        self.filter.pop();
        self.list_cursor = 0;
      }
      KeyCode::Char(c) => {
        self.filter.push(c);
        self.list_cursor = 0;
      }
      _ => {}
    }
    true
  }

  fn handle_review_key(&mut self, key: KeyEvent) -> bool {
    match key.code {
      KeyCode::Esc => self.review = None,
      KeyCode::Enter => self.spawn_review(),
      KeyCode::Backspace => {
        if let Some(draft) = &mut self.review {
          draft.remarks.pop();
        }
      }
      KeyCode::Char(c) => {
        if let Some(draft) = &mut self.review {
          draft.remarks.push(c);
        }
      }
      _ => {}
    }
    true
  }

  fn handle_notice_draft_key(&mut self, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
      && key.code == KeyCode::Char('s')
    {
      self.spawn_post_notice();
      return true;
    }
    if key.code == KeyCode::Esc {
      self.notice_draft = None;
      return true;
    }
    let Some(draft) = &mut self.notice_draft else { return true };
    match key.code {
      KeyCode::Tab | KeyCode::Down | KeyCode::Enter => {
        draft.focus = (draft.focus + 1) % NoticeDraft::FIELDS;
      }
      KeyCode::BackTab | KeyCode::Up => {
        draft.focus =
          (draft.focus + NoticeDraft::FIELDS - 1) % NoticeDraft::FIELDS;
      }
      KeyCode::Backspace => {
        draft.field_mut().pop();
      }
      KeyCode::Char(c) => draft.field_mut().push(c),
      _ => {}
    }
    true
  }

  fn set_student_tab(&mut self, tab: StudentTab) {
    if self.student_tab != tab {
      self.student_tab = tab;
      self.list_cursor = 0;
      self.reload_visible();
    }
  }

  fn set_admin_tab(&mut self, tab: AdminTab) {
    if self.admin_tab != tab {
      self.admin_tab = tab;
      self.list_cursor = 0;
      self.reload_visible();
    }
  }

  fn cycle_status_filter(&mut self) {
    self.status_filter = match self.status_filter {
      None => Some(SubmissionStatus::Pending),
      Some(SubmissionStatus::Pending) => Some(SubmissionStatus::Approved),
      Some(SubmissionStatus::Approved) => Some(SubmissionStatus::Rejected),
      Some(SubmissionStatus::Rejected) => None,
    };
    self.list_cursor = 0;
    self.spawn_load_submissions();
  }

  fn open_review(&mut self, status: SubmissionStatus) {
    let Some((submission_id, title)) = self
      .filtered_submissions()
      .get(self.list_cursor)
      .map(|s| (s.submission_id, s.title.clone()))
    else {
      return;
    };
    self.review =
      Some(ReviewDraft { submission_id, title, status, remarks: String::new() });
  }

  fn sign_out(&mut self) {
    self.auth.logout();
    self.enter_login();
  }

  // ── Background operations ─────────────────────────────────────────────────

  fn spawn_login_student(&mut self) {
    if self.busy {
      return;
    }
    self.busy = true;
    let generation = self.generation;
    let auth = self.auth.clone();
    let raw = self.login.roll.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = auth.login_student(&raw).await.map_err(|e| e.toast());
      let _ = tx.send(AppMsg::LoginDone { generation, result });
    });
  }

  fn spawn_login_admin(&mut self) {
    if self.busy {
      return;
    }
    self.busy = true;
    let generation = self.generation;
    let auth = self.auth.clone();
    let email = self.login.email.clone();
    let password = self.login.password.clone();
    let tx = self.tx.clone();
    // Argon2 verification is CPU-bound; keep it off the runtime threads.
    tokio::task::spawn_blocking(move || {
      let result = auth.login_admin(&email, &password).map_err(|e| e.toast());
      let _ = tx.send(AppMsg::LoginDone { generation, result });
    });
  }

  /// Re-fetch whatever list the current screen shows.
  pub fn reload_visible(&mut self) {
    match self.screen {
      Screen::Login => {}
      Screen::StudentHome => match self.student_tab {
        StudentTab::Submissions => self.spawn_load_submissions(),
        StudentTab::Notices => self.spawn_load_notices(),
        StudentTab::Compose => {}
      },
      Screen::AdminHome => match self.admin_tab {
        AdminTab::Submissions => self.spawn_load_submissions(),
        AdminTab::Notices => self.spawn_load_notices(),
      },
    }
  }

  fn spawn_load_submissions(&mut self) {
    let generation = self.generation;
    let service = self.service.clone();
    let roll = self.identity.as_ref().and_then(Identity::roll);
    let status = self.status_filter;
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = match roll {
        Some(roll) => service.submissions_for(roll).await,
        None => service.list_submissions(status).await,
      }
      .map_err(|e| Toast::error(e.to_string()));
      let _ = tx.send(AppMsg::SubmissionsLoaded { generation, result });
    });
  }

  fn spawn_load_notices(&mut self) {
    let generation = self.generation;
    let service = self.service.clone();
    let roll = self.identity.as_ref().and_then(Identity::roll);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = match roll {
        Some(roll) => service.notices_for(roll).await,
        None => service.list_notices().await,
      }
      .map_err(|e| Toast::error(e.to_string()));
      let _ = tx.send(AppMsg::NoticesLoaded { generation, result });
    });
  }

  fn spawn_submit_proposal(&mut self) {
    if self.busy {
      return;
    }
    let Some(roll) = self.identity.as_ref().and_then(Identity::roll) else {
      return;
    };
    let input = self.proposal.build(roll);
    // Validation feedback without a round trip.
    if let Err(err) = input.validate() {
      self.toast = Some(Toast::warning(err.to_string()));
      return;
    }
    self.busy = true;
    let generation = self.generation;
    let service = self.service.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result =
        service.submit(input).await.map_err(|e| Toast::error(e.to_string()));
      let _ = tx.send(AppMsg::ProposalSubmitted { generation, result });
    });
  }

  fn spawn_review(&mut self) {
    let Some(draft) = self.review.take() else { return };
    let generation = self.generation;
    let service = self.service.clone();
    let remarks = non_empty(&draft.remarks);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = service
        .review_submission(draft.submission_id, draft.status, remarks)
        .await
        .map_err(|e| Toast::error(e.to_string()));
      let _ = tx.send(AppMsg::ReviewSaved { generation, result });
    });
  }

  fn spawn_post_notice(&mut self) {
    let Some(Identity::Admin { email, .. }) = self.identity.clone() else {
      return;
    };
    let Some(draft) = self.notice_draft.take() else { return };

    let scope = if draft.roll.trim().is_empty() {
      NoticeScope::Broadcast
    } else {
      match RollNumber::parse(&draft.roll) {
        Ok(roll) => NoticeScope::Student(roll),
        Err(err) => {
          self.toast = Some(Toast::warning(err.to_string()));
          self.notice_draft = Some(draft);
          return;
        }
      }
    };

    let input = NewNotice {
      title: draft.title.trim().to_string(),
      message: draft.message.trim().to_string(),
      scope,
      posted_by: email,
    };
    if let Err(err) = input.validate() {
      self.toast = Some(Toast::warning(err.to_string()));
      self.notice_draft = Some(draft);
      return;
    }

    let generation = self.generation;
    let service = self.service.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = service
        .post_notice(input)
        .await
        .map_err(|e| Toast::error(e.to_string()));
      let _ = tx.send(AppMsg::NoticePosted { generation, result });
    });
  }

  fn mark_cursor_notice_read(&mut self) {
    let Some(notice) = self.notices.get(self.list_cursor) else { return };
    // Broadcasts have no per-student read state.
    if notice.read || !matches!(notice.scope, NoticeScope::Student(_)) {
      return;
    }
    let id = notice.notice_id;
    let generation = self.generation;
    let service = self.service.clone();
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = service
        .mark_notice_read(id)
        .await
        .map_err(|e| Toast::error(e.to_string()));
      let _ = tx.send(AppMsg::NoticeRead { generation, result });
    });
  }

  // ── Message handling ──────────────────────────────────────────────────────

  /// Apply a completed piece of background work. Results stamped with
  /// a stale generation belong to a screen that is gone and are
  /// dropped unapplied.
  pub fn handle_msg(&mut self, msg: AppMsg) {
    match msg {
      AppMsg::LoginDone { generation, result } => {
        if generation != self.generation {
          return;
        }
        self.busy = false;
        match result {
          Ok(identity) => self.enter_home(identity),
          Err(toast) => self.toast = Some(toast),
        }
      }

      AppMsg::SubmissionsLoaded { generation, result } => {
        if generation != self.generation {
          return;
        }
        match result {
          Ok(rows) => {
            match self.screen {
              Screen::AdminHome => self.all_submissions = rows,
              _ => self.submissions = rows,
            }
            self.clamp_cursor();
          }
          Err(toast) => self.toast = Some(toast),
        }
      }

      AppMsg::NoticesLoaded { generation, result } => {
        if generation != self.generation {
          return;
        }
        match result {
          Ok(rows) => {
            self.notices = rows;
            self.clamp_cursor();
          }
          Err(toast) => self.toast = Some(toast),
        }
      }

      AppMsg::ProposalSubmitted { generation, result } => {
        if generation != self.generation {
          return;
        }
        self.busy = false;
        match result {
          Ok(_) => {
            self.proposal = ProposalForm::default();
            self.toast = Some(Toast::info("Proposal submitted"));
            self.set_student_tab(StudentTab::Submissions);
          }
          Err(toast) => self.toast = Some(toast),
        }
      }

      AppMsg::ReviewSaved { generation, result } => {
        if generation != self.generation {
          return;
        }
        match result {
          Ok(updated) => {
            self.toast = Some(Toast::info(format!(
              "{}: {}",
              updated.status.as_str(),
              updated.title
            )));
            self.spawn_load_submissions();
          }
          Err(toast) => self.toast = Some(toast),
        }
      }

      AppMsg::NoticePosted { generation, result } => {
        if generation != self.generation {
          return;
        }
        match result {
          Ok(_) => {
            self.toast = Some(Toast::info("Notice posted"));
            self.spawn_load_notices();
          }
          Err(toast) => self.toast = Some(toast),
        }
      }

      AppMsg::NoticeRead { generation, result } => {
        if generation != self.generation {
          return;
        }
        match result {
          Ok(updated) => {
            if let Some(slot) = self
              .notices
              .iter_mut()
              .find(|n| n.notice_id == updated.notice_id)
            {
              *slot = updated;
            }
          }
          Err(toast) => self.toast = Some(toast),
        }
      }

      AppMsg::RowChanged { table } => match (self.screen, table) {
        (Screen::StudentHome, "submission")
          if self.student_tab == StudentTab::Submissions =>
        {
          self.spawn_load_submissions()
        }
        (Screen::StudentHome, "notice")
          if self.student_tab == StudentTab::Notices =>
        {
          self.spawn_load_notices()
        }
        (Screen::AdminHome, "submission")
          if self.admin_tab == AdminTab::Submissions =>
        {
          self.spawn_load_submissions()
        }
        (Screen::AdminHome, "notice") if self.admin_tab == AdminTab::Notices => {
          self.spawn_load_notices()
        }
        _ => {}
      },

      AppMsg::SessionChanged(identity) => match identity {
        None if self.screen != Screen::Login => self.enter_login(),
        Some(identity) if self.screen == Screen::Login => {
          self.enter_home(identity)
        }
        _ => {}
      },
    }
  }
}

// Accessors that do not need the service bound; the ui modules only
// see these.
impl<S> App<S> {
  /// Admin submissions after the fuzzy filter. The status filter is
  /// applied server-side at load time.
  pub fn filtered_submissions(&self) -> Vec<&Submission> {
    if self.filter.is_empty() {
      return self.all_submissions.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    self
      .all_submissions
      .iter()
      .filter(|s| {
        matcher.fuzzy_match(&s.title, &self.filter).is_some()
          || matcher.fuzzy_match(&s.student_name, &self.filter).is_some()
          || matcher
            .fuzzy_match(&s.roll_number.to_string(), &self.filter)
            .is_some()
      })
      .collect()
  }

  fn visible_len(&self) -> usize {
    match self.screen {
      Screen::Login => 0,
      Screen::StudentHome => match self.student_tab {
        StudentTab::Submissions => self.submissions.len(),
        StudentTab::Notices => self.notices.len(),
        StudentTab::Compose => 0,
      },
      Screen::AdminHome => match self.admin_tab {
        AdminTab::Submissions => self.filtered_submissions().len(),
        AdminTab::Notices => self.notices.len(),
      },
    }
  }
}

fn is_sign_out(key: KeyEvent) -> bool {
  key.modifiers.contains(KeyModifiers::CONTROL)
    && key.code == KeyCode::Char('l')
}
