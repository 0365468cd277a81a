//! `docket` — terminal portal for the project proposal service.
//!
//! # Usage
//!
//! ```
//! docket --url http://localhost:8642 --service-key secret
//! docket --store ~/.local/share/docket/docket.db
//! docket --config ~/.config/docket/config.toml
//! ```
//!
//! Students sign in with their roll number; the account is bound to the
//! first device it signs in from. Admins sign in with the configured
//! email and password.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```
//! docket --hash-password
//! ```

mod app;
mod ui;

use std::{
  io,
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::{Context, Result};
use app::{App, AppMsg};
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use crossterm::{
  event::{self, DisableFocusChange, EnableFocusChange, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use docket_client::{ClientConfig, ServiceClient};
use docket_core::service::DataService;
use docket_session::{
  auth::{AdminConfig, AuthFlow},
  device::DeviceGlimpse,
  store::SessionStore,
};
use docket_store_sqlite::SqliteStore;
use rand_core::OsRng;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tokio::sync::mpsc;

/// Admin pair used when no hash is configured anywhere.
const DEFAULT_ADMIN_EMAIL: &str = "husna.kazi@theemcoe.org";
const DEFAULT_ADMIN_PASSWORD: &str = "Husna@123";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "docket", about = "Terminal portal for student project proposals")]
struct Args {
  /// Path to a TOML config file (url, service_key, store, state_dir, admin_*).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the docket server (default: http://localhost:8642).
  #[arg(long, env = "DOCKET_URL")]
  url: Option<String>,

  /// Service key sent with every request to the server.
  #[arg(long, env = "DOCKET_SERVICE_KEY")]
  service_key: Option<String>,

  /// Open a local SQLite store at this path instead of talking to a server.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  /// Directory for the durable session slot (default: ~/.local/state/docket).
  #[arg(long, value_name = "DIR")]
  state_dir: Option<PathBuf>,

  /// Admin sign-in email.
  #[arg(long)]
  admin_email: Option<String>,

  /// Argon2 PHC hash the admin password must verify against.
  #[arg(long)]
  admin_password_hash: Option<String>,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:                 String,
  #[serde(default)]
  service_key:         String,
  #[serde(default)]
  store:               String,
  #[serde(default)]
  state_dir:           String,
  #[serde(default)]
  admin_email:         String,
  #[serde(default)]
  admin_password_hash: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Helper mode: hash a password and exit.
  if args.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let store_path = args
    .store
    .clone()
    .or_else(|| (!file_cfg.store.is_empty()).then(|| PathBuf::from(&file_cfg.store)));
  let state_dir = args
    .state_dir
    .clone()
    .or_else(|| (!file_cfg.state_dir.is_empty()).then(|| PathBuf::from(&file_cfg.state_dir)))
    .unwrap_or_else(|| PathBuf::from("~/.local/state/docket"));

  let admin = admin_config(&args, &file_cfg)?;
  let session = Arc::new(SessionStore::open(expand_tilde(&state_dir)));

  if let Some(path) = store_path {
    let path = expand_tilde(&path);
    let store = SqliteStore::open(&path)
      .await
      .with_context(|| format!("opening store at {path:?}"))?;
    run_portal(store, session, admin).await
  } else {
    let client_config = ClientConfig {
      base_url:    args
        .url
        .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
        .unwrap_or_else(|| "http://localhost:8642".to_string()),
      service_key: args
        .service_key
        .or_else(|| (!file_cfg.service_key.is_empty()).then(|| file_cfg.service_key.clone()))
        .unwrap_or_default(),
    };
    let client =
      ServiceClient::connect(client_config).context("connecting to server")?;
    run_portal(client, session, admin).await
  }
}

/// Resolve the admin pair: flags, then config file, then the built-in
/// default hashed at startup so verification still goes through argon2.
fn admin_config(args: &Args, file_cfg: &ConfigFile) -> Result<AdminConfig> {
  let email = args
    .admin_email
    .clone()
    .or_else(|| (!file_cfg.admin_email.is_empty()).then(|| file_cfg.admin_email.clone()))
    .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string());

  let configured = args.admin_password_hash.clone().or_else(|| {
    (!file_cfg.admin_password_hash.is_empty())
      .then(|| file_cfg.admin_password_hash.clone())
  });
  let password_hash = match configured {
    Some(hash) => hash,
    None => {
      let salt = SaltString::generate(&mut OsRng);
      Argon2::default()
        .hash_password(DEFAULT_ADMIN_PASSWORD.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
        .to_string()
    }
  };

  Ok(AdminConfig { email, password_hash })
}

// ─── Portal ───────────────────────────────────────────────────────────────────

/// Wire the portal to a data service and run it until the user quits.
///
/// Works identically over a local [`SqliteStore`] and a remote
/// [`ServiceClient`]; everything past this point only sees [`DataService`].
async fn run_portal<S>(
  service: S,
  session: Arc<SessionStore>,
  admin: AdminConfig,
) -> Result<()>
where
  S: DataService + Clone + 'static,
{
  let (tx, mut rx) = mpsc::unbounded_channel();

  let device = DeviceGlimpse::capture().token();
  let auth =
    Arc::new(AuthFlow::new(service.clone(), session.clone(), device, admin));

  // Change feed → refresh hints for whichever list is on screen.
  {
    let mut stream = service.subscribe();
    let tx = tx.clone();
    tokio::spawn(async move {
      while let Some(event) = stream.next().await {
        if tx.send(AppMsg::RowChanged { table: event.table() }).is_err() {
          break;
        }
      }
    });
  }

  // Session watch → screen routing on sign-in and sign-out.
  {
    let mut watch = session.watch();
    let tx = tx.clone();
    tokio::spawn(async move {
      while watch.changed().await.is_ok() {
        let identity = watch.borrow_and_update().clone();
        if tx.send(AppMsg::SessionChanged(identity)).is_err() {
          break;
        }
      }
    });
  }

  // Pick up sign-ins and sign-outs made by other processes on this machine.
  session.spawn_refresh_task(Duration::from_secs(30));

  let mut app = App::new(service, auth, tx);
  if let Some(identity) = session.current_identity() {
    app.enter_home(identity);
  }

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen, EnableFocusChange)
    .context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app, &mut rx, &session).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<S>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<S>,
  rx: &mut mpsc::UnboundedReceiver<AppMsg>,
  session: &SessionStore,
) -> Result<()>
where
  S: DataService + Clone + 'static,
{
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Apply everything the background tasks finished since the last frame.
    while let Ok(msg) = rx.try_recv() {
      app.handle_msg(msg);
    }

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(evt) = maybe_event {
      match evt {
        Event::Key(key) => {
          if !app.handle_key(key) {
            break;
          }
        }
        // Another terminal may have signed in or out while this one was
        // idle; re-read the session when focus returns.
        Event::FocusGained => session.refresh(),
        Event::Resize(_, _) => {
          // Terminal will redraw on next iteration.
        }
        _ => {}
      }
    }
  }

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> Result<String> {
  use std::io::{BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(line.trim_end_matches('\n').trim_end_matches('\r').to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
