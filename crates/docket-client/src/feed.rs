//! Background consumer for the remote change feed.

use std::time::Duration;

use docket_core::service::ChangeEvent;
use futures_util::StreamExt as _;
use reqwest::Client;
use tokio::sync::broadcast;

use crate::{ClientConfig, Result, sse::FrameParser};

/// Pause between reconnect attempts after the stream drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Consume `GET /changes` forever, republishing decoded events locally.
///
/// Runs until aborted (when the owning client is dropped). Connection loss
/// and undecodable frames are logged and survived; local subscribers just
/// see a gap, which the feed contract already allows.
pub(crate) async fn run(
  config: ClientConfig,
  changes: broadcast::Sender<ChangeEvent>,
) {
  // The stream stays open indefinitely, so this client gets a connect
  // timeout but no overall request timeout.
  let client = match Client::builder()
    .connect_timeout(Duration::from_secs(10))
    .build()
  {
    Ok(client) => client,
    Err(error) => {
      tracing::warn!(%error, "change feed disabled: cannot build client");
      return;
    }
  };

  loop {
    match consume(&client, &config, &changes).await {
      Ok(()) => tracing::info!("change feed closed; reconnecting"),
      Err(error) => tracing::warn!(%error, "change feed lost; reconnecting"),
    }
    tokio::time::sleep(RECONNECT_DELAY).await;
  }
}

/// One connection's worth of the feed: connect, then decode frames until
/// the stream ends.
async fn consume(
  client: &Client,
  config: &ClientConfig,
  changes: &broadcast::Sender<ChangeEvent>,
) -> Result<()> {
  let url = format!("{}/changes", config.base_url.trim_end_matches('/'));
  let resp = client
    .get(&url)
    .bearer_auth(&config.service_key)
    .send()
    .await?
    .error_for_status()?;

  tracing::info!("change feed connected");

  let mut parser = FrameParser::default();
  let mut chunks = resp.bytes_stream();
  while let Some(chunk) = chunks.next().await {
    for frame in parser.push(&chunk?) {
      match serde_json::from_str::<ChangeEvent>(&frame.data) {
        // `send` errs only when nobody is subscribed locally, in which
        // case there is nothing to deliver.
        Ok(event) => {
          let _ = changes.send(event);
        }
        Err(error) => {
          tracing::warn!(%error, "skipping undecodable change event");
        }
      }
    }
  }
  Ok(())
}
