//! `GET /changes` — the row change feed as server-sent events.

use std::convert::Infallible;

use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use docket_core::service::DataService;
use futures_util::{Stream, stream};

use crate::{AppState, auth::Authenticated};

/// Stream committed row changes to the caller.
///
/// Each SSE frame carries the event name of the mutated table (`profile`,
/// `submission`, `notice`, `managed_student`) and the JSON
/// [`ChangeEvent`](docket_core::service::ChangeEvent) as data. Events
/// published before the request arrived are not replayed, and a subscriber
/// that falls behind misses events rather than erroring — the same
/// contract as a local feed subscription.
pub async fn feed<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
  S: DataService + Clone + 'static,
{
  let changes = state.store.subscribe();
  let frames = stream::unfold(changes, |mut changes| async move {
    loop {
      let change = changes.next().await?;
      match Event::default().event(change.table()).json_data(&change) {
        Ok(frame) => return Some((Ok(frame), changes)),
        Err(error) => {
          tracing::warn!(%error, "dropping unserialisable change event");
        }
      }
    }
  });
  Sse::new(frames).keep_alive(KeepAlive::default())
}
