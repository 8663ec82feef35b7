//! Server-Sent-Events stream of user notices.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_core::Stream;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream, WatchStream};
use tokio_stream::StreamExt;

use domain::models::Notice;

use crate::app::AppState;
use crate::extractors::UserAuth;

/// GET /api/v1/notices/stream
///
/// Every notice published after the client connects, as `notice` events.
/// The stream ends when the server starts shutting down.
pub async fn stream_notices(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!(user_id = %auth.user_id, "Notice stream opened");

    let notices = BroadcastStream::new(state.notices.subscribe())
        .filter_map(|received| match received {
            Ok(notice) => notice_event(&notice).map(|event| Some(Ok::<_, Infallible>(event))),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notice stream lagging, dropped notices");
                None
            }
        });
    let shutdown = WatchStream::new(state.shutdown.clone())
        .filter(|down| *down)
        .map(|_| None);

    let stream = notices.merge(shutdown).map_while(|item| item);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn notice_event(notice: &Notice) -> Option<Event> {
    match Event::default()
        .event("notice")
        .id(notice.id.to_string())
        .json_data(notice)
    {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode notice");
            None
        }
    }
}
