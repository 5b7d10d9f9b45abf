//! Server-sent progress events.

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use insights::ProgressEvent;
use tokio::sync::broadcast::{error::RecvError, Receiver};

use crate::server::error::ApiError;
use crate::server::state::AppState;

struct Feed {
    pending: Option<ProgressEvent>,
    rx: Receiver<ProgressEvent>,
    file_id: String,
    finished: bool,
}

/// GET /api/v1/events/:file_id
///
/// Starts with the job's current status, then forwards its progress events.
/// The stream ends after a terminal event.
pub async fn events(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    // Subscribe before reading the status so a run finishing in between is not missed.
    let rx = state.orchestrator.subscribe();
    let current = state.orchestrator.get_status(&file_id).await?;

    let feed = Feed {
        pending: Some(ProgressEvent::status(
            &file_id,
            current.status,
            format!("Current status: {}", current.status),
        )),
        finished: current.status.is_terminal(),
        rx,
        file_id,
    };

    let stream = stream::unfold(feed, |mut feed| async move {
        if let Some(event) = feed.pending.take() {
            return Some((to_sse(&event), feed));
        }
        if feed.finished {
            return None;
        }

        loop {
            match feed.rx.recv().await {
                Ok(event) if event.file_id() == feed.file_id => {
                    feed.finished = event.is_final();
                    return Some((to_sse(&event), feed));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(file_id = %feed.file_id, skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &ProgressEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.kind()).json_data(event)
}
