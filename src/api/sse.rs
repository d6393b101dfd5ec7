//! Server-Sent Events framing for edit progress
//!
//! Every event goes out as `data: <json>\n\n`. Once the orchestrator drops
//! its sender the stream appends `data: [DONE]\n\n` and ends, whatever the
//! outcome of the run.

use crate::orchestrator::StreamEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::DropGuard;

/// Convert the orchestrator's event channel into an SSE response
///
/// `guard` lives as long as the response body, so a client disconnect
/// cancels the run.
pub fn event_stream(
    events: mpsc::Receiver<StreamEvent>,
    guard: DropGuard,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let done = futures::stream::once(async move {
        drop(guard);
        StreamEvent::Done
    });

    let stream = ReceiverStream::new(events)
        .chain(done)
        .map(|event| Ok(Event::default().data(event.to_data())));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
