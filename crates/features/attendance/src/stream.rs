use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use futures_util::stream;
use rollcall_derive::api_handler;
use rollcall_domain::constants::ATTENDANCE_TAG;
use rollcall_domain::events::LiveEvent;
use rollcall_kernel::events::EventHub;
use tracing::debug;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Live change notifications as Server-Sent Events.
///
/// Each event is named after its kind (`class_created`, `class_member_added`,
/// `attendance_marked`) and carries the full `{event, data}` envelope.
#[api_handler(
    get,
    path = "/attendance/stream",
    responses((
        status = OK,
        description = "Event stream",
        content_type = "text/event-stream",
        body = String,
    )),
    tag = ATTENDANCE_TAG,
)]
pub(crate) async fn live(
    State(events): State<EventHub<LiveEvent>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = events.subscribe();
    debug!(subscribers = events.subscriber_count(), "Live stream opened");

    let events = stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.next().await?;
        let frame = Event::default().event(event.name()).json_data(&*event);
        Some((frame, subscription))
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}
