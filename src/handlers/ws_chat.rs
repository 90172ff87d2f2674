// GET /ws/chat handler (WebSocket upgrade)

use crate::frames::{create_chunk_frame, create_done_frame, create_error_frame};
use crate::models::SocketRequest;
use crate::registry::{RegistryError, SessionId};
use crate::relay::{build_transcript, RelayFragment, SOCKET_SYSTEM_PROMPT};
use crate::state::AppState;
use futures_util::{SinkExt, Stream, StreamExt};
use pin_utils::pin_mut;
use std::convert::Infallible;
use std::fmt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use warp::ws::{Message, WebSocket, Ws};

/// Frames read ahead of the one being answered
const INBOUND_QUEUE: usize = 1;

pub async fn ws_chat_handler(ws: Ws, state: AppState) -> Result<impl warp::Reply, Infallible> {
    Ok(ws.on_upgrade(move |socket| run_session(socket, state)))
}

/// Drive one session from registration to unregistration
async fn run_session(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let cancel = CancellationToken::new();

    // Writer task: drains the session's queue into the socket. A failed
    // write trips the token so an in-flight relay stops early.
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_cancel = cancel.clone();
    let writer = tokio::spawn(async move {
        let mut outbound = UnboundedReceiverStream::new(rx);
        while let Some(text) = outbound.next().await {
            if let Err(e) = ws_tx.send(Message::text(text)).await {
                debug!(error = %e, "WebSocket send failed, client disconnected");
                break;
            }
        }
        writer_cancel.cancel();
    });

    let session_id = state.registry.register(tx);
    info!(session = %session_id, "WebSocket session opened");

    // Reader task: forwards text frames and trips the token on disconnect,
    // which also interrupts a relay that is waiting on the upstream
    let (inbound_tx, mut inbound_rx) = mpsc::channel::<String>(INBOUND_QUEUE);
    let reader_cancel = cancel.clone();
    let reader = tokio::spawn(async move {
        forward_inbound(ws_rx, inbound_tx, session_id).await;
        reader_cancel.cancel();
    });

    // One frame at a time, in arrival order
    loop {
        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = inbound_rx.recv() => match next {
                Some(text) => text,
                None => break,
            },
        };

        if let Err(e) = handle_frame(&state, session_id, &text, &cancel).await {
            debug!(session = %session_id, error = %e, "Stopping session");
            break;
        }
    }

    cancel.cancel();
    if let Err(e) = state.registry.unregister(session_id) {
        warn!(session = %session_id, error = %e, "Session was already unregistered");
    }
    // Unregistering dropped the queue's only sender, so the writer drains and exits
    let _ = writer.await;
    reader.abort();

    info!(session = %session_id, "WebSocket session closed");
}

/// Copy text frames from the socket into `inbound_tx` until the client goes away
///
/// Waits for queue space before reading the next frame, so a client that
/// outpaces the relay is held back by the transport.
async fn forward_inbound<S, E>(mut ws_rx: S, inbound_tx: mpsc::Sender<String>, session_id: SessionId)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    while let Some(result) = ws_rx.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                warn!(session = %session_id, error = %e, "WebSocket error");
                break;
            }
        };

        if msg.is_close() {
            debug!(session = %session_id, "Client sent close frame");
            break;
        }

        // Binary, ping and pong frames carry no chat payload
        let text = match msg.to_str() {
            Ok(text) => text.to_string(),
            Err(()) => continue,
        };

        if inbound_tx.send(text).await.is_err() {
            break;
        }
    }
}

/// Answer one inbound frame. Only transport failures are returned; decode
/// and upstream failures are reported to the client as error frames.
async fn handle_frame(
    state: &AppState,
    session_id: SessionId,
    text: &str,
    cancel: &CancellationToken,
) -> Result<(), RegistryError> {
    let request: SocketRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            warn!(session = %session_id, error = %e, "Failed to parse socket frame");
            return state
                .registry
                .send(session_id, create_error_frame(format!("Invalid message: {}", e)));
        }
    };

    debug!(
        session = %session_id,
        history = request.history.len(),
        "Relaying socket message"
    );

    let transcript = build_transcript(SOCKET_SYSTEM_PROMPT, request.history, request.message);
    let fragments = state.relay.stream(transcript, cancel.clone());
    pin_mut!(fragments);

    while let Some(fragment) = fragments.next().await {
        match fragment {
            RelayFragment::Text(text) => state.registry.send(session_id, create_chunk_frame(text))?,
            // Always the last fragment
            RelayFragment::Failed(error) => {
                return state.registry.send(session_id, create_error_frame(error));
            }
        }
    }

    // A cancelled relay ends quietly; the session is going away
    if cancel.is_cancelled() {
        return Ok(());
    }

    state.registry.send(session_id, create_done_frame())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    fn text_frames(count: usize, pulled: Arc<AtomicUsize>) -> impl Stream<Item = Result<Message, warp::Error>> + Unpin {
        stream::iter((0..count).map(|i| Ok(Message::text(format!("frame {}", i))))).inspect(move |_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_reader_stops_pulling_while_queue_is_full() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_QUEUE);

        let reader = tokio::spawn(forward_inbound(
            text_frames(1000, Arc::clone(&pulled)),
            inbound_tx,
            Uuid::new_v4(),
        ));

        // Nothing consumes the queue, as when a relay hangs
        tokio::time::sleep(Duration::from_millis(50)).await;
        // One frame queued, one waiting for space
        assert_eq!(pulled.load(Ordering::SeqCst), INBOUND_QUEUE + 1);

        // Draining lets the reader continue, in order
        assert_eq!(inbound_rx.recv().await.as_deref(), Some("frame 0"));
        assert_eq!(inbound_rx.recv().await.as_deref(), Some("frame 1"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pulled.load(Ordering::SeqCst), INBOUND_QUEUE + 3);

        reader.abort();
    }

    #[tokio::test]
    async fn test_reader_skips_non_text_and_stops_at_close() {
        let frames = stream::iter(vec![
            Ok::<_, warp::Error>(Message::binary(vec![1, 2, 3])),
            Ok(Message::text("hello")),
            Ok(Message::close()),
            Ok(Message::text("after close")),
        ]);
        let (inbound_tx, mut inbound_rx) = mpsc::channel(4);

        forward_inbound(frames, inbound_tx, Uuid::new_v4()).await;

        assert_eq!(inbound_rx.recv().await.as_deref(), Some("hello"));
        // The sender is gone once the reader returns
        assert_eq!(inbound_rx.recv().await, None);
    }
}
