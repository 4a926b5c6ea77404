//! Per-connection WebSocket handling.
//!
//! Each socket is split into a reader loop and a writer task. The reader
//! dispatches every inbound text (or UTF-8 binary) frame and hands the reply
//! to the writer through a bounded channel. Once the client goes away the
//! writer stops and replies still in flight are dropped.

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use ragbridge_core::Dispatcher;
use ragbridge_core::config::MessageOrdering;
use tokio::sync::mpsc;
use tracing::debug;

/// Replies buffered per connection before the reader waits on the writer.
const OUTBOUND_BUFFER: usize = 32;

pub async fn handle_socket(socket: WebSocket, dispatcher: Dispatcher, ordering: MessageOrdering) {
    debug!(?ordering, "Client connected");
    let (sink, stream) = socket.split();
    let (outbound, replies) = mpsc::channel(OUTBOUND_BUFFER);

    tokio::spawn(write_replies(sink, replies));
    serve_connection(stream, outbound, dispatcher, ordering).await;
    debug!("Client disconnected");
}

/// Read frames until the client closes, answering each through `outbound`.
pub async fn serve_connection<S>(
    mut inbound: S,
    outbound: mpsc::Sender<String>,
    dispatcher: Dispatcher,
    ordering: MessageOrdering,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = inbound.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(err) => {
                debug!(error = %err, "WebSocket read failed");
                break;
            }
        };

        match ordering {
            MessageOrdering::Serial => {
                let reply = dispatcher.dispatch(&text).await;
                if outbound.send(reply).await.is_err() {
                    break;
                }
            }
            MessageOrdering::Concurrent => {
                let dispatcher = dispatcher.clone();
                let outbound = outbound.clone();
                tokio::spawn(async move {
                    let reply = dispatcher.dispatch(&text).await;
                    if outbound.send(reply).await.is_err() {
                        debug!("Connection closed before reply was sent");
                    }
                });
            }
        }
    }
}

async fn write_replies<S>(mut sink: S, mut replies: mpsc::Receiver<String>)
where
    S: Sink<Message> + Unpin,
{
    while let Some(reply) = replies.recv().await {
        if sink.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
