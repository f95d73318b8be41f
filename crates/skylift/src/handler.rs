//! Per-connection handler: WebSocket upgrade and frame routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Upgrade the TCP stream to a WebSocket
//!   2. Subscribe to the table's snapshot feed
//!   3. Loop: forward snapshots out, dispatch client requests to the
//!      engine and send its reply back
//!
//! Snapshots and replies share one outgoing sink, so a client never sees
//! an interleaved half-frame.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use skylift_protocol::{ClientRequest, Codec, ProtocolError, ServerReply};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::SkyliftError;
use crate::server::ServerState;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), SkyliftError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut frames) = ws.split();

    // Subscribed for the lifetime of the connection; the unsubscribe on
    // exit is what lets the broadcaster forget this client.
    let (subscriber, mut snapshots) = state.broadcaster.subscribe();
    tracing::debug!(%addr, %subscriber, "client connected");

    let result = loop {
        tokio::select! {
            maybe_snapshot = snapshots.recv() => match maybe_snapshot {
                Some(snapshot) => {
                    if let Err(e) = send_frame(&mut sink, &state, &snapshot).await {
                        break Err(e);
                    }
                }
                // Feed closed: the engine is gone, nothing left to serve.
                None => break Ok(()),
            },
            maybe_frame = frames.next() => match maybe_frame {
                Some(Ok(msg)) => {
                    if let Err(e) = handle_frame(&mut sink, &state, msg).await {
                        break Err(e);
                    }
                }
                Some(Err(e)) => break Err(e.into()),
                None => break Ok(()),
            },
        }
    };

    state.broadcaster.unsubscribe(subscriber);
    tracing::debug!(%addr, %subscriber, "client disconnected");
    result
}

/// Routes one incoming WebSocket message.
async fn handle_frame(
    sink: &mut WsSink,
    state: &ServerState,
    msg: Message,
) -> Result<(), SkyliftError> {
    let data = match &msg {
        Message::Text(text) => text.as_bytes(),
        Message::Binary(data) => data.as_ref(),
        // Ping/pong is answered by tungstenite; close is surfaced as
        // stream end.
        _ => return Ok(()),
    };

    let reply = match state.codec.decode::<ClientRequest>(data) {
        Ok(request) => dispatch(state, request).await,
        Err(e) => {
            tracing::debug!(error = %e, "undecodable frame");
            ServerReply::Error {
                code: "bad_request".to_string(),
                message: e.to_string(),
            }
        }
    };

    send_frame(sink, state, &reply).await
}

/// Forwards a request to the engine and shapes the outcome as a reply.
async fn dispatch(state: &ServerState, request: ClientRequest) -> ServerReply {
    let result = match request {
        ClientRequest::PlaceBet { user_id, amount } => state
            .engine
            .place_bet(user_id, amount)
            .await
            .map(|()| ServerReply::BetPlaced),
        ClientRequest::CashOut { user_id } => state
            .engine
            .cash_out(user_id)
            .await
            .map(|win| ServerReply::CashedOut { win }),
        ClientRequest::GetBalance { user_id } => state
            .engine
            .balance(user_id)
            .await
            .map(|balance| ServerReply::Balance { balance }),
    };

    result.unwrap_or_else(|e| ServerReply::Error {
        code: e.code().to_string(),
        message: e.to_string(),
    })
}

/// Encodes a value and sends it as a text frame.
async fn send_frame<T: serde::Serialize>(
    sink: &mut WsSink,
    state: &ServerState,
    value: &T,
) -> Result<(), SkyliftError> {
    let bytes = state.codec.encode(value)?;
    // JsonCodec output is UTF-8; anything else cannot go in a text frame.
    let text = String::from_utf8(bytes)
        .map_err(|e| ProtocolError::InvalidFrame(e.to_string()))?;
    sink.send(Message::Text(text.into())).await?;
    Ok(())
}
