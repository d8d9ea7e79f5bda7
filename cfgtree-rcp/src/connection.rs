//! Per-connection state machine (§4.E): `READING_LEN`/`READING_BODY` are
//! handled internally by `cfgtree_proto::MessageCodec`'s length-delimited
//! framing; this module implements the `DISPATCH` step and the concurrent
//! `IDLE_OR_PUSH` outbound sender, and the terminal `CLOSED` transitions on
//! socket error, policy violation, or back-pressure.

use std::sync::Arc;

use arcstr::ArcStr;
use cfgtree_core::{Error, Tree};
use cfgtree_proto::{ConfigActionData, MessageCodec};
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio_util::codec::Framed;

use crate::dispatch::{dispatch, DispatchOutcome};
use crate::push::PushRegistry;

/// Negotiated once per connection, before any `ConfigActionData` framing
/// (SPEC_FULL.md §4.E supplement): a single byte each way, server first.
pub const PROTOCOL_VERSION: u8 = 1;

/// Per-connection push-queue capacity; exceeding it disconnects rather than
/// stalls the tree (§4.E, §5).
pub async fn handle(
    mut stream: TcpStream,
    tree: Arc<Tree>,
    registry: Arc<PushRegistry>,
    push_queue_capacity: usize,
) {
    if let Err(e) = negotiate_version(&mut stream).await {
        warn!("protocol version negotiation failed: {e}");
        return;
    }

    let disconnect = Arc::new(Notify::new());
    let (push_tx, mut push_rx) = mpsc::channel::<ConfigActionData>(push_queue_capacity);
    let mut framed = Framed::new(stream, MessageCodec::new());

    loop {
        tokio::select! {
            biased;

            _ = disconnect.notified() => {
                debug!("push queue exceeded its high-water mark, disconnecting");
                break;
            }

            frame = framed.next() => {
                let Some(frame) = frame else { break };
                let msg = match frame {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("malformed frame: {e}");
                        break;
                    }
                };
                match dispatch(&tree, &registry, &push_tx, &disconnect, msg) {
                    DispatchOutcome::Reply(frames) => {
                        let mut send_failed = false;
                        for reply in frames {
                            if framed.send(reply).await.is_err() {
                                send_failed = true;
                                break;
                            }
                        }
                        if send_failed {
                            break;
                        }
                    }
                    DispatchOutcome::ReplyThenClose(reply) => {
                        let _ = framed.send(reply).await;
                        break;
                    }
                    DispatchOutcome::CloseNoReply => break,
                }
            }

            pushed = push_rx.recv() => {
                match pushed {
                    Some(msg) => {
                        if framed.send(msg).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    registry.remove(&disconnect);
}

async fn negotiate_version(stream: &mut TcpStream) -> cfgtree_core::Result<()> {
    stream.write_u8(PROTOCOL_VERSION).await?;
    let client_version = stream.read_u8().await?;
    if client_version != PROTOCOL_VERSION {
        return Err(Error::ProtocolError(ArcStr::from(format!(
            "client requested protocol version {client_version}, server speaks {PROTOCOL_VERSION}"
        ))));
    }
    Ok(())
}
