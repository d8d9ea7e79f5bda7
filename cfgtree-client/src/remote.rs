//! Networked RCP client (§4.E) for remote subscribers: connects over TCP,
//! negotiates the protocol version, and correlates replies to requests by
//! `id` the way a request/response-over-channel client matches a response
//! back to its caller.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use arcstr::ArcStr;
use cfgtree_core::{AttrFlags, AttrType, Error, Result};
use cfgtree_proto::{Action, ConfigActionData, MessageCodec};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

/// Wire-stable; mirrors `cfgtree_rcp::connection::PROTOCOL_VERSION`. Kept as
/// its own constant here rather than a dependency on `cfgtree-rcp`, since a
/// remote client should not need to link the server crate to talk to it.
pub const PROTOCOL_VERSION: u8 = 1;

/// A single RCP connection to a remote tree. Not `Clone`: callers that need
/// concurrent requests should open one `RemoteClient` per task, matching the
/// one-connection-per-role shape `cfgtree-rcp`'s own test harness uses.
pub struct RemoteClient {
    framed: Framed<TcpStream, MessageCodec>,
    next_id: AtomicU64,
}

impl RemoteClient {
    pub async fn connect(addr: SocketAddr) -> Result<RemoteClient> {
        let mut stream = TcpStream::connect(addr).await?;
        let server_version = stream.read_u8().await?;
        stream.write_u8(PROTOCOL_VERSION).await?;
        if server_version != PROTOCOL_VERSION {
            return Err(Error::ProtocolError(ArcStr::from(format!(
                "server speaks protocol version {server_version}, client speaks {PROTOCOL_VERSION}"
            ))));
        }
        Ok(RemoteClient { framed: Framed::new(stream, MessageCodec::new()), next_id: AtomicU64::new(1) })
    }

    /// Sends `msg` with a freshly allocated id and waits for the reply
    /// carrying that same id, skipping over any push frames that arrive
    /// interleaved on the same connection in the meantime.
    async fn request(&mut self, mut msg: ConfigActionData) -> Result<ConfigActionData> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        msg.id = id;
        self.framed.send(msg).await?;
        loop {
            let reply = match self.framed.next().await {
                Some(frame) => frame?,
                None => return Err(Error::IoError(ArcStr::from("connection closed before a reply arrived"))),
            };
            if reply.id == id {
                return Ok(reply);
            }
        }
    }

    pub async fn node_exists(&mut self, node: &str) -> Result<bool> {
        let mut msg = ConfigActionData::bare(Action::NodeExists, 0);
        msg.node = node.to_string();
        Ok(self.request(msg).await?.value == "true")
    }

    pub async fn attr_exists(&mut self, node: &str, key: &str, attr_type: AttrType) -> Result<bool> {
        let mut msg = ConfigActionData::bare(Action::AttrExists, 0);
        msg.node = node.to_string();
        msg.key = key.to_string();
        msg.attr_type = attr_type.wire();
        Ok(self.request(msg).await?.value == "true")
    }

    pub async fn get(&mut self, node: &str, key: &str, attr_type: AttrType) -> Result<String> {
        let mut msg = ConfigActionData::bare(Action::Get, 0);
        msg.node = node.to_string();
        msg.key = key.to_string();
        msg.attr_type = attr_type.wire();
        Ok(self.request(msg).await?.value)
    }

    pub async fn put(&mut self, node: &str, key: &str, attr_type: AttrType, value: impl Into<String>) -> Result<()> {
        let mut msg = ConfigActionData::bare(Action::Put, 0);
        msg.node = node.to_string();
        msg.key = key.to_string();
        msg.attr_type = attr_type.wire();
        msg.value = value.into();
        let reply = self.request(msg).await?;
        if reply.action()? == Action::Error {
            return Err(Error::InvalidValue(ArcStr::from(reply.value)));
        }
        Ok(())
    }

    pub async fn get_children(&mut self, node: &str) -> Result<Vec<String>> {
        let mut msg = ConfigActionData::bare(Action::GetChildren, 0);
        msg.node = node.to_string();
        let reply = self.request(msg).await?;
        Ok(split_pipe(&reply.value))
    }

    pub async fn get_attributes(&mut self, node: &str) -> Result<Vec<String>> {
        let mut msg = ConfigActionData::bare(Action::GetAttributes, 0);
        msg.node = node.to_string();
        let reply = self.request(msg).await?;
        Ok(split_pipe(&reply.value))
    }

    pub async fn get_flags(&mut self, node: &str, key: &str, attr_type: AttrType) -> Result<AttrFlags> {
        let mut msg = ConfigActionData::bare(Action::GetFlags, 0);
        msg.node = node.to_string();
        msg.key = key.to_string();
        msg.attr_type = attr_type.wire();
        let reply = self.request(msg).await?;
        Ok(AttrFlags::from_bits_truncate(reply.flags))
    }

    pub async fn get_ranges(&mut self, node: &str, key: &str, attr_type: AttrType) -> Result<String> {
        let mut msg = ConfigActionData::bare(Action::GetRanges, 0);
        msg.node = node.to_string();
        msg.key = key.to_string();
        msg.attr_type = attr_type.wire();
        Ok(self.request(msg).await?.ranges)
    }

    /// Registers this connection as a push subscriber (§4.E); every
    /// subsequent frame received should be read with `next_push` rather than
    /// `request`.
    pub async fn add_push_client(&mut self) -> Result<()> {
        self.request(ConfigActionData::bare(Action::AddPushClient, 0)).await?;
        Ok(())
    }

    pub async fn remove_push_client(&mut self) -> Result<()> {
        self.request(ConfigActionData::bare(Action::RemovePushClient, 0)).await?;
        Ok(())
    }

    /// Reads the next `PUSH_MESSAGE_NODE`/`PUSH_MESSAGE_ATTR` frame. Only
    /// meaningful after `add_push_client`; returns `None` if the connection
    /// closed.
    pub async fn next_push(&mut self) -> Option<Result<ConfigActionData>> {
        self.framed.next().await
    }

    /// Issues a DUMP_TREE request and collects every `DUMP_TREE_NODE`/
    /// `DUMP_TREE_ATTR` frame until the empty terminator (§4.E).
    pub async fn dump_tree(&mut self, node: &str) -> Result<Vec<ConfigActionData>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut msg = ConfigActionData::bare(Action::DumpTree, id);
        msg.node = node.to_string();
        self.framed.send(msg).await?;

        let mut frames = Vec::new();
        loop {
            let frame = match self.framed.next().await {
                Some(frame) => frame?,
                None => return Err(Error::IoError(ArcStr::from("connection closed mid-DUMP_TREE"))),
            };
            if frame.id != id {
                continue;
            }
            if frame.action()? == Action::DumpTree {
                break;
            }
            frames.push(frame);
        }
        Ok(frames)
    }
}

fn split_pipe(s: &str) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split('|').map(String::from).collect()
    }
}
