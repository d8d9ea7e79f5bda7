//! Accept loop and the two global-listener closures that turn tree events
//! into push frames (§4.E).

use std::net::SocketAddr;
use std::sync::Arc;

use cfgtree_core::helpers::value_to_string;
use cfgtree_core::{AttrEvent, AttrEventKind, Node, NodeEvent, NodeEventKind, Result, Tree};
use cfgtree_proto::{
    Action, ConfigActionData, ATTR_EVENT_ADDED, ATTR_EVENT_MODIFIED, ATTR_EVENT_REMOVED,
    NODE_EVENT_CHILD_ADDED, NODE_EVENT_CHILD_REMOVED,
};
use log::info;
use tokio::net::TcpListener;

use crate::connection;
use crate::push::PushRegistry;

pub struct RcpServer {
    tree: Arc<Tree>,
    registry: Arc<PushRegistry>,
    push_queue_capacity: usize,
}

impl RcpServer {
    /// Installs `tree`'s two global listener slots (§4.C) so every event
    /// from every node is turned into a PUSH_MESSAGE_* frame and fanned out
    /// to every ADD_PUSH_CLIENT subscriber. A `Tree` has exactly one global
    /// listener slot of each kind, so only one `RcpServer` should own a
    /// given tree at a time.
    pub fn new(tree: Arc<Tree>, push_queue_capacity: usize) -> Arc<RcpServer> {
        let registry = Arc::new(PushRegistry::new());

        let node_registry = registry.clone();
        tree.set_global_node_listener(Some(Arc::new(move |node: &Node, event: &NodeEvent| {
            node_registry.broadcast(node_event_frame(node, event));
        })));

        let attr_registry = registry.clone();
        tree.set_global_attribute_listener(Some(Arc::new(move |node: &Node, event: &AttrEvent| {
            attr_registry.broadcast(attr_event_frame(node, event));
        })));

        Arc::new(RcpServer { tree, registry, push_queue_capacity })
    }

    pub fn push_client_count(&self) -> usize {
        self.registry.len()
    }

    /// Accepts connections until `listener` errors, spawning one task per
    /// connection (§5: parallel access, no state shared beyond the tree and
    /// the push registry).
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, addr) = listener.accept().await?;
            info!("accepted RCP connection from {addr}");
            let tree = self.tree.clone();
            let registry = self.registry.clone();
            let capacity = self.push_queue_capacity;
            tokio::spawn(async move {
                connection::handle(stream, tree, registry, capacity).await;
            });
        }
    }

    pub async fn bind_and_serve(self: Arc<Self>, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }
}

fn node_event_frame(node: &Node, event: &NodeEvent) -> ConfigActionData {
    let mut frame = ConfigActionData::bare(Action::PushMessageNode, 0);
    frame.node = node.path().to_string();
    frame.node_events = match event.kind {
        NodeEventKind::ChildAdded => NODE_EVENT_CHILD_ADDED,
        NodeEventKind::ChildRemoved => NODE_EVENT_CHILD_REMOVED,
    };
    frame.key = event.child_name.to_string();
    frame
}

fn attr_event_frame(node: &Node, event: &AttrEvent) -> ConfigActionData {
    let mut frame = ConfigActionData::bare(Action::PushMessageAttr, 0);
    frame.node = node.path().to_string();
    frame.key = event.key.to_string();
    frame.attr_type = event.attr_type.wire();
    frame.attr_events = match event.kind {
        AttrEventKind::Added => ATTR_EVENT_ADDED,
        AttrEventKind::Modified => ATTR_EVENT_MODIFIED,
        AttrEventKind::Removed => ATTR_EVENT_REMOVED,
    };
    frame.value = event
        .value
        .as_ref()
        .map(value_to_string)
        .map(|s| s.to_string())
        .unwrap_or_default();
    frame
}
