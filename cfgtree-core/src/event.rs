//! Node- and attribute-change events (§3, §6). These are plain data; the
//! listener function types that carry them live in `node.rs` alongside
//! `Node` itself, since a listener needs a handle back to the node the
//! event occurred on.

use arcstr::ArcStr;

use crate::value::{AttrType, Value};

/// Node-event codes, wire-stable (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeEventKind {
    ChildAdded = 0,
    ChildRemoved = 1,
}

/// Emitted on a node when a direct child is added or removed.
#[derive(Debug, Clone)]
pub struct NodeEvent {
    pub kind: NodeEventKind,
    pub child_name: ArcStr,
}

/// Attribute-event codes, wire-stable (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttrEventKind {
    Added = 0,
    Modified = 1,
    Removed = 2,
}

/// Emitted on a node when one of its attributes is created, modified, or
/// removed. `value` is the new value for ADDED/MODIFIED and the last known
/// value for REMOVED (best-effort; absent for NOTIFY_ONLY attributes since
/// those are never stored).
#[derive(Debug, Clone)]
pub struct AttrEvent {
    pub kind: AttrEventKind,
    pub key: ArcStr,
    pub attr_type: AttrType,
    pub value: Option<Value>,
}
