//! Action codes and the `ConfigActionData` message shape (§6).

use arcstr::ArcStr;
use cfgtree_core::{AttrFlags, AttrType, Error, Result};
use serde_derive::{Deserialize, Serialize};

/// Action codes, wire-stable, enumerated 0..=19 (§4.E, §6). Kept as a plain
/// `u8` on the wire (`ConfigActionData::action`) rather than letting serde
/// pick an enum-tag encoding, so the single-byte framing §6 describes is
/// exact regardless of serialization library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    NodeExists = 0,
    AttrExists = 1,
    Get = 2,
    Put = 3,
    GetChildren = 4,
    GetAttributes = 5,
    GetType = 6,
    GetRanges = 7,
    GetFlags = 8,
    GetDescription = 9,
    AddPushClient = 10,
    RemovePushClient = 11,
    PushMessageNode = 12,
    PushMessageAttr = 13,
    DumpTree = 14,
    DumpTreeNode = 15,
    DumpTreeAttr = 16,
    AddModule = 17,
    RemoveModule = 18,
    Error = 19,
}

impl Action {
    pub fn wire(self) -> u8 {
        self as u8
    }

    pub fn from_wire(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Action::NodeExists,
            1 => Action::AttrExists,
            2 => Action::Get,
            3 => Action::Put,
            4 => Action::GetChildren,
            5 => Action::GetAttributes,
            6 => Action::GetType,
            7 => Action::GetRanges,
            8 => Action::GetFlags,
            9 => Action::GetDescription,
            10 => Action::AddPushClient,
            11 => Action::RemovePushClient,
            12 => Action::PushMessageNode,
            13 => Action::PushMessageAttr,
            14 => Action::DumpTree,
            15 => Action::DumpTreeNode,
            16 => Action::DumpTreeAttr,
            17 => Action::AddModule,
            18 => Action::RemoveModule,
            19 => Action::Error,
            other => return Err(Error::ProtocolError(ArcStr::from(format!("unknown action code {other}")))),
        })
    }
}

/// Node-event codes carried in `nodeEvents` when `action` is
/// `PUSH_MESSAGE_NODE`; meaningless (and left 0) otherwise.
pub const NODE_EVENT_CHILD_ADDED: u8 = 0;
pub const NODE_EVENT_CHILD_REMOVED: u8 = 1;

/// Attribute-event codes carried in `attrEvents` when `action` is
/// `PUSH_MESSAGE_ATTR`; meaningless (and left 0) otherwise.
pub const ATTR_EVENT_ADDED: u8 = 0;
pub const ATTR_EVENT_MODIFIED: u8 = 1;
pub const ATTR_EVENT_REMOVED: u8 = 2;

/// The single message shape carried by every RCP frame (§6). Every field is
/// present on every message; unused fields take their zero/empty value
/// (`""` for strings, `0` for numeric codes) rather than being optional, to
/// match "absent string fields are the empty string".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigActionData {
    pub action: u8,
    pub node_events: u8,
    pub attr_events: u8,
    pub id: u64,
    pub node: String,
    pub key: String,
    #[serde(rename = "type")]
    pub attr_type: i8,
    pub value: String,
    pub ranges: String,
    pub flags: i32,
    pub description: String,
}

impl ConfigActionData {
    /// A bare request/reply carrying only `action` and `id`, every other
    /// field defaulted — the common shape for NODE_EXISTS/PUT-style
    /// exchanges before the caller fills in what it needs.
    pub fn bare(action: Action, id: u64) -> Self {
        ConfigActionData {
            action: action.wire(),
            node_events: 0,
            attr_events: 0,
            id,
            node: String::new(),
            key: String::new(),
            attr_type: AttrType::Unknown.wire(),
            value: String::new(),
            ranges: String::new(),
            flags: AttrFlags::NORMAL.bits(),
            description: String::new(),
        }
    }

    /// An ERROR reply: `value` carries the human-readable diagnostic (§4.E).
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        ConfigActionData {
            value: message.into(),
            ..ConfigActionData::bare(Action::Error, id)
        }
    }

    pub fn action(&self) -> Result<Action> {
        Action::from_wire(self.action)
    }

    pub fn attr_type(&self) -> Result<AttrType> {
        AttrType::from_wire(self.attr_type)
    }
}
