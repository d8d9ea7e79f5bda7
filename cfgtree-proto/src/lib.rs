//! Wire types and framing for the remote config protocol (§6), shared by
//! `cfgtree-rcp` (server) and `cfgtree-client` (networked client).

pub mod action;
pub mod codec;

pub use action::{
    Action, ConfigActionData, ATTR_EVENT_ADDED, ATTR_EVENT_MODIFIED, ATTR_EVENT_REMOVED,
    NODE_EVENT_CHILD_ADDED, NODE_EVENT_CHILD_REMOVED,
};
pub use codec::{decode_body, encode_frame, MessageCodec, MAX_FRAME_LEN};
