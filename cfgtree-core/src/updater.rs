//! Attribute updaters (§4.C, GLOSSARY): callables the tree invokes during
//! `attributeUpdaterRun` to refresh a specific attribute.

use std::sync::Arc;

use arcstr::ArcStr;

use crate::node::Node;
use crate::value::{AttrType, Value};

/// An updater callable bound to `(node, key, type)`. Returning `None` skips
/// the update for this pass; returning `Some(v)` applies `v` via
/// `Node::update_read_only`, which bypasses the `READ_ONLY` guard.
pub type UpdaterFn = Arc<dyn Fn(&Node) -> Option<Value> + Send + Sync>;

/// One entry in a node's per-attribute updater registry.
#[derive(Clone)]
pub(crate) struct UpdaterEntry {
    pub key: ArcStr,
    pub attr_type: AttrType,
    pub updater: UpdaterFn,
}
