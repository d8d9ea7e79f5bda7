//! Turns one inbound `ConfigActionData` into zero or more reply frames
//! (§4.E). Purely synchronous: every tree operation here is a direct call
//! into `cfgtree-core`, mirroring `graphix-rt`'s own request-handling
//! closures that never block inside the dispatch step itself.

use std::sync::Arc;

use arcstr::ArcStr;
use cfgtree_core::helpers::{ranges_to_string, string_to_value, value_to_string};
use cfgtree_core::{Error, Node, Result, Tree};
use cfgtree_proto::{Action, ConfigActionData};
use tokio::sync::{mpsc, Notify};

use crate::push::PushRegistry;

/// What the connection loop should do after a dispatch call.
pub enum DispatchOutcome {
    /// Send every frame in order, then keep the connection open.
    Reply(Vec<ConfigActionData>),
    /// Send one ERROR frame, then close the connection (§7:
    /// `ProtocolError` and malformed frames).
    ReplyThenClose(ConfigActionData),
    /// Close the connection without a reply (§7: `IOError`).
    CloseNoReply,
}

pub fn dispatch(
    tree: &Tree,
    registry: &PushRegistry,
    push_tx: &mpsc::Sender<ConfigActionData>,
    disconnect: &Arc<Notify>,
    msg: ConfigActionData,
) -> DispatchOutcome {
    let id = msg.id;
    let action = match msg.action() {
        Ok(a) => a,
        Err(e) => return classify(id, e),
    };

    let result = match action {
        Action::NodeExists => node_exists(tree, &msg),
        Action::AttrExists => attr_exists(tree, &msg),
        Action::Get => get(tree, &msg),
        Action::Put => put(tree, &msg),
        Action::GetChildren => get_children(tree, &msg),
        Action::GetAttributes => get_attributes(tree, &msg),
        Action::GetType => get_type(tree, &msg),
        Action::GetRanges => get_ranges(tree, &msg),
        Action::GetFlags => get_flags(tree, &msg),
        Action::GetDescription => get_description(tree, &msg),
        Action::AddPushClient => add_push_client(registry, push_tx, disconnect, &msg),
        Action::RemovePushClient => remove_push_client(registry, disconnect, &msg),
        Action::DumpTree => dump_tree(tree, &msg),
        Action::AddModule => add_module(tree, &msg),
        Action::RemoveModule => remove_module(tree, &msg),
        Action::PushMessageNode | Action::PushMessageAttr => Err(Error::ProtocolError(ArcStr::from(
            "PUSH_MESSAGE_* is a server-to-client-only action",
        ))),
        Action::DumpTreeNode | Action::DumpTreeAttr => Err(Error::ProtocolError(ArcStr::from(
            "DUMP_TREE_NODE/_ATTR are server-emitted, not requestable",
        ))),
        Action::Error => Err(Error::ProtocolError(ArcStr::from("client sent an ERROR action"))),
    };

    match result {
        Ok(frames) => DispatchOutcome::Reply(frames),
        Err(e) => classify(id, e),
    }
}

/// §7 propagation policy: most tree errors become an ERROR reply with the
/// same `id`; `ProtocolError` replies then closes; `IOError` closes with no
/// reply at all.
fn classify(id: u64, e: Error) -> DispatchOutcome {
    match e {
        Error::ProtocolError(_) => DispatchOutcome::ReplyThenClose(ConfigActionData::error(id, e.to_string())),
        Error::IoError(_) => DispatchOutcome::CloseNoReply,
        _ => DispatchOutcome::Reply(vec![ConfigActionData::error(id, e.to_string())]),
    }
}

fn reply(template: &ConfigActionData) -> ConfigActionData {
    ConfigActionData::bare(template.action().expect("action already validated"), template.id)
}

/// Resolves `msg.node` without creating it, for every read-only/predicate
/// action: `Tree::get_node` would materialize intermediate nodes and emit
/// `CHILD_ADDED` to every subscriber as a side effect of a mere query (§4.C,
/// §4.E). Only the mutating actions (`PUT`, `ADD_MODULE`/`REMOVE_MODULE`)
/// resolve through `get_node`.
fn resolve_node(tree: &Tree, path: &str) -> Result<Arc<Node>> {
    tree.find_node(path)?.ok_or_else(|| Error::not_found(path))
}

fn attribute_record(
    tree: &Tree,
    msg: &ConfigActionData,
) -> Result<(std::sync::Arc<Node>, cfgtree_core::AttributeRecord)> {
    let node = resolve_node(tree, &msg.node)?;
    let ty = msg.attr_type()?;
    let rec = node.get_attribute_record(&msg.key, ty)?;
    Ok((node, rec))
}

fn node_exists(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let exists = tree.exists_node(&msg.node)?;
    let mut out = reply(msg);
    out.value = if exists { "true".into() } else { "false".into() };
    Ok(vec![out])
}

fn attr_exists(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let ty = msg.attr_type()?;
    let mut out = reply(msg);
    out.value = match tree.find_node(&msg.node)? {
        Some(node) if node.exists(&msg.key, ty) => "true".into(),
        _ => "false".into(),
    };
    Ok(vec![out])
}

fn get(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let node = resolve_node(tree, &msg.node)?;
    let ty = msg.attr_type()?;
    let value = node.get_attribute(&msg.key, ty)?;
    let mut out = reply(msg);
    out.value = value_to_string(&value).to_string();
    Ok(vec![out])
}

fn put(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let node = tree.get_node(&msg.node)?;
    let ty = msg.attr_type()?;
    let value = string_to_value(ty, &msg.value)?;
    node.put_attribute(&msg.key, ty, value)?;
    Ok(vec![reply(msg)])
}

fn get_children(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let node = resolve_node(tree, &msg.node)?;
    // Pre-size the joined reply buffer from the cheap count, rather than
    // growing it one child name at a time.
    let mut value = String::with_capacity(node.child_count() * 16);
    for (i, name) in node.get_child_names().iter().enumerate() {
        if i > 0 {
            value.push('|');
        }
        value.push_str(name.as_str());
    }
    let mut out = reply(msg);
    out.value = value;
    Ok(vec![out])
}

fn get_attributes(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let node = resolve_node(tree, &msg.node)?;
    let mut value = String::with_capacity(node.attribute_count() * 16);
    for (i, (key, _)) in node.get_attribute_keys().iter().enumerate() {
        if i > 0 {
            value.push('|');
        }
        value.push_str(key.as_str());
    }
    let mut out = reply(msg);
    out.value = value;
    Ok(vec![out])
}

fn get_type(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let (_, rec) = attribute_record(tree, msg)?;
    let mut out = reply(msg);
    out.attr_type = rec.attr_type.wire();
    Ok(vec![out])
}

fn get_ranges(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let (_, rec) = attribute_record(tree, msg)?;
    let mut out = reply(msg);
    out.ranges = ranges_to_string(&rec.ranges).to_string();
    Ok(vec![out])
}

fn get_flags(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let (_, rec) = attribute_record(tree, msg)?;
    let mut out = reply(msg);
    out.flags = rec.flags.bits();
    Ok(vec![out])
}

fn get_description(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let (_, rec) = attribute_record(tree, msg)?;
    let mut out = reply(msg);
    out.description = rec.description.to_string();
    Ok(vec![out])
}

fn add_push_client(
    registry: &PushRegistry,
    push_tx: &mpsc::Sender<ConfigActionData>,
    disconnect: &Arc<Notify>,
    msg: &ConfigActionData,
) -> Result<Vec<ConfigActionData>> {
    registry.add(disconnect.clone(), push_tx.clone());
    Ok(vec![reply(msg)])
}

fn remove_push_client(
    registry: &PushRegistry,
    disconnect: &Arc<Notify>,
    msg: &ConfigActionData,
) -> Result<Vec<ConfigActionData>> {
    registry.remove(disconnect);
    Ok(vec![reply(msg)])
}

/// Thin wrapper over a well-known `/modules/<name>/` subtree (SPEC_FULL.md
/// §4.E supplement): not part of the core protocol invariants, but fully
/// testable through the same tree machinery as any user subtree.
fn add_module(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    tree.get_node(&format!("/modules/{}/", msg.node))?;
    Ok(vec![reply(msg)])
}

fn remove_module(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    tree.get_node(&format!("/modules/{}/", msg.node))?.remove_node()?;
    Ok(vec![reply(msg)])
}

/// Streams the schema of the subtree rooted at `msg.node`: one
/// `DUMP_TREE_NODE` frame per node, depth-first, followed immediately by a
/// `DUMP_TREE_ATTR` frame per exported attribute of that node, terminated by
/// an empty `DUMP_TREE` frame (§4.E).
fn dump_tree(tree: &Tree, msg: &ConfigActionData) -> Result<Vec<ConfigActionData>> {
    let root = resolve_node(tree, &msg.node)?;
    let mut frames = Vec::new();
    walk(&root, msg.id, &mut frames);
    let mut terminator = ConfigActionData::bare(Action::DumpTree, msg.id);
    terminator.node = String::new();
    frames.push(terminator);
    return Ok(frames);

    fn walk(node: &Node, id: u64, frames: &mut Vec<ConfigActionData>) {
        let mut node_frame = ConfigActionData::bare(Action::DumpTreeNode, id);
        node_frame.node = node.path().to_string();
        frames.push(node_frame);

        for (key, ty) in node.get_attribute_keys() {
            if let Ok(rec) = node.get_attribute_record(&key, ty) {
                if rec.flags.contains(cfgtree_core::AttrFlags::NO_EXPORT) {
                    continue;
                }
                let mut attr_frame = ConfigActionData::bare(Action::DumpTreeAttr, id);
                attr_frame.node = node.path().to_string();
                attr_frame.key = key.to_string();
                attr_frame.attr_type = ty.wire();
                attr_frame.value = value_to_string(&rec.value).to_string();
                attr_frame.ranges = ranges_to_string(&rec.ranges).to_string();
                attr_frame.flags = rec.flags.bits();
                attr_frame.description = rec.description.to_string();
                frames.push(attr_frame);
            }
        }

        for child in node.get_children() {
            walk(&child, id, frames);
        }
    }
}

