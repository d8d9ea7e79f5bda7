//! Tree node (§3, §4.B): path-addressed owner of typed attributes, child
//! nodes, and listener registries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arcstr::ArcStr;
use indexmap::IndexMap;
use log::{debug, trace};
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::event::{AttrEvent, AttrEventKind, NodeEvent, NodeEventKind};
use crate::flags::AttrFlags;
use crate::range::Range;
use crate::tree::TreeGlobals;
use crate::updater::{UpdaterEntry, UpdaterFn};
use crate::value::{AttrType, Value};

/// Opaque handle returned by `add_node_listener`/`add_attribute_listener`,
/// used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

fn next_listener_id() -> ListenerId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    ListenerId(NEXT.fetch_add(1, Ordering::Relaxed))
}

pub type NodeListener = Arc<dyn Fn(&Node, &NodeEvent) + Send + Sync>;
pub type AttributeListener = Arc<dyn Fn(&Node, &AttrEvent) + Send + Sync>;

/// The full record kept for one `(key, type)` attribute (§3).
#[derive(Clone)]
pub struct AttributeRecord {
    pub key: ArcStr,
    pub attr_type: AttrType,
    pub value: Value,
    pub ranges: Range,
    pub flags: AttrFlags,
    pub description: ArcStr,
    /// Incremented on every successful PUT/updateReadOnly (SPEC_FULL.md §3
    /// supplement); not part of the wire protocol.
    pub generation: u64,
}

struct NodeInner {
    attributes: std::collections::BTreeMap<(ArcStr, AttrType), AttributeRecord>,
    children: IndexMap<ArcStr, Arc<Node>>,
    node_listeners: Vec<(ListenerId, NodeListener)>,
    attribute_listeners: Vec<(ListenerId, AttributeListener)>,
    updaters: Vec<UpdaterEntry>,
}

impl NodeInner {
    fn new() -> Self {
        NodeInner {
            attributes: std::collections::BTreeMap::new(),
            children: IndexMap::new(),
            node_listeners: Vec::new(),
            attribute_listeners: Vec::new(),
            updaters: Vec::new(),
        }
    }
}

pub struct Node {
    name: ArcStr,
    path: ArcStr,
    parent: Option<Weak<Node>>,
    /// Points back to this node's own allocation, so methods taking only
    /// `&self` can still hand out an owning `Arc<Node>` to a freshly created
    /// child (which needs to downgrade it for its own parent back-reference).
    self_weak: Weak<Node>,
    pub(crate) globals: Arc<TreeGlobals>,
    inner: RwLock<NodeInner>,
}

impl Node {
    pub(crate) fn new_root(globals: Arc<TreeGlobals>) -> Arc<Node> {
        Arc::new_cyclic(|weak| Node {
            name: ArcStr::new(),
            path: ArcStr::from("/"),
            parent: None,
            self_weak: weak.clone(),
            globals,
            inner: RwLock::new(NodeInner::new()),
        })
    }

    fn new_child(parent: &Node, name: ArcStr) -> Arc<Node> {
        let path = ArcStr::from(format!("{}{}/", parent.path, name));
        Arc::new_cyclic(|weak| Node {
            name,
            path,
            parent: Some(parent.self_weak.clone()),
            self_weak: weak.clone(),
            globals: parent.globals.clone(),
            inner: RwLock::new(NodeInner::new()),
        })
    }

    fn arc(&self) -> Arc<Node> {
        self.self_weak.upgrade().expect("node dropped while a method on it was running")
    }

    pub fn name(&self) -> &ArcStr {
        &self.name
    }

    pub fn path(&self) -> &ArcStr {
        &self.path
    }

    pub fn parent(&self) -> Option<Arc<Node>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn attribute_count(&self) -> usize {
        self.inner.read().attributes.len()
    }

    pub fn child_count(&self) -> usize {
        self.inner.read().children.len()
    }

    /// Resolves (creating as needed) the child named `name` directly below
    /// this node. Used by `Tree::get_node` while walking a path.
    pub(crate) fn get_or_create_child(&self, name: &str) -> Arc<Node> {
        {
            let inner = self.inner.read();
            if let Some(child) = inner.children.get(name) {
                return child.clone();
            }
        }
        let mut inner = self.inner.write();
        if let Some(child) = inner.children.get(name) {
            return child.clone();
        }
        let child = Node::new_child(self, ArcStr::from(name));
        inner.children.insert(child.name.clone(), child.clone());
        drop(inner);
        trace!("created node {}", child.path);
        self.emit_node_event(NodeEvent {
            kind: NodeEventKind::ChildAdded,
            child_name: child.name.clone(),
        });
        child
    }

    pub(crate) fn find_child(&self, name: &str) -> Option<Arc<Node>> {
        self.inner.read().children.get(name).cloned()
    }

    pub fn get_child_names(&self) -> Vec<ArcStr> {
        self.inner.read().children.keys().cloned().collect()
    }

    pub fn get_children(&self) -> Vec<Arc<Node>> {
        self.inner.read().children.values().cloned().collect()
    }

    // ---- attributes ----------------------------------------------------

    /// `createAttribute` (§4.B). Idempotent when the same `(key,type)`
    /// already exists with identical ranges and flags; `Conflict` if ranges
    /// or flags differ.
    pub fn create_attribute(
        &self,
        key: impl Into<ArcStr>,
        attr_type: AttrType,
        default: Value,
        ranges: Range,
        flags: AttrFlags,
        description: impl Into<ArcStr>,
    ) -> Result<()> {
        let key = key.into();
        let description = description.into();
        if attr_type != default.attr_type() {
            return Err(Error::TypeMismatch {
                key: key.clone(),
                expected: attr_type,
                actual: default.attr_type(),
            });
        }
        if !default.is_finite_numeric() {
            return Err(Error::invalid_value(format!(
                "attribute {key} default must not be NaN/infinite"
            )));
        }
        ranges.contains_for(&key, &default)?;

        let mut inner = self.inner.write();
        let map_key = (key.clone(), attr_type);
        if let Some(existing) = inner.attributes.get_mut(&map_key) {
            if existing.ranges != ranges || existing.flags != flags {
                return Err(Error::Conflict(key));
            }
            existing.description = description;
            return Ok(());
        }
        inner.attributes.insert(
            map_key,
            AttributeRecord {
                key: key.clone(),
                attr_type,
                value: default.clone(),
                ranges,
                flags,
                description,
                generation: 0,
            },
        );
        drop(inner);
        debug!("created attribute {}{} ({attr_type})", self.path, key);
        self.emit_attribute_event(AttrEvent {
            kind: AttrEventKind::Added,
            key,
            attr_type,
            value: Some(default),
        });
        Ok(())
    }

    /// `removeAttribute` (§4.B): no-op if absent; also drops any updater
    /// bound to this `(key,type)`.
    pub fn remove_attribute(&self, key: &str, attr_type: AttrType) {
        let removed = {
            let mut inner = self.inner.write();
            inner.updaters.retain(|u| !(u.key.as_str() == key && u.attr_type == attr_type));
            inner.attributes.remove(&(ArcStr::from(key), attr_type))
        };
        if let Some(rec) = removed {
            self.emit_attribute_event(AttrEvent {
                kind: AttrEventKind::Removed,
                key: rec.key,
                attr_type,
                value: Some(rec.value),
            });
        }
    }

    /// `putAttribute` (§4.B). Returns whether the value was delivered to
    /// listeners: for ordinary attributes this means the stored value
    /// actually changed; `NOTIFY_ONLY` attributes deliver on every call
    /// since there is no stored value to compare against. Rejects
    /// `READ_ONLY` attributes; use `update_read_only` for privileged writers
    /// (updaters, in-process telemetry).
    pub fn put_attribute(&self, key: &str, attr_type: AttrType, value: Value) -> Result<bool> {
        self.put_attribute_inner(key, attr_type, value, false)
    }

    /// `updateReadOnly` (§4.C): identical to PUT but bypasses the
    /// `READ_ONLY` guard.
    pub fn update_read_only(&self, key: &str, attr_type: AttrType, value: Value) -> Result<bool> {
        self.put_attribute_inner(key, attr_type, value, true)
    }

    fn put_attribute_inner(
        &self,
        key: &str,
        attr_type: AttrType,
        value: Value,
        privileged: bool,
    ) -> Result<bool> {
        if attr_type != value.attr_type() {
            return Err(Error::TypeMismatch {
                key: ArcStr::from(key),
                expected: attr_type,
                actual: value.attr_type(),
            });
        }
        if !value.is_finite_numeric() {
            return Err(Error::invalid_value(format!(
                "value for {key} must not be NaN/infinite"
            )));
        }

        let (deliver, event_key) = {
            let mut inner = self.inner.write();
            let rec = inner
                .attributes
                .get_mut(&(ArcStr::from(key), attr_type))
                .ok_or_else(|| Error::not_found(format!("{}{key}", self.path)))?;
            if rec.flags.contains(AttrFlags::READ_ONLY) && !privileged {
                return Err(Error::ReadOnly(rec.key.clone()));
            }
            rec.ranges.contains_for(&rec.key, &value)?;
            // NOTIFY_ONLY attributes have no stored value to compare
            // against, so every PUT delivers through listeners (§3, §4.B).
            let notify_only = rec.flags.contains(AttrFlags::NOTIFY_ONLY);
            let deliver = if notify_only {
                true
            } else {
                let changed = !rec.value.same_bits(&value);
                if changed {
                    rec.value = value.clone();
                    rec.generation += 1;
                }
                changed
            };
            (deliver, rec.key.clone())
        };

        if deliver {
            self.emit_attribute_event(AttrEvent {
                kind: AttrEventKind::Modified,
                key: event_key,
                attr_type,
                value: Some(value),
            });
        }
        Ok(deliver)
    }

    pub fn get_attribute(&self, key: &str, attr_type: AttrType) -> Result<Value> {
        self.inner
            .read()
            .attributes
            .get(&(ArcStr::from(key), attr_type))
            .map(|r| r.value.clone())
            .ok_or_else(|| Error::not_found(format!("{}{key}", self.path)))
    }

    pub fn get_attribute_record(&self, key: &str, attr_type: AttrType) -> Result<AttributeRecord> {
        self.inner
            .read()
            .attributes
            .get(&(ArcStr::from(key), attr_type))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{}{key}", self.path)))
    }

    pub fn exists(&self, key: &str, attr_type: AttrType) -> bool {
        self.inner.read().attributes.contains_key(&(ArcStr::from(key), attr_type))
    }

    /// Keys in lexicographic `(key, type)` order (§4.B).
    pub fn get_attribute_keys(&self) -> Vec<(ArcStr, AttrType)> {
        self.inner.read().attributes.keys().cloned().collect()
    }

    pub fn all_attribute_records(&self) -> Vec<AttributeRecord> {
        self.inner.read().attributes.values().cloned().collect()
    }

    // ---- listeners -------------------------------------------------------

    pub fn add_node_listener(&self, listener: NodeListener) -> ListenerId {
        let id = next_listener_id();
        self.inner.write().node_listeners.push((id, listener));
        id
    }

    pub fn remove_node_listener(&self, id: ListenerId) {
        self.inner.write().node_listeners.retain(|(lid, _)| *lid != id);
    }

    pub fn add_attribute_listener(&self, listener: AttributeListener) -> ListenerId {
        let id = next_listener_id();
        self.inner.write().attribute_listeners.push((id, listener));
        id
    }

    pub fn remove_attribute_listener(&self, id: ListenerId) {
        self.inner.write().attribute_listeners.retain(|(lid, _)| *lid != id);
    }

    pub fn add_attribute_updater(&self, key: impl Into<ArcStr>, attr_type: AttrType, updater: UpdaterFn) {
        self.inner.write().updaters.push(UpdaterEntry { key: key.into(), attr_type, updater });
    }

    // ---- removal -----------------------------------------------------------

    /// Removes every attribute of this single node, the leaf-local step
    /// shared by `remove_node` and `clear_sub_tree`. Emits `ATTRIBUTE_REMOVED`
    /// once per attribute.
    fn drain_attributes(&self) {
        for rec in self.all_attribute_records() {
            self.inner.write().attributes.remove(&(rec.key.clone(), rec.attr_type));
            self.emit_attribute_event(AttrEvent {
                kind: AttrEventKind::Removed,
                key: rec.key,
                attr_type: rec.attr_type,
                value: Some(rec.value),
            });
        }
    }

    /// Detaches `self` from `parent`'s child map and emits `CHILD_REMOVED`
    /// on `parent`. Assumes `self`'s own attributes/descendants were already
    /// drained.
    fn detach_from(&self, parent: &Node) {
        parent.inner.write().children.shift_remove(&self.name);
        parent.emit_node_event(NodeEvent {
            kind: NodeEventKind::ChildRemoved,
            child_name: self.name.clone(),
        });
    }

    /// `removeNode` (§4.B): detaches this node from its parent, removing the
    /// whole subtree. Emits `ATTRIBUTE_REMOVED` for every attribute of every
    /// removed node leaf-first, then `CHILD_REMOVED` on the parent, per node.
    pub fn remove_node(&self) -> Result<()> {
        let parent = self
            .parent()
            .ok_or_else(|| Error::InvalidPath(ArcStr::from("cannot remove the root node")))?;
        self.clear_sub_tree(false);
        self.drain_attributes();
        self.detach_from(&parent);
        Ok(())
    }

    /// `clearSubTree` (§4.B): removes all descendants, leaf-first;
    /// optionally detaches this node from its own parent too.
    pub fn clear_sub_tree(&self, clear_this_node: bool) {
        for child in self.get_children() {
            child.clear_sub_tree(false);
            child.drain_attributes();
            child.detach_from(self);
        }
        if clear_this_node {
            if let Some(parent) = self.parent() {
                self.drain_attributes();
                self.detach_from(&parent);
            }
        }
    }

    // ---- dispatch ----------------------------------------------------------

    fn emit_node_event(&self, event: NodeEvent) {
        let listeners: Vec<NodeListener> =
            self.inner.read().node_listeners.iter().map(|(_, l)| l.clone()).collect();
        for listener in &listeners {
            listener(self, &event);
        }
        let global = self.globals.node_listener.read().clone();
        if let Some(global) = global {
            global(self, &event);
        }
    }

    fn emit_attribute_event(&self, event: AttrEvent) {
        let listeners: Vec<AttributeListener> =
            self.inner.read().attribute_listeners.iter().map(|(_, l)| l.clone()).collect();
        for listener in &listeners {
            listener(self, &event);
        }
        let global = self.globals.attribute_listener.read().clone();
        if let Some(global) = global {
            global(self, &event);
        }
    }

    /// Runs every updater registered on this node, applying results via
    /// `update_read_only`. Errors are reported to the process-wide error-log
    /// hook and do not abort the pass (§4.C).
    pub(crate) fn run_updaters(&self) {
        let entries: Vec<UpdaterEntry> = self.inner.read().updaters.clone();
        for entry in entries {
            if let Some(value) = (entry.updater)(self) {
                if let Err(e) = self.update_read_only(&entry.key, entry.attr_type, value) {
                    crate::error_log::report(
                        &format!("updater for {}{} failed: {e}", self.path, entry.key),
                        false,
                    );
                }
            }
        }
    }

    /// Returns an owning handle to this node. Exposed for callers (e.g. the
    /// RCP server) that received a `&Node` from a listener callback and need
    /// to retain a reference past the callback's lifetime.
    pub fn handle(&self) -> Arc<Node> {
        self.arc()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::tree::Tree;

    fn int_attr(node: &Node, key: &str, default: i32, min: i32, max: i32, flags: AttrFlags) {
        node.create_attribute(key, AttrType::Int, Value::Int(default), Range::Int { min, max }, flags, "")
            .unwrap();
    }

    /// §8 scenario 1: range-checked PUT, rejection leaves state unchanged.
    #[test]
    fn scenario_ranged_int_put() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        int_attr(&m, "n", 5, 0, 10, AttrFlags::NORMAL);
        assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(5));

        let err = m.put_attribute("n", AttrType::Int, Value::Int(11)).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
        assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(5));

        let modified = m.put_attribute("n", AttrType::Int, Value::Int(7)).unwrap();
        assert!(modified);
        assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(7));
    }

    /// §8 scenario 2: exactly one MODIFIED event per actual change, none on
    /// a no-op PUT.
    #[test]
    fn scenario_idempotent_put_emits_no_duplicate_events() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        m.create_attribute("b", AttrType::Bool, Value::Bool(false), Range::None, AttrFlags::NORMAL, "").unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let count2 = count.clone();
        let last2 = last.clone();
        m.add_attribute_listener(Arc::new(move |_node, event| {
            count2.fetch_add(1, Ordering::SeqCst);
            *last2.lock().unwrap() = event.value.clone();
        }));

        assert!(m.put_attribute("b", AttrType::Bool, Value::Bool(true)).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*last.lock().unwrap(), Some(Value::Bool(true)));

        assert!(!m.put_attribute("b", AttrType::Bool, Value::Bool(true)).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn create_attribute_is_idempotent_with_identical_schema() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        int_attr(&m, "n", 5, 0, 10, AttrFlags::NORMAL);
        m.put_attribute("n", AttrType::Int, Value::Int(9)).unwrap();
        // Re-creating with the same ranges/flags must not reset the value.
        int_attr(&m, "n", 5, 0, 10, AttrFlags::NORMAL);
        assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(9));
    }

    #[test]
    fn create_attribute_conflicts_on_differing_schema() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        int_attr(&m, "n", 5, 0, 10, AttrFlags::NORMAL);
        let err = m
            .create_attribute("n", AttrType::Int, Value::Int(5), Range::Int { min: 0, max: 20 }, AttrFlags::NORMAL, "")
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn nan_default_is_rejected() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        let err = m
            .create_attribute(
                "f",
                AttrType::Float,
                Value::Float(f32::NAN),
                Range::unbounded(AttrType::Float),
                AttrFlags::NORMAL,
                "",
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }

    #[test]
    fn read_only_rejects_put_but_allows_update_read_only() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        int_attr(&m, "n", 5, 0, 10, AttrFlags::READ_ONLY);
        assert!(matches!(m.put_attribute("n", AttrType::Int, Value::Int(6)), Err(Error::ReadOnly(_))));
        assert!(m.update_read_only("n", AttrType::Int, Value::Int(6)).unwrap());
        assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(6));
    }

    #[test]
    fn notify_only_never_updates_its_stored_value_but_always_delivers() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        int_attr(&m, "n", 0, 0, 100, AttrFlags::NOTIFY_ONLY);

        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        m.add_attribute_listener(Arc::new(move |_n, _e| {
            count2.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(m.put_attribute("n", AttrType::Int, Value::Int(1)).unwrap());
        assert!(m.put_attribute("n", AttrType::Int, Value::Int(1)).unwrap());
        assert_eq!(count.load(Ordering::SeqCst), 2);
        // Storage is never touched for NOTIFY_ONLY attributes: the record
        // still holds its creation-time default.
        assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(0));
    }

    /// §8: `ATTRIBUTE_ADDED` precedes any `ATTRIBUTE_MODIFIED` for the same
    /// attribute.
    #[test]
    fn added_precedes_modified() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let kinds2 = kinds.clone();
        m.add_attribute_listener(Arc::new(move |_n, e| kinds2.lock().unwrap().push(e.kind)));
        int_attr(&m, "n", 0, 0, 10, AttrFlags::NORMAL);
        m.put_attribute("n", AttrType::Int, Value::Int(3)).unwrap();
        let seen = kinds.lock().unwrap();
        assert_eq!(*seen, vec![AttrEventKind::Added, AttrEventKind::Modified]);
    }

    /// §8: removing a node emits `ATTRIBUTE_REMOVED` for every attribute
    /// before `CHILD_REMOVED` fires on the parent, leaf-first across the
    /// subtree.
    #[test]
    fn remove_node_orders_attribute_removed_before_child_removed() {
        let tree = Tree::new();
        let parent = tree.get_node("/p/").unwrap();
        let child = tree.get_node("/p/c/").unwrap();
        int_attr(&child, "n", 1, 0, 10, AttrFlags::NORMAL);

        let log = Arc::new(Mutex::new(Vec::new()));
        let log_attr = log.clone();
        child.add_attribute_listener(Arc::new(move |_n, e| {
            log_attr.lock().unwrap().push(format!("attr:{:?}", e.kind));
        }));
        let log_node = log.clone();
        parent.add_node_listener(Arc::new(move |_n, e| {
            log_node.lock().unwrap().push(format!("node:{:?}", e.kind));
        }));

        child.remove_node().unwrap();

        let seen = log.lock().unwrap();
        assert_eq!(seen[0], "attr:Removed");
        assert_eq!(seen[1], "node:ChildRemoved");
        assert!(!tree.exists_node("/p/c/").unwrap());
    }

    #[test]
    fn clear_sub_tree_removes_descendants_leaf_first_without_detaching_self() {
        let tree = Tree::new();
        let root = tree.get_node("/p/").unwrap();
        tree.get_node("/p/a/").unwrap();
        tree.get_node("/p/a/b/").unwrap();

        root.clear_sub_tree(false);
        assert_eq!(root.child_count(), 0);
        assert!(tree.exists_node("/p/").unwrap());
        assert!(!tree.exists_node("/p/a/").unwrap());
    }

    #[test]
    fn cannot_remove_the_root_node() {
        let tree = Tree::new();
        assert!(matches!(tree.root().remove_node(), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn attribute_keys_are_lexicographic_and_children_are_insertion_ordered() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        int_attr(&m, "zeta", 0, 0, 10, AttrFlags::NORMAL);
        int_attr(&m, "alpha", 0, 0, 10, AttrFlags::NORMAL);
        let keys: Vec<_> = m.get_attribute_keys().into_iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["alpha".to_string(), "zeta".to_string()]);

        tree.get_node("/m/second/").unwrap();
        tree.get_node("/m/first/").unwrap();
        let names: Vec<_> = m.get_child_names().into_iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["second".to_string(), "first".to_string()]);
    }

    /// §8 scenario 6: an updater applied through `updateReadOnly`, run twice
    /// via the tree-level scheduler, producing monotonically non-decreasing
    /// values and one MODIFIED event per run once the value actually moves.
    #[test]
    fn updater_applies_through_update_read_only() {
        let tree = Tree::new();
        let clock = tree.get_node("/clock/").unwrap();
        clock
            .create_attribute("ts", AttrType::Long, Value::Long(0), Range::unbounded(AttrType::Long), AttrFlags::READ_ONLY, "")
            .unwrap();

        let tick = Arc::new(AtomicUsize::new(1));
        let tick2 = tick.clone();
        clock.add_attribute_updater(
            "ts",
            AttrType::Long,
            Arc::new(move |_node| Some(Value::Long(tick2.fetch_add(1, Ordering::SeqCst) as i64))),
        );

        assert!(matches!(clock.put_attribute("ts", AttrType::Long, Value::Long(99)), Err(Error::ReadOnly(_))));

        tree.attribute_updater_run();
        let first = match clock.get_attribute("ts", AttrType::Long).unwrap() {
            Value::Long(v) => v,
            _ => unreachable!(),
        };
        tree.attribute_updater_run();
        let second = match clock.get_attribute("ts", AttrType::Long).unwrap() {
            Value::Long(v) => v,
            _ => unreachable!(),
        };
        assert!(second >= first);
    }

    #[test]
    fn remove_attribute_is_a_no_op_when_absent() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        m.remove_attribute("ghost", AttrType::Int);
    }

    #[test]
    fn get_or_create_child_emits_child_added_once() {
        let tree = Tree::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        tree.root().add_node_listener(Arc::new(move |_n, _e| {
            count2.fetch_add(1, Ordering::SeqCst);
        }));
        tree.get_node("/a/").unwrap();
        tree.get_node("/a/").unwrap();
        assert_eq!(tree.get_node("/a/").unwrap().child_count(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
