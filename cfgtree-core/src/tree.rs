//! Root ownership, path resolution, and the process-wide singleton (§4.C).

use std::sync::Arc;

use arcstr::ArcStr;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::node::{AttributeListener, Node, NodeListener};

/// The slots every node's dispatch code reads after exhausting its own
/// per-node listener registry. Lives in its own small struct (rather than on
/// `Tree` directly) so `Node` can hold an `Arc<TreeGlobals>` without a
/// `Node` ↔ `Tree` cyclic type dependency.
pub(crate) struct TreeGlobals {
    pub(crate) node_listener: RwLock<Option<NodeListener>>,
    pub(crate) attribute_listener: RwLock<Option<AttributeListener>>,
}

impl TreeGlobals {
    fn new() -> Arc<TreeGlobals> {
        Arc::new(TreeGlobals {
            node_listener: RwLock::new(None),
            attribute_listener: RwLock::new(None),
        })
    }
}

/// Path grammar (§6): `/` | `/` segment (`/` segment)* `/`, segment is
/// `[A-Za-z0-9_]+`. Accepts a missing trailing slash on input (normalized on
/// return); rejects empty segments, leading-non-slash paths, and anything
/// outside the allowed character set.
fn split_segments(path: &str) -> Result<Vec<&str>> {
    if !path.starts_with('/') {
        return Err(Error::invalid_path(format!("path must be absolute: {path}")));
    }
    if path == "/" {
        return Ok(Vec::new());
    }
    let trimmed = path.strip_prefix('/').unwrap();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        if segment.is_empty()
            || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::invalid_path(format!("invalid path segment in {path}")));
        }
        segments.push(segment);
    }
    Ok(segments)
}

/// Owns the root node and resolves canonical paths against it (§4.C). A
/// `Tree` is a self-contained instance; `cfgtree_core::global()` provides an
/// optional process-wide one for code that wants "the" tree without
/// threading a handle everywhere.
pub struct Tree {
    root: Arc<Node>,
    globals: Arc<TreeGlobals>,
}

impl Tree {
    pub fn new() -> Tree {
        let globals = TreeGlobals::new();
        let root = Node::new_root(globals.clone());
        Tree { root, globals }
    }

    pub fn root(&self) -> Arc<Node> {
        self.root.clone()
    }

    /// `getNode` (§4.C): resolves or creates every node along `path`,
    /// returning a stable `Arc<Node>` handle. `getNode(p) == getNode(p)` in
    /// the sense that both calls return a handle to the same underlying node
    /// (§8).
    pub fn get_node(&self, path: &str) -> Result<Arc<Node>> {
        let segments = split_segments(path)?;
        let mut node = self.root.clone();
        for segment in segments {
            node = node.get_or_create_child(segment);
        }
        Ok(node)
    }

    /// `existsNode` (§4.C): presence check without creation.
    pub fn exists_node(&self, path: &str) -> Result<bool> {
        Ok(self.find_node(path)?.is_some())
    }

    /// Resolves `path` without creating any node along the way, returning
    /// `None` if any segment is missing. Used by read-only/predicate
    /// operations (e.g. the RCP server's GET-family actions) that must not
    /// materialize nodes or emit `CHILD_ADDED` events as a side effect of a
    /// query (§4.C, §4.E).
    pub fn find_node(&self, path: &str) -> Result<Option<Arc<Node>>> {
        let segments = split_segments(path)?;
        let mut node = self.root.clone();
        for segment in segments {
            match node.find_child(segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// `getRelativeNode` (§4.C): like `get_node`, but rooted at `base`
    /// unless `path` is itself absolute.
    pub fn get_relative_node(&self, base: &Node, path: &str) -> Result<Arc<Node>> {
        if path.starts_with('/') {
            return self.get_node(path);
        }
        let segments = split_segments(&format!("/{}/", path.trim_end_matches('/')))?;
        let mut node = base.handle();
        for segment in segments {
            node = node.get_or_create_child(segment);
        }
        Ok(node)
    }

    pub fn set_global_node_listener(&self, listener: Option<NodeListener>) {
        *self.globals.node_listener.write() = listener;
    }

    pub fn set_global_attribute_listener(&self, listener: Option<AttributeListener>) {
        *self.globals.attribute_listener.write() = listener;
    }

    /// `attributeUpdaterRun` (§4.C): walks every node in the tree, running
    /// its registered updaters. Order is depth-first, parent before children,
    /// matching `caer-sdk`'s own top-down refresh pass.
    pub fn attribute_updater_run(&self) {
        fn walk(node: &Arc<Node>) {
            node.run_updaters();
            for child in node.get_children() {
                walk(&child);
            }
        }
        walk(&self.root);
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}

static GLOBAL: RwLock<Option<Arc<Tree>>> = RwLock::new(None);

/// The process-wide tree, if one has been installed with `set_global`.
/// `spec.md` §9's "global singleton tree" design note is expressed as
/// explicit state rather than implicit lazy-initialization, so tests can run
/// with isolated `Tree::new()` instances instead.
pub fn global() -> Option<Arc<Tree>> {
    GLOBAL.read().clone()
}

/// Installs (or clears, with `None`) the process-wide tree.
pub fn set_global(tree: Option<Arc<Tree>>) {
    *GLOBAL.write() = tree;
}

/// Returns the process-wide tree, installing a fresh one if none exists yet.
pub fn global_or_init() -> Arc<Tree> {
    {
        if let Some(tree) = GLOBAL.read().clone() {
            return tree;
        }
    }
    let mut slot = GLOBAL.write();
    if let Some(tree) = slot.clone() {
        return tree;
    }
    let tree = Arc::new(Tree::new());
    *slot = Some(tree.clone());
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_node_is_stable() {
        let tree = Tree::new();
        let a = tree.get_node("/a/b/c/").unwrap();
        let b = tree.get_node("/a/b/c/").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn get_node_accepts_missing_trailing_slash() {
        let tree = Tree::new();
        let a = tree.get_node("/a/b/c/").unwrap();
        let b = tree.get_node("/a/b/c").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn rejects_malformed_paths() {
        let tree = Tree::new();
        assert!(tree.get_node("a/b/").is_err());
        assert!(tree.get_node("/a//b/").is_err());
        assert!(tree.get_node("/a.b/").is_err());
    }

    #[test]
    fn exists_node_does_not_create() {
        let tree = Tree::new();
        assert!(!tree.exists_node("/a/b/").unwrap());
        assert_eq!(tree.root().child_count(), 0);
        tree.get_node("/a/b/").unwrap();
        assert!(tree.exists_node("/a/b/").unwrap());
    }

    #[test]
    fn relative_node_resolution() {
        let tree = Tree::new();
        let a = tree.get_node("/a/").unwrap();
        let rel = tree.get_relative_node(&a, "b/c/").unwrap();
        assert_eq!(rel.path().as_str(), "/a/b/c/");
        let abs = tree.get_relative_node(&a, "/x/").unwrap();
        assert_eq!(abs.path().as_str(), "/x/");
    }

    #[test]
    fn relative_node_resolution_without_trailing_slash() {
        let tree = Tree::new();
        let a = tree.get_node("/a/").unwrap();
        let rel = tree.get_relative_node(&a, "b/c").unwrap();
        assert_eq!(rel.path().as_str(), "/a/b/c/");
    }

    #[test]
    fn find_node_does_not_create() {
        let tree = Tree::new();
        assert_eq!(tree.find_node("/a/b/").unwrap(), None);
        assert_eq!(tree.root().child_count(), 0);
        let created = tree.get_node("/a/b/").unwrap();
        let found = tree.find_node("/a/b/").unwrap().unwrap();
        assert!(Arc::ptr_eq(&created, &found));
    }
}
