//! Typed per-type façade over `cfgtree_core::Node` (§4.F): validates before
//! calling into the tree rather than leaning on `Node`'s own `Value`-typed
//! checks, so a type mismatch is caught at the call site with a concrete
//! Rust type rather than a runtime `Value` variant.

use std::sync::Arc;

use arcstr::ArcStr;
use cfgtree_core::{AttrFlags, AttrType, Node, Range, Result, Tree, Value};

/// A single attribute's home: an in-process module's handle onto one node of
/// the tree, used to register and access its own options.
#[derive(Clone)]
pub struct Facade {
    node: Arc<Node>,
}

impl Facade {
    pub fn new(node: Arc<Node>) -> Facade {
        Facade { node }
    }

    /// Resolves `path` (creating intermediate nodes as needed) as a façade.
    pub fn at(tree: &Tree, path: &str) -> Result<Facade> {
        Ok(Facade::new(tree.get_node(path)?))
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

macro_rules! typed_accessors {
    ($create:ident, $put:ident, $get:ident, $update_ro:ident, $value:path, $ty:ty, $attr_type:expr) => {
        /// Creates the attribute, rejecting a default outside `ranges`.
        pub fn $create(
            &self,
            key: impl Into<ArcStr>,
            default: $ty,
            ranges: Range,
            flags: AttrFlags,
            description: impl Into<ArcStr>,
        ) -> Result<()> {
            self.node.create_attribute(key, $attr_type, $value(default), ranges, flags, description)
        }

        /// Writes a new value, rejecting it if out of range or if the
        /// attribute is `READ_ONLY`.
        pub fn $put(&self, key: &str, value: $ty) -> Result<bool> {
            self.node.put_attribute(key, $attr_type, $value(value))
        }

        pub fn $get(&self, key: &str) -> Result<$ty> {
            match self.node.get_attribute(key, $attr_type)? {
                $value(v) => Ok(v),
                other => unreachable!("get_attribute returned {:?} for a {} key", other, $attr_type),
            }
        }

        /// Like `$put`, but bypasses the `READ_ONLY` guard (§4.C) for
        /// privileged writers such as updaters or in-process telemetry.
        pub fn $update_ro(&self, key: &str, value: $ty) -> Result<bool> {
            self.node.update_read_only(key, $attr_type, $value(value))
        }
    };
}

impl Facade {
    typed_accessors!(create_bool, put_bool, get_bool, update_read_only_bool, Value::Bool, bool, AttrType::Bool);
    typed_accessors!(create_int, put_int, get_int, update_read_only_int, Value::Int, i32, AttrType::Int);
    typed_accessors!(create_long, put_long, get_long, update_read_only_long, Value::Long, i64, AttrType::Long);
    typed_accessors!(create_float, put_float, get_float, update_read_only_float, Value::Float, f32, AttrType::Float);
    typed_accessors!(
        create_double,
        put_double,
        get_double,
        update_read_only_double,
        Value::Double,
        f64,
        AttrType::Double
    );

    /// String variant, written by hand rather than through the macro so
    /// callers can pass a plain `&str` without naming `ArcStr` themselves.
    pub fn create_string(
        &self,
        key: impl Into<ArcStr>,
        default: impl Into<ArcStr>,
        ranges: Range,
        flags: AttrFlags,
        description: impl Into<ArcStr>,
    ) -> Result<()> {
        self.node.create_attribute(key, AttrType::String, Value::String(default.into()), ranges, flags, description)
    }

    pub fn put_string(&self, key: &str, value: impl Into<ArcStr>) -> Result<bool> {
        self.node.put_attribute(key, AttrType::String, Value::String(value.into()))
    }

    pub fn get_string(&self, key: &str) -> Result<ArcStr> {
        match self.node.get_attribute(key, AttrType::String)? {
            Value::String(s) => Ok(s),
            other => unreachable!("get_attribute returned {:?} for a string key", other),
        }
    }

    pub fn update_read_only_string(&self, key: &str, value: impl Into<ArcStr>) -> Result<bool> {
        self.node.update_read_only(key, AttrType::String, Value::String(value.into()))
    }

    /// Read-only generation counter for `(key, attr_type)` (SPEC_FULL.md
    /// §3 supplement): incremented on every successful PUT/`updateReadOnly`
    /// that actually changed the stored value, so a module can cheaply
    /// detect a missed update by comparing against a previously observed
    /// generation instead of diffing the value itself.
    pub fn generation(&self, key: &str, attr_type: AttrType) -> Result<u64> {
        Ok(self.node.get_attribute_record(key, attr_type)?.generation)
    }
}
