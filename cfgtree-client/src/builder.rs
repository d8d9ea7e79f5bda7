//! Single declarative module registration step (§4.F), mirroring
//! `caer-sdk/BaseModule.hpp`'s `ConfigOption` factories: a module lists its
//! options once at startup rather than issuing one `create_attribute` call
//! per option by hand.

use arcstr::ArcStr;
use cfgtree_core::{AttrFlags, AttrType, Range, Result, Tree, Value};

use crate::facade::Facade;

/// One attribute a module wants under its own subtree.
pub struct AttributeSpec {
    key: ArcStr,
    attr_type: AttrType,
    default: Value,
    ranges: Range,
    flags: AttrFlags,
    description: ArcStr,
}

impl AttributeSpec {
    pub fn new(
        key: impl Into<ArcStr>,
        default: Value,
        ranges: Range,
        flags: AttrFlags,
        description: impl Into<ArcStr>,
    ) -> AttributeSpec {
        AttributeSpec {
            key: key.into(),
            attr_type: default.attr_type(),
            default,
            ranges,
            flags,
            description: description.into(),
        }
    }
}

/// Builds a module's option set under `/modules/<name>/` in one step, the
/// Rust counterpart of `caer-sdk`'s `ConfigOption::fractionalOption`/
/// `integerOption`/... factories called in a module's `init`.
pub struct ModuleBuilder {
    name: ArcStr,
    attributes: Vec<AttributeSpec>,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<ArcStr>) -> ModuleBuilder {
        ModuleBuilder { name: name.into(), attributes: Vec::new() }
    }

    pub fn attribute(mut self, spec: AttributeSpec) -> ModuleBuilder {
        self.attributes.push(spec);
        self
    }

    /// Resolves `/modules/<name>/`, creating every declared attribute under
    /// it, and returns a `Facade` over that node.
    pub fn build(self, tree: &Tree) -> Result<Facade> {
        let path = format!("/modules/{}/", self.name);
        let node = tree.get_node(&path)?;
        for spec in self.attributes {
            node.create_attribute(spec.key, spec.attr_type, spec.default, spec.ranges, spec.flags, spec.description)?;
        }
        Ok(Facade::new(node))
    }
}
