//! Stable textual form for a subtree (§4.D): `<dv>` export/import used for
//! persistence, built on `quick-xml` the same way
//! `johnstonskj-rust-upnp`/`deuxfleurs-org-aerogramme` use it for their own
//! wire-facing XML documents.

use std::io::Cursor;

use arcstr::ArcStr;
use cfgtree_core::helpers::{string_to_type, string_to_value, type_to_string, value_to_string};
use cfgtree_core::{AttrFlags, Error, Node, Result, Tree};
use log::warn;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

/// Serializes the subtree rooted at `node` into the canonical `<dv>` form.
/// Attributes flagged `NO_EXPORT`, and `NOTIFY_ONLY` attributes (which have
/// no stored value to export), are omitted.
pub fn export(node: &Node) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Start(BytesStart::new("dv"))).map_err(xml_err)?;
    write_node(&mut writer, node)?;
    writer.write_event(Event::End(BytesEnd::new("dv"))).map_err(xml_err)?;
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| Error::invalid_value(format!("non-UTF8 XML output: {e}")))
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: &Node) -> Result<()> {
    let mut start = BytesStart::new("node");
    start.push_attribute(("name", node.name().as_str()));
    start.push_attribute(("path", node.path().as_str()));
    writer.write_event(Event::Start(start)).map_err(xml_err)?;

    for (key, attr_type) in node.get_attribute_keys() {
        let rec = node.get_attribute_record(&key, attr_type)?;
        if rec.flags.contains(AttrFlags::NO_EXPORT) || rec.flags.contains(AttrFlags::NOTIFY_ONLY) {
            continue;
        }
        let mut attr = BytesStart::new("attr");
        attr.push_attribute(("key", key.as_str()));
        attr.push_attribute(("type", type_to_string(attr_type).as_str()));
        writer.write_event(Event::Start(attr)).map_err(xml_err)?;
        writer
            .write_event(Event::Text(BytesText::new(&value_to_string(&rec.value))))
            .map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("attr"))).map_err(xml_err)?;
    }

    for child in node.get_children() {
        write_node(writer, &child)?;
    }

    writer.write_event(Event::End(BytesEnd::new("node"))).map_err(xml_err)
}

/// Outcome of a lenient (`strict=false`) import: how many attribute values
/// were applied, and a diagnostic per skipped offender. A strict import
/// never produces one of these; it returns the first error instead.
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    pub applied: u32,
    pub skipped: Vec<ArcStr>,
}

/// Imports a previously exported document against `tree`. Nodes are
/// resolved (and materialized, per `Tree::get_node`'s usual lifecycle) by
/// the canonical `path` attribute on each `<node>` element; import never
/// calls `create_attribute` — only values of already-existing attributes are
/// PUT, so ranges/flags/description are whatever the node already has
/// (§4.D: "existing attributes retain their creation metadata").
///
/// `strict=true` surfaces the first failure (unknown attribute, type
/// mismatch, out-of-range, read-only) as an error. `strict=false` skips
/// offenders, logs them, and keeps going.
pub fn import(tree: &Tree, xml: &str, strict: bool) -> Result<ImportReport> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut report = ImportReport::default();
    let mut node_stack: Vec<std::sync::Arc<Node>> = Vec::new();
    let mut pending: Option<(ArcStr, cfgtree_core::AttrType)> = None;
    let mut pending_text = String::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => match e.name().as_ref() {
                b"dv" => {}
                b"node" => {
                    let path = required_attr(&e, "path")?;
                    let node = tree.get_node(&path)?;
                    node_stack.push(node);
                }
                b"attr" => {
                    let key = ArcStr::from(required_attr(&e, "key")?);
                    let ty = string_to_type(&required_attr(&e, "type")?)?;
                    pending = Some((key, ty));
                    pending_text.clear();
                }
                _ => {}
            },
            Event::Text(t) => {
                pending_text.push_str(&t.unescape().map_err(xml_err)?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"node" => {
                    node_stack.pop();
                }
                b"attr" => {
                    if let Some((key, ty)) = pending.take() {
                        let node = node_stack
                            .last()
                            .ok_or_else(|| Error::invalid_value("<attr> outside any <node>"))?;
                        let outcome = apply_one(node, &key, ty, &pending_text);
                        match outcome {
                            Ok(()) => report.applied += 1,
                            Err(e) if strict => return Err(e),
                            Err(e) => {
                                let diag = ArcStr::from(format!(
                                    "{}{key} ({ty}): {e}",
                                    node.path()
                                ));
                                warn!("skipping offending attribute during import: {diag}");
                                report.skipped.push(diag);
                            }
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(report)
}

fn apply_one(node: &Node, key: &ArcStr, ty: cfgtree_core::AttrType, text: &str) -> Result<()> {
    if !node.exists(key, ty) {
        return Err(Error::not_found(format!("{}{key}", node.path())));
    }
    let value = string_to_value(ty, text)?;
    node.put_attribute(key, ty, value)?;
    Ok(())
}

fn required_attr(e: &BytesStart, name: &str) -> Result<String> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        if attr.key.as_ref() == name.as_bytes() {
            return attr
                .unescape_value()
                .map(|v| v.into_owned())
                .map_err(xml_err);
        }
    }
    Err(Error::invalid_value(format!("missing required XML attribute: {name}")))
}

fn xml_err(e: quick_xml::Error) -> Error {
    Error::IoError(ArcStr::from(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgtree_core::{AttrType, Range, Value};

    #[test]
    fn export_import_round_trip() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        m.create_attribute(
            "n",
            AttrType::Int,
            Value::Int(5),
            Range::Int { min: 0, max: 10 },
            AttrFlags::NORMAL,
            "count",
        )
        .unwrap();
        m.put_attribute("n", AttrType::Int, Value::Int(7)).unwrap();

        let xml = export(&tree.root()).unwrap();
        assert!(xml.contains("key=\"n\""));

        let tree2 = Tree::new();
        let m2 = tree2.get_node("/m/").unwrap();
        m2.create_attribute(
            "n",
            AttrType::Int,
            Value::Int(5),
            Range::Int { min: 0, max: 10 },
            AttrFlags::NORMAL,
            "count",
        )
        .unwrap();
        let report = import(&tree2, &xml, true).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(m2.get_attribute("n", AttrType::Int).unwrap(), Value::Int(7));
    }

    #[test]
    fn no_export_and_notify_only_are_omitted() {
        let tree = Tree::new();
        let m = tree.get_node("/m/").unwrap();
        m.create_attribute(
            "secret",
            AttrType::String,
            Value::String(ArcStr::from("s")),
            Range::unbounded(AttrType::String),
            AttrFlags::NO_EXPORT,
            "",
        )
        .unwrap();
        m.create_attribute(
            "tick",
            AttrType::Int,
            Value::Int(0),
            Range::unbounded(AttrType::Int),
            AttrFlags::NOTIFY_ONLY,
            "",
        )
        .unwrap();
        let xml = export(&tree.root()).unwrap();
        assert!(!xml.contains("secret"));
        assert!(!xml.contains("tick"));
    }

    #[test]
    fn lenient_import_skips_unknown_attribute() {
        let tree = Tree::new();
        let xml = r#"<dv><node name="m" path="/m/"><attr key="ghost" type="INT">1</attr></node></dv>"#;
        let report = import(&tree, xml, false).unwrap();
        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn strict_import_surfaces_unknown_attribute() {
        let tree = Tree::new();
        let xml = r#"<dv><node name="m" path="/m/"><attr key="ghost" type="INT">1</attr></node></dv>"#;
        assert!(import(&tree, xml, true).is_err());
    }
}
