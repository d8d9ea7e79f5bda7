//! Tagged attribute value union and its string conversions (§4.A).

use std::fmt;

use arcstr::ArcStr;

use crate::error::{Error, Result};

/// Attribute type discriminant. Numeric values are wire-stable (§6) and MUST
/// NOT be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i8)]
pub enum AttrType {
    Unknown = -1,
    Bool = 0,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    String = 7,
}

impl AttrType {
    pub fn wire(self) -> i8 {
        self as i8
    }

    pub fn from_wire(code: i8) -> Result<Self> {
        match code {
            -1 => Ok(AttrType::Unknown),
            0 => Ok(AttrType::Bool),
            3 => Ok(AttrType::Int),
            4 => Ok(AttrType::Long),
            5 => Ok(AttrType::Float),
            6 => Ok(AttrType::Double),
            7 => Ok(AttrType::String),
            other => Err(Error::invalid_value(format!("unknown type code {other}"))),
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttrType::Unknown => "UNKNOWN",
            AttrType::Bool => "BOOL",
            AttrType::Int => "INT",
            AttrType::Long => "LONG",
            AttrType::Float => "FLOAT",
            AttrType::Double => "DOUBLE",
            AttrType::String => "STRING",
        })
    }
}

/// A concrete attribute value. `String` values carry no interior NUL bytes;
/// callers constructing one from untrusted input should validate that
/// themselves (the tree does not scan values for NULs).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(ArcStr),
}

impl Value {
    pub fn attr_type(&self) -> AttrType {
        match self {
            Value::Bool(_) => AttrType::Bool,
            Value::Int(_) => AttrType::Int,
            Value::Long(_) => AttrType::Long,
            Value::Float(_) => AttrType::Float,
            Value::Double(_) => AttrType::Double,
            Value::String(_) => AttrType::String,
        }
    }

    /// NaN defaults/values are forbidden (spec.md §9 open question): NaN
    /// compares unequal to itself and would break the "modified iff changed"
    /// rule in `Node::put_attribute`.
    pub fn is_finite_numeric(&self) -> bool {
        match self {
            Value::Float(v) => v.is_finite(),
            Value::Double(v) => v.is_finite(),
            _ => true,
        }
    }

    /// Bit-identical comparison used to decide whether a PUT actually
    /// modified the stored value. Plain `==` would already do this for our
    /// representation (no NaNs are ever stored), but spelling it out keeps
    /// the invariant from spec.md §4.B explicit at the call site.
    pub fn same_bits(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

/// Canonical round-trippable string form of a value (§4.A). Rust's float
/// `Display` already emits the shortest string that round-trips, which
/// satisfies the ">=9/>=17 digit" requirement without hand-rolled formatting.
pub fn value_to_string(value: &Value) -> ArcStr {
    match value {
        Value::Bool(b) => ArcStr::from(if *b { "true" } else { "false" }),
        Value::Int(v) => ArcStr::from(v.to_string()),
        Value::Long(v) => ArcStr::from(v.to_string()),
        Value::Float(v) => ArcStr::from(v.to_string()),
        Value::Double(v) => ArcStr::from(v.to_string()),
        Value::String(s) => s.clone(),
    }
}

/// Parse `s` as a value of `ty`. Fails with `InvalidValue` on malformed
/// input; the caller is responsible for range-checking the result.
pub fn string_to_value(ty: AttrType, s: &str) -> Result<Value> {
    match ty {
        AttrType::Bool => match s {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(Error::invalid_value(format!("not a bool: {other}"))),
        },
        AttrType::Int => s
            .parse::<i32>()
            .map(Value::Int)
            .map_err(|e| Error::invalid_value(format!("not an int: {e}"))),
        AttrType::Long => s
            .parse::<i64>()
            .map(Value::Long)
            .map_err(|e| Error::invalid_value(format!("not a long: {e}"))),
        AttrType::Float => {
            let v = s
                .parse::<f32>()
                .map_err(|e| Error::invalid_value(format!("not a float: {e}")))?;
            if !v.is_finite() {
                return Err(Error::invalid_value("NaN/infinite float is not allowed"));
            }
            Ok(Value::Float(v))
        }
        AttrType::Double => {
            let v = s
                .parse::<f64>()
                .map_err(|e| Error::invalid_value(format!("not a double: {e}")))?;
            if !v.is_finite() {
                return Err(Error::invalid_value("NaN/infinite double is not allowed"));
            }
            Ok(Value::Double(v))
        }
        AttrType::String => Ok(Value::String(ArcStr::from(s))),
        AttrType::Unknown => Err(Error::invalid_value("cannot parse an UNKNOWN-typed value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bool_round_trip() {
        for b in [true, false] {
            let v = Value::Bool(b);
            let s = value_to_string(&v);
            assert_eq!(string_to_value(AttrType::Bool, &s).unwrap(), v);
        }
    }

    #[test]
    fn rejects_nan() {
        assert!(string_to_value(AttrType::Float, "NaN").is_err());
        assert!(string_to_value(AttrType::Double, "inf").is_err());
    }

    proptest! {
        #[test]
        fn int_round_trip(n: i32) {
            let v = Value::Int(n);
            let s = value_to_string(&v);
            prop_assert_eq!(string_to_value(AttrType::Int, &s).unwrap(), v);
        }

        #[test]
        fn long_round_trip(n: i64) {
            let v = Value::Long(n);
            let s = value_to_string(&v);
            prop_assert_eq!(string_to_value(AttrType::Long, &s).unwrap(), v);
        }

        #[test]
        fn float_round_trip(n in any::<f32>().prop_filter("finite", |v| v.is_finite())) {
            let v = Value::Float(n);
            let s = value_to_string(&v);
            let back = string_to_value(AttrType::Float, &s).unwrap();
            prop_assert!(v.same_bits(&back));
        }

        #[test]
        fn double_round_trip(n in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let v = Value::Double(n);
            let s = value_to_string(&v);
            let back = string_to_value(AttrType::Double, &s).unwrap();
            prop_assert!(v.same_bits(&back));
        }

        #[test]
        fn string_round_trip(s in "[^\\x00]*") {
            let v = Value::String(ArcStr::from(s.as_str()));
            let round = value_to_string(&v);
            prop_assert_eq!(round.as_str(), s.as_str());
            let back = string_to_value(AttrType::String, &round).unwrap();
            prop_assert_eq!(back, v);
        }
    }
}
