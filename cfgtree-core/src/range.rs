//! Per-type attribute ranges (§3, §4.A).

use arcstr::ArcStr;

use crate::error::Error;
use crate::value::{AttrType, Value};

/// An inclusive range for numerics, a byte-length range for strings, or
/// nothing at all for BOOL (both bounds are zero by convention, per
/// spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Range {
    None,
    Int { min: i32, max: i32 },
    Long { min: i64, max: i64 },
    Float { min: f32, max: f32 },
    Double { min: f64, max: f64 },
    /// Length bounds in bytes, not chars.
    String { min_len: u32, max_len: u32 },
}

impl Range {
    pub fn unbounded(ty: AttrType) -> Range {
        match ty {
            AttrType::Bool | AttrType::Unknown => Range::None,
            AttrType::Int => Range::Int { min: i32::MIN, max: i32::MAX },
            AttrType::Long => Range::Long { min: i64::MIN, max: i64::MAX },
            AttrType::Float => Range::Float { min: f32::MIN, max: f32::MAX },
            AttrType::Double => Range::Double { min: f64::MIN, max: f64::MAX },
            AttrType::String => Range::String { min_len: 0, max_len: u32::MAX },
        }
    }

    pub fn attr_type(&self) -> Option<AttrType> {
        match self {
            Range::None => None,
            Range::Int { .. } => Some(AttrType::Int),
            Range::Long { .. } => Some(AttrType::Long),
            Range::Float { .. } => Some(AttrType::Float),
            Range::Double { .. } => Some(AttrType::Double),
            Range::String { .. } => Some(AttrType::String),
        }
    }

    /// Validates `value` is of a matching type and within bounds.
    pub fn contains(&self, value: &Value) -> Result<(), Error> {
        match (self, value) {
            (Range::None, Value::Bool(_)) => Ok(()),
            (Range::Int { min, max }, Value::Int(v)) => {
                if v >= min && v <= max {
                    Ok(())
                } else {
                    Err(Error::OutOfRange { key: ArcStr::new() })
                }
            }
            (Range::Long { min, max }, Value::Long(v)) => {
                if v >= min && v <= max {
                    Ok(())
                } else {
                    Err(Error::OutOfRange { key: ArcStr::new() })
                }
            }
            (Range::Float { min, max }, Value::Float(v)) => {
                if v >= min && v <= max {
                    Ok(())
                } else {
                    Err(Error::OutOfRange { key: ArcStr::new() })
                }
            }
            (Range::Double { min, max }, Value::Double(v)) => {
                if v >= min && v <= max {
                    Ok(())
                } else {
                    Err(Error::OutOfRange { key: ArcStr::new() })
                }
            }
            (Range::String { min_len, max_len }, Value::String(v)) => {
                let len = v.as_bytes().len() as u32;
                if len >= *min_len && len <= *max_len {
                    Ok(())
                } else {
                    Err(Error::OutOfRange { key: ArcStr::new() })
                }
            }
            _ => Err(Error::TypeMismatch {
                key: ArcStr::new(),
                expected: self.attr_type().unwrap_or(AttrType::Unknown),
                actual: value.attr_type(),
            }),
        }
    }

    /// Like `contains`, but stamps the real attribute key into the error on
    /// failure instead of leaving it empty.
    pub fn contains_for(&self, key: &ArcStr, value: &Value) -> Result<(), Error> {
        self.contains(value).map_err(|e| match e {
            Error::OutOfRange { .. } => Error::OutOfRange { key: key.clone() },
            Error::TypeMismatch { expected, actual, .. } => {
                Error::TypeMismatch { key: key.clone(), expected, actual }
            }
            other => other,
        })
    }
}

/// `rangesToString` (§4.A): a comma-separated `min,max` pair, empty for BOOL.
pub fn ranges_to_string(range: &Range) -> ArcStr {
    match range {
        Range::None => ArcStr::new(),
        Range::Int { min, max } => ArcStr::from(format!("{min},{max}")),
        Range::Long { min, max } => ArcStr::from(format!("{min},{max}")),
        Range::Float { min, max } => ArcStr::from(format!("{min},{max}")),
        Range::Double { min, max } => ArcStr::from(format!("{min},{max}")),
        Range::String { min_len, max_len } => ArcStr::from(format!("{min_len},{max_len}")),
    }
}

/// `stringToRanges` (§4.A): the inverse of `ranges_to_string` for a given
/// attribute type.
pub fn string_to_ranges(ty: AttrType, s: &str) -> Result<Range, Error> {
    if ty == AttrType::Bool || ty == AttrType::Unknown {
        return Ok(Range::None);
    }
    let (lo, hi) = s
        .split_once(',')
        .ok_or_else(|| Error::invalid_value(format!("malformed range: {s}")))?;
    match ty {
        AttrType::Int => Ok(Range::Int {
            min: lo.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
            max: hi.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
        }),
        AttrType::Long => Ok(Range::Long {
            min: lo.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
            max: hi.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
        }),
        AttrType::Float => Ok(Range::Float {
            min: lo.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
            max: hi.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
        }),
        AttrType::Double => Ok(Range::Double {
            min: lo.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
            max: hi.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
        }),
        AttrType::String => Ok(Range::String {
            min_len: lo.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
            max_len: hi.parse().map_err(|_| Error::invalid_value(format!("bad range: {s}")))?,
        }),
        AttrType::Bool | AttrType::Unknown => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let r = Range::Int { min: 0, max: 10 };
        let s = ranges_to_string(&r);
        assert_eq!(string_to_ranges(AttrType::Int, &s).unwrap(), r);
    }

    #[test]
    fn rejects_out_of_range() {
        let r = Range::Int { min: 0, max: 10 };
        assert!(r.contains(&Value::Int(11)).is_err());
        assert!(r.contains(&Value::Int(7)).is_ok());
    }
}
