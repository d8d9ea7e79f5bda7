//! Pure type/flags/range ↔ string converters (§4.G). No hidden state; these
//! are the canonical basis used by the XML and RCP layers for every
//! textual attribute representation.

use arcstr::ArcStr;

pub use crate::flags::{flags_to_string, string_to_flags};
pub use crate::range::{ranges_to_string, string_to_ranges};
pub use crate::value::{string_to_value, value_to_string};
use crate::{error::Error, value::AttrType};

/// `typeToString` (§4.A).
pub fn type_to_string(ty: AttrType) -> ArcStr {
    ArcStr::from(ty.to_string())
}

/// `stringToType` (§4.A): the inverse of `type_to_string`.
pub fn string_to_type(s: &str) -> Result<AttrType, Error> {
    match s {
        "UNKNOWN" => Ok(AttrType::Unknown),
        "BOOL" => Ok(AttrType::Bool),
        "INT" => Ok(AttrType::Int),
        "LONG" => Ok(AttrType::Long),
        "FLOAT" => Ok(AttrType::Float),
        "DOUBLE" => Ok(AttrType::Double),
        "STRING" => Ok(AttrType::String),
        other => Err(Error::invalid_value(format!("unknown type name: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_round_trip() {
        for ty in [
            AttrType::Unknown,
            AttrType::Bool,
            AttrType::Int,
            AttrType::Long,
            AttrType::Float,
            AttrType::Double,
            AttrType::String,
        ] {
            let s = type_to_string(ty);
            assert_eq!(string_to_type(&s).unwrap(), ty);
        }
    }
}
