//! Attribute flag bitset (§3, §6): wire-stable bit values.

use arcstr::ArcStr;
use bitflags::bitflags;

use crate::error::Error;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttrFlags: i32 {
        const NORMAL      = 0;
        const READ_ONLY   = 1;
        const NOTIFY_ONLY = 2;
        const NO_EXPORT   = 4;
    }
}

impl Default for AttrFlags {
    fn default() -> Self {
        AttrFlags::NORMAL
    }
}

/// `flagsToString` (§4.A): a `|`-joined list of flag names, `NORMAL` if none
/// are set.
pub fn flags_to_string(flags: AttrFlags) -> ArcStr {
    if flags.is_empty() {
        return ArcStr::from("NORMAL");
    }
    let mut parts = Vec::new();
    if flags.contains(AttrFlags::READ_ONLY) {
        parts.push("READ_ONLY");
    }
    if flags.contains(AttrFlags::NOTIFY_ONLY) {
        parts.push("NOTIFY_ONLY");
    }
    if flags.contains(AttrFlags::NO_EXPORT) {
        parts.push("NO_EXPORT");
    }
    ArcStr::from(parts.join("|"))
}

/// `stringToFlags` (§4.A): the inverse of `flags_to_string`.
pub fn string_to_flags(s: &str) -> Result<AttrFlags, Error> {
    let mut flags = AttrFlags::NORMAL;
    if s.is_empty() || s == "NORMAL" {
        return Ok(flags);
    }
    for part in s.split('|') {
        match part {
            "NORMAL" => {}
            "READ_ONLY" => flags |= AttrFlags::READ_ONLY,
            "NOTIFY_ONLY" => flags |= AttrFlags::NOTIFY_ONLY,
            "NO_EXPORT" => flags |= AttrFlags::NO_EXPORT,
            other => return Err(Error::invalid_value(format!("unknown flag: {other}"))),
        }
    }
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let flags = AttrFlags::READ_ONLY | AttrFlags::NO_EXPORT;
        let s = flags_to_string(flags);
        assert_eq!(string_to_flags(&s).unwrap(), flags);
    }

    #[test]
    fn wire_values_match_spec() {
        assert_eq!(AttrFlags::NORMAL.bits(), 0);
        assert_eq!(AttrFlags::READ_ONLY.bits(), 1);
        assert_eq!(AttrFlags::NOTIFY_ONLY.bits(), 2);
        assert_eq!(AttrFlags::NO_EXPORT.bits(), 4);
    }
}
