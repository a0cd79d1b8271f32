//! Strongly-typed identifiers for domain entities.
//!
//! The `Display` form (`exe_<uuid>`) only contains ASCII letters, digits,
//! `_` and `-`, so it is safe to use as a directory or file name.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }
    };
}

define_id!(TriggerId, "trg");
define_id!(ExecutionId, "exe");
define_id!(LogId, "log");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_id_display() {
        let id = ExecutionId::new();
        let s = id.to_string();
        assert!(s.starts_with("exe_"));
        assert!(
            s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        );
    }

    #[test]
    fn test_trigger_id_parse() {
        let id = TriggerId::new();
        let parsed: TriggerId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);

        let bare: TriggerId = id.as_uuid().to_string().parse().unwrap();
        assert_eq!(id, bare);
    }
}
