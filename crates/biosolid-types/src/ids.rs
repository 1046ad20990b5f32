//! Type-safe identifier wrappers around registry codes.
//!
//! Plants, farms, and rainfall zones are identified by short codes taken from
//! the registries (for example `STP_TVM` or `F_0042`). Wrapping each in its
//! own newtype prevents a farm code from being passed where a plant code is
//! expected. All identifiers order lexicographically, which fixes the
//! iteration order of every `BTreeMap` keyed by them.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a registry code.
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            /// Return the registry code as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }
    };
}

define_id! {
    /// Identifier of a sewage treatment plant (STP).
    PlantId
}

define_id! {
    /// Identifier of a farm receiving deliveries.
    FarmId
}

define_id! {
    /// Identifier of a rainfall forecast zone shared by several farms.
    ZoneId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_code() {
        let id = PlantId::new("STP_TVM");
        assert_eq!(id.to_string(), "STP_TVM");
        assert_eq!(id.as_str(), "STP_TVM");
    }

    #[test]
    fn ids_order_lexicographically() {
        let mut farms = vec![FarmId::from("F_010"), FarmId::from("F_002"), FarmId::from("F_001")];
        farms.sort();
        let codes: Vec<&str> = farms.iter().map(FarmId::as_str).collect();
        assert_eq!(codes, ["F_001", "F_002", "F_010"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        let zone = ZoneId::new("Kollam");
        let json = serde_json::to_string(&zone).unwrap();
        assert_eq!(json, "\"Kollam\"");
        let back: ZoneId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, zone);
    }
}
