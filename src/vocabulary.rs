//! Catalog Vocabulary Lookup Tables
//!
//! Fixed enumerations used by the catalog: hardiness zones, plant types,
//! functional groups and sun exposure.
//!
//! Every table is addressed by its wire code (the value the catalog API and
//! the search query string use). Lookups return `Option` so that an unknown
//! code coming from the API or a shared link is a "not found", never a panic.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Sentinel used by filter-editing surfaces to mean "all values".
pub const ALL_SENTINEL: &str = ".";

/// Normalize a raw choice from a form or a query string.
///
/// The "all" sentinel and blank strings are equivalent to no choice at all.
pub fn choice(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ALL_SENTINEL {
        None
    } else {
        Some(trimmed)
    }
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => ($code:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            /// Every value, in enumeration order
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Wire code
            pub fn code(self) -> &'static str {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            /// Human readable label
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Look up a value by wire code (exact match after trimming).
            pub fn from_code(code: &str) -> Option<Self> {
                match code.trim() {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = String::deserialize(deserializer)?;
                $name::from_code(&code).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "unknown {} code: {}",
                        stringify!($name),
                        code
                    ))
                })
            }
        }
    };
}

// ============================================================================
// Hardiness Zones
// ============================================================================

vocabulary! {
    /// Plant hardiness zone (expected winter-survival range)
    HardinessZone {
        Z0a => ("0a", "Zone 0a"),
        Z0b => ("0b", "Zone 0b"),
        Z1a => ("1a", "Zone 1a"),
        Z1b => ("1b", "Zone 1b"),
        Z2a => ("2a", "Zone 2a"),
        Z2b => ("2b", "Zone 2b"),
        Z3a => ("3a", "Zone 3a"),
        Z3b => ("3b", "Zone 3b"),
        Z4a => ("4a", "Zone 4a"),
        Z4b => ("4b", "Zone 4b"),
        Z5a => ("5a", "Zone 5a"),
        Z5b => ("5b", "Zone 5b"),
        Z6a => ("6a", "Zone 6a"),
        Z6b => ("6b", "Zone 6b"),
        Z7a => ("7a", "Zone 7a"),
        Z7b => ("7b", "Zone 7b"),
        Z8a => ("8a", "Zone 8a"),
        Z8b => ("8b", "Zone 8b"),
        Z9a => ("9a", "Zone 9a"),
    }
}

// ============================================================================
// Plant Types
// ============================================================================

vocabulary! {
    /// Horticultural plant type
    PlantType {
        Conifer => ("conifer", "Conifer"),
        DeciduousTree => ("deciduous_tree", "Deciduous tree"),
        EvergreenShrub => ("evergreen_shrub", "Evergreen shrub"),
        DeciduousShrub => ("deciduous_shrub", "Deciduous shrub"),
        Climber => ("climber", "Climbing plant"),
        Perennial => ("perennial", "Perennial"),
        Annual => ("annual", "Annual"),
        Grass => ("grass", "Ornamental grass"),
        Fern => ("fern", "Fern"),
        Groundcover => ("groundcover", "Groundcover"),
        Bulb => ("bulb", "Bulb"),
        Aquatic => ("aquatic", "Aquatic plant"),
        Rose => ("rose", "Rose"),
        FruitPlant => ("fruit", "Fruit plant"),
    }
}

impl PlantType {
    /// Woody types are the ones classified into functional groups.
    pub fn is_woody(self) -> bool {
        matches!(
            self,
            PlantType::Conifer
                | PlantType::DeciduousTree
                | PlantType::EvergreenShrub
                | PlantType::DeciduousShrub
        )
    }
}

// ============================================================================
// Functional Groups
// ============================================================================

vocabulary! {
    /// Functional group of urban-forest species, by shared ecological traits
    FunctionalGroup {
        G1A => ("1A", "Drought-tolerant conifers"),
        G1B => ("1B", "Shade-tolerant conifers"),
        G2A => ("2A", "Large-seeded, drought-tolerant broadleaves"),
        G2B => ("2B", "Large-seeded, shade-tolerant broadleaves"),
        G2C => ("2C", "Large-seeded, flood-tolerant broadleaves"),
        G3A => ("3A", "Small-seeded, shade-tolerant broadleaves"),
        G3B => ("3B", "Small-seeded, pioneer broadleaves"),
        G4A => ("4A", "Wind-dispersed, flood-tolerant broadleaves"),
        G4B => ("4B", "Wind-dispersed, fast-growing broadleaves"),
        G5 => ("5", "Small trees and tall shrubs"),
    }
}

impl FunctionalGroup {
    /// Longer description shown on the functional-group reference page
    pub fn description(self) -> &'static str {
        match self {
            FunctionalGroup::G1A => {
                "Conifers of dry, open sites; drought tolerant, shade intolerant, ectomycorrhizal."
            }
            FunctionalGroup::G1B => {
                "Conifers of moist, shaded sites; shade tolerant, sensitive to drought."
            }
            FunctionalGroup::G2A => {
                "Broadleaves with heavy, animal-dispersed seeds; deep rooted and drought tolerant."
            }
            FunctionalGroup::G2B => {
                "Broadleaves with heavy seeds; shade tolerant and long lived."
            }
            FunctionalGroup::G2C => {
                "Broadleaves with heavy seeds; tolerate periodic flooding."
            }
            FunctionalGroup::G3A => {
                "Broadleaves with light seeds; shade tolerant, arbuscular mycorrhizal."
            }
            FunctionalGroup::G3B => {
                "Broadleaves with light seeds; early-successional and shade intolerant."
            }
            FunctionalGroup::G4A => {
                "Wind-dispersed broadleaves of wet sites; flood tolerant."
            }
            FunctionalGroup::G4B => {
                "Wind-dispersed broadleaves; fast growing, short lived, shade intolerant."
            }
            FunctionalGroup::G5 => {
                "Small trees and tall shrubs of the understory and urban edges."
            }
        }
    }

    /// Plant types whose species typically fall into this group
    pub fn typical_types(self) -> &'static [PlantType] {
        match self {
            FunctionalGroup::G1A | FunctionalGroup::G1B => &[PlantType::Conifer],
            FunctionalGroup::G5 => &[
                PlantType::DeciduousTree,
                PlantType::DeciduousShrub,
                PlantType::EvergreenShrub,
            ],
            _ => &[PlantType::DeciduousTree],
        }
    }
}

// ============================================================================
// Sun Exposure
// ============================================================================

vocabulary! {
    /// Sun exposure a plant tolerates
    SunExposure {
        Full => ("full", "Full sun"),
        Partial => ("partial", "Partial shade"),
        Shade => ("shade", "Shade"),
    }
}

// ============================================================================
// LOOKUP FUNCTIONS
// ============================================================================

/// Label for a hardiness zone code, `None` when the code is unknown.
pub fn zone_label(code: &str) -> Option<&'static str> {
    HardinessZone::from_code(code).map(HardinessZone::label)
}

/// Label for a plant type code, `None` when the code is unknown.
pub fn type_label(code: &str) -> Option<&'static str> {
    PlantType::from_code(code).map(PlantType::label)
}

/// Label for a functional group code, `None` when the code is unknown.
pub fn functional_group_label(code: &str) -> Option<&'static str> {
    FunctionalGroup::from_code(code).map(FunctionalGroup::label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_sizes() {
        assert_eq!(HardinessZone::ALL.len(), 19);
        assert_eq!(PlantType::ALL.len(), 14);
        assert_eq!(FunctionalGroup::ALL.len(), 10);
        assert_eq!(SunExposure::ALL.len(), 3);
    }

    #[test]
    fn test_codes_are_unique_and_resolvable() {
        for zone in HardinessZone::ALL {
            assert_eq!(HardinessZone::from_code(zone.code()), Some(*zone));
        }
        for t in PlantType::ALL {
            assert_eq!(PlantType::from_code(t.code()), Some(*t));
        }
        for g in FunctionalGroup::ALL {
            assert_eq!(FunctionalGroup::from_code(g.code()), Some(*g));
            assert!(!g.description().is_empty());
        }
    }

    #[test]
    fn test_unknown_codes_are_not_found() {
        assert_eq!(HardinessZone::from_code("9b"), None);
        assert_eq!(PlantType::from_code("cactus"), None);
        assert_eq!(FunctionalGroup::from_code("6"), None);
        assert_eq!(zone_label("10a"), None);
        assert_eq!(type_label(""), None);
        assert_eq!(functional_group_label("2a"), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(zone_label("4b"), Some("Zone 4b"));
        assert_eq!(type_label("conifer"), Some("Conifer"));
        assert_eq!(functional_group_label("5"), Some("Small trees and tall shrubs"));
    }

    #[test]
    fn test_choice_sentinel() {
        assert_eq!(choice("."), None);
        assert_eq!(choice(""), None);
        assert_eq!(choice("  "), None);
        assert_eq!(choice(" loam "), Some("loam"));
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&FunctionalGroup::G2C).unwrap();
        assert_eq!(json, "\"2C\"");
        let zone: HardinessZone = serde_json::from_str("\"5a\"").unwrap();
        assert_eq!(zone, HardinessZone::Z5a);
        assert!(serde_json::from_str::<PlantType>("\"tree\"").is_err());
    }

    #[test]
    fn test_conifer_groups() {
        assert_eq!(FunctionalGroup::G1A.typical_types(), &[PlantType::Conifer]);
        assert!(PlantType::Conifer.is_woody());
        assert!(!PlantType::Fern.is_woody());
    }
}
