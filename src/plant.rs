//! Plant records and the plant factory
//!
//! [`ApiPlant`] is the record as the catalog API sends it. [`Plant`] is the
//! decorated snapshot the rest of the crate works with (and the shape stored
//! in the project list):
//! - the latin name is split into species name, cultivar and comment
//! - sizes are normalized from meters to centimeters
//! - bloom months are cleaned to a sorted set within 1..=12

use serde::{Deserialize, Serialize};

use crate::aggregation::{bloom_span, BloomSpan};
use crate::vocabulary::{FunctionalGroup, HardinessZone, PlantType, SunExposure};

// ============================================================================
// Wire Record
// ============================================================================

/// Plant as returned by `GET /api/plants`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiPlant {
    pub id: u64,
    pub code: String,
    pub latin: String,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub cultivar: Option<String>,
    pub synonym: Option<String>,
    pub common_name: Option<String>,
    pub note: Option<String>,
    #[serde(rename = "type")]
    pub plant_type: Option<String>,
    pub functional_group: Option<String>,
    pub zone: Option<String>,
    pub sun_tolerance: Vec<String>,
    pub soil_humidity: Vec<String>,
    pub soil_richness: Vec<String>,
    pub soil_structure: Vec<String>,
    pub is_native: bool,
    pub is_naturalized: bool,
    pub drought_tolerant: bool,
    pub flood_tolerant: bool,
    pub bloom: Vec<i64>,
    /// Meters
    pub height: Option<f64>,
    /// Meters
    pub spread: Option<f64>,
}

// ============================================================================
// Decorated Plant
// ============================================================================

/// Read-only plant snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Plant {
    pub id: u64,
    /// Catalog code, the user-facing identifier
    pub code: String,
    /// Latin name without cultivar or comment
    pub latin: String,
    pub cultivar: Option<String>,
    pub comment: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
    pub synonym: Option<String>,
    pub common_name: Option<String>,
    pub note: Option<String>,
    #[serde(rename = "type")]
    pub plant_type: Option<String>,
    pub functional_group: Option<String>,
    pub zone: Option<String>,
    pub sun_tolerance: Vec<String>,
    pub soil_humidity: Vec<String>,
    pub soil_richness: Vec<String>,
    pub soil_structure: Vec<String>,
    pub is_native: bool,
    pub is_naturalized: bool,
    pub drought_tolerant: bool,
    pub flood_tolerant: bool,
    /// Sorted, distinct months in 1..=12
    pub bloom: Vec<u8>,
    pub height_cm: Option<u32>,
    pub spread_cm: Option<u32>,
}

impl From<ApiPlant> for Plant {
    fn from(raw: ApiPlant) -> Self {
        let name = split_latin(&raw.latin);
        let genus = non_empty(raw.genus).or_else(|| {
            name.latin
                .split_whitespace()
                .next()
                .map(str::to_string)
        });

        Plant {
            id: raw.id,
            code: raw.code.trim().to_string(),
            cultivar: name.cultivar.or_else(|| non_empty(raw.cultivar)),
            comment: name.comment,
            latin: name.latin,
            family: non_empty(raw.family),
            genus,
            species: non_empty(raw.species),
            synonym: non_empty(raw.synonym),
            common_name: non_empty(raw.common_name),
            note: non_empty(raw.note),
            plant_type: non_empty(raw.plant_type),
            functional_group: non_empty(raw.functional_group),
            zone: non_empty(raw.zone),
            sun_tolerance: raw.sun_tolerance,
            soil_humidity: raw.soil_humidity,
            soil_richness: raw.soil_richness,
            soil_structure: raw.soil_structure,
            is_native: raw.is_native,
            is_naturalized: raw.is_naturalized,
            drought_tolerant: raw.drought_tolerant,
            flood_tolerant: raw.flood_tolerant,
            bloom: clean_months(&raw.bloom),
            height_cm: raw.height.map(meters_to_cm),
            spread_cm: raw.spread.map(meters_to_cm),
        }
    }
}

impl Plant {
    /// Latin name with the cultivar in single quotes, e.g. `Acer rubrum 'Red Sunset'`
    pub fn display_name(&self) -> String {
        match &self.cultivar {
            Some(c) => format!("{} '{}'", self.latin, c),
            None => self.latin.clone(),
        }
    }

    /// Display name followed by the first common name, when there is one
    pub fn label(&self) -> String {
        let name = self.display_name();
        match self.common_name.as_deref().and_then(primary_common_name) {
            Some(common) => format!("{} ({})", name, common),
            None => name,
        }
    }

    pub fn plant_type(&self) -> Option<PlantType> {
        self.plant_type.as_deref().and_then(PlantType::from_code)
    }

    pub fn functional_group(&self) -> Option<FunctionalGroup> {
        self.functional_group.as_deref().and_then(FunctionalGroup::from_code)
    }

    pub fn zone(&self) -> Option<HardinessZone> {
        self.zone.as_deref().and_then(HardinessZone::from_code)
    }

    /// Known sun exposures; unknown codes are skipped
    pub fn sun_exposures(&self) -> Vec<SunExposure> {
        self.sun_tolerance
            .iter()
            .filter_map(|s| SunExposure::from_code(s))
            .collect()
    }

    pub fn bloom_span(&self) -> BloomSpan {
        bloom_span(&self.bloom)
    }
}

// ============================================================================
// Latin Name Splitting
// ============================================================================

/// Parts of a catalog latin name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatinName {
    pub latin: String,
    pub cultivar: Option<String>,
    pub comment: Option<String>,
}

/// Split `Genus species 'Cultivar' (comment)` into its parts.
///
/// The quoted cultivar is cut first; only a quote opening outside any
/// parentheses starts one, so apostrophes inside a comment stay in it. The
/// comment is the parenthesized text after the closing quote, or failing that,
/// the one before the opening quote.
pub fn split_latin(raw: &str) -> LatinName {
    let raw = raw.trim();

    if let Some(open) = cultivar_quote(raw) {
        let head = &raw[..open];
        let tail = &raw[open + 1..];
        let (cultivar, rest) = match tail.find('\'') {
            Some(close) => (&tail[..close], &tail[close + 1..]),
            None => (tail, ""),
        };

        let (latin, comment) = match parenthetical(rest) {
            Some((_, comment)) => (head.trim().to_string(), comment),
            None => match parenthetical(head) {
                Some((before, comment)) => (before, comment),
                None => (head.trim().to_string(), None),
            },
        };

        return LatinName {
            latin,
            cultivar: non_empty(Some(cultivar.trim().to_string())),
            comment,
        };
    }

    match parenthetical(raw) {
        Some((latin, comment)) => LatinName {
            latin,
            cultivar: None,
            comment,
        },
        None => LatinName {
            latin: raw.to_string(),
            cultivar: None,
            comment: None,
        },
    }
}

/// Byte offset of the first `'` not nested in parentheses
fn cultivar_quote(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '\'' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// `(text before '(', text inside the parentheses)`, or `None` without a '('
fn parenthetical(text: &str) -> Option<(String, Option<String>)> {
    let open = text.find('(')?;
    let inside = &text[open + 1..];
    let inside = match inside.find(')') {
        Some(close) => &inside[..close],
        None => inside,
    };
    Some((
        text[..open].trim().to_string(),
        non_empty(Some(inside.trim().to_string())),
    ))
}

// ============================================================================
// Helpers
// ============================================================================

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Meters to whole centimeters; negative or non-finite sizes become 0
pub fn meters_to_cm(meters: f64) -> u32 {
    if !meters.is_finite() || meters <= 0.0 {
        return 0;
    }
    (meters * 100.0).round().min(f64::from(u32::MAX)) as u32
}

fn clean_months(raw: &[i64]) -> Vec<u8> {
    let mut months: Vec<u8> = raw
        .iter()
        .filter(|m| (1..=12).contains(*m))
        .map(|m| *m as u8)
        .collect();
    months.sort_unstable();
    months.dedup();
    months
}

/// First entry of a `;` or `,` separated common-name list
fn primary_common_name(raw: &str) -> Option<&str> {
    raw.split([';', ','])
        .map(str::trim)
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cultivar_only() {
        let name = split_latin("Acer rubrum 'Red Sunset'");
        assert_eq!(name.latin, "Acer rubrum");
        assert_eq!(name.cultivar.as_deref(), Some("Red Sunset"));
        assert_eq!(name.comment, None);
    }

    #[test]
    fn test_split_comment_only() {
        let name = split_latin("Ginkgo biloba (male)");
        assert_eq!(name.latin, "Ginkgo biloba");
        assert_eq!(name.cultivar, None);
        assert_eq!(name.comment.as_deref(), Some("male"));
    }

    #[test]
    fn test_split_cultivar_and_comment() {
        let name = split_latin("Acer rubrum 'Red Sunset' (patented)");
        assert_eq!(name.latin, "Acer rubrum");
        assert_eq!(name.cultivar.as_deref(), Some("Red Sunset"));
        assert_eq!(name.comment.as_deref(), Some("patented"));
    }

    #[test]
    fn test_split_comment_before_cultivar() {
        let name = split_latin("Malus (crabapple) 'Royalty'");
        assert_eq!(name.latin, "Malus");
        assert_eq!(name.cultivar.as_deref(), Some("Royalty"));
        assert_eq!(name.comment.as_deref(), Some("crabapple"));
    }

    #[test]
    fn test_split_plain_and_unterminated() {
        assert_eq!(split_latin("  Quercus alba ").latin, "Quercus alba");

        let name = split_latin("Thuja occidentalis 'Smaragd");
        assert_eq!(name.latin, "Thuja occidentalis");
        assert_eq!(name.cultivar.as_deref(), Some("Smaragd"));

        let name = split_latin("Picea abies ''");
        assert_eq!(name.cultivar, None);
    }

    #[test]
    fn test_apostrophe_inside_comment_is_not_a_cultivar() {
        let name = split_latin("Ginkgo biloba (Fairmount's clone)");
        assert_eq!(name.latin, "Ginkgo biloba");
        assert_eq!(name.cultivar, None);
        assert_eq!(name.comment.as_deref(), Some("Fairmount's clone"));

        let name = split_latin("Malus (Adams' crab) 'Royalty'");
        assert_eq!(name.latin, "Malus");
        assert_eq!(name.cultivar.as_deref(), Some("Royalty"));
        assert_eq!(name.comment.as_deref(), Some("Adams' crab"));
    }

    #[test]
    fn test_meters_to_cm() {
        assert_eq!(meters_to_cm(1.5), 150);
        assert_eq!(meters_to_cm(0.35), 35);
        assert_eq!(meters_to_cm(-2.0), 0);
        assert_eq!(meters_to_cm(f64::NAN), 0);
    }

    #[test]
    fn test_factory_decorates_api_record() {
        let raw: ApiPlant = serde_json::from_value(serde_json::json!({
            "id": 7,
            "code": " ACRU-RS ",
            "latin": "Acer rubrum 'Red Sunset' (patented)",
            "commonName": "Red maple; Swamp maple",
            "type": "deciduous_tree",
            "functionalGroup": "4A",
            "zone": "4a",
            "sunTolerance": ["full", "partial", "dappled"],
            "isNative": true,
            "bloom": [5, 4, 4, 13, 0],
            "height": 15.0,
            "spread": 0.8
        }))
        .unwrap();

        let plant = Plant::from(raw);
        assert_eq!(plant.code, "ACRU-RS");
        assert_eq!(plant.latin, "Acer rubrum");
        assert_eq!(plant.genus.as_deref(), Some("Acer"));
        assert_eq!(plant.display_name(), "Acer rubrum 'Red Sunset'");
        assert_eq!(plant.label(), "Acer rubrum 'Red Sunset' (Red maple)");
        assert_eq!(plant.plant_type(), Some(PlantType::DeciduousTree));
        assert_eq!(plant.functional_group(), Some(FunctionalGroup::G4A));
        assert_eq!(plant.zone(), Some(HardinessZone::Z4a));
        assert_eq!(plant.sun_exposures(), vec![SunExposure::Full, SunExposure::Partial]);
        assert_eq!(plant.bloom, vec![4, 5]);
        assert_eq!(plant.height_cm, Some(1500));
        assert_eq!(plant.spread_cm, Some(80));
    }

    #[test]
    fn test_unknown_codes_are_not_found() {
        let plant = Plant {
            plant_type: Some("cactus".to_string()),
            functional_group: Some("9Z".to_string()),
            ..Default::default()
        };
        assert_eq!(plant.plant_type(), None);
        assert_eq!(plant.functional_group(), None);
        assert_eq!(plant.zone(), None);
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let plant = Plant {
            code: "GIBI".to_string(),
            latin: "Ginkgo biloba".to_string(),
            comment: Some("male".to_string()),
            bloom: vec![4],
            ..Default::default()
        };
        let json = serde_json::to_string(&plant).unwrap();
        let back: Plant = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plant);
    }
}
