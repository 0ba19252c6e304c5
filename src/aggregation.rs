//! Aggregation over plant lists
//!
//! Pure, total functions deriving grouped views and statistics from a list of
//! plants: groupings by genus / type / functional group / native status, the
//! native ratio, the functional-group histogram and the bloom calendar.
//! Every function accepts the empty list.
//!
//! Also shapes the taxonomy endpoints (species per genus, genera per
//! functional group) into the ordered structures the browsing pages use.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::filters::MONTH_DOMAIN;
use crate::plant::Plant;
use crate::vocabulary::{FunctionalGroup, PlantType};

/// Bucket for plants whose key is absent or unknown
pub const UNKNOWN_KEY: &str = "unknown";

pub const NATIVE_KEY: &str = "native";
pub const OTHER_KEY: &str = "other";

// ============================================================================
// Grouping
// ============================================================================

/// Ordered mapping of key to plants
///
/// Keys keep first-seen order; plants keep input order within their group.
#[derive(Debug, Clone, Default)]
pub struct Groups<'a> {
    entries: Vec<(String, Vec<&'a Plant>)>,
    index: FxHashMap<String, usize>,
}

impl<'a> Groups<'a> {
    fn push(&mut self, key: String, plant: &'a Plant) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1.push(plant),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, vec![plant]));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&[&'a Plant]> {
        self.index.get(key).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a Plant])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `(key, group size)` in key order
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.entries.iter().map(|(k, v)| (k.clone(), v.len())).collect()
    }
}

/// Group plants by `key_fn`; `None` or blank keys land in [`UNKNOWN_KEY`].
pub fn group_by<'a, F, K>(plants: &'a [Plant], key_fn: F) -> Groups<'a>
where
    F: Fn(&'a Plant) -> Option<K>,
    K: AsRef<str>,
{
    let mut groups = Groups::default();
    for plant in plants {
        let key = key_fn(plant)
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| UNKNOWN_KEY.to_string());
        groups.push(key, plant);
    }
    groups
}

pub fn group_by_genus(plants: &[Plant]) -> Groups<'_> {
    group_by(plants, |p| p.genus.as_deref())
}

/// Keyed by type code; unknown type codes go to [`UNKNOWN_KEY`]
pub fn group_by_type(plants: &[Plant]) -> Groups<'_> {
    group_by(plants, |p| p.plant_type().map(PlantType::code))
}

/// Keyed by functional-group code; unknown codes go to [`UNKNOWN_KEY`]
pub fn group_by_functional_group(plants: &[Plant]) -> Groups<'_> {
    group_by(plants, |p| p.functional_group().map(FunctionalGroup::code))
}

/// Two buckets, [`NATIVE_KEY`] and [`OTHER_KEY`], in first-seen order
pub fn group_by_native(plants: &[Plant]) -> Groups<'_> {
    group_by(plants, |p| Some(if p.is_native { NATIVE_KEY } else { OTHER_KEY }))
}

// ============================================================================
// Native Ratio
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeRatio {
    pub native_percent: u32,
    pub other_percent: u32,
}

/// Floor percentage of native plants; both values are 0 for an empty list.
pub fn native_ratio(plants: &[Plant]) -> NativeRatio {
    let total = plants.len();
    if total == 0 {
        return NativeRatio {
            native_percent: 0,
            other_percent: 0,
        };
    }
    let native = plants.iter().filter(|p| p.is_native).count();
    let native_percent = percent_floor(native, total);
    NativeRatio {
        native_percent,
        other_percent: 100 - native_percent,
    }
}

fn percent_floor(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count * 100) / total) as u32
}

// ============================================================================
// Functional Group Histogram
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub group: FunctionalGroup,
    pub label: &'static str,
    pub count: usize,
}

/// One entry per group of `all_groups`, in that order, zero counts included.
pub fn functional_group_histogram(
    plants: &[Plant],
    all_groups: &[FunctionalGroup],
) -> Vec<GroupCount> {
    let mut counts: FxHashMap<FunctionalGroup, usize> = FxHashMap::default();
    for group in plants.iter().filter_map(Plant::functional_group) {
        *counts.entry(group).or_insert(0) += 1;
    }

    all_groups
        .iter()
        .map(|&group| GroupCount {
            group,
            label: group.label(),
            count: counts.get(&group).copied().unwrap_or(0),
        })
        .collect()
}

// ============================================================================
// Bloom Calendar
// ============================================================================

/// Partition of the twelve months around a bloom period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BloomSpan {
    pub before: Vec<u8>,
    pub active: Vec<u8>,
    pub after: Vec<u8>,
}

/// Split months 1..=12 into before / during / after the bloom period.
///
/// The period runs from the smallest to the largest valid month; gaps inside
/// it are not represented. Without valid months every month is `before`.
pub fn bloom_span(months: &[u8]) -> BloomSpan {
    let valid = months
        .iter()
        .copied()
        .filter(|&m| MONTH_DOMAIN.contains(u32::from(m)));
    let (first, last) = match (valid.clone().min(), valid.max()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return BloomSpan {
                before: (1..=12).collect(),
                active: Vec::new(),
                after: Vec::new(),
            }
        }
    };

    BloomSpan {
        before: (1..first).collect(),
        active: (first..=last).collect(),
        after: (last + 1..=12).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloomRow {
    pub code: String,
    pub name: String,
    pub span: BloomSpan,
}

/// One calendar row per plant, in input order
pub fn bloom_calendar(plants: &[Plant]) -> Vec<BloomRow> {
    plants
        .iter()
        .map(|p| BloomRow {
            code: p.code.clone(),
            name: p.display_name(),
            span: p.bloom_span(),
        })
        .collect()
}

// ============================================================================
// Distributions and Tables
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeShare {
    /// Type code, or [`UNKNOWN_KEY`]
    pub plant_type: String,
    pub label: String,
    pub count: usize,
    pub percent: u32,
}

/// Plant count per type, first-seen order, with floor percentages
pub fn type_distribution(plants: &[Plant]) -> Vec<TypeShare> {
    let total = plants.len();
    group_by_type(plants)
        .iter()
        .map(|(key, group)| TypeShare {
            plant_type: key.to_string(),
            label: PlantType::from_code(key)
                .map(|t| t.label().to_string())
                .unwrap_or_else(|| UNKNOWN_KEY.to_string()),
            count: group.len(),
            percent: percent_floor(group.len(), total),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenusRow {
    pub genus: String,
    pub count: usize,
    pub codes: Vec<String>,
}

/// Rows of the grouped-by-genus table
pub fn genus_table(plants: &[Plant]) -> Vec<GenusRow> {
    group_by_genus(plants)
        .iter()
        .map(|(genus, group)| GenusRow {
            genus: genus.to_string(),
            count: group.len(),
            codes: group.iter().map(|p| p.code.clone()).collect(),
        })
        .collect()
}

/// Everything the project page charts and tables need
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub total: usize,
    pub native: NativeRatio,
    pub types: Vec<TypeShare>,
    pub functional_groups: Vec<GroupCount>,
    pub genera: Vec<GenusRow>,
    pub bloom_calendar: Vec<BloomRow>,
}

pub fn project_summary(plants: &[Plant]) -> ProjectSummary {
    ProjectSummary {
        total: plants.len(),
        native: native_ratio(plants),
        types: type_distribution(plants),
        functional_groups: functional_group_histogram(plants, FunctionalGroup::ALL),
        genera: genus_table(plants),
        bloom_calendar: bloom_calendar(plants),
    }
}

// ============================================================================
// Taxonomy Browsing
// ============================================================================

/// Row of `GET /api/species/all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesPair {
    pub genus: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenusSpecies {
    pub genus: String,
    pub species: Vec<String>,
}

/// Species listed under their genus; genera in first-seen order, species
/// deduplicated in first-seen order.
pub fn species_by_genus(pairs: &[SpeciesPair]) -> Vec<GenusSpecies> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut out: Vec<GenusSpecies> = Vec::new();

    for pair in pairs {
        let genus = pair.genus.trim();
        let genus = if genus.is_empty() { UNKNOWN_KEY } else { genus };
        let i = *index.entry(genus).or_insert_with(|| {
            out.push(GenusSpecies {
                genus: genus.to_string(),
                species: Vec::new(),
            });
            out.len() - 1
        });

        let species = pair.species.trim();
        if !species.is_empty() && !out[i].species.iter().any(|s| s == species) {
            out[i].species.push(species.to_string());
        }
    }
    out
}

/// Row of `GET /api/group`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRow {
    pub functional_group: String,
    pub genus: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenusCount {
    pub genus: String,
    pub count: u64,
}

/// Reference page entry for one functional group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReference {
    pub group: FunctionalGroup,
    pub label: &'static str,
    pub description: &'static str,
    pub total: u64,
    pub genera: Vec<GenusCount>,
}

/// One entry per functional group in enumeration order.
///
/// Genera are summed per group and sorted by count (descending) then name.
/// Rows with an unknown group code are skipped.
pub fn functional_group_reference(rows: &[GroupRow]) -> Vec<GroupReference> {
    let mut per_group: FxHashMap<FunctionalGroup, FxHashMap<&str, u64>> = FxHashMap::default();
    let mut skipped = 0usize;

    for row in rows {
        match FunctionalGroup::from_code(&row.functional_group) {
            Some(group) => {
                *per_group
                    .entry(group)
                    .or_default()
                    .entry(row.genus.trim())
                    .or_insert(0) += row.count;
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} group rows with unknown functional group", skipped);
    }

    FunctionalGroup::ALL
        .iter()
        .map(|&group| {
            let mut genera: Vec<GenusCount> = per_group
                .remove(&group)
                .unwrap_or_default()
                .into_iter()
                .map(|(genus, count)| GenusCount {
                    genus: genus.to_string(),
                    count,
                })
                .collect();
            genera.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genus.cmp(&b.genus)));

            GroupReference {
                group,
                label: group.label(),
                description: group.description(),
                total: genera.iter().map(|g| g.count).sum(),
                genera,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant(code: &str, genus: Option<&str>) -> Plant {
        Plant {
            code: code.to_string(),
            latin: genus.map(|g| format!("{} sp.", g)).unwrap_or_default(),
            genus: genus.map(str::to_string),
            ..Default::default()
        }
    }

    fn native(is_native: bool) -> Plant {
        Plant {
            is_native,
            ..Default::default()
        }
    }

    #[test]
    fn test_group_by_empty() {
        let groups = group_by_genus(&[]);
        assert!(groups.is_empty());
        assert_eq!(groups.len(), 0);
    }

    #[test]
    fn test_group_by_genus_keeps_order() {
        let plants = vec![
            plant("A1", Some("Acer")),
            plant("Q1", Some("Quercus")),
            plant("A2", Some("Acer")),
        ];
        let groups = group_by_genus(&plants);

        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["Acer", "Quercus"]);
        let acer: Vec<&str> = groups.get("Acer").unwrap().iter().map(|p| p.code.as_str()).collect();
        assert_eq!(acer, vec!["A1", "A2"]);
        assert_eq!(groups.get("Quercus").unwrap().len(), 1);
        assert_eq!(groups.get("Betula"), None);
    }

    #[test]
    fn test_group_by_unknown_bucket() {
        let plants = vec![plant("X", None), plant("Y", Some("  ")), plant("A", Some("Acer"))];
        let groups = group_by_genus(&plants);
        assert_eq!(groups.counts(), vec![("unknown".to_string(), 2), ("Acer".to_string(), 1)]);
    }

    #[test]
    fn test_group_by_type_and_group_use_codes() {
        let plants = vec![
            Plant {
                plant_type: Some("conifer".to_string()),
                functional_group: Some("1A".to_string()),
                ..Default::default()
            },
            Plant {
                plant_type: Some("palm".to_string()),
                functional_group: Some("7".to_string()),
                ..Default::default()
            },
        ];
        let by_type = group_by_type(&plants);
        assert_eq!(by_type.keys().collect::<Vec<_>>(), vec!["conifer", "unknown"]);
        let by_group = group_by_functional_group(&plants);
        assert_eq!(by_group.keys().collect::<Vec<_>>(), vec!["1A", "unknown"]);
    }

    #[test]
    fn test_group_by_native() {
        let plants = vec![native(false), native(true), native(false)];
        let groups = group_by_native(&plants);
        assert_eq!(groups.counts(), vec![("other".to_string(), 2), ("native".to_string(), 1)]);
    }

    #[test]
    fn test_native_ratio_empty() {
        assert_eq!(
            native_ratio(&[]),
            NativeRatio {
                native_percent: 0,
                other_percent: 0
            }
        );
    }

    #[test]
    fn test_native_ratio_floors() {
        let plants = vec![native(true), native(false), native(false)];
        assert_eq!(
            native_ratio(&plants),
            NativeRatio {
                native_percent: 33,
                other_percent: 67
            }
        );

        let all_native = vec![native(true), native(true)];
        assert_eq!(native_ratio(&all_native).native_percent, 100);
        assert_eq!(native_ratio(&all_native).other_percent, 0);
    }

    #[test]
    fn test_histogram_empty_has_every_group() {
        let histogram = functional_group_histogram(&[], FunctionalGroup::ALL);
        assert_eq!(histogram.len(), FunctionalGroup::ALL.len());
        for (entry, group) in histogram.iter().zip(FunctionalGroup::ALL) {
            assert_eq!(entry.group, *group);
            assert_eq!(entry.count, 0);
        }
    }

    #[test]
    fn test_histogram_counts() {
        let with_group = |code: &str| Plant {
            functional_group: Some(code.to_string()),
            ..Default::default()
        };
        let plants = vec![with_group("2A"), with_group("2A"), with_group("5"), with_group("??")];
        let histogram = functional_group_histogram(&plants, FunctionalGroup::ALL);
        let count = |g: FunctionalGroup| histogram.iter().find(|e| e.group == g).unwrap().count;
        assert_eq!(count(FunctionalGroup::G2A), 2);
        assert_eq!(count(FunctionalGroup::G5), 1);
        assert_eq!(count(FunctionalGroup::G1A), 0);
        assert_eq!(histogram.iter().map(|e| e.count).sum::<usize>(), 3);
    }

    #[test]
    fn test_bloom_span_empty() {
        let span = bloom_span(&[]);
        assert!(span.active.is_empty());
        assert_eq!(span.before.len() + span.after.len(), 12);
    }

    #[test]
    fn test_bloom_span_contiguous() {
        let span = bloom_span(&[5, 6, 7]);
        assert_eq!(span.before, vec![1, 2, 3, 4]);
        assert_eq!(span.active, vec![5, 6, 7]);
        assert_eq!(span.after, vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_bloom_span_gaps_and_bounds() {
        let span = bloom_span(&[9, 3]);
        assert_eq!(span.before, vec![1, 2]);
        assert_eq!(span.active, vec![3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(span.after, vec![10, 11, 12]);

        let edges = bloom_span(&[1, 12, 0, 13]);
        assert!(edges.before.is_empty());
        assert_eq!(edges.active.len(), 12);
        assert!(edges.after.is_empty());
    }

    #[test]
    fn test_type_distribution() {
        let typed = |code: &str| Plant {
            plant_type: Some(code.to_string()),
            ..Default::default()
        };
        let plants = vec![typed("fern"), typed("rose"), typed("fern")];
        let dist = type_distribution(&plants);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].plant_type, "fern");
        assert_eq!(dist[0].label, "Fern");
        assert_eq!(dist[0].count, 2);
        assert_eq!(dist[0].percent, 66);
        assert_eq!(dist[1].percent, 33);
    }

    #[test]
    fn test_project_summary_empty() {
        let summary = project_summary(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.native.native_percent, 0);
        assert!(summary.types.is_empty());
        assert_eq!(summary.functional_groups.len(), 10);
        assert!(summary.genera.is_empty());
        assert!(summary.bloom_calendar.is_empty());
    }

    #[test]
    fn test_genus_table_and_calendar() {
        let mut a = plant("A1", Some("Acer"));
        a.bloom = vec![4, 5];
        let plants = vec![a, plant("A2", Some("Acer"))];

        let table = genus_table(&plants);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].codes, vec!["A1", "A2"]);

        let calendar = bloom_calendar(&plants);
        assert_eq!(calendar[0].span.active, vec![4, 5]);
        assert!(calendar[1].span.active.is_empty());
    }

    #[test]
    fn test_species_by_genus() {
        let pair = |g: &str, s: &str| SpeciesPair {
            genus: g.to_string(),
            species: s.to_string(),
        };
        let grouped = species_by_genus(&[
            pair("Quercus", "alba"),
            pair("Acer", "rubrum"),
            pair("Quercus", "rubra"),
            pair("Quercus", "alba"),
            pair("", "incognita"),
        ]);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].genus, "Quercus");
        assert_eq!(grouped[0].species, vec!["alba", "rubra"]);
        assert_eq!(grouped[1].genus, "Acer");
        assert_eq!(grouped[2].genus, "unknown");
    }

    #[test]
    fn test_functional_group_reference() {
        let row = |g: &str, genus: &str, count: u64| GroupRow {
            functional_group: g.to_string(),
            genus: genus.to_string(),
            count,
        };
        let reference = functional_group_reference(&[
            row("2A", "Quercus", 12),
            row("2A", "Carya", 3),
            row("2A", "Juglans", 12),
            row("1A", "Pinus", 8),
            row("nope", "Acer", 4),
        ]);

        assert_eq!(reference.len(), 10);
        assert_eq!(reference[0].group, FunctionalGroup::G1A);
        assert_eq!(reference[0].total, 8);

        let g2a = reference.iter().find(|r| r.group == FunctionalGroup::G2A).unwrap();
        let names: Vec<&str> = g2a.genera.iter().map(|g| g.genus.as_str()).collect();
        assert_eq!(names, vec!["Juglans", "Quercus", "Carya"]);
        assert_eq!(g2a.total, 27);

        let g5 = reference.iter().find(|r| r.group == FunctionalGroup::G5).unwrap();
        assert!(g5.genera.is_empty());
    }
}
