//! Search Filters and Query-String Codec
//!
//! Converts a structured [`Filters`] value to the flat, ordered list of
//! `(name, value)` pairs sent to the catalog API as a query string, and back
//! again when a search page is restored from a shared link.
//!
//! Encoding rule: a field is emitted only when it constrains the search.
//! Unset choices, the "all" sentinel, `false` booleans and interval bounds
//! equal to their domain bound are all omitted, so the default filters
//! encode to nothing.
//!
//! Decoding never fails: missing, unknown or malformed parameters fall back
//! to the matching field of [`DEFAULT_FILTERS`].

use serde::{Deserialize, Serialize};

use crate::vocabulary::{choice, FunctionalGroup, HardinessZone, PlantType, SunExposure};

/// Ordered `(name, value)` pairs of a query string
pub type QueryParameters = Vec<(String, String)>;

// ============================================================================
// Intervals
// ============================================================================

/// Closed integer interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub min: u32,
    pub max: u32,
}

/// Height and spread domain, in centimeters
pub const SIZE_DOMAIN: Interval = Interval { min: 0, max: 3000 };

/// Bloom domain, in month numbers
pub const MONTH_DOMAIN: Interval = Interval { min: 1, max: 12 };

impl Interval {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Build an interval clamped to `domain`; reversed bounds are swapped.
    pub fn clamped(min: i64, max: i64, domain: Interval) -> Self {
        let lo = i64::from(domain.min);
        let hi = i64::from(domain.max);
        let a = min.clamp(lo, hi) as u32;
        let b = max.clamp(lo, hi) as u32;
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }

    /// True when the interval covers `domain` entirely (no constraint).
    pub fn covers(&self, domain: Interval) -> bool {
        self.min <= domain.min && self.max >= domain.max
    }
}

// ============================================================================
// Filters
// ============================================================================

/// A search request against the plant catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    /// Free text matched against common and latin names by the server
    pub q: Option<String>,
    pub zone: Option<HardinessZone>,
    pub soil: Option<String>,
    pub sun: Option<SunExposure>,
    pub salt_conditions: Option<String>,
    #[serde(rename = "type")]
    pub plant_type: Option<PlantType>,
    pub color: Option<String>,
    /// Bloom months, `[1, 12]` when unconstrained
    pub bloom: Interval,
    pub functional_group: Option<FunctionalGroup>,
    pub species: Option<String>,
    pub genus: Option<String>,
    pub drought_tolerant: bool,
    pub flood_tolerant: bool,
    pub native: bool,
    /// Height in centimeters, `[0, 3000]` when unconstrained
    pub height: Interval,
    /// Spread in centimeters, `[0, 3000]` when unconstrained
    pub spread: Interval,
}

/// The canonical "no filters" value
pub const DEFAULT_FILTERS: Filters = Filters {
    q: None,
    zone: None,
    soil: None,
    sun: None,
    salt_conditions: None,
    plant_type: None,
    color: None,
    bloom: MONTH_DOMAIN,
    functional_group: None,
    species: None,
    genus: None,
    drought_tolerant: false,
    flood_tolerant: false,
    native: false,
    height: SIZE_DOMAIN,
    spread: SIZE_DOMAIN,
};

impl Default for Filters {
    fn default() -> Self {
        DEFAULT_FILTERS
    }
}

impl Filters {
    /// Set a free-vocabulary choice from UI input; the "all" sentinel clears it.
    pub fn choose(slot: &mut Option<String>, raw: &str) {
        *slot = choice(raw).map(str::to_string);
    }

    /// True when encoding would produce no parameters.
    pub fn is_unconstrained(&self) -> bool {
        encode(self).is_empty()
    }

    /// Query string for this filter set, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        to_query_string(&encode(self))
    }
}

// ============================================================================
// Parameter Names
// ============================================================================

const P_Q: &str = "q";
const P_ZONE: &str = "zone";
const P_SOIL: &str = "soil";
const P_SUN: &str = "sun";
const P_SALT: &str = "saltConditions";
const P_TYPE: &str = "type";
const P_COLOR: &str = "color";
const P_BLOOM_MIN: &str = "bloomMin";
const P_BLOOM_MAX: &str = "bloomMax";
const P_GROUP: &str = "functionalGroup";
const P_SPECIES: &str = "species";
const P_GENUS: &str = "genus";
const P_DROUGHT: &str = "droughtTolerant";
const P_FLOOD: &str = "floodTolerant";
const P_NATIVE: &str = "native";
const P_HEIGHT_MIN: &str = "heightMin";
const P_HEIGHT_MAX: &str = "heightMax";
const P_SPREAD_MIN: &str = "spreadMin";
const P_SPREAD_MAX: &str = "spreadMax";

// ============================================================================
// Encoding
// ============================================================================

/// Encode filters into query parameters, in field declaration order.
pub fn encode(filters: &Filters) -> QueryParameters {
    let mut params = QueryParameters::new();

    if let Some(q) = filters.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        params.push((P_Q.to_string(), q.to_lowercase()));
    }
    push_code(&mut params, P_ZONE, filters.zone.map(HardinessZone::code));
    push_choice(&mut params, P_SOIL, filters.soil.as_deref());
    push_code(&mut params, P_SUN, filters.sun.map(SunExposure::code));
    push_choice(&mut params, P_SALT, filters.salt_conditions.as_deref());
    push_code(&mut params, P_TYPE, filters.plant_type.map(PlantType::code));
    push_choice(&mut params, P_COLOR, filters.color.as_deref());
    push_interval(&mut params, P_BLOOM_MIN, P_BLOOM_MAX, filters.bloom, MONTH_DOMAIN);
    push_code(&mut params, P_GROUP, filters.functional_group.map(FunctionalGroup::code));
    push_choice(&mut params, P_SPECIES, filters.species.as_deref());
    push_choice(&mut params, P_GENUS, filters.genus.as_deref());
    push_flag(&mut params, P_DROUGHT, filters.drought_tolerant);
    push_flag(&mut params, P_FLOOD, filters.flood_tolerant);
    push_flag(&mut params, P_NATIVE, filters.native);
    push_interval(&mut params, P_HEIGHT_MIN, P_HEIGHT_MAX, filters.height, SIZE_DOMAIN);
    push_interval(&mut params, P_SPREAD_MIN, P_SPREAD_MAX, filters.spread, SIZE_DOMAIN);

    params
}

/// Encode optional filters; `None` yields no parameters.
pub fn encode_optional(filters: Option<&Filters>) -> QueryParameters {
    filters.map(encode).unwrap_or_default()
}

fn push_code(params: &mut QueryParameters, name: &str, code: Option<&'static str>) {
    if let Some(code) = code {
        params.push((name.to_string(), code.to_string()));
    }
}

fn push_choice(params: &mut QueryParameters, name: &str, value: Option<&str>) {
    if let Some(value) = value.and_then(choice) {
        params.push((name.to_string(), value.to_string()));
    }
}

fn push_flag(params: &mut QueryParameters, name: &str, value: bool) {
    if value {
        params.push((name.to_string(), "true".to_string()));
    }
}

/// Bounds are independent: each one is emitted only when it narrows the domain.
fn push_interval(
    params: &mut QueryParameters,
    min_name: &str,
    max_name: &str,
    interval: Interval,
    domain: Interval,
) {
    if interval.covers(domain) {
        return;
    }
    if interval.min > domain.min {
        params.push((min_name.to_string(), interval.min.to_string()));
    }
    if interval.max < domain.max {
        params.push((max_name.to_string(), interval.max.to_string()));
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Restore filters from query parameters.
///
/// When a name repeats, the last occurrence wins.
pub fn decode(params: &[(String, String)]) -> Filters {
    let get = |name: &str| last_value(params, name);
    let defaults = DEFAULT_FILTERS;

    Filters {
        q: get(P_Q)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .or(defaults.q),
        zone: get(P_ZONE)
            .and_then(choice)
            .and_then(HardinessZone::from_code)
            .or(defaults.zone),
        soil: decode_choice(get(P_SOIL)).or(defaults.soil),
        sun: get(P_SUN)
            .and_then(choice)
            .and_then(SunExposure::from_code)
            .or(defaults.sun),
        salt_conditions: decode_choice(get(P_SALT)).or(defaults.salt_conditions),
        plant_type: get(P_TYPE)
            .and_then(choice)
            .and_then(PlantType::from_code)
            .or(defaults.plant_type),
        color: decode_choice(get(P_COLOR)).or(defaults.color),
        bloom: decode_interval(get(P_BLOOM_MIN), get(P_BLOOM_MAX), defaults.bloom, MONTH_DOMAIN),
        functional_group: get(P_GROUP)
            .and_then(choice)
            .and_then(FunctionalGroup::from_code)
            .or(defaults.functional_group),
        species: decode_choice(get(P_SPECIES)).or(defaults.species),
        genus: decode_choice(get(P_GENUS)).or(defaults.genus),
        drought_tolerant: decode_flag(get(P_DROUGHT), defaults.drought_tolerant),
        flood_tolerant: decode_flag(get(P_FLOOD), defaults.flood_tolerant),
        native: decode_flag(get(P_NATIVE), defaults.native),
        height: decode_interval(get(P_HEIGHT_MIN), get(P_HEIGHT_MAX), defaults.height, SIZE_DOMAIN),
        spread: decode_interval(get(P_SPREAD_MIN), get(P_SPREAD_MAX), defaults.spread, SIZE_DOMAIN),
    }
}

fn last_value<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn decode_choice(value: Option<&str>) -> Option<String> {
    value.and_then(choice).map(str::to_string)
}

fn decode_flag(value: Option<&str>, default: bool) -> bool {
    match value {
        Some(v) => v.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}

/// Integers only; anything unparsable keeps the default bound.
fn decode_interval(
    min: Option<&str>,
    max: Option<&str>,
    default: Interval,
    domain: Interval,
) -> Interval {
    let parse = |raw: Option<&str>, fallback: u32| -> i64 {
        raw.and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or_else(|| i64::from(fallback))
    };
    Interval::clamped(parse(min, default.min), parse(max, default.max), domain)
}

// ============================================================================
// Query Strings
// ============================================================================

/// Join parameters into a percent-encoded query string (no leading `?`).
pub fn to_query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Split a query string into parameters.
///
/// Accepts a leading `?`, reads `+` as a space and keeps malformed escapes
/// verbatim rather than failing.
pub fn parse_query_string(query: &str) -> QueryParameters {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

fn percent_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
