//! Plant Catalog Browser
//!
//! Library side of a plant catalog browser:
//! - `vocabulary`: closed code sets (hardiness zones, plant types, functional groups)
//! - `filters`: search filters and their query-string codec
//! - `plant`: plant snapshots built from catalog API records
//! - `aggregation`: grouping, ratios and histograms for charts and tables
//! - `project`: the user's project list over a key-value store
//! - `client`: async client for the remote catalog API (feature `api`)
//! - `api_server`: Axum service exposing the browser views (feature `api`)

pub mod vocabulary;
pub mod filters;
pub mod plant;
pub mod aggregation;
pub mod error;
pub mod project;
pub mod config;

#[cfg(feature = "api")]
pub mod client;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use vocabulary::{FunctionalGroup, HardinessZone, PlantType, SunExposure};
pub use filters::{decode, encode, encode_optional, Filters, Interval, DEFAULT_FILTERS};
pub use plant::{split_latin, ApiPlant, LatinName, Plant};
pub use aggregation::{
    bloom_span, functional_group_histogram, group_by, native_ratio, BloomSpan, GroupCount,
    Groups, NativeRatio,
};
pub use error::{CatalogError, StoreError};
pub use project::{FileStore, KeyValueStore, MemoryStore, Project};
pub use config::Config;

#[cfg(feature = "api")]
pub use client::{CatalogClient, LoadState, PlantApi, SearchSession};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
