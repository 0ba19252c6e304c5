// Axum web service for the plant catalog browser
//
// Purpose: JSON views over the remote catalog API (search with summary
// charts, plant pages, taxonomy, functional groups) plus the user's project
// list persisted in a key-value store.

#[cfg(feature = "api")]
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

#[cfg(feature = "api")]
use moka::future::Cache;

#[cfg(feature = "api")]
use std::sync::{Arc, Mutex, MutexGuard};

#[cfg(feature = "api")]
use std::time::Duration;

#[cfg(feature = "api")]
use crate::aggregation::{
    functional_group_histogram, functional_group_reference, genus_table, native_ratio,
    project_summary, species_by_genus, type_distribution,
};
#[cfg(feature = "api")]
use crate::client::{CatalogClient, PlantApi};
#[cfg(feature = "api")]
use crate::config::Config;
#[cfg(feature = "api")]
use crate::error::{CatalogError, StoreError};
#[cfg(feature = "api")]
use crate::filters::{decode, encode, parse_query_string, to_query_string};
#[cfg(feature = "api")]
use crate::plant::Plant;
#[cfg(feature = "api")]
use crate::project::{FileStore, KeyValueStore, Project};
#[cfg(feature = "api")]
use crate::vocabulary::{
    functional_group_label, type_label, zone_label, FunctionalGroup, PlantType, SunExposure,
};

// ============================================================================
// Application State
// ============================================================================

#[cfg(feature = "api")]
pub type SharedProject = Project<Box<dyn KeyValueStore + Send>>;

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn PlantApi>,
    pub project: Arc<Mutex<SharedProject>>,
    /// Upstream search results keyed by encoded query string
    pub cache: Cache<String, Arc<Vec<Plant>>>,
}

#[cfg(feature = "api")]
impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        tracing::info!("Initializing catalog API client for {}...", config.api_url);
        let client = CatalogClient::new(&config.api_url, config.request_timeout)?;

        let store = FileStore::new(&config.data_dir);
        tracing::info!("Opening project store in {}...", store.dir().display());

        Ok(Self::with_parts(
            Arc::new(client),
            Box::new(store),
            config.cache_capacity,
            config.cache_ttl,
        ))
    }

    /// Assemble state from explicit collaborators (used by tests)
    pub fn with_parts(
        api: Arc<dyn PlantApi>,
        store: Box<dyn KeyValueStore + Send>,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Self {
        tracing::info!("Initializing Moka cache...");
        let cache = Cache::builder()
            .max_capacity(cache_capacity)
            .time_to_live(cache_ttl)
            .build();

        Self {
            api,
            project: Arc::new(Mutex::new(Project::new(store))),
            cache,
        }
    }

    fn project(&self) -> Result<MutexGuard<'_, SharedProject>, AppError> {
        self.project
            .lock()
            .map_err(|_| AppError::from(StoreError::Poisoned))
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Search and plant pages
        .route("/api/search", get(search_plants))
        .route("/api/plants/:code", get(get_plant))

        // Taxonomy browsing
        .route("/api/genus", get(list_genera))
        .route("/api/genus/:genus", get(list_species_of_genus))
        .route("/api/species", get(list_species))

        // Functional group reference
        .route("/api/groups", get(list_functional_groups))

        // Project (cart)
        .route("/api/project", get(get_project).delete(clear_project))
        .route("/api/project/:code", post(add_to_project).delete(remove_from_project))

        // Upstream bulk import
        .route("/api/import", post(trigger_import))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// GET /api/search?<filters>
///
/// The inbound query is decoded defensively and re-encoded, so malformed or
/// redundant parameters never reach the catalog API and equivalent searches
/// share one cache entry.
#[cfg(feature = "api")]
async fn search_plants(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<serde_json::Value>, AppError> {
    let filters = decode(&parse_query_string(raw.as_deref().unwrap_or("")));
    let query = to_query_string(&encode(&filters));
    let cache_key = format!("search:{}", query);

    let plants = match state.cache.get(&cache_key).await {
        Some(cached) => {
            tracing::debug!("Cache hit for search '{}'", query);
            cached
        }
        None => {
            let start = std::time::Instant::now();
            let plants = Arc::new(state.api.search_plants(&filters).await?);
            tracing::debug!(
                "Search '{}' returned {} plants in {:?}",
                query,
                plants.len(),
                start.elapsed()
            );
            state.cache.insert(cache_key, plants.clone()).await;
            plants
        }
    };

    Ok(Json(serde_json::json!({
        "query": query,
        "filters": filters,
        "rows": plants.len(),
        "data": plants.as_slice(),
        "summary": {
            "native": native_ratio(&plants),
            "types": type_distribution(&plants),
            "functionalGroups": functional_group_histogram(&plants, FunctionalGroup::ALL),
            "genera": genus_table(&plants),
        },
    })))
}

#[cfg(feature = "api")]
async fn get_plant(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    tracing::debug!("Fetching plant {}", code);
    let plant = state
        .api
        .get_plant(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plant {} not found", code)))?;

    let in_project = state.project()?.contains(&plant.code)?;
    let sun_exposures: Vec<&str> = plant
        .sun_exposures()
        .into_iter()
        .map(SunExposure::label)
        .collect();

    Ok(Json(serde_json::json!({
        "plant": plant,
        "displayName": plant.display_name(),
        "label": plant.label(),
        "typeLabel": plant.plant_type.as_deref().and_then(type_label),
        "functionalGroupLabel": plant.functional_group.as_deref().and_then(functional_group_label),
        "zoneLabel": plant.zone.as_deref().and_then(zone_label),
        "woody": plant.plant_type().map(PlantType::is_woody),
        "sunExposures": sun_exposures,
        "bloomSpan": plant.bloom_span(),
        "inProject": in_project,
    })))
}

#[cfg(feature = "api")]
async fn list_genera(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let genera = state.api.genera().await?;
    Ok(Json(serde_json::json!({
        "rows": genera.len(),
        "data": genera,
    })))
}

#[cfg(feature = "api")]
async fn list_species_of_genus(
    State(state): State<AppState>,
    Path(genus): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let species = state.api.species_of(&genus).await?;
    Ok(Json(serde_json::json!({
        "genus": genus,
        "rows": species.len(),
        "data": species,
    })))
}

/// All species grouped under their genus
#[cfg(feature = "api")]
async fn list_species(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let pairs = state.api.all_species().await?;
    let grouped = species_by_genus(&pairs);
    Ok(Json(serde_json::json!({
        "rows": grouped.len(),
        "data": grouped,
    })))
}

#[cfg(feature = "api")]
async fn list_functional_groups(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let rows = state.api.group_rows().await?;
    let reference = functional_group_reference(&rows);
    Ok(Json(serde_json::json!({
        "rows": reference.len(),
        "data": reference,
    })))
}

#[cfg(feature = "api")]
async fn get_project(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let project = state.project()?;
    let plants = project.plants()?;
    let summary = project_summary(&plants);

    Ok(Json(serde_json::json!({
        "rows": plants.len(),
        "data": plants,
        "summary": summary,
    })))
}

#[cfg(feature = "api")]
async fn clear_project(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.project()?.clear()?;
    tracing::info!("Project cleared");
    Ok(Json(serde_json::json!({ "cleared": true })))
}

/// POST /api/project/:code
///
/// 201 when the plant was added, 200 when it was already in the project.
#[cfg(feature = "api")]
async fn add_to_project(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let already = state.project()?.contains(&code)?;
    if already {
        return Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "code": code, "added": false })),
        ));
    }

    let plant = state
        .api
        .get_plant(&code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Plant {} not found", code)))?;

    let added = state.project()?.add(plant)?;
    if added {
        tracing::info!("Added {} to project", code);
    }

    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(serde_json::json!({ "code": code, "added": added }))))
}

#[cfg(feature = "api")]
async fn remove_from_project(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.project()?.remove(&code)? {
        return Err(AppError::NotFound(format!("Plant {} is not in the project", code)));
    }
    tracing::info!("Removed {} from project", code);
    Ok(Json(serde_json::json!({ "code": code, "removed": true })))
}

/// Triggers the upstream import and drops cached searches
#[cfg(feature = "api")]
async fn trigger_import(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.api.import().await?;
    state.cache.invalidate_all();
    tracing::info!("Catalog import triggered, search cache invalidated");
    Ok(Json(serde_json::json!({ "status": "started" })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
enum AppError {
    Upstream(String),
    Store(String),
    NotFound(String),
}

#[cfg(feature = "api")]
impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        tracing::warn!("Catalog API error: {}", e);
        AppError::Upstream(e.to_string())
    }
}

#[cfg(feature = "api")]
impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Project store error: {}", e);
        AppError::Store(e.to_string())
    }
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Store(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
