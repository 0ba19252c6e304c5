//! Catalog API Client
//!
//! Async client for the remote plant catalog REST API, behind the
//! [`PlantApi`] trait so the web service and tests can swap implementations.
//!
//! Endpoints consumed:
//!   - GET  /api/plants?<filters>     plant search
//!   - GET  /api/plants/{code}        single plant (404 = not found)
//!   - GET  /api/genus                genus names
//!   - GET  /api/genus/{genus}        species names of a genus
//!   - GET  /api/species/all          (genus, species) pairs
//!   - GET  /api/group                (functional group, genus, count) rows
//!   - POST /api/plants/import        server-side bulk import

#[cfg(feature = "api")]
use async_trait::async_trait;
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};
#[cfg(feature = "api")]
use serde::de::DeserializeOwned;
#[cfg(feature = "api")]
use serde::Serialize;
#[cfg(feature = "api")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "api")]
use std::time::Duration;

#[cfg(feature = "api")]
use crate::aggregation::{GroupRow, SpeciesPair};
#[cfg(feature = "api")]
use crate::error::{CatalogError, CatalogResult};
#[cfg(feature = "api")]
use crate::filters::Filters;
#[cfg(feature = "api")]
use crate::plant::{ApiPlant, Plant};

// ============================================================================
// API Trait
// ============================================================================

#[cfg(feature = "api")]
#[async_trait]
pub trait PlantApi: Send + Sync {
    async fn search_plants(&self, filters: &Filters) -> CatalogResult<Vec<Plant>>;

    /// `Ok(None)` when the catalog has no plant with this code
    async fn get_plant(&self, code: &str) -> CatalogResult<Option<Plant>>;

    async fn genera(&self) -> CatalogResult<Vec<String>>;

    async fn species_of(&self, genus: &str) -> CatalogResult<Vec<String>>;

    async fn all_species(&self) -> CatalogResult<Vec<SpeciesPair>>;

    async fn group_rows(&self) -> CatalogResult<Vec<GroupRow>>;

    async fn import(&self) -> CatalogResult<()>;
}

// ============================================================================
// HTTP Client
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

#[cfg(feature = "api")]
impl CatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> CatalogResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("plant_catalog/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Transport {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> CatalogResult<reqwest::Response> {
        request.send().await.map_err(|e| CatalogError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> CatalogResult<T> {
        response.json::<T>().await.map_err(|e| CatalogError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> CatalogResult<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let response = self.send(self.client.get(&url), &url).await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Self::decode(response, &url).await
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl PlantApi for CatalogClient {
    async fn search_plants(&self, filters: &Filters) -> CatalogResult<Vec<Plant>> {
        let query = filters.to_query_string();
        let path = if query.is_empty() {
            "/api/plants".to_string()
        } else {
            format!("/api/plants?{}", query)
        };

        let raw: Vec<ApiPlant> = self.get_json(&path).await?;
        Ok(raw.into_iter().map(Plant::from).collect())
    }

    async fn get_plant(&self, code: &str) -> CatalogResult<Option<Plant>> {
        let url = self.url(&format!("/api/plants/{}", urlencoding::encode(code)));
        tracing::debug!("GET {}", url);

        let response = self.send(self.client.get(&url), &url).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let raw: ApiPlant = Self::decode(response, &url).await?;
                Ok(Some(Plant::from(raw)))
            }
            status => Err(CatalogError::Status {
                url,
                status: status.as_u16(),
            }),
        }
    }

    async fn genera(&self) -> CatalogResult<Vec<String>> {
        self.get_json("/api/genus").await
    }

    async fn species_of(&self, genus: &str) -> CatalogResult<Vec<String>> {
        self.get_json(&format!("/api/genus/{}", urlencoding::encode(genus)))
            .await
    }

    async fn all_species(&self) -> CatalogResult<Vec<SpeciesPair>> {
        self.get_json("/api/species/all").await
    }

    async fn group_rows(&self) -> CatalogResult<Vec<GroupRow>> {
        self.get_json("/api/group").await
    }

    async fn import(&self) -> CatalogResult<()> {
        let url = self.url("/api/plants/import");
        tracing::info!("POST {}", url);

        let response = self.send(self.client.post(&url), &url).await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Load State and Search Sessions
// ============================================================================

/// Observable state of a fetch
#[cfg(feature = "api")]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    /// The fetch failed; carries a message for display
    Failed(String),
    /// A newer request replaced this one before it finished
    Superseded,
}

#[cfg(feature = "api")]
impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn loaded(self) -> Option<T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn from_result(result: CatalogResult<T>) -> Self {
        match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.to_string()),
        }
    }
}

/// Runs searches for one browsing session, dropping results that a newer
/// search has superseded.
#[cfg(feature = "api")]
#[derive(Debug, Default)]
pub struct SearchSession {
    generation: AtomicU64,
}

#[cfg(feature = "api")]
impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of searches started so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub async fn search(&self, api: &dyn PlantApi, filters: &Filters) -> LoadState<Vec<Plant>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = api.search_plants(filters).await;

        if self.generation.load(Ordering::SeqCst) != ticket {
            tracing::debug!("Search #{} superseded, discarding result", ticket);
            return LoadState::Superseded;
        }

        if let Err(e) = &result {
            tracing::warn!("Search #{} failed: {}", ticket, e);
        }
        LoadState::from_result(result)
    }
}

#[cfg(test)]
#[cfg(feature = "api")]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Answers searches after a delay taken from the query text
    struct DelayedApi;

    #[async_trait]
    impl PlantApi for DelayedApi {
        async fn search_plants(&self, filters: &Filters) -> CatalogResult<Vec<Plant>> {
            let q = filters.q.clone().unwrap_or_default();
            if q == "broken" {
                return Err(CatalogError::Status {
                    url: "/api/plants".to_string(),
                    status: 500,
                });
            }
            let delay = if q == "slow" { 100 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![Plant {
                code: q,
                ..Default::default()
            }])
        }

        async fn get_plant(&self, _code: &str) -> CatalogResult<Option<Plant>> {
            Ok(None)
        }

        async fn genera(&self) -> CatalogResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn species_of(&self, _genus: &str) -> CatalogResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn all_species(&self) -> CatalogResult<Vec<SpeciesPair>> {
            Ok(Vec::new())
        }

        async fn group_rows(&self) -> CatalogResult<Vec<GroupRow>> {
            Ok(Vec::new())
        }

        async fn import(&self) -> CatalogResult<()> {
            Ok(())
        }
    }

    fn query(q: &str) -> Filters {
        Filters {
            q: Some(q.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_search_supersedes_older() {
        let session = Arc::new(SearchSession::new());
        let api = DelayedApi;

        let slow = query("slow");
        let fast = query("fast");
        let (first, second) = tokio::join!(
            session.search(&api, &slow),
            session.search(&api, &fast),
        );

        assert_eq!(first, LoadState::Superseded);
        let plants = second.loaded().unwrap();
        assert_eq!(plants[0].code, "fast");
        assert_eq!(session.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_distinguishable() {
        let session = SearchSession::new();
        let state = session.search(&DelayedApi, &query("broken")).await;
        match state {
            LoadState::Failed(message) => assert!(message.contains("500")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_load_state_helpers() {
        let loading: LoadState<u8> = LoadState::Loading;
        assert!(loading.is_loading());
        assert_eq!(LoadState::Loaded(3u8).loaded(), Some(3));
        assert_eq!(LoadState::<u8>::Superseded.loaded(), None);

        let json = serde_json::to_value(LoadState::<u8>::Failed("down".to_string())).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["value"], "down");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = CatalogClient::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
