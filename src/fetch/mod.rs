//! HTTP access to the statistics backend.
//!
//! The backend is an external collaborator reached through the
//! [`StatsApi`] trait. [`HttpStatsApi`] talks to the real REST service.
//! Tests use an in-process mock serving canned data.

#[cfg(test)]
mod mock;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::models::{
    GroupedTournaments, GroupingMode, HeroDetails, Stage, StatsResponse, Team, Tournament,
};

#[cfg(test)]
pub use mock::MockStatsApi;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Coarse failure classes the views react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request rejected, unreachable host or non-success status.
    NetworkFailure,
    /// Body could not be decoded into the expected shape.
    ParseFailure,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Http(e) if e.is_decode() => FailureKind::ParseFailure,
            FetchError::Parse { .. } => FailureKind::ParseFailure,
            FetchError::Http(_) | FetchError::HttpStatus { .. } | FetchError::InvalidUrl(_) => {
                FailureKind::NetworkFailure
            }
        }
    }
}

/// Scope of a team listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamQuery {
    /// Every team the backend knows.
    All,
    /// Teams that played in any of the named tournaments.
    Tournaments(Vec<String>),
    /// Teams that have fielded the named hero.
    Hero(String),
}

impl TeamQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            TeamQuery::All => Vec::new(),
            TeamQuery::Tournaments(names) => {
                names.iter().map(|n| ("tournaments", n.clone())).collect()
            }
            TeamQuery::Hero(hero) => vec![("hero_name", hero.clone())],
        }
    }
}

/// Filter dimensions sent with stats and hero-detail requests.
///
/// An empty dimension is omitted from the query, meaning "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsQuery {
    pub tournaments: Vec<String>,
    pub stages: Vec<Stage>,
    pub teams: Vec<String>,
}

impl StatsQuery {
    /// Repeated-key query pairs (`tournaments=A&tournaments=B`).
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let tournaments = self.tournaments.iter().map(|t| ("tournaments", t.clone()));
        let stages = self.stages.iter().map(|s| ("stages", s.clone()));
        let teams = self.teams.iter().map(|t| ("teams", t.clone()));
        tournaments.chain(stages).chain(teams).collect()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.tournaments.is_empty() && self.stages.is_empty() && self.teams.is_empty()
    }
}

/// The statistics backend.
#[async_trait]
pub trait StatsApi: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// `GET /api/tournaments`
    async fn tournaments(&self) -> Result<Vec<Tournament>, FetchError>;

    /// `GET /api/tournaments?group_by=split|region`
    async fn grouped_tournaments(
        &self,
        mode: GroupingMode,
    ) -> Result<GroupedTournaments, FetchError>;

    /// `GET /api/teams[?tournaments=..]*[?hero_name=..]`
    async fn teams(&self, scope: &TeamQuery) -> Result<Vec<Team>, FetchError>;

    /// `GET /api/stages?tournaments=..*`
    async fn stages(&self, tournaments: &[String]) -> Result<Vec<Stage>, FetchError>;

    /// `GET /api/heroes`
    async fn heroes(&self) -> Result<Vec<String>, FetchError>;

    /// `GET /api/heroes/{hero}[?tournaments=..&stages=..&teams=..]`
    async fn hero_details(&self, hero: &str, query: &StatsQuery)
        -> Result<HeroDetails, FetchError>;

    /// `GET /api/stats[?tournaments=..&stages=..&teams=..]`
    async fn stats(&self, query: &StatsQuery) -> Result<StatsResponse, FetchError>;
}

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the backend, e.g. `http://127.0.0.1:8000`
    pub base_url: Url,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

/// REST client for the statistics backend.
pub struct HttpStatsApi {
    client: Client,
    base_url: Url,
}

impl HttpStatsApi {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("mlbb-meta/0.1.0")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        let mut base_url = config.base_url;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Build the full URL for an endpoint path plus repeated-key query pairs.
    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))?;
        append_query(&mut url, query);
        Ok(url)
    }

    fn hero_endpoint(&self, hero: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = self.endpoint("api/heroes", &[])?;
        let invalid = FetchError::InvalidUrl(url.to_string());
        url.path_segments_mut().map_err(|_| invalid)?.push(hero);
        append_query(&mut url, query);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

fn append_query(url: &mut Url, query: &[(&str, String)]) {
    if query.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in query {
        pairs.append_pair(key, value);
    }
}

#[async_trait]
impl StatsApi for HttpStatsApi {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn tournaments(&self) -> Result<Vec<Tournament>, FetchError> {
        let url = self.endpoint("api/tournaments", &[])?;
        let list: Vec<Tournament> = self.get_json(url).await?;
        info!("Loaded {} tournaments", list.len());
        Ok(list)
    }

    async fn grouped_tournaments(
        &self,
        mode: GroupingMode,
    ) -> Result<GroupedTournaments, FetchError> {
        let url = self.endpoint("api/tournaments", &[("group_by", mode.to_string())])?;
        let grouped: GroupedTournaments = self.get_json(url).await?;
        info!("Loaded {} tournament groups by {}", grouped.len(), mode);
        Ok(grouped)
    }

    async fn teams(&self, scope: &TeamQuery) -> Result<Vec<Team>, FetchError> {
        let url = self.endpoint("api/teams", &scope.to_pairs())?;
        self.get_json(url).await
    }

    async fn stages(&self, tournaments: &[String]) -> Result<Vec<Stage>, FetchError> {
        let pairs: Vec<(&str, String)> =
            tournaments.iter().map(|t| ("tournaments", t.clone())).collect();
        let url = self.endpoint("api/stages", &pairs)?;
        self.get_json(url).await
    }

    async fn heroes(&self) -> Result<Vec<String>, FetchError> {
        let url = self.endpoint("api/heroes", &[])?;
        self.get_json(url).await
    }

    async fn hero_details(
        &self,
        hero: &str,
        query: &StatsQuery,
    ) -> Result<HeroDetails, FetchError> {
        let url = self.hero_endpoint(hero, &query.to_pairs())?;
        self.get_json(url).await
    }

    async fn stats(&self, query: &StatsQuery) -> Result<StatsResponse, FetchError> {
        let url = self.endpoint("api/stats", &query.to_pairs())?;
        self.get_json(url).await
    }
}
