//! TMDB API client.

use crate::models::config::TmdbConfig;
use crate::models::{DetailResult, SearchResult};
use crate::services::metadata::MetadataApi;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// TMDB API client.
pub struct TmdbClient {
    api_key: String,
    language: String,
    base_url: String,
    /// Whether to use Bearer token authentication (API v4 style)
    use_bearer: bool,
    client: reqwest::Client,
}

/// Movie search result.
#[derive(Debug, Deserialize)]
struct MovieSearchResponse {
    results: Vec<MovieItem>,
}

/// Movie as returned by search and by `movie/{id}`.
#[derive(Debug, Deserialize)]
struct MovieItem {
    id: u64,
    title: String,
    original_title: String,
    release_date: Option<String>,
}

/// Movie details, only the parts we read.
#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(flatten)]
    movie: MovieItem,
    #[serde(default)]
    genres: Vec<NamedItem>,
}

/// Genre or keyword.
#[derive(Debug, Deserialize)]
struct NamedItem {
    id: u64,
    name: String,
}

/// Movie credits.
#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<NamedItem>,
    #[serde(default)]
    crew: Vec<CrewMember>,
}

/// Crew member.
#[derive(Debug, Deserialize)]
struct CrewMember {
    id: u64,
    name: String,
    job: String,
}

/// Keyword list.
#[derive(Debug, Deserialize)]
struct Keywords {
    #[serde(default)]
    keywords: Vec<NamedItem>,
}

/// External IDs for a movie.
#[derive(Debug, Deserialize)]
struct ExternalIds {
    imdb_id: Option<String>,
}

/// Year part of a TMDB date ("2015-09-17").
fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

impl From<MovieItem> for SearchResult {
    fn from(item: MovieItem) -> Self {
        Self {
            release_year: year_of(item.release_date.as_deref()),
            external_id: item.id,
            title: item.title,
            original_title: item.original_title,
        }
    }
}

impl From<NamedItem> for DetailResult {
    fn from(item: NamedItem) -> Self {
        Self {
            external_id: item.id,
            name: item.name,
        }
    }
}

impl TmdbClient {
    /// Create a new TMDB client.
    ///
    /// Supports both API key (v3) and Bearer token (v4) formats.
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::TmdbApiKeyMissing)?;

        // Bearer tokens start with "eyJ" (base64 encoded JWT header)
        let use_bearer = api_key.starts_with("eyJ");

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            use_bearer,
            client,
        })
    }

    /// Which TMDB credential kind the configured key is.
    pub fn auth_scheme(&self) -> &'static str {
        if self.use_bearer {
            "v4 bearer token"
        } else {
            "v3 api key"
        }
    }

    /// Build a request with proper authentication.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        if self.use_bearer {
            request.header("Authorization", format!("Bearer {}", self.api_key))
        } else {
            request
        }
    }

    /// Build URL with optional api_key parameter (only for v3 style).
    fn build_url(&self, path: &str, extra_params: &str) -> String {
        if self.use_bearer {
            format!(
                "{}/{}?language={}{}",
                self.base_url, path, self.language, extra_params
            )
        } else {
            format!(
                "{}/{}?api_key={}&language={}{}",
                self.base_url, path, self.api_key, self.language, extra_params
            )
        }
    }

    /// GET a path and decode the JSON body, mapping TMDB status codes.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, extra_params: &str) -> Result<T> {
        let url = self.build_url(path, extra_params);
        tracing::debug!("TMDB GET {}", path);

        let resp = self.build_request(&url).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::Throttled);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }

    /// Verify API key is valid.
    pub async fn verify_api_key(&self) -> Result<bool> {
        let url = if self.use_bearer {
            format!("{}/authentication", self.base_url)
        } else {
            format!("{}/authentication?api_key={}", self.base_url, self.api_key)
        };

        let resp = self.build_request(&url).send().await?;
        Ok(resp.status().is_success())
    }
}

#[async_trait]
impl MetadataApi for TmdbClient {
    async fn search_movie(&self, title: &str, year: Option<i32>) -> Result<Vec<SearchResult>> {
        let year_param = year.map(|y| format!("&year={}", y)).unwrap_or_default();
        let resp: MovieSearchResponse = self
            .get_json(
                "search/movie",
                &format!("&query={}{}", urlencoding::encode(title), year_param),
            )
            .await?;
        Ok(resp.results.into_iter().map(SearchResult::from).collect())
    }

    async fn get_movie_info(&self, external_id: u64) -> Result<SearchResult> {
        let item: MovieItem = self.get_json(&format!("movie/{}", external_id), "").await?;
        Ok(item.into())
    }

    async fn external_id_exists(&self, external_id: u64) -> Result<bool> {
        match self.get_movie_info(external_id).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_movie_genres(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        let details: MovieDetails = self.get_json(&format!("movie/{}", external_id), "").await?;
        tracing::debug!("Genres for {}: {}", details.movie.title, details.genres.len());
        Ok(details.genres.into_iter().map(DetailResult::from).collect())
    }

    async fn get_movie_cast(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        let credits: Credits = self
            .get_json(&format!("movie/{}/credits", external_id), "")
            .await?;
        Ok(credits.cast.into_iter().map(DetailResult::from).collect())
    }

    async fn get_movie_directors(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        let credits: Credits = self
            .get_json(&format!("movie/{}/credits", external_id), "")
            .await?;
        Ok(directors_from_crew(credits.crew))
    }

    async fn get_movie_keywords(&self, external_id: u64) -> Result<Vec<DetailResult>> {
        let keywords: Keywords = self
            .get_json(&format!("movie/{}/keywords", external_id), "")
            .await?;
        Ok(keywords.keywords.into_iter().map(DetailResult::from).collect())
    }

    async fn get_movie_imdb_id(&self, external_id: u64) -> Result<Option<String>> {
        let ids: ExternalIds = self
            .get_json(&format!("movie/{}/external_ids", external_id), "")
            .await?;
        Ok(ids.imdb_id.filter(|id| !id.trim().is_empty()))
    }

    fn base_address(&self) -> &str {
        &self.base_url
    }
}

/// Directors from a crew list; a person credited twice is kept once.
fn directors_from_crew(crew: Vec<CrewMember>) -> Vec<DetailResult> {
    let mut seen = HashSet::new();
    crew.into_iter()
        .filter(|c| c.job == "Director" && seen.insert(c.id))
        .map(|c| DetailResult {
            external_id: c.id,
            name: c.name,
        })
        .collect()
}
