use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::Deserialize;
use shared::{
    domain::{Movie, MovieDraft, MovieId},
    protocol::{CreateMovieResponse, MessageResponse, MovieInput},
};
use tracing::debug;
use url::Url;

use crate::CatalogError;

/// Request/response contract of the catalog service as seen by a client.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_movies(&self) -> Result<Vec<Movie>, CatalogError>;
    async fn create_movie(&self, draft: &MovieDraft) -> Result<CreateMovieResponse, CatalogError>;
    async fn update_movie(
        &self,
        movie_id: MovieId,
        draft: &MovieDraft,
    ) -> Result<MessageResponse, CatalogError>;
    async fn delete_movie(&self, movie_id: MovieId) -> Result<MessageResponse, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Vec<String>,
}

pub struct HttpCatalogApi {
    http: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(server_url: &str) -> Result<Self, CatalogError> {
        let mut base_url = Url::parse(server_url.trim())
            .map_err(|err| CatalogError::InvalidServerUrl(format!("{server_url}: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn movies_url(&self) -> Result<Url, CatalogError> {
        self.endpoint("movies")
    }

    fn movie_url(&self, movie_id: MovieId) -> Result<Url, CatalogError> {
        self.endpoint(&format!("movies/{movie_id}"))
    }

    fn endpoint(&self, path: &str) -> Result<Url, CatalogError> {
        self.base_url
            .join(path)
            .map_err(|err| CatalogError::InvalidServerUrl(err.to_string()))
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_movies(&self) -> Result<Vec<Movie>, CatalogError> {
        let res = self
            .http
            .get(self.movies_url()?)
            .send()
            .await
            .map_err(transport)?;
        let res = ensure_success(res).await?;

        let is_json = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        if !is_json {
            return Err(CatalogError::NotJson);
        }
        res.json().await.map_err(transport)
    }

    async fn create_movie(&self, draft: &MovieDraft) -> Result<CreateMovieResponse, CatalogError> {
        let res = self
            .http
            .post(self.movies_url()?)
            .json(&MovieInput::from(draft))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(res).await?.json().await.map_err(transport)
    }

    async fn update_movie(
        &self,
        movie_id: MovieId,
        draft: &MovieDraft,
    ) -> Result<MessageResponse, CatalogError> {
        let res = self
            .http
            .put(self.movie_url(movie_id)?)
            .json(&MovieInput::from(draft))
            .send()
            .await
            .map_err(transport)?;
        ensure_success(res).await?.json().await.map_err(transport)
    }

    async fn delete_movie(&self, movie_id: MovieId) -> Result<MessageResponse, CatalogError> {
        let res = self
            .http
            .delete(self.movie_url(movie_id)?)
            .send()
            .await
            .map_err(transport)?;
        ensure_success(res).await?.json().await.map_err(transport)
    }
}

async fn ensure_success(res: Response) -> Result<Response, CatalogError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let bytes = res.bytes().await.map_err(transport)?;
    let body = serde_json::from_slice::<ErrorBody>(&bytes).ok();
    debug!(status = status.as_u16(), "catalog request failed");
    Err(api_error(status, body))
}

fn api_error(status: StatusCode, body: Option<ErrorBody>) -> CatalogError {
    let (error, details) = match body {
        Some(body) => (body.error, body.details),
        None => (None, Vec::new()),
    };
    let message = if !details.is_empty() {
        details.join(", ")
    } else {
        error.unwrap_or_else(|| format!("Server responded with status {}", status.as_u16()))
    };
    CatalogError::Api {
        status: status.as_u16(),
        message,
        details,
    }
}

fn transport(err: reqwest::Error) -> CatalogError {
    CatalogError::Transport(err.to_string())
}
