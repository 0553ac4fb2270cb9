//! API client module for the photo feed server.

use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Visibility class of a photo. Personal photos require the auth token
/// for both API calls and raw image loads.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Shared,
    Personal,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Shared => "shared",
            Scope::Personal => "personal",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Photo {
    pub id: i64,
    pub thumb_url: String,
    #[serde(default)]
    pub full_url: Option<String>,
    #[serde(default)]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub orig_width: Option<u32>,
    #[serde(default)]
    pub orig_height: Option<u32>,
}

/// One date bucket of the feed, most recent first.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Block {
    pub date: String,
    pub photos: Vec<Photo>,
}

/// Lazily fetched metadata for a single photo.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PhotoInfo {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub orig_name: Option<String>,
    #[serde(default)]
    pub full_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// The upload endpoint answers either `{"photo": {...}}` or a bare `{"id": n}`.
#[derive(Debug, Deserialize, Clone)]
pub struct UploadResponse {
    #[serde(default)]
    photo: Option<Photo>,
    #[serde(default)]
    id: Option<i64>,
}

impl UploadResponse {
    /// Normalize into a full descriptor, deriving the conventional rendition
    /// paths when the server only returned an id.
    pub fn into_photo(self, scope: Scope) -> Result<Photo, ApiClientError> {
        if let Some(photo) = self.photo {
            return Ok(photo);
        }
        match self.id {
            Some(id) => Ok(Photo {
                id,
                thumb_url: format!("/thumbs/{}", id),
                full_url: Some(format!("/images/{}", id)),
                orig_name: None,
                scope,
                orig_width: None,
                orig_height: None,
            }),
            None => Err(ApiClientError::Other(
                "upload response carried neither photo nor id".into(),
            )),
        }
    }
}

#[derive(Debug)]
pub enum ApiClientError {
    RequestError(String),
    ServerError(String),
    Unauthorized,
    Other(String),
}

impl fmt::Display for ApiClientError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiClientError::RequestError(msg) => write!(f, "Request Error: {}", msg),
            ApiClientError::ServerError(msg) => write!(f, "Server Error: {}", msg),
            ApiClientError::Unauthorized => write!(f, "Unauthorized"),
            ApiClientError::Other(msg) => write!(f, "Other Error: {}", msg),
        }
    }
}

impl Error for ApiClientError {}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        ApiClient {
            client: reqwest::Client::new(),
            token: None,
            base_url,
        }
    }

    pub fn with_token(base_url: String, token: Option<String>) -> Self {
        ApiClient {
            client: reqwest::Client::new(),
            token,
            base_url,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a server-relative rendition path against the configured host.
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        req
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiClientError::Unauthorized);
        }
        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiClientError::ServerError(error_text));
        }
        Ok(response)
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn list_blocks(
        &self,
        scope: Scope,
        start: usize,
        count: usize,
    ) -> Result<Vec<Block>, ApiClientError> {
        let url = format!(
            "{}/api/blocks?scope={}&start={}&count={}",
            self.base_url, scope, start, count
        );

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        let response = Self::check(response).await?;

        response
            .json::<Vec<Block>>()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))
    }

    pub async fn photo_info(&self, id: i64) -> Result<PhotoInfo, ApiClientError> {
        let url = format!("{}/api/photo/{}", self.base_url, id);

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        let response = Self::check(response).await?;

        response
            .json::<PhotoInfo>()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))
    }

    /// Exchange credentials for a bearer token. The token is returned to the
    /// caller; session persistence is the session crate's concern.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiClientError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            username: &'a str,
            password: &'a str,
        }

        let url = format!("{}/api/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Login failed".to_string());
            return Err(ApiClientError::ServerError(error_text));
        }

        let login = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        Ok(login.token)
    }

    /// Upload raw image bytes as a base64 JSON payload.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, bytes)))]
    pub async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
        scope: Scope,
    ) -> Result<UploadResponse, ApiClientError> {
        #[derive(Serialize)]
        struct UploadRequest<'a> {
            filename: &'a str,
            data: String,
        }

        let url = format!("{}/api/upload?scope={}", self.base_url, scope);
        let payload = UploadRequest {
            filename,
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        };

        let mut req = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&payload);
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = req
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        let response = Self::check(response).await?;

        response
            .json::<UploadResponse>()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))
    }

    /// Delete a photo. On failure the server's body text is the error message.
    pub async fn delete_photo(&self, id: i64) -> Result<(), ApiClientError> {
        let url = format!("{}/api/photo/{}", self.base_url, id);
        let mut req = self.client.delete(&url);
        if let Some(token) = &self.token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = req
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    /// Authenticated raw fetch of an image URL. Used when a plain image load
    /// fails and the rendition has to be pulled with the bearer header.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiClientError> {
        let url = self.absolute_url(url);
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        let response = Self::check(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiClientError::RequestError(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
