//! Image fetching for the feed and the overlay: direct download with an
//! authenticated fallback, bounded retries for thumbnails, and sequential
//! candidate probing for full-size renditions.

use api_client::{ApiClient, Scope};
use iced::widget::image::Handle;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};

/// Per-candidate budget when probing for a full-size rendition.
pub const FULL_CANDIDATE_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum ImageLoaderError {
    #[error("network error: {0}")]
    Request(String),
    #[error("image bytes did not decode")]
    Decode,
    #[error("semaphore closed")]
    SemaphoreClosed,
}

/// A decoded image ready for display, with its natural dimensions.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub handle: Handle,
    pub width: u32,
    pub height: u32,
}

/// Retry schedule for thumbnail loads: exponential backoff between
/// attempts, each attempt bounded by its own timeout.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_millis(600),
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of a retried load. A `None` image after `attempts` tries means
/// the caller keeps showing its fallback; the pipeline never errors out.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub image: Option<LoadedImage>,
    pub attempts: u32,
}

/// A full-size rendition together with the candidate URL that produced it.
#[derive(Debug, Clone)]
pub struct ResolvedFull {
    pub url: String,
    pub image: LoadedImage,
}

#[derive(Debug, Clone)]
pub struct ImageLoader {
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            semaphore: Arc::new(Semaphore::new(4)),
        }
    }

    async fn fetch_direct(&self, url: &str) -> Result<Vec<u8>, ImageLoaderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageLoaderError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ImageLoaderError::Request(format!(
                "status {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageLoaderError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// One load attempt: a plain GET first, then the same URL through the
    /// authenticated client when the direct bytes fail to arrive or to
    /// decode. A body that decodes to zero dimensions counts as a failure.
    async fn fetch_with_fallback(
        &self,
        api: &ApiClient,
        url: &str,
    ) -> Result<LoadedImage, ImageLoaderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ImageLoaderError::SemaphoreClosed)?;
        let absolute = api.absolute_url(url);
        if let Some(image) = self.fetch_direct(&absolute).await.ok().and_then(decode) {
            return Ok(image);
        }
        tracing::debug!(url, "direct fetch failed, retrying with credentials");
        let bytes = api
            .fetch_image(url)
            .await
            .map_err(|e| ImageLoaderError::Request(e.to_string()))?;
        decode(bytes).ok_or(ImageLoaderError::Decode)
    }

    /// Single-shot load for grid thumbnails.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, api)))]
    pub async fn load_thumbnail(
        &self,
        api: &ApiClient,
        url: &str,
    ) -> Result<LoadedImage, ImageLoaderError> {
        self.fetch_with_fallback(api, url).await
    }

    /// Retried load for the overlay: up to `max_attempts` tries, doubling
    /// the delay between them. Returns the outcome instead of an error so
    /// the caller's fallback image simply stays up on exhaustion.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, api, policy)))]
    pub async fn load_with_retries(
        &self,
        api: &ApiClient,
        url: &str,
        policy: &RetryPolicy,
    ) -> RetryOutcome {
        let mut delay = policy.initial_delay;
        for attempt in 1..=policy.max_attempts {
            match timeout(policy.attempt_timeout, self.fetch_with_fallback(api, url)).await {
                Ok(Ok(image)) => {
                    return RetryOutcome {
                        image: Some(image),
                        attempts: attempt,
                    }
                }
                Ok(Err(err)) => tracing::debug!(url, attempt, %err, "load attempt failed"),
                Err(_) => tracing::debug!(url, attempt, "load attempt timed out"),
            }
            if attempt < policy.max_attempts {
                sleep(delay).await;
                delay *= 2;
            }
        }
        RetryOutcome {
            image: None,
            attempts: policy.max_attempts,
        }
    }

    /// Try full-size candidates strictly in order; the first one that
    /// downloads and decodes wins. Personal-scope photos always go through
    /// the authenticated client so the token rides along.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, api, candidates)))]
    pub async fn resolve_full(
        &self,
        api: &ApiClient,
        scope: Scope,
        candidates: &[String],
    ) -> Option<ResolvedFull> {
        let _permit = self.semaphore.acquire().await.ok()?;
        for url in candidates {
            let fetched = if scope == Scope::Personal {
                timeout(FULL_CANDIDATE_TIMEOUT, api.fetch_image(url))
                    .await
                    .ok()
                    .and_then(|r| r.ok())
            } else {
                timeout(FULL_CANDIDATE_TIMEOUT, self.fetch_direct(&api.absolute_url(url)))
                    .await
                    .ok()
                    .and_then(|r| r.ok())
            };
            if let Some(image) = fetched.and_then(decode) {
                tracing::debug!(url, "full-size candidate accepted");
                return Some(ResolvedFull {
                    url: url.clone(),
                    image,
                });
            }
            tracing::debug!(url, "full-size candidate rejected");
        }
        None
    }
}

fn decode(bytes: Vec<u8>) -> Option<LoadedImage> {
    let decoded = image::load_from_memory(&bytes).ok()?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return None;
    }
    Some(LoadedImage {
        handle: Handle::from_memory(bytes),
        width,
        height,
    })
}

/// Build the ordered list of full-size URL guesses for a photo, given the
/// known full URL (if any), a previously discovered URL, and the thumbnail
/// source. Duplicates are dropped while preserving order.
pub fn full_url_candidates(
    known: Option<&str>,
    discovered: Option<&str>,
    thumb: &str,
) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |url: String| {
        if !url.is_empty() && !candidates.contains(&url) {
            candidates.push(url);
        }
    };
    if let Some(url) = known {
        push(url.to_string());
    }
    if let Some(url) = discovered {
        push(url.to_string());
    }
    if !thumb.is_empty() {
        if thumb.contains("/thumbs/") {
            push(thumb.replacen("/thumbs/", "/images/", 1));
        }
        if let Some(stripped) = strip_thumb_infix(thumb) {
            push(stripped);
        }
        if let Some(stripped) = strip_thumb_suffix(thumb) {
            push(stripped);
        }
        if let Some((base, _)) = thumb.split_once('?') {
            push(base.to_string());
        }
        if thumb.contains("/thumb") {
            push(thumb.replacen("/thumb", "/full", 1));
        }
    }
    candidates
}

/// Drop the first `thumb_` / `thumb-` fragment: `/p/thumb_cat.jpg` becomes
/// `/p/cat.jpg`.
fn strip_thumb_infix(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    for pat in ["thumb_", "thumb-"] {
        if let Some(i) = lower.find(pat) {
            let mut out = String::with_capacity(url.len() - pat.len());
            out.push_str(&url[..i]);
            out.push_str(&url[i + pat.len()..]);
            return Some(out);
        }
    }
    None
}

/// Drop a `_thumb` / `-thumb` suffix before the extension: `cat_thumb.jpg`
/// becomes `cat.jpg`. Only applies when the URL ends in a plain extension.
fn strip_thumb_suffix(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    let dot = lower.rfind('.')?;
    if !lower[dot + 1..].chars().all(|c| c.is_ascii_alphanumeric())
        || lower[dot + 1..].is_empty()
    {
        return None;
    }
    for pat in ["_thumb", "-thumb"] {
        if lower[..dot].ends_with(pat) {
            let mut out = String::with_capacity(url.len() - pat.len());
            out.push_str(&url[..dot - pat.len()]);
            out.push_str(&url[dot..]);
            return Some(out);
        }
    }
    None
}
