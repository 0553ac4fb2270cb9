//! Server transfer orchestration for the photo feed: paginated block
//! loading, the optimistic upload pipeline, and the cosmetic progress
//! model for in-flight uploads.

use api_client::{ApiClient, ApiClientError, Block, Photo, Scope};
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

/// Blocks fetched per feed page.
pub const BLOCKS_PER_LOAD: usize = 4;

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("session expired")]
    Unauthorized,
    #[error("API Error: {0}")]
    Api(String),
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Other Error: {0}")]
    Other(String),
}

impl From<ApiClientError> for FeedError {
    fn from(err: ApiClientError) -> Self {
        match err {
            ApiClientError::Unauthorized => FeedError::Unauthorized,
            ApiClientError::RequestError(msg) => FeedError::Api(msg),
            ApiClientError::ServerError(msg) => FeedError::Api(msg),
            ApiClientError::Other(msg) => FeedError::Other(msg),
        }
    }
}

/// Fetch one page of date-grouped blocks. In shared view the server may
/// still interleave personal photos; they are filtered out here so the
/// store only ever sees what the current scope is allowed to show.
/// Blocks emptied by the filter are kept: pagination counts blocks, so
/// the page length must match what the server actually returned.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(client)))]
pub async fn load_blocks(
    client: &ApiClient,
    scope: Scope,
    start: usize,
    count: usize,
) -> Result<Vec<Block>, FeedError> {
    let mut blocks = client.list_blocks(scope, start, count).await?;
    if scope != Scope::Personal {
        for block in &mut blocks {
            block.photos.retain(|p| p.scope != Scope::Personal);
        }
    }
    tracing::debug!(pages = blocks.len(), start, "loaded feed page");
    Ok(blocks)
}

/// Send one file's bytes to the upload endpoint and normalize the
/// response into a confirmed descriptor. The same byte buffer backs the
/// optimistic preview, so the file is read exactly once.
#[cfg_attr(feature = "trace-spans", tracing::instrument(skip(client, bytes)))]
pub async fn upload_photo(
    client: ApiClient,
    filename: String,
    bytes: Arc<Vec<u8>>,
    scope: Scope,
) -> Result<Photo, FeedError> {
    let response = client.upload(&filename, &bytes, scope).await?;
    let photo = response.into_photo(scope)?;
    tracing::info!(id = photo.id, %scope, "upload confirmed");
    Ok(photo)
}

/// Today's date bucket key for freshly uploaded photos.
pub fn todays_block_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// One step of the simulated upload progress: quick to 60, slower to 90,
/// capped at 98 until the server answers. The percentages are cosmetic;
/// the JSON transport reports no real progress events.
pub fn advance_progress(current: f32) -> f32 {
    let mut rng = rand::thread_rng();
    let step = if current < 60.0 {
        rng.gen_range(4.0..12.0)
    } else if current < 90.0 {
        rng.gen_range(1.0..4.0)
    } else {
        0.5
    };
    (current + step).min(98.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_monotonic_and_capped() {
        let mut p = 0.0_f32;
        for _ in 0..500 {
            let next = advance_progress(p);
            assert!(next > p || next == 98.0);
            assert!(next <= 98.0);
            p = next;
        }
        assert_eq!(p, 98.0);
    }

    #[test]
    fn block_date_format() {
        let date = todays_block_date();
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "-");
        assert_eq!(&date[7..8], "-");
    }
}
