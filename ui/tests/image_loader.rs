use api_client::{ApiClient, Scope};
use httpmock::prelude::*;
use std::io::Cursor;
use std::time::Duration;
use ui::image_loader::{full_url_candidates, ImageLoader, RetryPolicy};

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([12, 34, 56, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("encode test image");
    bytes.into_inner()
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        attempt_timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn retries_stop_at_the_attempt_bound() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/thumbs/1");
            then.status(404);
        })
        .await;

    let api = ApiClient::with_token(server.base_url(), Some("tok".into()));
    let loader = ImageLoader::new();
    let outcome = loader
        .load_with_retries(&api, "/thumbs/1", &fast_policy(3))
        .await;

    assert!(outcome.image.is_none());
    assert_eq!(outcome.attempts, 3);
    // each attempt tries the direct GET and then the authenticated one
    mock.assert_hits_async(6).await;
}

#[tokio::test]
async fn success_stops_further_attempts() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/thumbs/1");
            then.status(200).body(tiny_png());
        })
        .await;

    let api = ApiClient::new(server.base_url());
    let loader = ImageLoader::new();
    let outcome = loader
        .load_with_retries(&api, "/thumbs/1", &fast_policy(6))
        .await;

    let image = outcome.image.expect("image should load");
    assert_eq!(outcome.attempts, 1);
    assert_eq!((image.width, image.height), (2, 2));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn undecodable_body_counts_as_failure() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/thumbs/1");
            then.status(200).body("<html>not an image</html>");
        })
        .await;

    let api = ApiClient::new(server.base_url());
    let loader = ImageLoader::new();
    let outcome = loader
        .load_with_retries(&api, "/thumbs/1", &fast_policy(2))
        .await;

    assert!(outcome.image.is_none());
    assert_eq!(outcome.attempts, 2);
}

#[tokio::test]
async fn authenticated_fallback_recovers_protected_images() {
    let server = MockServer::start_async().await;
    // only the credentialed request matches; the direct one gets a 404
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/thumbs/9")
                .header("authorization", "Bearer tok");
            then.status(200).body(tiny_png());
        })
        .await;

    let api = ApiClient::with_token(server.base_url(), Some("tok".into()));
    let loader = ImageLoader::new();
    let image = loader
        .load_thumbnail(&api, "/thumbs/9")
        .await
        .expect("fallback should recover the image");

    assert_eq!((image.width, image.height), (2, 2));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn first_working_candidate_wins() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET).path("/images/5");
            then.status(200).body(tiny_png());
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET).path("/full/5");
            then.status(200).body(tiny_png());
        })
        .await;

    let api = ApiClient::new(server.base_url());
    let loader = ImageLoader::new();
    let candidates = vec!["/images/5".to_string(), "/full/5".to_string()];
    let resolved = loader
        .resolve_full(&api, Scope::Shared, &candidates)
        .await
        .expect("first candidate should resolve");

    assert_eq!(resolved.url, "/images/5");
    first.assert_hits_async(1).await;
    second.assert_hits_async(0).await;
}

#[tokio::test]
async fn failing_candidates_are_skipped_in_order() {
    let server = MockServer::start_async().await;
    let _broken = server
        .mock_async(|when, then| {
            when.method(GET).path("/images/5");
            then.status(404);
        })
        .await;
    let working = server
        .mock_async(|when, then| {
            when.method(GET).path("/full/5");
            then.status(200).body(tiny_png());
        })
        .await;

    let api = ApiClient::new(server.base_url());
    let loader = ImageLoader::new();
    let candidates = vec!["/images/5".to_string(), "/full/5".to_string()];
    let resolved = loader
        .resolve_full(&api, Scope::Shared, &candidates)
        .await
        .expect("second candidate should resolve");

    assert_eq!(resolved.url, "/full/5");
    working.assert_hits_async(1).await;
}

#[tokio::test]
async fn personal_candidates_carry_credentials() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/images/5")
                .header("authorization", "Bearer tok");
            then.status(200).body(tiny_png());
        })
        .await;

    let api = ApiClient::with_token(server.base_url(), Some("tok".into()));
    let loader = ImageLoader::new();
    let resolved = loader
        .resolve_full(&api, Scope::Personal, &["/images/5".to_string()])
        .await
        .expect("personal fetch should use the token");

    assert_eq!(resolved.url, "/images/5");
    mock.assert_hits_async(1).await;
}

#[test]
fn candidate_derivation_covers_all_rewrites() {
    let candidates = full_url_candidates(
        Some("/images/3"),
        Some("/previously/found/3"),
        "/thumbs/thumb_3.jpg?w=150",
    );
    assert_eq!(candidates[0], "/images/3");
    assert_eq!(candidates[1], "/previously/found/3");
    assert!(candidates.contains(&"/images/thumb_3.jpg?w=150".to_string()));
    assert!(candidates.contains(&"/thumbs/3.jpg?w=150".to_string()));
    assert!(candidates.contains(&"/thumbs/thumb_3.jpg".to_string()));
}
