use api_client::{ApiClient, Scope};
use feed::{load_blocks, upload_photo, FeedError};
use std::sync::Arc;

#[tokio::test]
async fn shared_view_filters_personal_photos() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/blocks?scope=shared&start=0&count=4")
        .with_status(200)
        .with_body(
            r#"[
                {"date": "2024-01-02", "photos": [
                    {"id": 1, "thumb_url": "/t/1", "scope": "shared"},
                    {"id": 2, "thumb_url": "/t/2", "scope": "personal"}
                ]},
                {"date": "2024-01-01", "photos": [
                    {"id": 3, "thumb_url": "/t/3", "scope": "personal"}
                ]}
            ]"#,
        )
        .create_async()
        .await;

    let client = ApiClient::new(server.url());
    let blocks = load_blocks(&client, Scope::Shared, 0, 4).await.unwrap();

    // The emptied block survives so pagination still counts it.
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].photos.len(), 1);
    assert_eq!(blocks[0].photos[0].id, 1);
    assert!(blocks[1].photos.is_empty());
}

#[tokio::test]
async fn personal_view_keeps_everything() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/blocks?scope=personal&start=0&count=4")
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_body(
            r#"[{"date": "2024-01-02", "photos": [
                {"id": 1, "thumb_url": "/t/1", "scope": "shared"},
                {"id": 2, "thumb_url": "/t/2", "scope": "personal"}
            ]}]"#,
        )
        .create_async()
        .await;

    let client = ApiClient::with_token(server.url(), Some("tok".into()));
    let blocks = load_blocks(&client, Scope::Personal, 0, 4).await.unwrap();
    assert_eq!(blocks[0].photos.len(), 2);
}

#[tokio::test]
async fn expired_session_maps_to_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/api/blocks?scope=shared&start=0&count=4")
        .with_status(401)
        .create_async()
        .await;

    let client = ApiClient::new(server.url());
    let err = load_blocks(&client, Scope::Shared, 0, 4).await.unwrap_err();
    assert!(matches!(err, FeedError::Unauthorized));
}

#[tokio::test]
async fn upload_confirms_descriptor() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/api/upload?scope=personal")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body(r#"{"photo": {"id": 5, "thumb_url": "/thumbs/5", "full_url": "/images/5", "orig_name": "cat.jpg", "scope": "personal"}}"#)
        .create_async()
        .await;

    let client = ApiClient::new(server.url());
    let photo = upload_photo(client, "cat.jpg".into(), Arc::new(vec![0xFF, 0xD8]), Scope::Personal)
        .await
        .unwrap();

    assert_eq!(photo.id, 5);
    assert_eq!(photo.thumb_url, "/thumbs/5");
}

#[tokio::test]
async fn upload_failure_surfaces_server_text() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/api/upload?scope=shared")
        .with_status(500)
        .with_body("disk full")
        .create_async()
        .await;

    let client = ApiClient::new(server.url());
    let err = upload_photo(client, "cat.jpg".into(), Arc::new(vec![1]), Scope::Shared)
        .await
        .unwrap_err();
    match err {
        FeedError::Api(msg) => assert_eq!(msg, "disk full"),
        other => panic!("unexpected error: {other}"),
    }
}
