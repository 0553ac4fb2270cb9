use api_client::{Block, Photo, PhotoInfo, Scope};
use std::sync::Arc;
use store::{PendingUpload, PhotoKey, PhotoStore, Selection};

fn photo(id: i64) -> Photo {
    Photo {
        id,
        thumb_url: format!("/t/{}", id),
        full_url: None,
        orig_name: Some(format!("{}.jpg", id)),
        scope: Scope::Shared,
        orig_width: None,
        orig_height: None,
    }
}

fn block(date: &str, ids: &[i64]) -> Block {
    Block {
        date: date.to_string(),
        photos: ids.iter().map(|id| photo(*id)).collect(),
    }
}

fn pending(date: &str) -> PendingUpload {
    PendingUpload {
        orig_name: "new.jpg".into(),
        scope: Scope::Personal,
        block_date: date.into(),
        preview_bytes: Arc::new(vec![1, 2, 3]),
    }
}

#[test]
fn append_page_is_idempotent() {
    let mut store = PhotoStore::new();
    let page = vec![block("2024-01-01", &[1])];

    assert_eq!(store.append_page(page.clone()), 1);
    assert_eq!(store.append_page(page), 0);

    assert_eq!(store.len(), 1);
    assert_eq!(store.get_at(0).unwrap().key, PhotoKey::Id(1));
}

#[test]
fn overlapping_pages_equal_union() {
    let mut once = PhotoStore::new();
    once.append_page(vec![block("2024-01-02", &[1, 2, 3])]);

    let mut twice = PhotoStore::new();
    twice.append_page(vec![block("2024-01-02", &[1, 2])]);
    twice.append_page(vec![block("2024-01-02", &[2, 3])]);

    assert_eq!(once.keys(), twice.keys());
}

#[test]
fn no_duplicate_ids_after_any_sequence() {
    let mut store = PhotoStore::new();
    store.append_page(vec![block("2024-01-02", &[1, 2])]);
    let key = store.insert_pending_upload(pending("2024-01-02"));
    store.append_page(vec![block("2024-01-02", &[2, 3])]);
    store.confirm_upload(key, photo(4));
    store.remove(PhotoKey::Id(2));
    store.append_page(vec![block("2024-01-02", &[2])]);

    let mut ids: Vec<i64> = store.iter().filter_map(|p| p.id()).collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn pending_upload_prepends_into_matching_bucket() {
    let mut store = PhotoStore::new();
    store.append_page(vec![block("2024-01-05", &[1, 2]), block("2024-01-04", &[3])]);

    let key = store.insert_pending_upload(pending("2024-01-04"));
    assert_eq!(store.position_of(key), Some(2));
    assert_eq!(store.get(key).unwrap().block_date, "2024-01-04");
}

#[test]
fn pending_upload_opens_new_bucket_at_top() {
    let mut store = PhotoStore::new();
    store.append_page(vec![block("2024-01-05", &[1])]);

    let key = store.insert_pending_upload(pending("2024-01-06"));
    assert_eq!(store.position_of(key), Some(0));
}

#[test]
fn confirm_upload_replaces_in_place() {
    let mut store = PhotoStore::new();
    store.append_page(vec![block("2024-01-05", &[1])]);
    let key = store.insert_pending_upload(pending("2024-01-05"));
    let position = store.position_of(key).unwrap();

    let confirmed = store.confirm_upload(key, photo(9)).unwrap();
    assert_eq!(confirmed, PhotoKey::Id(9));
    assert_eq!(store.position_of(confirmed), Some(position));
    assert_eq!(store.len(), 2);
    assert!(store.get(key).is_none());
}

#[test]
fn confirm_upload_never_duplicates_existing_id() {
    let mut store = PhotoStore::new();
    store.append_page(vec![block("2024-01-05", &[9])]);
    let key = store.insert_pending_upload(pending("2024-01-05"));

    assert!(store.confirm_upload(key, photo(9)).is_none());
    assert_eq!(store.len(), 1);
}

#[test]
fn rollback_removes_pending_entry() {
    let mut store = PhotoStore::new();
    let key = store.insert_pending_upload(pending("2024-01-05"));
    assert_eq!(store.len(), 1);

    assert!(store.remove(key));
    assert!(store.is_empty());
    assert!(!store.remove(key));
}

#[test]
fn remove_unknown_id_is_noop() {
    let mut store = PhotoStore::new();
    store.append_page(vec![block("2024-01-05", &[1])]);
    assert!(!store.remove(PhotoKey::Id(42)));
    assert_eq!(store.len(), 1);
}

#[test]
fn apply_info_merges_lazy_metadata() {
    let mut store = PhotoStore::new();
    store.append_page(vec![block("2024-01-05", &[1])]);

    store.apply_info(
        1,
        &PhotoInfo {
            time: Some("2024-01-05T10:31".into()),
            owner: Some("alice".into()),
            orig_name: None,
            full_url: Some("/images/1".into()),
        },
    );

    let entry = store.get(PhotoKey::Id(1)).unwrap();
    assert_eq!(entry.uploaded_at.as_deref(), Some("2024-01-05T10:31"));
    assert_eq!(entry.owner.as_deref(), Some("alice"));
    assert_eq!(entry.full_url.as_deref(), Some("/images/1"));
    assert_eq!(entry.orig_name, "1.jpg");
}

#[test]
fn grouped_preserves_block_order() {
    let mut store = PhotoStore::new();
    store.append_page(vec![
        block("2024-01-05", &[1, 2]),
        block("2024-01-04", &[3]),
    ]);
    store.insert_pending_upload(pending("2024-01-05"));

    let groups = store.grouped();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, "2024-01-05");
    assert_eq!(groups[0].1.len(), 3);
    assert!(groups[0].1[0].is_pending());
    assert_eq!(groups[1].0, "2024-01-04");
}

#[test]
fn selection_toggle_and_clear() {
    let mut selection = Selection::default();
    assert!(selection.toggle(1));
    assert!(selection.toggle(2));
    assert!(!selection.toggle(1));
    assert_eq!(selection.len(), 1);
    assert!(selection.contains(2));

    selection.clear();
    assert!(selection.is_empty());
}
