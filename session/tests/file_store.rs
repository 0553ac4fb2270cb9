use serial_test::serial;
use session::{Session, USE_FILE_STORE_ENV};
use tempfile::TempDir;

#[test]
#[serial]
fn token_roundtrip_through_file_store() {
    let dir = TempDir::new().unwrap();
    std::env::set_var("HOME", dir.path());
    std::env::set_var(USE_FILE_STORE_ENV, "1");

    let mut session = Session::load();
    assert!(!session.is_logged_in());

    session.login("jwt-token".into(), "alice".into()).unwrap();
    assert!(dir.path().join(".fotolenta").join("token.json").exists());
    assert_eq!(session.display_name(), Some("alice"));

    // token survives a reload, display name does not
    let restored = Session::load();
    assert_eq!(restored.token(), Some("jwt-token"));
    assert_eq!(restored.display_name(), None);

    std::env::remove_var(USE_FILE_STORE_ENV);
}

#[test]
#[serial]
fn clear_removes_persisted_token() {
    let dir = TempDir::new().unwrap();
    std::env::set_var("HOME", dir.path());
    std::env::set_var(USE_FILE_STORE_ENV, "1");

    let mut session = Session::load();
    session.login("jwt-token".into(), "alice".into()).unwrap();
    session.clear();
    assert!(!session.is_logged_in());
    assert!(!dir.path().join(".fotolenta").join("token.json").exists());

    let restored = Session::load();
    assert!(!restored.is_logged_in());

    std::env::remove_var(USE_FILE_STORE_ENV);
}
