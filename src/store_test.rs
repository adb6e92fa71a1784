use super::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("roomsync-store-{}-{name}", uuid::Uuid::new_v4())).join("store.json")
}

#[test]
fn missing_file_loads_empty() {
    let store = ClientStore::load(temp_path("missing")).expect("load");
    for key in StoredKey::ALL {
        assert_eq!(store.get(key), None);
    }
}

#[test]
fn values_survive_save_and_load() {
    let path = temp_path("persist");
    let mut store = ClientStore::load(&path).expect("load");
    store.set(StoredKey::Name, "alice");
    store.set(StoredKey::Token, "t0k3n");
    store.save().expect("save");

    let reloaded = ClientStore::load(&path).expect("reload");
    assert_eq!(reloaded.get(StoredKey::Name), Some("alice"));
    assert_eq!(reloaded.get(StoredKey::Token), Some("t0k3n"));
    assert_eq!(reloaded, store);
}

#[test]
fn logout_keeps_display_name() {
    let mut store = ClientStore::load(temp_path("logout")).expect("load");
    for key in StoredKey::ALL {
        store.set(key, "x");
    }
    store.logout();
    assert_eq!(store.get(StoredKey::Name), Some("x"));
    assert_eq!(store.get(StoredKey::Token), None);
    assert_eq!(store.get(StoredKey::Email), None);
    assert_eq!(store.get(StoredKey::Profile), None);
}

#[test]
fn remove_returns_previous_value() {
    let mut store = ClientStore::load(temp_path("remove")).expect("load");
    store.set(StoredKey::Email, "a@example.com");
    assert_eq!(store.remove(StoredKey::Email).as_deref(), Some("a@example.com"));
    assert_eq!(store.remove(StoredKey::Email), None);
}

#[test]
fn corrupt_file_is_reported() {
    let path = temp_path("corrupt");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, "not json").expect("write");
    let err = ClientStore::load(&path).expect_err("should fail");
    assert!(matches!(err, StoreError::Json { .. }));
}
