use audio_scribe::db::UserRecord;
use audio_scribe::session::{cookie_value, SessionStore};
use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

fn sample_user() -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        name: "Alex".to_string(),
        email: "alex@example.com".to_string(),
        created_at: Utc::now(),
        usage_count: 0,
        is_admin: false,
    }
}

#[test]
fn create_and_get_roundtrip() {
    let store = SessionStore::new();
    let user = sample_user();

    let token = store.create(&user);
    let session = store.get(&token).expect("session should exist");

    assert_eq!(session.user_id, user.id);
    assert_eq!(session.email, user.email);
    assert_eq!(session.name, user.name);
    assert_eq!(session.usage_count, 0);
    assert!(!session.is_admin);
}

#[test]
fn tokens_are_opaque_and_unique() {
    let store = SessionStore::new();
    let user = sample_user();

    let a = store.create(&user);
    let b = store.create(&user);

    assert_eq!(a.len(), 32);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(a, b);
}

#[test]
fn unknown_token_returns_none() {
    let store = SessionStore::new();
    assert!(store.get("no-such-token").is_none());
}

#[test]
fn destroy_removes_session() {
    let store = SessionStore::new();
    let token = store.create(&sample_user());

    store.destroy(&token);

    assert!(store.get(&token).is_none());
}

#[test]
fn expired_session_is_evicted_on_lookup() {
    let store = SessionStore::with_ttl(Duration::ZERO);
    let token = store.create(&sample_user());

    std::thread::sleep(Duration::from_millis(5));

    assert!(store.get(&token).is_none());
}

#[test]
fn update_mutates_live_session() {
    let store = SessionStore::new();
    let token = store.create(&sample_user());

    store.update(&token, |s| {
        s.usage_count = 3;
        s.name = "Alexandra".to_string();
    });

    let session = store.get(&token).unwrap();
    assert_eq!(session.usage_count, 3);
    assert_eq!(session.name, "Alexandra");
}

#[test]
fn cookie_value_finds_named_cookie() {
    let header = "theme=dark; session_id=abc123; flash=msg";
    assert_eq!(cookie_value(header, "session_id").as_deref(), Some("abc123"));
    assert_eq!(cookie_value(header, "theme").as_deref(), Some("dark"));
}

#[test]
fn cookie_value_handles_missing_cookie() {
    assert!(cookie_value("theme=dark", "session_id").is_none());
    assert!(cookie_value("", "session_id").is_none());
}

#[test]
fn cookie_value_does_not_match_prefix_names() {
    // "session_id_old" must not satisfy a lookup for "session_id"
    let header = "session_id_old=stale";
    assert!(cookie_value(header, "session_id").is_none());
}
