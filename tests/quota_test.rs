use audio_scribe::quota::is_quota_blocked;

#[test]
fn fresh_user_is_not_blocked() {
    assert!(!is_quota_blocked(0, 1, false));
}

#[test]
fn user_at_limit_is_blocked() {
    assert!(is_quota_blocked(1, 1, false));
}

#[test]
fn user_over_limit_is_blocked() {
    assert!(is_quota_blocked(5, 1, false));
}

#[test]
fn admin_is_never_blocked() {
    assert!(!is_quota_blocked(0, 1, true));
    assert!(!is_quota_blocked(1, 1, true));
    assert!(!is_quota_blocked(1000, 1, true));
}

#[test]
fn larger_limit_allows_more_usage() {
    assert!(!is_quota_blocked(4, 5, false));
    assert!(is_quota_blocked(5, 5, false));
}
