//! Free-trial quota policy
//!
//! Non-admin users get a fixed number of completed transcriptions; admins are
//! exempt. The check runs before any audio is processed, against the usage
//! count mirrored into the session at login.

/// Returns true when a user must be redirected to the pricing page instead of
/// having their upload processed.
pub fn is_quota_blocked(usage_count: i64, free_trial_limit: i64, is_admin: bool) -> bool {
    if is_admin {
        return false;
    }
    usage_count >= free_trial_limit
}
