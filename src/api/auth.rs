use axum::http::{header::AUTHORIZATION, HeaderMap};

pub const CRON_SECRET_ENV: &str = "BEACON_CRON_SECRET";

/// Shared secret for the cron trigger endpoints. Unset means development:
/// the endpoints are open.
pub fn cron_secret() -> Option<String> {
    std::env::var(CRON_SECRET_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Bearer check for cron triggers, enforced only when a secret is set
pub fn cron_auth_ok(headers: &HeaderMap) -> bool {
    let Some(secret) = cron_secret() else {
        return true;
    };

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim() == secret)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    // One test covers both modes: tests share the process environment, so
    // the secret is set and removed in a single sequence.
    #[test]
    fn bearer_gate_tracks_secret_presence() {
        std::env::remove_var(CRON_SECRET_ENV);
        assert!(cron_auth_ok(&HeaderMap::new()));

        std::env::set_var(CRON_SECRET_ENV, "s3cret");

        let mut ok = HeaderMap::new();
        ok.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(cron_auth_ok(&ok));

        let mut bad = HeaderMap::new();
        bad.insert(AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(!cron_auth_ok(&bad));

        assert!(!cron_auth_ok(&HeaderMap::new()));

        std::env::remove_var(CRON_SECRET_ENV);
    }
}
