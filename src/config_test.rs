use super::*;

/// # Safety
/// Every test that touches `AUTH_*` vars holds `ENV_LOCK` to avoid env races.
unsafe fn clear_auth_env() {
    unsafe {
        std::env::remove_var("AUTH_API_BASE_URL");
        std::env::remove_var("AUTH_STORE_PATH");
        std::env::remove_var("AUTH_STORAGE_KEY");
        std::env::remove_var("AUTH_CLIENT_ID");
        std::env::remove_var("AUTH_CLIENT_SECRET");
        std::env::remove_var("AUTH_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("AUTH_CONNECT_TIMEOUT_SECS");
    }
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn env_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// =============================================================================
// from_env
// =============================================================================

#[test]
fn from_env_defaults() {
    let _guard = env_guard();
    unsafe { clear_auth_env() };

    let cfg = SessionConfig::from_env().unwrap();
    assert_eq!(cfg.api.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.api.client_auth, None);
    assert_eq!(cfg.api.timeouts, Timeouts::default());
    assert_eq!(cfg.store_path, PathBuf::from(DEFAULT_STORE_PATH));
    assert_eq!(cfg.storage_key, "currentUser");
}

#[test]
fn from_env_parses_overrides() {
    let _guard = env_guard();
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_API_BASE_URL", "https://api.example.test/v2/");
        std::env::set_var("AUTH_STORE_PATH", "/tmp/session.json");
        std::env::set_var("AUTH_STORAGE_KEY", "jwtToken");
        std::env::set_var("AUTH_CLIENT_ID", "childcareapp");
        std::env::set_var("AUTH_CLIENT_SECRET", "temporary");
        std::env::set_var("AUTH_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("AUTH_CONNECT_TIMEOUT_SECS", "7");
    }

    let cfg = SessionConfig::from_env().unwrap();
    assert_eq!(cfg.api.base_url, "https://api.example.test/v2");
    assert_eq!(
        cfg.api.client_auth,
        Some(ClientAuth { client_id: "childcareapp".into(), client_secret: Some("temporary".into()) })
    );
    assert_eq!(cfg.api.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/session.json"));
    assert_eq!(cfg.storage_key, "jwtToken");

    unsafe { clear_auth_env() };
}

#[test]
fn from_env_bad_timeout_falls_back_to_default() {
    let _guard = env_guard();
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = SessionConfig::from_env().unwrap();
    assert_eq!(cfg.api.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_auth_env() };
}

#[test]
fn from_env_secret_without_id_errors() {
    let _guard = env_guard();
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_CLIENT_SECRET", "temporary");
    }

    let err = SessionConfig::from_env().unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG_PARSE");
    assert!(err.to_string().contains("AUTH_CLIENT_ID"));

    unsafe { clear_auth_env() };
}

#[test]
fn from_env_invalid_base_url_errors() {
    let _guard = env_guard();
    unsafe {
        clear_auth_env();
        std::env::set_var("AUTH_API_BASE_URL", "ftp://example.test");
    }

    let err = SessionConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

    unsafe { clear_auth_env() };
}

// =============================================================================
// normalize_base_url
// =============================================================================

#[test]
fn normalize_trims_trailing_slashes() {
    assert_eq!(normalize_base_url("http://localhost:9191/api//").unwrap(), "http://localhost:9191/api");
}

#[test]
fn normalize_rejects_bare_scheme() {
    assert!(normalize_base_url("https://").is_err());
}

#[test]
fn normalize_rejects_missing_scheme() {
    assert!(normalize_base_url("localhost:9191").is_err());
}

#[test]
fn api_config_new_uses_default_timeouts() {
    let cfg = ApiConfig::new("http://127.0.0.1:1").unwrap();
    assert_eq!(cfg.timeouts, Timeouts::default());
    assert!(cfg.client_auth.is_none());
}
