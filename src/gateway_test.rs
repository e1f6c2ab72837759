use super::*;
use crate::state::test_helpers::*;
use crate::store::TokenStore;
use crate::types::Token;
use serde_json::json;

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_authenticates_and_returns_user() {
    let (session, store) = session_with(None);
    let u = user(json!({ "email": "x", "access_token": "abc" }));
    let (gateway, api) = gateway_with(MockAuthApi::new().with_login(Ok(u.clone())), &session);
    let mut flags = session.subscribe_is_authenticated();

    let returned = gateway.login(&Credentials::new("x", "y")).await.unwrap();

    assert_eq!(returned, u);
    assert_eq!(store.read().unwrap(), Some(Token::from_user(&u)));
    assert_eq!(flags.drain(), vec![true]);
    assert_eq!(session.current_user_snapshot(), u);
    assert_eq!(api.calls(), vec!["request_token"]);
}

#[tokio::test]
async fn login_failure_leaves_unauthenticated_session_untouched() {
    let (session, store) = session_with(None);
    let (gateway, _api) = gateway_with(MockAuthApi::new().with_login(Err(401)), &session);
    let mut flags = session.subscribe_is_authenticated();

    let err = gateway.login(&Credentials::new("x", "bad")).await.unwrap_err();

    assert!(matches!(err, AuthError::LoginFailed(ApiError::Response { status: 401, .. })));
    assert_eq!(err.error_code(), "E_LOGIN_FAILED");
    assert_eq!(session.is_authenticated_snapshot(), None);
    assert!(flags.drain().is_empty());
    assert_eq!(store.read().unwrap(), None);
}

#[tokio::test]
async fn login_failure_does_not_clear_existing_session() {
    let (session, store) = session_with(None);
    let existing = user(json!({ "email": "a", "token": "t" }));
    session.set_authenticated(existing.clone());
    let (gateway, _api) = gateway_with(MockAuthApi::new().with_login(Err(503)), &session);

    let err = gateway.login(&Credentials::new("b", "pw")).await.unwrap_err();

    assert!(err.api_error().retryable());
    assert_eq!(session.current_user_snapshot(), existing);
    assert_eq!(session.is_authenticated_snapshot(), Some(true));
    assert_eq!(store.read().unwrap(), Some(Token::from_user(&existing)));
}

#[tokio::test]
async fn login_with_empty_user_is_failure() {
    let (session, _store) = session_with(None);
    let (gateway, _api) = gateway_with(MockAuthApi::new().with_login(Ok(User::empty())), &session);

    let err = gateway.login(&Credentials::new("x", "y")).await.unwrap_err();

    assert!(matches!(err, AuthError::LoginFailed(ApiError::EmptyUser)));
    assert_eq!(session.is_authenticated_snapshot(), None);
}

// =============================================================================
// update_profile
// =============================================================================

#[tokio::test]
async fn update_profile_success_republishes_user() {
    let original = user(json!({ "email": "a", "token": "t", "bio": "old" }));
    let updated = user(json!({ "email": "a", "token": "t", "bio": "new" }));
    let (session, store) = session_with(None);
    session.set_authenticated(original.clone());
    let (gateway, api) = gateway_with(MockAuthApi::new().with_update(Ok(updated.clone())), &session);
    let mut users = session.subscribe_current_user();

    let patch = ProfileUpdate::from_value(json!({ "bio": "new" })).unwrap();
    let returned = gateway.update_profile(&patch).await.unwrap();

    assert_eq!(returned, updated);
    assert_eq!(users.drain(), vec![updated.clone()]);
    assert_eq!(store.read().unwrap(), Some(Token::from_user(&updated)));
    assert_eq!(*api.tokens_seen.lock().unwrap(), vec![Token::from_user(&original)]);
}

#[tokio::test]
async fn update_profile_failure_leaves_state_unchanged() {
    let original = user(json!({ "email": "a", "token": "t" }));
    let (session, store) = session_with(None);
    session.set_authenticated(original.clone());
    let (gateway, _api) = gateway_with(MockAuthApi::new().with_update(Err(422)), &session);

    let patch = ProfileUpdate::from_value(json!({ "email": "" })).unwrap();
    let err = gateway.update_profile(&patch).await.unwrap_err();

    assert!(matches!(err, AuthError::ProfileUpdateFailed(ApiError::Response { status: 422, .. })));
    assert_eq!(session.current_user_snapshot(), original);
    assert_eq!(session.is_authenticated_snapshot(), Some(true));
    assert_eq!(store.read().unwrap(), Some(Token::from_user(&original)));
}

#[tokio::test]
async fn update_profile_without_session_skips_api() {
    let (session, _store) = session_with(None);
    let (gateway, api) = gateway_with(MockAuthApi::new(), &session);

    let patch = ProfileUpdate::from_value(json!({ "bio": "x" })).unwrap();
    let err = gateway.update_profile(&patch).await.unwrap_err();

    assert!(matches!(err, AuthError::ProfileUpdateFailed(ApiError::MissingCredential)));
    assert!(api.calls().is_empty());
}

// =============================================================================
// fetch_current_profile / logout
// =============================================================================

#[tokio::test]
async fn fetch_current_profile_does_not_touch_session() {
    let (session, _store) = session_with(Some(Token::new("t")));
    let profile = user(json!({ "email": "a@b.com" }));
    let (gateway, _api) = gateway_with(MockAuthApi::new().with_profile(Ok(profile.clone())), &session);

    let fetched = gateway.fetch_current_profile().await.unwrap();

    assert_eq!(fetched, profile);
    assert_eq!(session.is_authenticated_snapshot(), None);
}

#[tokio::test]
async fn fetch_current_profile_error_kind() {
    let (session, _store) = session_with(Some(Token::new("t")));
    let (gateway, _api) = gateway_with(MockAuthApi::new().with_profile(Err(401)), &session);

    let err = gateway.fetch_current_profile().await.unwrap_err();

    assert_eq!(err.error_code(), "E_PROFILE_FETCH_FAILED");
    assert!(err.to_string().starts_with("profile fetch failed"));
}

#[tokio::test]
async fn fetch_current_profile_without_token() {
    let (session, _store) = session_with(None);
    let (gateway, api) = gateway_with(MockAuthApi::new(), &session);

    let err = gateway.fetch_current_profile().await.unwrap_err();

    assert!(matches!(err, AuthError::ProfileFetchFailed(ApiError::MissingCredential)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn fetch_profile_for_uses_given_token_not_store() {
    let (session, store) = session_with(Some(Token::new("stored")));
    let profile = user(json!({ "email": "a@b.com" }));
    let (gateway, api) = gateway_with(MockAuthApi::new().with_profile(Ok(profile.clone())), &session);
    store.write(&Token::new("replaced")).unwrap();

    let fetched = gateway.fetch_profile_for(&Token::new("stored")).await.unwrap();

    assert_eq!(fetched, profile);
    assert_eq!(*api.tokens_seen.lock().unwrap(), vec![Token::new("stored")]);
    assert_eq!(session.is_authenticated_snapshot(), None);
}

#[tokio::test]
async fn logout_clears_session() {
    let (session, store) = session_with(None);
    let (gateway, _api) = gateway_with(MockAuthApi::new(), &session);
    session.set_authenticated(user(json!({ "email": "a" })));

    gateway.logout();

    assert_eq!(session.is_authenticated_snapshot(), Some(false));
    assert!(session.current_user_snapshot().is_empty());
    assert_eq!(store.read().unwrap(), None);
}
