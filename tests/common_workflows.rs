//! Integration tests for common formguard workflows.
//!
//! Each test drives full request cycles: render a form, persist whatever the
//! framework would persist, then submit.

use formguard::prelude::*;
use formguard::{Backend, SESSION_EXPIRED_MESSAGE};
use http::{Method, Request, StatusCode, header};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("formguard=debug,formguard_csrf=debug")
        .with_test_writer()
        .try_init();
}

fn settings() -> Arc<CsrfSettings> {
    let config = CsrfConfig::new(CsrfConfig::generate_secret()).with_cookie_path("/mrbs/");
    Arc::new(CsrfSettings::new(config).unwrap())
}

fn form_post(token: &str, cookie: Option<&str>) -> Request<Vec<u8>> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/mrbs/edit_entry_handler.php")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(format!("name=Meeting&csrf_token={}", token).into_bytes())
        .unwrap()
}

// =============================================================================
// Session-backed flow
// =============================================================================

#[tokio::test]
async fn test_session_backed_form_submission() {
    init_tracing();
    let settings = settings();
    let store = MemorySessionStore::default();
    let session = store.create(None).await.unwrap();

    // Render
    let mut page = Exchange::get().with_session(session);
    let mut guard = CsrfGuard::new(settings.clone());
    let form = guard.form(&mut page).unwrap();
    let html = guard.token_html(&mut page).unwrap();
    let token = form.hidden_value("csrf_token").unwrap().to_string();

    assert!(html.contains(&token));
    assert!(page.outgoing_cookies().is_empty());

    // The token is persisted with the session
    let session = page.take_session().unwrap();
    store.save(&session).await.unwrap();
    let loaded = store.get(&session.id).await.unwrap().unwrap();
    assert_eq!(loaded.get::<String>("csrf_token"), Some(token));
}

#[tokio::test]
async fn test_session_backed_roundtrip_through_store() {
    init_tracing();
    let settings = settings();
    let store = MemorySessionStore::default();
    let session = store.create(None).await.unwrap();
    let session_id = session.id.clone();

    let mut page = Exchange::get().with_session(session);
    let token = CsrfGuard::new(settings.clone())
        .embed_value(&mut page)
        .unwrap();
    store.save(&page.take_session().unwrap()).await.unwrap();

    let loaded = store.get(&session_id).await.unwrap().unwrap();
    let mut submit = Exchange::from_request(&form_post(token.as_str(), None)).with_session(loaded);
    let mut guard = CsrfGuard::new(settings);

    assert!(guard.check(&mut submit, false).is_ok());
    assert_eq!(guard.store().backend(), Backend::SessionBacked);
}

#[tokio::test]
async fn test_forgery_logs_user_off() {
    init_tracing();
    let settings = settings();
    let store = MemorySessionStore::default();
    let mut session = store.create(None).await.unwrap();
    session.set("csrf_token", "abc123").unwrap();
    store.save(&session).await.unwrap();

    let mut submit = Exchange::from_request(&form_post("wrong", None))
        .with_remote_addr("192.0.2.10")
        .with_session(session);

    let err = CsrfGuard::new(settings)
        .check(&mut submit, false)
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(err.user_message(), SESSION_EXPIRED_MESSAGE);
    assert_eq!(submit.warnings().len(), 1);
    assert!(submit.warnings()[0].contains("192.0.2.10"));
    assert!(!submit.warnings()[0].contains("abc123"));

    // The framework finishes the logout
    let terminated = submit.terminated_session().unwrap().to_string();
    store.delete(&terminated).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

// =============================================================================
// Cookie fallback flow
// =============================================================================

#[test]
fn test_cookie_fallback_form_submission() {
    init_tracing();
    let settings = settings();

    // Render two forms on one page
    let mut page = Exchange::get();
    let mut guard = CsrfGuard::new(settings.clone());
    let search = guard.form(&mut page).unwrap();
    let mut edit = guard.form(&mut page).unwrap().with_action("edit_entry_handler.php");
    edit.add_hidden_input("id", "42");

    let token = search.hidden_value("csrf_token").unwrap().to_string();
    assert_eq!(edit.hidden_value("csrf_token"), Some(token.as_str()));

    let headers = page.set_cookie_headers();
    assert_eq!(headers.len(), 1);
    assert!(headers[0].contains("Path=/mrbs/"));

    // The browser sends the cookie back
    let cookie = page.outgoing_cookies()[0].clone();
    let request = form_post(&token, Some(&format!("{}={}", cookie.name, cookie.value)));
    let mut submit = Exchange::from_request(&request);
    let mut guard = CsrfGuard::new(settings);

    assert!(guard.check(&mut submit, true).is_ok());
    assert_eq!(guard.store().backend(), Backend::CookieBacked);
}

#[test]
fn test_cookie_fallback_without_cookie_is_rejected() {
    init_tracing();
    let settings = settings();
    let mut page = Exchange::get();
    let token = CsrfGuard::new(settings.clone())
        .embed_value(&mut page)
        .unwrap();

    let mut submit = Exchange::from_request(&form_post(token.as_str(), None));
    assert!(CsrfGuard::new(settings).check(&mut submit, false).is_err());
}

#[test]
fn test_read_only_request_is_exempt() {
    init_tracing();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/mrbs/day.php?csrf_token=anything")
        .body(Vec::new())
        .unwrap();

    let mut ctx = Exchange::from_request(&request);
    assert!(CsrfGuard::new(settings()).check(&mut ctx, true).is_ok());
    assert!(ctx.warnings().is_empty());
}
