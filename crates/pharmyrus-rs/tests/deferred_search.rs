//! End-to-end wiring tests for the SDK facade.

use pharmyrus_rs::DeferredSearch;
use pharmyrus_rs::config::{IntentBackendKind, IntentConfig, PharmyrusConfig, SessionConfig};
use pharmyrus_rs::core::{ResumeOutcome, ViewHandle};
use pharmyrus_rs::protocol::{AuthState, IntentEventPayload, Navigation, SearchForm, UserId};
use pharmyrus_rs_test_utils::RecordingNavigator;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;

fn config(root: &std::path::Path) -> PharmyrusConfig {
    PharmyrusConfig::builder()
        .intent(IntentConfig {
            backend: IntentBackendKind::Session,
            path: Some(root.join("intents").to_string_lossy().to_string()),
            default_scope: vec!["US".to_string()],
            ..IntentConfig::default()
        })
        .session(SessionConfig {
            path: Some(root.join("session.json").to_string_lossy().to_string()),
        })
        .build()
}

/// A capture before a reload is resumed by the instance created after it.
#[tokio::test]
async fn capture_survives_reload_and_resumes_once() {
    let temp = tempdir().expect("tempdir");
    let navigator = Arc::new(RecordingNavigator::new());

    let before_login =
        DeferredSearch::from_config(config(temp.path()), navigator.clone()).expect("wire");
    let navigation = before_login
        .capture()
        .submit(&SearchForm::new("darolutamide", "", Vec::<String>::new()), false)
        .await
        .expect("capture");
    assert_eq!(navigation, Navigation::Authenticate);

    let after_login =
        DeferredSearch::from_config(config(temp.path()), navigator.clone()).expect("wire");
    assert_eq!(after_login.session_key(), before_login.session_key());
    let mut events = after_login.events().subscribe();

    let resume = after_login.resume(ViewHandle::always_ready());
    let signed_in = AuthState::Authenticated(UserId::new("u1"));
    let outcome = resume.on_auth_state(&signed_in).await;
    let ResumeOutcome::Resumed(params) = outcome else {
        panic!("expected resumed, got {outcome:?}");
    };
    assert_eq!(params.scope.codes(), ["US"]);
    assert_eq!(
        resume.on_auth_state(&signed_in).await,
        ResumeOutcome::NothingPending
    );
    assert_eq!(navigator.navigations().len(), 1);

    let event = events.recv().await.expect("event");
    assert!(matches!(
        event.payload,
        IntentEventPayload::IntentResumed { ref primary_term, .. } if primary_term == "darolutamide"
    ));
}

/// The default session settings keep the session across the login redirect.
#[tokio::test]
async fn default_session_config_survives_redirect() {
    let temp = tempdir().expect("tempdir");
    let config = || {
        PharmyrusConfig::builder()
            .intent(IntentConfig {
                path: Some(temp.path().join("intents").to_string_lossy().to_string()),
                ..IntentConfig::default()
            })
            .build()
    };
    let navigator = Arc::new(RecordingNavigator::new());

    let before_login = DeferredSearch::from_config(config(), navigator.clone()).expect("wire");
    before_login
        .capture()
        .submit(&SearchForm::new("darolutamide", "", ["BR"]), false)
        .await
        .expect("capture");

    let after_login = DeferredSearch::from_config(config(), navigator.clone()).expect("wire");
    assert_eq!(after_login.session_key(), before_login.session_key());
    let outcome = after_login
        .resume(ViewHandle::always_ready())
        .on_auth_state(&AuthState::Authenticated(UserId::new("u1")))
        .await;
    assert!(matches!(
        outcome,
        ResumeOutcome::Resumed(ref params) if params.primary_term == "darolutamide"
    ));
    assert_eq!(navigator.navigations().len(), 1);

    let session_dirs = std::fs::read_dir(temp.path().join("intents"))
        .expect("read dir")
        .count();
    assert_eq!(session_dirs, 1);
}

/// Ending the session hides earlier captures from later instances.
#[tokio::test]
async fn ended_session_starts_fresh() {
    let temp = tempdir().expect("tempdir");
    let navigator = Arc::new(RecordingNavigator::new());

    let first = DeferredSearch::from_config(config(temp.path()), navigator.clone()).expect("wire");
    first
        .capture()
        .submit(&SearchForm::new("aspirin", "", ["BR"]), false)
        .await
        .expect("capture");
    first.end_session().expect("end");

    let second = DeferredSearch::from_config(config(temp.path()), navigator.clone()).expect("wire");
    assert_ne!(second.session_key(), first.session_key());
    let outcome = second
        .resume(ViewHandle::always_ready())
        .on_auth_state(&AuthState::Authenticated(UserId::new("u1")))
        .await;
    assert_eq!(outcome, ResumeOutcome::NothingPending);
    assert!(navigator.navigations().is_empty());
}

/// Misconfigured remote backends are rejected during wiring.
#[test]
fn remote_without_url_fails_to_wire() {
    let temp = tempdir().expect("tempdir");
    let mut config = config(temp.path());
    config.intent.backend = IntentBackendKind::Remote;
    let navigator = Arc::new(RecordingNavigator::new());
    assert!(DeferredSearch::from_config(config, navigator).is_err());
}
