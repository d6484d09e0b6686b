//! Capture controller integration tests.

use pharmyrus_rs_core::{CaptureController, CaptureError};
use pharmyrus_rs_intent::{IntentBackend, LocalIntentStore};
use pharmyrus_rs_protocol::{
    AuthState, IdentityKey, IntentEventPayload, Navigation, RegionScope, SearchForm, SessionKey,
    UserId, ValidationError,
};
use pharmyrus_rs_test_utils::{CountingBackend, FailingBackend, RecordingSink};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

fn counting_store() -> (TempDir, Arc<CountingBackend>) {
    let temp = tempdir().expect("tempdir");
    let store = LocalIntentStore::new(temp.path()).expect("store");
    (temp, Arc::new(CountingBackend::new(Arc::new(store))))
}

/// Authenticated users search immediately and storage is never touched.
#[tokio::test]
async fn authenticated_submit_navigates_without_storage() {
    let (_temp, backend) = counting_store();
    let controller = CaptureController::new(backend.clone(), SessionKey::generate());

    let form = SearchForm::new("  darolutamide ", " Nubeqa ", ["BR", "US"]);
    let navigation = controller.submit(&form, true).await.expect("submit");

    let Navigation::Destination(params) = navigation else {
        panic!("expected destination, got {navigation:?}");
    };
    assert_eq!(params.primary_term, "darolutamide");
    assert_eq!(params.secondary_term, "Nubeqa");
    assert_eq!(params.scope.codes(), ["BR", "US"]);
    assert_eq!(backend.counts().total(), 0);
}

/// Anonymous submissions are persisted under the session key before redirecting.
#[tokio::test]
async fn anonymous_submit_persists_then_redirects() {
    let (_temp, backend) = counting_store();
    let session = SessionKey::generate();
    let sink = Arc::new(RecordingSink::new());
    let controller =
        CaptureController::new(backend.clone(), session).with_event_sink(sink.clone());

    let form = SearchForm::new("aspirin", "", Vec::<String>::new());
    let navigation = controller.submit(&form, false).await.expect("submit");
    assert_eq!(navigation, Navigation::Authenticate);
    assert_eq!(backend.counts().save, 1);
    assert_eq!(backend.counts().total(), 1);

    let stored = backend
        .load(&IdentityKey::Session(session))
        .await
        .expect("load")
        .expect("record");
    assert_eq!(stored.params.primary_term, "aspirin");
    assert_eq!(stored.params.scope, RegionScope::default());
    assert!(stored.captured_at.is_some());
    assert_eq!(
        sink.payloads(),
        vec![IntentEventPayload::IntentCaptured {
            key: format!("session-{session}"),
            primary_term: "aspirin".to_string(),
        }]
    );
}

/// A later capture replaces an earlier unconsumed one.
#[tokio::test]
async fn later_capture_overwrites_earlier() {
    let (_temp, backend) = counting_store();
    let session = SessionKey::generate();
    let controller = CaptureController::new(backend.clone(), session)
        .with_default_scope(RegionScope::parse(["US"]).expect("scope"));

    for term in ["first", "second"] {
        controller
            .submit(&SearchForm::new(term, "", Vec::<String>::new()), false)
            .await
            .expect("submit");
    }
    let stored = backend
        .load(&IdentityKey::Session(session))
        .await
        .expect("load")
        .expect("record");
    assert_eq!(stored.params.primary_term, "second");
    assert_eq!(stored.params.scope.codes(), ["US"]);
}

/// Invalid forms fail before any storage call or navigation.
#[tokio::test]
async fn invalid_form_is_rejected_up_front() {
    let (_temp, backend) = counting_store();
    let controller = CaptureController::new(backend.clone(), SessionKey::generate());

    let err = controller
        .submit(&SearchForm::new("   ", "x", ["BR"]), false)
        .await
        .expect_err("blank");
    assert!(matches!(
        err,
        CaptureError::Validation(ValidationError::EmptyPrimaryTerm)
    ));

    let err = controller
        .submit(&SearchForm::new("aspirin", "", ["brazil"]), false)
        .await
        .expect_err("region");
    assert!(matches!(
        err,
        CaptureError::Validation(ValidationError::InvalidRegion(_))
    ));
    assert_eq!(backend.counts().total(), 0);
}

/// A failed save surfaces an error and never redirects.
#[tokio::test]
async fn failed_save_does_not_redirect() {
    let sink = Arc::new(RecordingSink::new());
    let controller = CaptureController::new(Arc::new(FailingBackend::new()), SessionKey::generate())
        .with_event_sink(sink.clone());

    let err = controller
        .submit(&SearchForm::new("aspirin", "", ["BR"]), false)
        .await
        .expect_err("offline");
    assert!(matches!(err, CaptureError::BackendUnavailable(_)));
    assert!(matches!(
        sink.payloads().as_slice(),
        [IntentEventPayload::BackendFailed { operation, .. }] if operation == "save"
    ));
}

/// Unresolved auth at submit time is handled like an anonymous user.
#[tokio::test]
async fn unresolved_state_captures() {
    let (_temp, backend) = counting_store();
    let controller = CaptureController::new(backend.clone(), SessionKey::generate());
    let form = SearchForm::new("aspirin", "", ["BR"]);

    let navigation = controller
        .submit_with_state(&form, &AuthState::Unresolved)
        .await
        .expect("submit");
    assert_eq!(navigation, Navigation::Authenticate);

    let navigation = controller
        .submit_with_state(&form, &AuthState::Authenticated(UserId::new("u1")))
        .await
        .expect("submit");
    assert!(matches!(navigation, Navigation::Destination(_)));
    assert_eq!(backend.counts().save, 1);
}
