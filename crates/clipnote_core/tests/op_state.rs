use std::sync::Once;

use clipnote_core::{OperationPatch, OperationState, OperationStatus};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(clip_logging::initialize_for_tests);
}

#[test]
fn fresh_state_is_none_with_null_fields() {
    init_logging();
    let state = OperationState::default();
    assert_eq!(state.status, OperationStatus::None);
    assert_eq!(state.url, None);
    assert_eq!(state.title, None);
    assert_eq!(state.summary, None);
    assert_eq!(state.error, None);
    assert!(state.is_consistent());
}

#[test]
fn error_patch_leaves_unrelated_fields_alone() {
    init_logging();
    let state = OperationState::default()
        .apply(OperationPatch::processing("https://e.com", "T"))
        .apply(OperationPatch::completed("old summary"));

    let state = state.apply(OperationPatch::failed("x"));

    assert_eq!(state.status, OperationStatus::Error);
    assert_eq!(state.error.as_deref(), Some("x"));
    // `summary` was not part of the patch, so it is untouched.
    assert_eq!(state.summary.as_deref(), Some("old summary"));
    assert_eq!(state.url.as_deref(), Some("https://e.com"));
    assert!(state.is_consistent());
}

#[test]
fn later_patches_overwrite_per_field() {
    init_logging();
    let state = OperationState::default()
        .apply(OperationPatch::processing("https://a.com", "A"))
        .apply(OperationPatch::processing("https://b.com", "B"))
        .apply(OperationPatch::completed("s2"));

    assert_eq!(state.status, OperationStatus::Completed);
    assert_eq!(state.url.as_deref(), Some("https://b.com"));
    assert_eq!(state.title.as_deref(), Some("B"));
    assert_eq!(state.summary.as_deref(), Some("s2"));
}

#[test]
fn cleared_resets_everything() {
    init_logging();
    let state = OperationState::default()
        .apply(OperationPatch::processing("https://e.com", "T"))
        .apply(OperationPatch::failed("boom"));

    assert_ne!(state, OperationState::default());
    assert_eq!(OperationState::cleared(), OperationState::default());
}

#[test]
fn completed_and_error_invariants() {
    init_logging();
    let completed = OperationState::default().apply(OperationPatch::completed("s"));
    assert!(completed.is_consistent());

    let errored = OperationState::default().apply(OperationPatch::failed("e"));
    assert!(errored.is_consistent());

    // Forged inconsistent states are detectable.
    let forged = OperationState {
        status: OperationStatus::Completed,
        ..OperationState::default()
    };
    assert!(!forged.is_consistent());
}
