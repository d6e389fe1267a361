//! Leftover registration and end-of-run cleanup.

use ferry_core::application::{Action, CancelSignal};
use ferry_core::application::services::{
    add_leftover, check_file_exists_once, cleanup_leftovers,
};
use ferry_core::domain::{ActionError, CleanupError};

use crate::mocks::{FakeHost, RecordingReporter, engine};

#[tokio::test]
async fn test_cleanup_with_no_leftovers_does_nothing() {
    let host = FakeHost::new();
    let reporter = RecordingReporter::default();
    let mut engine = engine(&host, &reporter);

    engine.run(cleanup_leftovers()).await.expect("cleanup");
    assert!(host.commands().is_empty());
    assert!(reporter.messages().is_empty());
}

#[tokio::test]
async fn test_cleanup_deletes_in_registration_order() {
    let host = FakeHost::new()
        .with_file("/tmp/b", b"b\n")
        .with_file("/tmp/a", b"a\n");
    let reporter = RecordingReporter::default();
    let mut engine = engine(&host, &reporter);

    engine
        .run(Action::Sequence(vec![
            add_leftover("/tmp/b"),
            add_leftover("/tmp/a"),
            cleanup_leftovers(),
        ]))
        .await
        .expect("cleanup");

    assert_eq!(host.commands(), vec!["rm -f '/tmp/b'", "rm -f '/tmp/a'"]);
    assert!(host.files().is_empty());
    assert_eq!(reporter.at("step"), vec!["Removing leftovers..."]);
    assert!(engine.state().leftovers().is_empty(), "registry is drained");
}

#[tokio::test]
async fn test_leftover_added_lazily_is_cleaned() {
    let host = FakeHost::new();
    let reporter = RecordingReporter::default();
    let mut engine = engine(&host, &reporter);

    engine
        .run(Action::Sequence(vec![
            Action::deferred(|state| {
                state.add_leftover("/tmp/late");
                Action::noop()
            }),
            cleanup_leftovers(),
        ]))
        .await
        .expect("cleanup");

    assert_eq!(host.commands(), vec!["rm -f '/tmp/late'"]);
}

#[tokio::test]
async fn test_cleanup_continues_after_a_failed_delete() {
    let host = FakeHost::new().failing_on("rm -f '/tmp/a'");
    let reporter = RecordingReporter::default();
    let mut engine = engine(&host, &reporter);

    let err = engine
        .run(Action::Sequence(vec![
            add_leftover("/tmp/a"),
            add_leftover("/tmp/b"),
            cleanup_leftovers(),
        ]))
        .await
        .expect_err("one delete failed");

    assert_eq!(host.commands(), vec!["rm -f '/tmp/a'", "rm -f '/tmp/b'"]);
    match err.downcast_ref::<CleanupError>() {
        Some(CleanupError::Incomplete { total, failures }) => {
            assert_eq!(*total, 2);
            assert_eq!(failures.len(), 1);
            assert!(failures[0].contains("/tmp/a"));
        }
        None => panic!("expected CleanupError, got {err:#}"),
    }
    assert!(engine.state().leftovers().is_empty());
}

#[tokio::test]
async fn test_cleanup_evicts_cached_existence() {
    let host = FakeHost::new().with_file("/tmp/a", b"a\n");
    let reporter = RecordingReporter::default();
    let mut engine = engine(&host, &reporter);

    assert!(engine.check(&check_file_exists_once("/tmp/a")).await.expect("check"));
    engine
        .run(Action::Sequence(vec![add_leftover("/tmp/a"), cleanup_leftovers()]))
        .await
        .expect("cleanup");

    assert!(engine.state().cache().is_empty());
    assert!(!engine.check(&check_file_exists_once("/tmp/a")).await.expect("check"));
}

#[tokio::test]
async fn test_empty_leftover_is_rejected() {
    let host = FakeHost::new();
    let reporter = RecordingReporter::default();
    let mut engine = engine(&host, &reporter);

    let err = engine.run(add_leftover("")).await.expect_err("empty path");
    assert_eq!(err.to_string(), "empty remote path for leftover registration");
    assert!(engine.state().leftovers().is_empty());
}

#[tokio::test]
async fn test_cancellation_during_cleanup_still_removes_every_leftover() {
    let signal = CancelSignal::new();
    let host = FakeHost::new()
        .with_file("/tmp/a", b"a\n")
        .with_file("/tmp/b", b"b\n")
        .with_file("/tmp/c", b"c\n")
        .cancelling_on_exec(&signal);
    let reporter = RecordingReporter::default();
    let mut engine = engine(&host, &reporter).with_cancel_signal(signal);

    let err = engine
        .run(Action::Sequence(vec![
            add_leftover("/tmp/a"),
            add_leftover("/tmp/b"),
            add_leftover("/tmp/c"),
            cleanup_leftovers(),
            Action::exec("echo after cleanup"),
        ]))
        .await
        .expect_err("cancelled after cleanup");

    assert!(matches!(
        err.downcast_ref::<ActionError>(),
        Some(ActionError::Cancelled)
    ));
    assert!(host.files().is_empty(), "stranded: {:?}", host.files());
    assert_eq!(
        host.commands(),
        vec!["rm -f '/tmp/a'", "rm -f '/tmp/b'", "rm -f '/tmp/c'"]
    );
    assert!(engine.state().leftovers().is_empty());
}
