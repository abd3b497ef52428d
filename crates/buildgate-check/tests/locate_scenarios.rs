//! Integration scenarios for the three-phase locator and the full check.
//!
//! All scenarios run against the in-memory queue; spawned tasks play the
//! build worker's part. Watch windows are short so the timeout paths are
//! exercised in real time.

use std::time::Duration;

use buildgate_check::{locate_build, next_event, BuildCheck, LocatedBuild, WatchOutcome};
use buildgate_core::{BuildTarget, CheckConfig};
use buildgate_state::{BuildFailure, BuildPayload, BuildQueue, BuildRecord, BuildStatus};

/// Window short enough to time out quickly when nothing happens.
const SHORT: Duration = Duration::from_millis(250);
/// Window generous enough that an expected event always lands inside it.
const GENEROUS: Duration = Duration::from_secs(5);

fn target() -> BuildTarget {
    BuildTarget {
        actor: "jane".to_string(),
        owner: "mongodb".to_string(),
        repo: "docs-java".to_string(),
        branch: "master".to_string(),
    }
}

fn payload() -> BuildPayload {
    BuildPayload {
        repo_owner: "mongodb".to_string(),
        repo_name: "docs-java".to_string(),
        branch_name: "master".to_string(),
    }
}

fn fast_config() -> CheckConfig {
    CheckConfig {
        timeout: SHORT,
        ..CheckConfig::default()
    }
}

/// Test: the race helper reports a timeout on a quiet stream.
#[tokio::test]
async fn race_helper_times_out_on_a_quiet_stream() {
    let queue = BuildQueue::in_memory().await.unwrap();
    let stream = queue.watch_ongoing(&target()).await.unwrap();

    let outcome = next_event(stream, SHORT).await.expect("helper should not error");
    assert!(matches!(outcome, WatchOutcome::TimedOut));
}

/// Test: the race helper returns the first matching event.
#[tokio::test]
async fn race_helper_returns_the_first_matching_event() {
    let queue = BuildQueue::in_memory().await.unwrap();
    let stream = queue.watch_ongoing(&target()).await.unwrap();

    let worker = queue.clone();
    tokio::spawn(async move {
        worker
            .enqueue(&BuildRecord::new(payload()).started())
            .await
            .expect("worker enqueues");
    });

    match next_event(stream, GENEROUS).await.expect("helper should not error") {
        WatchOutcome::Event(build) => assert!(build.is_ongoing()),
        WatchOutcome::TimedOut => panic!("expected an event before the window closed"),
    }
}

/// Test: a build that finished before the checker started resolves via
/// the fallback lookup after a quiet Phase 1.
#[tokio::test]
async fn fallback_resolves_a_build_that_finished_long_ago() {
    let queue = BuildQueue::in_memory().await.unwrap();
    let record = BuildRecord::new(payload()).completed(vec!["INFO done".to_string()]);
    queue.enqueue(&record).await.unwrap();

    let located = locate_build(&queue, &target(), SHORT).await.unwrap();
    match located {
        LocatedBuild::Found(build) => assert_eq!(build.build_id, record.build_id),
        LocatedBuild::Missing(explanation) => panic!("expected a build, got: {explanation}"),
    }
}

/// Test: an ongoing build that completes inside the window resolves to
/// the completed record (Phase 1 then Phase 2).
#[tokio::test]
async fn ongoing_build_resolves_when_it_completes() {
    let queue = BuildQueue::in_memory().await.unwrap();

    let record = BuildRecord::new(payload()).started();
    let build_id = record.build_id.clone();
    let worker = queue.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        worker.enqueue(&record).await.expect("worker enqueues");
        tokio::time::sleep(Duration::from_millis(200)).await;
        worker
            .complete(&record.build_id, vec!["INFO all pages built".to_string()])
            .await
            .expect("worker completes");
    });

    let located = locate_build(&queue, &target(), GENEROUS).await.unwrap();
    writer.await.unwrap();

    match located {
        LocatedBuild::Found(build) => {
            assert_eq!(build.build_id, build_id);
            assert_eq!(build.status, BuildStatus::Completed);
            assert!(build.end_time.is_some());
        }
        LocatedBuild::Missing(explanation) => panic!("expected a build, got: {explanation}"),
    }
}

/// Test: Phase 1 fires, Phase 2 times out, and the fallback still
/// resolves an older finished record.
#[tokio::test]
async fn completion_timeout_falls_back_to_the_latest_completed() {
    let queue = BuildQueue::in_memory().await.unwrap();

    let mut finished =
        BuildRecord::new(payload()).completed(vec!["ERROR: disk full".to_string()]);
    finished.end_time = Some(chrono::Utc::now() - chrono::Duration::minutes(5));
    queue.enqueue(&finished).await.unwrap();

    // The stuck build appears after the watch opens and never completes.
    let worker = queue.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        worker
            .enqueue(&BuildRecord::new(payload()).started())
            .await
            .expect("worker enqueues");
    });

    let located = locate_build(&queue, &target(), SHORT).await.unwrap();
    writer.await.unwrap();

    match located {
        LocatedBuild::Found(build) => assert_eq!(build.build_id, finished.build_id),
        LocatedBuild::Missing(explanation) => panic!("expected a build, got: {explanation}"),
    }
}

/// Test: nothing in the queue yields the explanatory not-found outcome
/// naming the filter and the fork hint.
#[tokio::test]
async fn nothing_found_names_the_filter_and_the_fork_hint() {
    let queue = BuildQueue::in_memory().await.unwrap();

    let located = locate_build(&queue, &target(), SHORT).await.unwrap();
    match located {
        LocatedBuild::Missing(explanation) => {
            assert!(explanation.contains("Nothing found for filter"));
            assert!(explanation.contains("docs-java"));
            assert!(explanation.contains("not set up on your fork"));
        }
        LocatedBuild::Found(build) => panic!("expected nothing, found {}", build.build_id),
    }
}

/// Test: a failed build surfaces the worker's failure verbatim through
/// the full check.
#[tokio::test]
async fn failed_build_surfaces_the_worker_failure() {
    let queue = BuildQueue::in_memory().await.unwrap();

    let mut record = BuildRecord::new(payload()).failed("MegaRepo checkout failed");
    record.error = Some(BuildFailure {
        time: "2026-08-20T10:00:00Z".to_string(),
        reason: "MegaRepo checkout failed".to_string(),
    });
    queue.enqueue(&record).await.unwrap();

    let verdict = BuildCheck::run(&queue, "jane/mongodb/docs-java/master", &fast_config())
        .await
        .unwrap();
    assert!(!verdict.passed());
    assert_eq!(
        verdict.unexpected,
        vec!["Build failed at 2026-08-20T10:00:00Z\n\nMegaRepo checkout failed".to_string()]
    );
}

/// Test: a malformed tuple is reported as a verdict, never an error.
#[tokio::test]
async fn malformed_target_is_reported_not_thrown() {
    let queue = BuildQueue::in_memory().await.unwrap();

    let verdict = BuildCheck::run(&queue, "jane/mongodb", &fast_config())
        .await
        .unwrap();
    assert!(!verdict.passed());
    assert_eq!(verdict.unexpected.len(), 1);
    assert!(verdict.unexpected[0].contains("Expected build target in the form"));
    assert!(verdict.unexpected[0].contains("jane/mongodb"));
}

/// Test: expected toolchain noise passes the full check.
#[tokio::test]
async fn expected_noise_passes_the_full_check() {
    let queue = BuildQueue::in_memory().await.unwrap();

    let record = BuildRecord::new(payload()).completed(vec![
        "INFO start".to_string(),
        "WARNING: Directive \"container\" has been deprecated".to_string(),
        "ERROR #98124  WEBPACK".to_string(),
    ]);
    queue.enqueue(&record).await.unwrap();

    let verdict = BuildCheck::run(&queue, "jane/mongodb/docs-java/master", &fast_config())
        .await
        .unwrap();
    assert!(verdict.passed());
    assert_eq!(verdict.flagged.len(), 2);
    assert!(verdict.unexpected.is_empty());
    assert_eq!(verdict.message, "Passed with expected errors.");
}

/// Test: an unexpected error fails the full check and is reported alone.
#[tokio::test]
async fn unexpected_error_fails_the_full_check() {
    let queue = BuildQueue::in_memory().await.unwrap();

    let record = BuildRecord::new(payload()).completed(vec!["ERROR: disk full".to_string()]);
    queue.enqueue(&record).await.unwrap();

    let verdict = BuildCheck::run(&queue, "jane/mongodb/docs-java/master", &fast_config())
        .await
        .unwrap();
    assert!(!verdict.passed());
    assert_eq!(verdict.unexpected, vec!["ERROR: disk full".to_string()]);
}
