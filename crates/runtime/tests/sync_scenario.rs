use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use progress_runtime::{
    ConflictResolver, Counter, FileLedger, Guess, InMemoryLedger, InMemoryReporter,
    InMemorySnapshotStore, ProgressConfig, ProgressError, ProgressRuntime, PuzzleHistoryEntry,
    SnapshotCodec, SyncError,
};
use puzzle_core::{PuzzleDefinition, Verdict};
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

/// Outer letters `abcdef`, center `g`. `fabcedg` is the only perfect word.
fn puzzle() -> PuzzleDefinition {
    PuzzleDefinition::new(
        "abcdef".chars(),
        'g',
        [
            ("bag", "a flexible container"),
            ("cage", "an enclosure"),
            ("badge", "a distinctive emblem"),
            ("fabcedg", "not a real word"),
        ],
    )
    .unwrap()
}

/// A one-word puzzle per center letter, so each day gets its own fingerprint.
fn daily(center: char) -> PuzzleDefinition {
    let word = format!("ab{center}");
    PuzzleDefinition::new("cdefhi".chars(), center, [(word.clone(), word)]).unwrap()
}

fn config() -> ProgressConfig {
    ProgressConfig::default()
        .with_player_id("alice")
        .with_snapshot_name("progress")
}

async fn device() -> ProgressRuntime {
    ProgressRuntime::builder()
        .config(config())
        .ledger(InMemoryLedger::new())
        .build()
        .await
        .unwrap()
}

async fn guess_set(runtime: &ProgressRuntime) -> BTreeSet<Guess> {
    runtime
        .handle()
        .export()
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.guess)
        .collect()
}

#[tokio::test]
async fn submissions_are_validated_and_recorded() {
    let runtime = device().await;
    let handle = runtime.handle();
    let def = puzzle();

    let cage = handle.submit_guess_at(&def, "Cage", 1).await.unwrap();
    assert_eq!(cage.verdict, Verdict::Correct);
    assert_eq!(cage.points, 2);

    let perfect = handle.submit_guess_at(&def, "fabcedg", 2).await.unwrap();
    assert_eq!(perfect.points, 17);

    let again = handle.submit_guess_at(&def, "CAGE", 3).await.unwrap();
    assert_eq!(again.verdict, Verdict::AlreadyFound);
    assert_eq!(again.points, 0);

    let short = handle.submit_guess_at(&def, "ab", 4).await.unwrap();
    assert_eq!(short.verdict, Verdict::TooShort);

    let records = handle.query_by_puzzle(def.fingerprint()).await.unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(
        records.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
    assert_eq!(
        records.iter().filter(|r| r.is_correct()).count(),
        2
    );

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn two_devices_converge_and_count_each_word_once() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    let phone = device().await;
    let tablet = device().await;
    let phone_reporter = Arc::new(InMemoryReporter::new());
    let tablet_reporter = Arc::new(InMemoryReporter::new());
    let phone_sync = phone.coordinator(store.clone(), phone_reporter.clone());
    let tablet_sync = tablet.coordinator(store.clone(), tablet_reporter.clone());

    phone.handle().submit_guess_at(&def, "bag", 10).await.unwrap();
    tablet.handle().submit_guess_at(&def, "cage", 20).await.unwrap();
    tablet.handle().submit_guess_at(&def, "badge", 30).await.unwrap();

    let first = phone_sync.sync(&phone.handle(), &history).await.unwrap();
    assert_eq!(first.report.points_delta, 1);
    assert_eq!(first.records, 1);

    let second = tablet_sync.sync(&tablet.handle(), &history).await.unwrap();
    assert_eq!(second.records, 3);
    assert_eq!(second.report.points_delta, 7);

    let third = phone_sync.sync(&phone.handle(), &history).await.unwrap();
    assert_eq!(third.records, 3);
    assert_eq!(third.report.points_delta, 0);

    assert_eq!(guess_set(&phone).await, guess_set(&tablet).await);

    let remote = store.get("progress").unwrap();
    let remote: BTreeSet<Guess> = SnapshotCodec::decode(&remote.bytes)
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(remote, guess_set(&phone).await);

    // bag = 1, cage = 2, badge = 5: each reported by the device that found it.
    assert_eq!(phone_reporter.value(Counter::Points), 1);
    assert_eq!(tablet_reporter.value(Counter::Points), 7);
    assert_eq!(
        phone_reporter.value(Counter::WordsFound) + tablet_reporter.value(Counter::WordsFound),
        3
    );

    // One day played, no perfect day: both devices agree on the same bests.
    for reporter in [&phone_reporter, &tablet_reporter] {
        assert_eq!(reporter.value(Counter::PlayedStreak), 1);
        assert_eq!(reporter.value(Counter::PerfectStreak), 0);
    }
}

#[tokio::test]
async fn streaks_are_not_inflated_by_a_second_device() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    let phone = device().await;
    let tablet = device().await;
    let phone_sync = phone.coordinator(store.clone(), reporter.clone());
    let tablet_sync = tablet.coordinator(store.clone(), reporter.clone());

    phone.handle().submit_guess_at(&def, "bag", 10).await.unwrap();
    phone_sync.sync(&phone.handle(), &history).await.unwrap();

    // The tablet never played; it only adopts the phone's progress.
    let adopted = tablet_sync.sync(&tablet.handle(), &history).await.unwrap();
    assert_eq!(adopted.records, 1);
    assert_eq!(adopted.report.points_delta, 0);
    assert_eq!(adopted.report.longest_played_streak, 1);

    phone_sync.sync(&phone.handle(), &history).await.unwrap();
    tablet_sync.sync(&tablet.handle(), &history).await.unwrap();

    assert_eq!(reporter.value(Counter::PlayedStreak), 1);
    assert_eq!(reporter.value(Counter::PerfectStreak), 0);
    assert_eq!(reporter.value(Counter::Points), 1);
    assert_eq!(reporter.value(Counter::WordsFound), 1);
}

#[tokio::test]
async fn same_word_found_offline_on_two_devices_scores_once() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    let phone = device().await;
    let tablet = device().await;
    let phone_sync = phone.coordinator(store.clone(), reporter.clone());
    let tablet_sync = tablet.coordinator(store.clone(), reporter.clone());

    phone.handle().submit_guess_at(&def, "badge", 10).await.unwrap();
    tablet.handle().submit_guess_at(&def, "Badge", 20).await.unwrap();

    phone_sync.sync(&phone.handle(), &history).await.unwrap();
    let tablet_outcome = tablet_sync.sync(&tablet.handle(), &history).await.unwrap();
    assert_eq!(tablet_outcome.records, 2);
    assert_eq!(tablet_outcome.report.points_delta, 0);

    let phone_outcome = phone_sync.sync(&phone.handle(), &history).await.unwrap();
    assert_eq!(phone_outcome.report.points_delta, 0);

    assert_eq!(reporter.value(Counter::Points), 5);
    assert_eq!(reporter.value(Counter::WordsFound), 1);
}

#[tokio::test]
async fn concurrent_syncs_deliver_the_outbox_once() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let sync = runtime.coordinator(store.clone(), reporter.clone());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    runtime.handle().submit_guess_at(&def, "badge", 1).await.unwrap();

    let handle = runtime.handle();
    let other = runtime.handle();
    let (first, second) = tokio::join!(sync.sync(&handle, &history), sync.sync(&other, &history));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.report.points_delta + second.report.points_delta, 5);
    // Points, words found and the played streak, each delivered once.
    assert_eq!(first.delivered + second.delivered, 3);
    assert_eq!(reporter.received().len(), 3);
    assert_eq!(reporter.value(Counter::Points), 5);
    assert!(handle.sync_state().await.unwrap().pending_report.is_empty());
}

#[tokio::test]
async fn coordinators_sharing_a_ledger_take_turns() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let foreground = runtime.coordinator(store.clone(), reporter.clone());
    let background = runtime.coordinator(store.clone(), reporter.clone());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    let ui = runtime.handle();
    let worker = runtime.handle();
    ui.submit_guess_at(&def, "badge", 1).await.unwrap();
    ui.submit_guess_at(&def, "cage", 2).await.unwrap();

    let (synced, resumed) = tokio::join!(
        foreground.sync(&ui, &history),
        background.resume(&worker, &history)
    );
    synced.unwrap();
    resumed.unwrap();

    let (first, second) = tokio::join!(
        foreground.sync(&ui, &history),
        background.sync(&worker, &history)
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(reporter.value(Counter::Points), 7);
    assert_eq!(reporter.value(Counter::WordsFound), 2);
    assert_eq!(reporter.value(Counter::PlayedStreak), 1);
}

#[tokio::test]
async fn repeated_sync_reports_nothing_new() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let sync = runtime.coordinator(store.clone(), reporter.clone());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    runtime.handle().submit_guess_at(&def, "fabcedg", 1).await.unwrap();

    sync.sync(&runtime.handle(), &history).await.unwrap();
    let delivered = reporter.received();
    let version = store.get("progress").unwrap().version;

    let again = sync.sync(&runtime.handle(), &history).await.unwrap();
    assert_eq!(again.report.processed, 0);
    assert_eq!(again.delivered, 0);
    assert_eq!(reporter.received(), delivered);
    assert_eq!(reporter.value(Counter::Points), 17);
    assert_eq!(reporter.value(Counter::PerfectWords), 1);
    assert_eq!(reporter.value(Counter::PerfectStreak), 1);

    // Content is unchanged; only the version moved.
    let stored = store.get("progress").unwrap();
    assert_ne!(stored.version, version);
    assert_eq!(SnapshotCodec::decode(&stored.bytes).unwrap().len(), 1);
}

#[tokio::test]
async fn played_streak_skips_gaps() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let sync = runtime.coordinator(store, reporter.clone());
    let handle = runtime.handle();

    let mut history = Vec::new();
    for (d, center) in [(1, 'g'), (2, 'j'), (3, 'k'), (5, 'm')] {
        let def = daily(center);
        let word = format!("ab{center}");
        let submission = handle.submit_guess_at(&def, word, i64::from(d)).await.unwrap();
        assert_eq!(submission.verdict, Verdict::Correct);
        history.push(PuzzleHistoryEntry::from_definition(day(d), &def));
    }

    let outcome = sync.sync(&handle, &history).await.unwrap();
    let report = outcome.report;
    assert_eq!(report.longest_played_streak, 3);
    assert_eq!(report.words_found_delta, 4);
    assert_eq!(reporter.value(Counter::PlayedStreak), 3);
    assert_eq!(handle.sync_state().await.unwrap().best_played_streak, 3);
}

#[tokio::test]
async fn corrupt_remote_keeps_local_progress() {
    let store = Arc::new(InMemorySnapshotStore::new());
    store.put(
        "progress",
        br#"{"version":2,"count":5,"guesses":[]}"#.to_vec(),
        Default::default(),
    );
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let sync = runtime.coordinator(store.clone(), reporter);
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    runtime.handle().submit_guess_at(&def, "bag", 1).await.unwrap();
    runtime.handle().submit_guess_at(&def, "cage", 2).await.unwrap();

    let outcome = sync.sync(&runtime.handle(), &history).await.unwrap();
    assert!(outcome.remote_decode_failed);
    assert_eq!(outcome.records, 2);

    let stored = store.get("progress").unwrap();
    assert_eq!(SnapshotCodec::decode(&stored.bytes).unwrap().len(), 2);
}

#[tokio::test]
async fn conflict_exhaustion_is_surfaced_and_retryable() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = ProgressRuntime::builder()
        .config(config().with_max_conflict_attempts(3))
        .ledger(InMemoryLedger::new())
        .build()
        .await
        .unwrap();
    let sync = runtime.coordinator(store.clone(), reporter);
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    runtime.handle().submit_guess_at(&def, "bag", 1).await.unwrap();
    store.put("progress", Vec::new(), Default::default());
    store.force_conflicts("progress", 4);

    let err = sync.sync(&runtime.handle(), &history).await.unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Sync(SyncError::ConflictExhausted { attempts: 3 })
    ));
    assert!(err.is_retryable());
    assert_eq!(runtime.handle().export().await.unwrap().len(), 1);
    assert!(
        runtime
            .handle()
            .sync_state()
            .await
            .unwrap()
            .last_applied_remote_version
            .is_none()
    );

    let outcome = sync.sync(&runtime.handle(), &history).await.unwrap();
    assert_eq!(outcome.conflicts, 0);
    assert_eq!(outcome.records, 1);
}

#[tokio::test]
async fn failed_report_is_redelivered_once() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let sync = runtime.coordinator(store, reporter.clone());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    runtime.handle().submit_guess_at(&def, "badge", 1).await.unwrap();

    reporter.set_failing(true);
    let err = sync.sync(&runtime.handle(), &history).await.unwrap_err();
    assert!(matches!(err, ProgressError::Report(_)));

    let state = runtime.handle().sync_state().await.unwrap();
    assert!(state.is_counted(0));
    assert!(!state.pending_report.is_empty());

    reporter.set_failing(false);
    let outcome = sync.sync(&runtime.handle(), &history).await.unwrap();
    assert_eq!(outcome.report.processed, 0);
    assert!(outcome.delivered > 0);
    assert_eq!(reporter.value(Counter::Points), 5);
    assert!(
        runtime
            .handle()
            .sync_state()
            .await
            .unwrap()
            .pending_report
            .is_empty()
    );
}

#[tokio::test]
async fn interrupted_sync_resumes_from_disk_without_remerging() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(InMemorySnapshotStore::new());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    // First run: reconcile and persist, then stop before aggregating.
    {
        let runtime = ProgressRuntime::builder()
            .config(config())
            .ledger(FileLedger::open(temp_dir.path()).unwrap())
            .build()
            .await
            .unwrap();
        let handle = runtime.handle();
        handle.submit_guess_at(&def, "bag", 1).await.unwrap();
        handle.submit_guess_at(&def, "cage", 2).await.unwrap();

        let local: Vec<Guess> = handle
            .export()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.guess)
            .collect();
        let reconciled = ConflictResolver::default()
            .reconcile(store.as_ref(), "progress", &local, 100)
            .await
            .unwrap();
        handle
            .apply_reconciliation(reconciled.guesses, reconciled.version)
            .await
            .unwrap();

        drop(handle);
        runtime.shutdown().await.unwrap();
    }

    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = ProgressRuntime::builder()
        .config(config())
        .ledger(FileLedger::open(temp_dir.path()).unwrap())
        .build()
        .await
        .unwrap();
    let sync = runtime.coordinator(store.clone(), reporter.clone());

    let state = runtime.handle().sync_state().await.unwrap();
    assert!(state.counted.is_empty());
    assert!(state.last_applied_remote_version.is_some());

    let resumed = sync.resume(&runtime.handle(), &history).await.unwrap();
    assert_eq!(resumed.processed, 2);
    assert_eq!(resumed.points_delta, 3);
    assert_eq!(reporter.value(Counter::Points), 3);

    let outcome = sync.sync(&runtime.handle(), &history).await.unwrap();
    assert_eq!(outcome.report.processed, 0);
    assert_eq!(reporter.value(Counter::Points), 3);
}

#[tokio::test]
async fn offline_snapshot_service_leaves_ledger_untouched() {
    let store = Arc::new(InMemorySnapshotStore::new());
    store.set_offline(true);
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let sync = runtime.coordinator(store.clone(), reporter);
    let def = puzzle();

    runtime.handle().submit_guess_at(&def, "bag", 1).await.unwrap();

    let err = sync.sync(&runtime.handle(), &[]).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, ProgressError::Sync(SyncError::Network(_))));

    let state = runtime.handle().sync_state().await.unwrap();
    assert!(state.last_applied_remote_version.is_none());
    assert_eq!(runtime.handle().export().await.unwrap().len(), 1);
}

#[tokio::test]
async fn newer_snapshot_format_stops_sync_without_overwriting() {
    let store = Arc::new(InMemorySnapshotStore::new());
    let newer = br#"{"version":3,"count":1,"guesses":[{"opaque":true}]}"#.to_vec();
    store.put("progress", newer.clone(), Default::default());
    let reporter = Arc::new(InMemoryReporter::new());
    let runtime = device().await;
    let sync = runtime.coordinator(store.clone(), reporter.clone());
    let def = puzzle();
    let history = [PuzzleHistoryEntry::from_definition(day(1), &def)];

    runtime.handle().submit_guess_at(&def, "bag", 1).await.unwrap();

    let err = sync.sync(&runtime.handle(), &history).await.unwrap_err();
    assert!(matches!(
        err,
        ProgressError::Sync(SyncError::NewerSnapshotFormat { version: 3 })
    ));
    assert!(!err.is_retryable());

    assert_eq!(store.get("progress").unwrap().bytes, newer);
    let state = runtime.handle().sync_state().await.unwrap();
    assert!(state.last_applied_remote_version.is_none());
    assert!(state.counted.is_empty());
    assert!(reporter.received().is_empty());
}
