mod common;

use chatsift_compress::FailureKind;
use chatsift_core::{PipelineConfig, ReportOutcome};
use chatsift_store::{read_jsonl, Cursor, InsightStore, RunOutcome, RunRecord, NO_NEW_INSIGHTS};
use common::*;

#[tokio::test]
async fn test_three_chunks_with_quiet_middle_chunk() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "team_chat");
    let export = write_export(&paths.folder, "result.json", 1..=120);

    let stub = Scripted::new(|kind, seen, user| match kind {
        CallKind::Chunk if seen == 1 => Ok(NO_NEW_INSIGHTS.to_string()),
        _ => echo_handler(kind, seen, user),
    });
    let pipeline = pipeline(stub, test_config());

    let record = pipeline.run(&paths).await;
    assert_eq!(record.outcome, RunOutcome::Completed);
    assert_eq!(record.new_records, 120);
    assert_eq!(record.chunks_processed, 3);
    assert_eq!(record.insights_added, 2);

    let chunk_calls = pipeline.summarizer().calls_of(CallKind::Chunk);
    assert_eq!(chunk_calls.len(), 3);
    assert_eq!(chunk_note_ids(&chunk_calls[0]).len(), 50);
    assert_eq!(chunk_note_ids(&chunk_calls[1]).len(), 50);
    assert_eq!(chunk_note_ids(&chunk_calls[2]), (101..=120).collect::<Vec<_>>());

    let store = InsightStore::load(&paths.state_file());
    assert_eq!(store.insights().len(), 2);
    assert_eq!(store.insights()[0].insight_text, "- notes 1 to 50 discussed");
    assert_eq!(store.insights()[1].insight_text, "- notes 101 to 120 discussed");
    assert_eq!(store.insights()[1].chunk_start_message_id, 101);
    assert_eq!(store.insights()[1].chunk_end_message_timestamp_unix, BASE_TS + 120);
    assert_eq!(store.cursor(), Cursor::new(BASE_TS + 120, 120));

    let report_name = record.report_file.clone().expect("report written");
    assert_eq!(store.state().latest_report_filename.as_deref(), Some(report_name.as_str()));
    let report = std::fs::read_to_string(paths.report_path(&report_name)).unwrap();
    assert!(report.starts_with("Final Report for: team_chat\n"));
    assert!(report.contains("- notes 1 to 50 discussed"));
    assert!(report.contains("- notes 101 to 120 discussed"));

    assert!(!export.exists(), "processed export is removed");
    assert_eq!(
        store.state().system_prompts_used.len(),
        3,
        "instruction texts are recorded"
    );
}

#[tokio::test]
async fn test_running_context_carries_previous_insight() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "ctx");
    write_export(&paths.folder, "result.json", 1..=100);

    let pipeline = pipeline(Scripted::new(echo_handler), test_config());
    pipeline.run(&paths).await;

    let chunk_calls = pipeline.summarizer().calls_of(CallKind::Chunk);
    assert!(chunk_calls[0].contains("No previous summary available."));
    assert!(chunk_calls[1].contains("Previous Conversation Summary:\n- notes 1 to 50 discussed"));
    assert!(pipeline.summarizer().calls_of(CallKind::Compact).is_empty());
}

#[tokio::test]
async fn test_compaction_failure_falls_back_and_run_continues() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "tight");
    write_export(&paths.folder, "result.json", 1..=40);

    let config = PipelineConfig {
        chunk_size: 10,
        chunk_context_budget: 20,
        ..PipelineConfig::new()
    };
    let stub = Scripted::new(|kind, seen, user| match kind {
        CallKind::Compact => Err(failure(FailureKind::Overloaded)),
        _ => echo_handler(kind, seen, user),
    });
    let pipeline = pipeline(stub, config);

    let record = pipeline.run(&paths).await;
    assert_eq!(record.outcome, RunOutcome::Completed);
    assert_eq!(record.insights_added, 4);
    assert!(!pipeline.summarizer().calls_of(CallKind::Compact).is_empty());

    // Degraded context keeps only the newest insight that fits
    let chunk_calls = pipeline.summarizer().calls_of(CallKind::Chunk);
    let last = &chunk_calls[3];
    assert!(last.contains("- notes 21 to 30 discussed"));
    assert!(!last.contains("- notes 1 to 10 discussed"));
}

#[tokio::test]
async fn test_chunk_failure_aborts_and_keeps_progress() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "flaky");
    let export = write_export(&paths.folder, "result.json", 1..=120);

    let stub = Scripted::new(|kind, seen, user| match kind {
        CallKind::Chunk if seen == 1 => Err(failure(FailureKind::ServerError(500))),
        _ => echo_handler(kind, seen, user),
    });
    let pipeline = pipeline(stub, test_config());

    let record = pipeline.run(&paths).await;
    assert_eq!(record.outcome, RunOutcome::Aborted);
    assert_eq!(record.chunks_processed, 1);
    assert_eq!(pipeline.summarizer().calls_of(CallKind::Chunk).len(), 2);
    assert!(pipeline.summarizer().calls_of(CallKind::Report).is_empty());

    let store = InsightStore::load(&paths.state_file());
    assert_eq!(store.insights().len(), 1);
    assert_eq!(store.cursor(), Cursor::new(BASE_TS + 50, 50));
    assert!(export.exists(), "export kept for the next run");
}

#[tokio::test]
async fn test_resumed_run_matches_uninterrupted_run() {
    let root = tempfile::tempdir().unwrap();

    let straight = chat_folder(root.path(), "straight");
    write_export(&straight.folder, "result.json", 1..=170);
    pipeline(Scripted::new(echo_handler), test_config())
        .run(&straight)
        .await;

    let resumed = chat_folder(root.path(), "resumed");
    write_export(&resumed.folder, "result.json", 1..=170);
    let failing = Scripted::new(|kind, seen, user| match kind {
        CallKind::Chunk if seen == 2 => Err(failure(FailureKind::Timeout)),
        _ => echo_handler(kind, seen, user),
    });
    let first = pipeline(failing, test_config()).run(&resumed).await;
    assert_eq!(first.outcome, RunOutcome::Aborted);

    let second = pipeline(Scripted::new(echo_handler), test_config())
        .run(&resumed)
        .await;
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(second.new_records, 70);

    let a = InsightStore::load(&straight.state_file());
    let b = InsightStore::load(&resumed.state_file());
    assert_eq!(a.cursor(), b.cursor());
    assert_eq!(a.insights().len(), 4);
    assert_eq!(a.insights().len(), b.insights().len());
    for (x, y) in a.insights().iter().zip(b.insights()) {
        assert_eq!(x.insight_text, y.insight_text);
        assert_eq!(x.chunk_start_message_id, y.chunk_start_message_id);
        assert_eq!(x.chunk_end_message_id, y.chunk_end_message_id);
    }
}

#[tokio::test]
async fn test_rerun_on_same_export_processes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "again");
    let config = PipelineConfig {
        keep_exports: true,
        ..test_config()
    };

    write_export(&paths.folder, "result.json", 1..=60);
    pipeline(Scripted::new(echo_handler), config.clone())
        .run(&paths)
        .await;

    let second = pipeline(Scripted::new(echo_handler), config);
    let record = second.run(&paths).await;
    assert_eq!(record.outcome, RunOutcome::NoNewRecords);
    assert!(second.summarizer().calls.borrow().is_empty(), "valid report is reused");
    assert_eq!(InsightStore::load(&paths.state_file()).insights().len(), 2);
}

#[tokio::test]
async fn test_stale_export_deleted() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "stale");

    write_export(&paths.folder, "result.json", 1..=30);
    pipeline(Scripted::new(echo_handler), test_config())
        .run(&paths)
        .await;

    let old = write_export(&paths.folder, "older.json", 1..=20);
    let record = pipeline(Scripted::new(echo_handler), test_config())
        .run(&paths)
        .await;
    assert_eq!(record.outcome, RunOutcome::NoNewRecords);
    assert!(!old.exists());
}

#[tokio::test]
async fn test_newer_export_continues_from_cursor() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "growing");

    write_export(&paths.folder, "first.json", 1..=50);
    pipeline(Scripted::new(echo_handler), test_config())
        .run(&paths)
        .await;

    // A later export repeats the old history plus new messages
    write_export(&paths.folder, "second.json", 1..=75);
    let second = pipeline(Scripted::new(echo_handler), test_config());
    let record = second.run(&paths).await;
    assert_eq!(record.new_records, 25);
    let chunk_calls = second.summarizer().calls_of(CallKind::Chunk);
    assert_eq!(chunk_note_ids(&chunk_calls[0]), (51..=75).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_report_failure_clears_pointer_and_keeps_export() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "noreport");
    let export = write_export(&paths.folder, "result.json", 1..=10);

    let stub = Scripted::new(|kind, seen, user| match kind {
        CallKind::Report => Err(failure(FailureKind::ClientError(400))),
        _ => echo_handler(kind, seen, user),
    });
    let record = pipeline(stub, test_config()).run(&paths).await;
    assert_eq!(record.outcome, RunOutcome::ReportFailed);
    assert!(export.exists());

    let store = InsightStore::load(&paths.state_file());
    assert_eq!(store.insights().len(), 1, "insight progress survives");
    assert!(store.state().latest_report_filename.is_none());
    assert!(store.state().report_generated_at_utc.is_some());
}

#[tokio::test]
async fn test_no_export_still_regenerates_missing_report() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "reportonly");
    write_export(&paths.folder, "result.json", 1..=10);
    let first = pipeline(Scripted::new(echo_handler), test_config())
        .run(&paths)
        .await;
    let report_name = first.report_file.unwrap();
    std::fs::remove_file(paths.report_path(&report_name)).unwrap();

    let second = pipeline(Scripted::new(echo_handler), test_config());
    let record = second.run(&paths).await;
    assert_eq!(record.outcome, RunOutcome::NoExport);
    assert!(record.report_file.is_some());
    assert_eq!(second.summarizer().calls_of(CallKind::Report).len(), 1);
    assert!(second.summarizer().calls_of(CallKind::Chunk).is_empty());
}

#[tokio::test]
async fn test_empty_folder_does_nothing() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "empty");

    let pipeline = pipeline(Scripted::new(echo_handler), test_config());
    let record = pipeline.run(&paths).await;
    assert_eq!(record.outcome, RunOutcome::NoExport);
    assert!(record.report_file.is_none());
    assert!(pipeline.summarizer().calls.borrow().is_empty());
}

#[tokio::test]
async fn test_run_history_appended() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "history");
    write_export(&paths.folder, "result.json", 1..=5);

    pipeline(Scripted::new(echo_handler), test_config())
        .run(&paths)
        .await;
    pipeline(Scripted::new(echo_handler), test_config())
        .run(&paths)
        .await;

    let runs: Vec<RunRecord> = read_jsonl(&paths.runs_file()).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].outcome, RunOutcome::Completed);
    assert_eq!(runs[0].new_records, 5);
    assert_eq!(runs[1].outcome, RunOutcome::NoExport);
}

#[tokio::test]
async fn test_forced_report_ignores_validity() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "forced");
    write_export(&paths.folder, "result.json", 1..=10);
    pipeline(Scripted::new(echo_handler), test_config())
        .run(&paths)
        .await;

    let unforced = pipeline(Scripted::new(echo_handler), test_config());
    assert_eq!(
        unforced.regenerate_report(&paths, false).await,
        ReportOutcome::Skipped
    );

    let forced = pipeline(Scripted::new(echo_handler), test_config());
    let outcome = forced.regenerate_report(&paths, true).await;
    assert!(matches!(outcome, ReportOutcome::Written { .. }));
}

#[tokio::test]
async fn test_state_save_failure_is_logged_and_run_completes() {
    let root = tempfile::tempdir().unwrap();
    let paths = chat_folder(root.path(), "blocked_state");
    write_export(&paths.folder, "result.json", 1..=60);
    // A directory where the snapshot should go makes every save fail
    std::fs::create_dir(paths.state_file()).unwrap();

    let pipeline = pipeline(Scripted::new(echo_handler), test_config());
    let record = pipeline.run(&paths).await;

    assert_eq!(record.outcome, RunOutcome::Completed);
    assert_eq!(record.chunks_processed, 2);
    assert_eq!(record.insights_added, 2);
    assert!(paths.state_file().is_dir());

    // The report is built from the insights held in memory
    let report = record.report_file.unwrap();
    let text = std::fs::read_to_string(paths.report_path(&report)).unwrap();
    assert!(text.contains("- notes 1 to 50 discussed"));
    assert!(text.contains("- notes 51 to 60 discussed"));
}
