use anyhow::Context;
use chatsift_store::{read_jsonl, ChatPaths, RunOutcome, RunRecord};
use std::path::Path;

const RECENT_LIMIT: usize = 20;

fn compute_stats(runs: &[RunRecord]) -> String {
    if runs.is_empty() {
        return "No runs to analyze.".to_string();
    }
    let count = |outcome: RunOutcome| runs.iter().filter(|r| r.outcome == outcome).count();
    let records: usize = runs.iter().map(|r| r.new_records).sum();
    let chunks: usize = runs.iter().map(|r| r.chunks_processed).sum();
    let insights: usize = runs.iter().map(|r| r.insights_added).sum();
    let reports = runs.iter().filter(|r| r.report_file.is_some()).count();

    format!(
        "Total runs: {}\n\
         Completed: {}  Aborted: {}  Report failed: {}  Nothing new: {}\n\
         Records processed: {}\n\
         Chunks processed: {}\n\
         Insights added: {}\n\
         Reports written: {}",
        runs.len(),
        count(RunOutcome::Completed),
        count(RunOutcome::Aborted),
        count(RunOutcome::ReportFailed),
        count(RunOutcome::NoNewRecords) + count(RunOutcome::NoExport),
        records,
        chunks,
        insights,
        reports
    )
}

fn format_run(run: &RunRecord) -> String {
    let export = run
        .export_file
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "  {} | {:<14} | export:{} records:{} chunks:{} insights:{}",
        run.started_at.format("%Y-%m-%d %H:%M"),
        run.outcome.to_string(),
        export,
        run.new_records,
        run.chunks_processed,
        run.insights_added,
    )
}

pub fn run(folder: &Path, stats: bool) -> anyhow::Result<()> {
    let paths = ChatPaths::new(folder)
        .with_context(|| format!("{} is not a chat folder", folder.display()))?;
    let runs: Vec<RunRecord> = read_jsonl(&paths.runs_file())?;

    if runs.is_empty() {
        println!("No run history");
        return Ok(());
    }

    if stats {
        println!("{}", compute_stats(&runs));
        return Ok(());
    }

    let recent: Vec<_> = runs.iter().rev().take(RECENT_LIMIT).collect();
    println!("Recent Runs (last {})", recent.len());
    println!("===================");
    for run in &recent {
        println!("{}", format_run(run));
    }
    Ok(())
}
