use crate::cli::ConfigArgs;
use anyhow::Context;
use chatsift_core::ReportOutcome;
use chatsift_store::ChatPaths;
use std::path::Path;

pub fn run(folder: &Path, args: &ConfigArgs, force: bool) -> anyhow::Result<()> {
    let config = super::resolve_config(args)?;
    let paths = ChatPaths::new(folder)
        .with_context(|| format!("{} is not a chat folder", folder.display()))?;
    let pipeline = super::live_pipeline(config)?;

    let outcome = super::runtime()?.block_on(pipeline.regenerate_report(&paths, force));
    println!("{}", describe(&paths, &outcome));
    if let ReportOutcome::Failed(e) = outcome {
        anyhow::bail!("report generation failed: {}", e);
    }
    Ok(())
}

fn describe(paths: &ChatPaths, outcome: &ReportOutcome) -> String {
    match outcome {
        ReportOutcome::Skipped => "Report is up to date (use --force to regenerate)".to_string(),
        ReportOutcome::NoInsights => "No insights to report on".to_string(),
        ReportOutcome::Written { file_name } => {
            format!("Report written to {}", paths.report_path(file_name).display())
        }
        ReportOutcome::Failed(e) => format!("Report generation failed: {}", e),
    }
}
