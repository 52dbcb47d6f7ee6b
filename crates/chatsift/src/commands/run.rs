use crate::cli::ConfigArgs;
use anyhow::Context;
use chatsift_store::{ChatPaths, RunRecord};
use std::path::Path;

pub fn run(
    folder: &Path,
    args: &ConfigArgs,
    chunk_size: Option<usize>,
    keep_exports: bool,
) -> anyhow::Result<()> {
    let mut config = super::resolve_config(args)?;
    if let Some(size) = chunk_size {
        config.chunk_size = size;
    }
    config.keep_exports |= keep_exports;
    config.validate()?;

    let paths = ChatPaths::new(folder)
        .with_context(|| format!("{} is not a chat folder", folder.display()))?;
    let pipeline = super::live_pipeline(config)?;

    let record = super::runtime()?.block_on(pipeline.run(&paths));
    println!("{}", summary_line(&paths.name, &record));
    Ok(())
}

fn summary_line(name: &str, record: &RunRecord) -> String {
    let report = record.report_file.as_deref().unwrap_or("-");
    format!(
        "{}: {} | new records: {} | chunks: {} | insights added: {} | report: {}",
        name,
        record.outcome,
        record.new_records,
        record.chunks_processed,
        record.insights_added,
        report
    )
}
