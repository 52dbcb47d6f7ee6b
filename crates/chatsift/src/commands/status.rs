use anyhow::Context;
use chatsift_store::{ChatPaths, InsightStore};
use std::path::Path;

pub fn run(folder: &Path) -> anyhow::Result<()> {
    let paths = ChatPaths::new(folder)
        .with_context(|| format!("{} is not a chat folder", folder.display()))?;
    println!("{}", status_json(&paths));
    Ok(())
}

fn status_json(paths: &ChatPaths) -> serde_json::Value {
    let store = InsightStore::load(&paths.state_file());
    let state = store.state();
    let substantive = store.insights().iter().filter(|i| i.is_substantive()).count();

    serde_json::json!({
        "chat": paths.name,
        "last_processed_message_id": state.last_processed_message_id,
        "last_processed_message_timestamp_unix": state.last_processed_message_timestamp_unix,
        "insights": store.insights().len(),
        "substantive_insights": substantive,
        "latest_report": state.latest_report_filename,
        "report_valid": store.has_valid_report(&paths.folder),
        "pending_export": paths
            .latest_export()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())),
    })
}
