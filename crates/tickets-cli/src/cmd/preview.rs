use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tickets_core::{config::Config, processor};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let task_file = config.task_file_path(root);
    let pending = processor::preview(&task_file)
        .with_context(|| format!("failed to read {}", task_file.display()))?;

    if json {
        return print_json(&serde_json::json!({
            "task_file": task_file,
            "pending": pending,
        }));
    }

    if pending.is_empty() {
        println!("Nothing pending in {}.", task_file.display());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = pending
        .iter()
        .map(|p| {
            let file = p
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            vec![
                p.line.content_hash.clone(),
                p.line.summary.clone(),
                p.line.labels.join(","),
                file,
            ]
        })
        .collect();
    print_table(&["HASH", "SUMMARY", "LABELS", "FILE"], rows);
    Ok(())
}
