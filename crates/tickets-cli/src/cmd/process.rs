use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use tickets_core::processor::{process_project, CycleReport};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let report = process_project(root).context("processing failed")?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if let Some(reason) = &report.halted {
        anyhow::bail!("cycle stopped early: {reason}");
    }
    Ok(())
}

pub fn print_report(report: &CycleReport) {
    if report.task_file_missing {
        println!("Task file {} not found; nothing to do.", report.task_file.display());
        return;
    }

    let rows: Vec<Vec<String>> = report
        .files
        .iter()
        .map(|f| {
            vec![
                f.path.display().to_string(),
                f.created.len().to_string(),
                f.duplicates.len().to_string(),
                f.kept.to_string(),
            ]
        })
        .collect();
    print_table(&["FILE", "CREATED", "DUPLICATES", "KEPT"], rows);

    let created: Vec<&str> = report
        .files
        .iter()
        .flat_map(|f| f.created.iter().map(String::as_str))
        .collect();
    if !created.is_empty() {
        println!();
        println!("Created: {}", created.join(", "));
    }
    if report.conflicts_resolved > 0 {
        println!("Merged {} sync conflict file(s).", report.conflicts_resolved);
    }
    for error in report.files.iter().flat_map(|f| f.errors.iter()) {
        println!("[error] {error}");
    }
}
