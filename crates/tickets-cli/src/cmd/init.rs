use anyhow::Context;
use std::path::{Path, PathBuf};
use tickets_core::{config::Config, io, paths, secrets::JiraSecrets};

pub fn run(root: &Path, task_file: Option<PathBuf>) -> anyhow::Result<()> {
    println!("Initializing tickets in: {}", root.display());

    let dir = paths::tickets_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    // Keep an existing config; only a fresh one picks up --task-file.
    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let cfg = match task_file {
            Some(p) => Config::new(p),
            None => Config::default(),
        };
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    let secrets_path = config.secrets_path(root);
    if io::write_if_missing(&secrets_path, JiraSecrets::template().as_bytes())
        .context("failed to write secrets template")?
    {
        println!("  created: {}", secrets_path.display());
    } else {
        println!("  exists:  {}", secrets_path.display());
    }

    let task_path = config.task_file_path(root);
    if io::write_if_missing(&task_path, b"").context("failed to create task file")? {
        println!("  created: {}", task_path.display());
    } else {
        println!("  exists:  {}", task_path.display());
    }

    println!();
    println!(
        "Fill in the Jira credentials in {} (or set JIRA_SERVER, JIRA_EMAIL, JIRA_API_TOKEN, JIRA_PROJECT), then run `tickets run`.",
        secrets_path.display()
    );
    Ok(())
}
