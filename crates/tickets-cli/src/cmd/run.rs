use anyhow::{bail, Context};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tickets_core::config::{Config, WarnLevel};
use tickets_core::daemon::{is_pid_alive, DaemonRecord};
use tickets_core::processor::process_project;
use tickets_core::TicketsError;
use tickets_server::{CycleFn, ServiceHandle};

pub fn run(root: &Path, port: Option<u16>, interval: Option<u64>) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    for w in config.validate(root) {
        match w.level {
            WarnLevel::Error => bail!("invalid config: {}", w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }

    let interval_secs = interval.unwrap_or(config.poll.interval_secs);
    if interval_secs == 0 {
        return Err(TicketsError::InvalidInterval(interval_secs).into());
    }
    let port = port.unwrap_or(config.server.port);

    if let Some(record) = DaemonRecord::read(root)? {
        if is_pid_alive(record.pid) {
            bail!(
                "tickets is already running for this project at {} (PID {})\n\
                 Run `tickets stop` to stop it first.",
                record.url,
                record.pid
            );
        }
        let _ = record.remove();
    }

    let cycle_root = root.to_path_buf();
    let cycle: CycleFn = Arc::new(move || process_project(&cycle_root));
    let service = ServiceHandle::new(cycle, Duration::from_secs(interval_secs));

    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind 127.0.0.1:{port}"))?;
        let actual_port = listener.local_addr()?.port();

        let record = DaemonRecord::new(&root_buf, actual_port);
        record.write().context("failed to write daemon record")?;

        println!(
            "tickets watching {} every {interval_secs}s, control at {}  (PID {})",
            config.task_file_path(&root_buf).display(),
            record.url,
            record.pid
        );

        let scheduler = service.clone();
        let result = tokio::select! {
            res = tickets_server::serve_on(root_buf.clone(), service.clone(), listener) => res,
            _ = scheduler.run() => Ok(()),
            _ = tokio::signal::ctrl_c() => {
                service.shutdown();
                Ok(())
            }
        };

        let _ = record.remove();
        result
    })
}
