// src/exec/command.rs

//! Stage command runner.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use futures::future::try_join_all;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::StageConfig;
use crate::dag::{Callback, callback};
use crate::exec::files::write_files;

/// Callbacks for one configured stage.
///
/// Without files, each command is its own callback. A stage with files gets a
/// single callback that writes them and then runs the commands concurrently,
/// so no command starts before its files exist.
pub fn stage_callbacks(name: &str, stage: &StageConfig) -> Vec<Callback> {
    if stage.files.is_empty() {
        return stage
            .commands
            .iter()
            .map(|cmd| command_callback(name, cmd))
            .collect();
    }

    let name = name.to_string();
    let files = stage.files.clone();
    let commands = stage.commands.clone();
    vec![callback(move |token| {
        let name = name.clone();
        let files = files.clone();
        let commands = commands.clone();
        async move {
            write_files(&name, &files).await?;
            try_join_all(
                commands
                    .iter()
                    .map(|cmd| run_command(&name, cmd, token.clone())),
            )
            .await?;
            Ok(())
        }
    })]
}

/// Build a callback that runs `cmd` for `stage`.
pub fn command_callback(stage: &str, cmd: &str) -> Callback {
    let stage = stage.to_string();
    let cmd = cmd.to_string();
    callback(move |token| {
        let stage = stage.clone();
        let cmd = cmd.clone();
        async move { run_command(&stage, &cmd, token).await }
    })
}

/// Run a single shell command to completion.
///
/// - A non-zero exit status is an error naming the command and exit code.
/// - If `token` is cancelled first, the child process is killed and the
///   command reports a cancellation error.
pub async fn run_command(stage: &str, cmd_line: &str, token: CancellationToken) -> Result<()> {
    info!(stage = %stage, cmd = %cmd_line, "starting stage command");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning `{cmd_line}` for stage '{stage}'"))?;

    // Always consume output so pipe buffers don't fill; log at debug.
    forward_lines(stage, "stdout", child.stdout.take());
    forward_lines(stage, "stderr", child.stderr.take());

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res
                .with_context(|| format!("waiting for `{cmd_line}` of stage '{stage}'"))?;
            let code = status.code().unwrap_or(-1);

            info!(
                stage = %stage,
                exit_code = code,
                success = status.success(),
                "stage command exited"
            );

            if !status.success() {
                bail!("command `{cmd_line}` exited with status {code}");
            }
            Ok(())
        }

        _ = token.cancelled() => {
            info!(stage = %stage, cmd = %cmd_line, "cancellation requested; killing stage command");
            if let Err(e) = child.kill().await {
                warn!(stage = %stage, error = %e, "failed to kill stage command on cancellation");
            }
            bail!("command `{cmd_line}` cancelled")
        }
    }
}

fn forward_lines<R>(stage: &str, stream: &'static str, reader: Option<R>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return;
    };
    let stage = stage.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(stage = %stage, stream, "{}", line);
        }
    });
}
