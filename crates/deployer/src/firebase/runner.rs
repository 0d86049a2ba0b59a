use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// A fully specified child process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment
    pub env: Vec<(String, String)>,
    /// Removed from the inherited environment
    pub env_remove: Vec<String>,
    pub current_dir: PathBuf,
}

/// A launch that did not end in a zero exit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessFailure {
    /// Standard output captured before the failure, in order
    pub captured: Vec<String>,
    pub message: String,
}

/// Runs a child process to completion and hands back its standard output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<Vec<String>, ProcessFailure>;
}

/// Spawns real processes on the tokio runtime. Standard output is echoed to
/// the log line by line as it arrives; standard error goes straight through.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<Vec<String>, ProcessFailure> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        for key in &invocation.env_remove {
            command.env_remove(key);
        }
        command.envs(invocation.env.iter().map(|(k, v)| (k, v)));

        let mut child = command.spawn().map_err(|e| ProcessFailure {
            captured: Vec::new(),
            message: format!("Unable to start '{}': {}", invocation.program, e),
        })?;

        let mut captured = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = decode_line(&buf);
                        info!("{}", line);
                        captured.push(line);
                    }
                    Err(e) => {
                        reap(&mut child).await;
                        return Err(ProcessFailure {
                            captured,
                            message: format!("Failed reading output of '{}': {}", invocation.program, e),
                        });
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|e| ProcessFailure {
            captured: captured.clone(),
            message: format!("Failed waiting for '{}': {}", invocation.program, e),
        })?;

        if status.success() {
            Ok(captured)
        } else {
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown (terminated by signal)".to_string());
            Err(ProcessFailure {
                captured,
                message: format!("The process '{}' failed with exit code {}", invocation.program, code),
            })
        }
    }
}

/// Output is decoded lossily; stray bytes never fail a deploy
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Stop a child whose output can no longer be followed, so no attempt
/// outlives its `run` call
async fn reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to stop child process: {}", e);
    }
}
