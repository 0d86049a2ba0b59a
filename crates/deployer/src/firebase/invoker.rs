use super::runner::{CommandRunner, Invocation, ProcessFailure};
use hosting_deploy_core::{CREDENTIALS_FILE_ENV, DeployAuth, Error, Result, TOKEN_ENV};
use std::path::Path;
use tracing::{error, info, warn};

pub const DEPLOY_AGENT_ENV: &str = "FIREBASE_DEPLOY_AGENT";
pub const DEPLOY_AGENT: &str = "action-hosting-deploy";

/// How the tool should format its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Machine readable result document
    Json,
    /// Verbose human readable diagnostics
    Debug,
}

impl OutputMode {
    fn flag(self) -> &'static str {
        match self {
            OutputMode::Json => "--json",
            OutputMode::Debug => "--debug",
        }
    }
}

/// The executable plus any leading arguments, e.g. `npx firebase-tools`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub prefix_args: Vec<String>,
}

impl Default for ToolCommand {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            prefix_args: vec!["firebase-tools".to_string()],
        }
    }
}

/// Build the launch for one attempt. The child sees the inherited
/// environment, the agent marker and exactly one credential variable.
pub fn build_invocation(
    tool: &ToolCommand,
    args: &[String],
    project_id: Option<&str>,
    auth: &DeployAuth,
    working_dir: &Path,
    mode: OutputMode,
) -> Invocation {
    let mut full_args = tool.prefix_args.clone();
    full_args.extend(args.iter().cloned());
    if let Some(project) = project_id.filter(|p| !p.is_empty()) {
        full_args.push("--project".to_string());
        full_args.push(project.to_string());
    }
    full_args.push(mode.flag().to_string());

    let (credential_key, credential_value) = auth.env_var();
    let other_credential = if credential_key == CREDENTIALS_FILE_ENV {
        TOKEN_ENV
    } else {
        CREDENTIALS_FILE_ENV
    };

    Invocation {
        program: tool.program.clone(),
        args: full_args,
        env: vec![
            (DEPLOY_AGENT_ENV.to_string(), DEPLOY_AGENT.to_string()),
            (credential_key.to_string(), credential_value),
        ],
        env_remove: vec![other_credential.to_string()],
        current_dir: working_dir.to_path_buf(),
    }
}

/// Run the tool and return its result payload.
///
/// A failed `--json` attempt is logged and re-run once with `--debug` so the
/// log shows the tool's full diagnostics. The verbose attempt's output is
/// never parsed; the run still fails with the process error.
pub async fn exec_with_credentials(
    runner: &dyn CommandRunner,
    tool: &ToolCommand,
    args: &[String],
    project_id: Option<&str>,
    auth: &DeployAuth,
    working_dir: &Path,
) -> Result<String> {
    let invocation = build_invocation(tool, args, project_id, auth, working_dir, OutputMode::Json);
    let failure = match runner.run(&invocation).await {
        Ok(captured) => return Ok(final_payload(&captured)),
        Err(failure) => failure,
    };
    log_failure(&failure);

    info!("Retrying deploy with the --debug flag for better error output");
    let retry = build_invocation(tool, args, project_id, auth, working_dir, OutputMode::Debug);
    match runner.run(&retry).await {
        Ok(_) => {
            warn!("The --debug retry exited cleanly, but its output is diagnostic only");
            Err(Error::ProcessExecution(failure.message))
        }
        Err(retry_failure) => {
            log_failure(&retry_failure);
            Err(Error::ProcessExecution(retry_failure.message))
        }
    }
}

fn log_failure(failure: &ProcessFailure) {
    if !failure.captured.is_empty() {
        info!("{}", failure.captured.join("\n"));
    }
    error!("{}", failure.message);
}

/// The last document the tool wrote.
///
/// Progress lines may precede the result, and the result itself may be
/// pretty printed over many lines, so the payload starts at the last line
/// that opens a top level object. Without one, the last non-blank line is
/// the payload; empty output gives an empty payload.
pub fn final_payload(captured: &[String]) -> String {
    if let Some(start) = captured.iter().rposition(|line| line.starts_with('{')) {
        return captured[start..].join("\n");
    }
    captured
        .iter()
        .rev()
        .find(|line| !line.trim().is_empty())
        .cloned()
        .unwrap_or_default()
}
