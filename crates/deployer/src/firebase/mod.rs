// Firebase Hosting deploys through the firebase-tools CLI

pub mod invoker;
pub mod result;
pub mod runner;

use crate::Deployer;
use async_trait::async_trait;
use hosting_deploy_core::{ChannelDeployResult, DeployConfig, ProductionConfig, ProductionDeployResult, Result};
use invoker::{ToolCommand, exec_with_credentials};
use runner::{CommandRunner, TokioCommandRunner};

/// Deploys by shelling out to `firebase-tools`
pub struct FirebaseCli {
    runner: Box<dyn CommandRunner>,
    tool: ToolCommand,
}

impl FirebaseCli {
    /// `npx firebase-tools`, run as a real child process
    pub fn new() -> Self {
        Self::with_runner(Box::new(TokioCommandRunner), ToolCommand::default())
    }

    pub fn with_runner(runner: Box<dyn CommandRunner>, tool: ToolCommand) -> Self {
        Self { runner, tool }
    }
}

impl Default for FirebaseCli {
    fn default() -> Self {
        Self::new()
    }
}

/// `hosting:channel:deploy [--only t1,t2] <channel> [--expires d]`
pub fn preview_args(config: &DeployConfig) -> Vec<String> {
    let mut args = vec!["hosting:channel:deploy".to_string()];
    if !config.targets.is_empty() {
        args.push("--only".to_string());
        args.push(config.targets.join(","));
    }
    args.push(config.channel_id.clone());
    if let Some(expires) = config.expires.as_deref().filter(|e| !e.is_empty()) {
        args.push("--expires".to_string());
        args.push(expires.to_string());
    }
    args
}

/// `deploy --only hosting[:t1],...`
pub fn production_args(targets: &[String]) -> Vec<String> {
    let only = if targets.is_empty() {
        "hosting".to_string()
    } else {
        targets
            .iter()
            .map(|t| format!("hosting:{}", t))
            .collect::<Vec<_>>()
            .join(",")
    };
    vec!["deploy".to_string(), "--only".to_string(), only]
}

#[async_trait]
impl Deployer for FirebaseCli {
    async fn deploy_preview(&self, config: &DeployConfig) -> Result<ChannelDeployResult> {
        let payload = exec_with_credentials(
            self.runner.as_ref(),
            &self.tool,
            &preview_args(config),
            config.project_id.as_deref(),
            &config.auth,
            &config.project_dir,
        )
        .await?;
        result::classify_channel(&payload)
    }

    async fn deploy_production(&self, config: &ProductionConfig) -> Result<ProductionDeployResult> {
        let payload = exec_with_credentials(
            self.runner.as_ref(),
            &self.tool,
            &production_args(&config.targets),
            config.project_id.as_deref(),
            &config.auth,
            &config.project_dir,
        )
        .await?;
        result::classify_production(&payload)
    }
}
