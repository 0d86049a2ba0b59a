use anyhow::{Context, Result};
use hosting_deploy_core::{
    ActionConfig, CheckReport, DeployConfig, Error, PrContext, ProductionConfig, RawInputs,
    SiteDeploy, resolve_channel_id,
};
use hosting_deploy_deployer::{Deployer, FirebaseCli};
use hosting_deploy_generator::{
    failure_report, preview_comment, preview_report, production_report, production_url,
};
use hosting_deploy_validator::{resolve_auth, verify_entry_point};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::actions::{GitHubActions, Workflow};
use crate::github::{GitHubClient, PullRequestApi};
use crate::report::{Finisher, post_or_update_comment};

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    VerifyingEnvironment,
    Authenticating,
    Deploying,
    ReportingSuccess,
    ReportingFailure,
    Done,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded(CheckReport),
    Failed {
        /// Stage that raised the failure
        stage: Stage,
        message: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }
}

enum Deployed {
    Production,
    Preview {
        /// Deployed URLs, primary site first
        urls: Vec<String>,
        expire_time: String,
        report: CheckReport,
    },
}

/// One deploy-and-report run.
///
/// Stages run strictly in order. The first failure short-circuits to the
/// failure report, which always reaches both the finisher and the workflow.
pub struct Run<'a> {
    config: &'a ActionConfig,
    deployer: &'a dyn Deployer,
    github: Option<&'a dyn PullRequestApi>,
    workflow: &'a dyn Workflow,
    scratch_dir: PathBuf,
    stage: Stage,
    group_open: bool,
}

impl<'a> Run<'a> {
    pub fn new(
        config: &'a ActionConfig,
        deployer: &'a dyn Deployer,
        github: Option<&'a dyn PullRequestApi>,
        workflow: &'a dyn Workflow,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            deployer,
            github,
            workflow,
            scratch_dir,
            stage: Stage::Init,
            group_open: false,
        }
    }

    pub async fn execute(mut self) -> RunOutcome {
        let config = self.config;
        let pr = config.pr_context.as_ref();
        // The PR surfaces are only usable with both a token and a pull request
        let github = self.github.filter(|_| pr.is_some());
        let finisher = Finisher::start(github, pr).await;

        match self.deploy().await {
            Ok(deployed) => {
                self.enter(Stage::ReportingSuccess);
                let report = self.report_success(deployed, github, pr).await;
                finisher.finish(&report).await;
                self.enter(Stage::Done);
                RunOutcome::Succeeded(report)
            }
            Err(err) => {
                let failed_in = self.stage;
                self.close_group();
                self.enter(Stage::ReportingFailure);

                let message = err.message();
                error!(stage = ?failed_in, "{}", err);
                self.workflow.set_failed(&message);
                finisher.finish(&failure_report(&message)).await;

                self.enter(Stage::Done);
                RunOutcome::Failed {
                    stage: failed_in,
                    message,
                }
            }
        }
    }

    async fn deploy(&mut self) -> hosting_deploy_core::Result<Deployed> {
        self.enter(Stage::VerifyingEnvironment);
        self.open_group("Verifying firebase.json exists");
        let project_dir = verify_entry_point(&self.config.entry_point)?;
        self.close_group();

        self.enter(Stage::Authenticating);
        self.open_group("Setting up CLI credentials");
        let auth = resolve_auth(
            self.config.firebase_service_account.as_deref(),
            self.config.firebase_token.as_deref(),
            &self.scratch_dir,
        )?;
        self.close_group();

        self.enter(Stage::Deploying);
        if self.config.is_production() {
            self.open_group("Deploying to production site");
            let production = ProductionConfig {
                auth,
                project_id: self.config.project_id.clone(),
                targets: self.config.targets.clone(),
                project_dir,
            };
            let sites = self
                .deployer
                .deploy_production(&production)
                .await?
                .into_result()?;
            self.close_group();
            if let Some(hosting) = sites.hosting {
                info!("Deployed hosting: {:?}", hosting);
            }
            return Ok(Deployed::Production);
        }

        let channel_id = resolve_channel_id(
            self.config.channel_id.as_deref(),
            self.config.pr_context.as_ref(),
        )?;

        self.open_group(&format!("Deploying to Firebase preview channel {}", channel_id));
        let preview = DeployConfig {
            auth,
            project_id: self.config.project_id.clone(),
            expires: self.config.expires.clone(),
            channel_id,
            targets: self.config.targets.clone(),
            project_dir,
        };
        let result = self.deployer.deploy_preview(&preview).await?;
        self.close_group();

        let sites: Vec<SiteDeploy> = result.into_result()?.into_values().collect();
        let (Some(primary), Some(report)) = (
            sites.first(),
            preview_report(&sites, &self.config.comment_url_path),
        ) else {
            return Err(Error::Deployment(
                "the deploy reported success but no hosting sites were deployed".to_string(),
            ));
        };
        Ok(Deployed::Preview {
            urls: sites.iter().map(|s| s.url.clone()).collect(),
            expire_time: primary.expire_time.clone(),
            report,
        })
    }

    async fn report_success(
        &self,
        deployed: Deployed,
        github: Option<&dyn PullRequestApi>,
        pr: Option<&PrContext>,
    ) -> CheckReport {
        let (urls, expire_time, report) = match deployed {
            Deployed::Production => {
                let project_id = self.config.project_id.as_deref().unwrap_or_default();
                self.workflow.set_output("details_url", &production_url(project_id));
                return production_report(project_id);
            }
            Deployed::Preview {
                urls,
                expire_time,
                report,
            } => (urls, expire_time, report),
        };

        match serde_json::to_string(&urls) {
            Ok(json) => self.workflow.set_output("urls", &json),
            Err(e) => warn!("Could not encode urls output: {}", e),
        }
        self.workflow.set_output("expire_time", &expire_time);
        if let Some(details_url) = report.details_url.as_deref() {
            self.workflow.set_output("details_url", details_url);
        }

        if let (Some(api), Some(pr)) = (github, pr) {
            let body = preview_comment(pr.short_sha(), &report.summary, &expire_time);
            post_or_update_comment(api, pr.pr_number, &body).await;
        }

        report
    }

    fn enter(&mut self, stage: Stage) {
        info!(from = ?self.stage, to = ?stage, "run stage");
        self.stage = stage;
    }

    fn open_group(&mut self, title: &str) {
        self.workflow.start_group(title);
        self.group_open = true;
    }

    fn close_group(&mut self) {
        if self.group_open {
            self.workflow.end_group();
            self.group_open = false;
        }
    }
}

/// Read the webhook payload that triggered the workflow
fn load_event(path: &Path) -> Result<serde_json::Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    serde_json::from_str(&contents).context("Failed to parse event payload")
}

/// Deploy with the real tool and report to GitHub
pub async fn run(
    raw: RawInputs,
    event_path: Option<PathBuf>,
    output_file: Option<PathBuf>,
) -> Result<RunOutcome> {
    let event = event_path.as_deref().and_then(|path| match load_event(path) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("{:#}", e);
            None
        }
    });

    let config = ActionConfig::from_raw(raw, event.as_ref());
    if config.pr_context.is_none() {
        info!("No pull request context; skipping check run and comment");
    }

    let github = match (&config.token, &config.repository) {
        (Some(token), Some(repository)) => {
            match GitHubClient::new(token, &config.api_url, repository.clone()) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("GitHub reporting disabled: {:#}", e);
                    None
                }
            }
        }
        _ => None,
    };

    let deployer = FirebaseCli::new();
    let workflow = GitHubActions::new(output_file);

    let outcome = Run::new(
        &config,
        &deployer,
        github.as_ref().map(|c| c as &dyn PullRequestApi),
        &workflow,
        std::env::temp_dir(),
    )
    .execute()
    .await;

    Ok(outcome)
}
