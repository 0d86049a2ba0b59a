use crate::github::PullRequestApi;
use hosting_deploy_core::{CheckReport, PrContext};
use hosting_deploy_generator::is_preview_comment;
use tracing::{info, warn};

/// Delivers the run's final report exactly once.
///
/// With a token and a pull request the report completes a check run that was
/// opened at the start of the run; otherwise it is written to the log.
pub enum Finisher<'a> {
    Log,
    Check {
        api: &'a dyn PullRequestApi,
        check_run_id: u64,
    },
}

impl<'a> Finisher<'a> {
    /// Open an in-progress check for the PR head commit when possible.
    /// Failing to create the check degrades to logging.
    pub async fn start(api: Option<&'a dyn PullRequestApi>, pr: Option<&PrContext>) -> Finisher<'a> {
        let (Some(api), Some(pr)) = (api, pr) else {
            return Finisher::Log;
        };

        match api.create_check_run(&pr.commit_sha).await {
            Ok(check_run_id) => Finisher::Check { api, check_run_id },
            Err(e) => {
                warn!("Could not create a check run, reporting to the log instead: {:#}", e);
                Finisher::Log
            }
        }
    }

    /// Never fails: reporting trouble is logged and the report falls back to
    /// the log so the conclusion is always visible.
    pub async fn finish(&self, report: &CheckReport) {
        match self {
            Finisher::Log => log_report(report),
            Finisher::Check { api, check_run_id } => {
                if let Err(e) = api.complete_check_run(*check_run_id, report).await {
                    warn!("Could not complete check run {}: {:#}", check_run_id, e);
                    log_report(report);
                }
            }
        }
    }
}

fn log_report(report: &CheckReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => info!("{}", json),
        Err(_) => info!("{:?}", report),
    }
}

/// Keep a single preview comment per pull request: update our latest one if
/// it exists, otherwise create it. Failures are logged and swallowed.
pub async fn post_or_update_comment(api: &dyn PullRequestApi, pr_number: u64, body: &str) {
    info!("Commenting on PR #{}", pr_number);

    let existing = match api.list_issue_comments(pr_number).await {
        Ok(comments) => comments
            .into_iter()
            .rev()
            .find(|c| c.is_from_bot() && c.body.as_deref().is_some_and(is_preview_comment))
            .map(|c| c.id),
        Err(e) => {
            warn!("Error checking for previous comments: {:#}", e);
            None
        }
    };

    if let Some(comment_id) = existing {
        match api.update_issue_comment(comment_id, body).await {
            Ok(()) => return,
            Err(e) => warn!("Error updating comment {}: {:#}", comment_id, e),
        }
    }

    if let Err(e) = api.create_issue_comment(pr_number, body).await {
        warn!("Error creating comment: {:#}", e);
    }
}
