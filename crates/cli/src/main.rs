mod actions;
mod commands;
mod github;
mod report;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use hosting_deploy_core::RawInputs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hosting-deploy")]
#[command(
    version,
    about = "Deploy Firebase Hosting previews and report them on the pull request",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    deploy: DeployArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy to a preview channel or the live site (default)
    Deploy,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Action inputs. Each flag falls back to the variable the runner sets for it.
#[derive(Args, Debug)]
struct DeployArgs {
    /// Service account JSON used to authenticate the Firebase CLI
    #[arg(long, env = "INPUT_FIREBASESERVICEACCOUNT", hide_env_values = true)]
    firebase_service_account: Option<String>,

    /// Firebase CLI token (legacy alternative to a service account)
    #[arg(long, env = "INPUT_FIREBASETOKEN", hide_env_values = true)]
    firebase_token: Option<String>,

    /// How long the preview channel lives, e.g. 7d
    #[arg(long, env = "INPUT_EXPIRES")]
    expires: Option<String>,

    /// Path appended to every preview link in the comment
    #[arg(long, env = "INPUT_COMMENTURLPATH")]
    comment_url_path: Option<String>,

    /// Firebase project to deploy to
    #[arg(long, env = "INPUT_PROJECTID")]
    project_id: Option<String>,

    /// Preview channel id; `live` deploys to production
    #[arg(long, env = "INPUT_CHANNELID")]
    channel_id: Option<String>,

    /// Comma separated hosting targets
    #[arg(long, env = "INPUT_TARGETS")]
    targets: Option<String>,

    /// Token for the check run and the PR comment
    #[arg(long, env = "INPUT_REPOTOKEN", hide_env_values = true)]
    repo_token: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
    github_token: Option<String>,

    /// Directory containing firebase.json
    #[arg(long, env = "INPUT_ENTRYPOINT", default_value = ".")]
    entry_point: String,

    #[arg(long, env = "INPUT_PRNUMBER")]
    pr_number: Option<String>,

    #[arg(long, env = "INPUT_COMMITSHA")]
    commit_sha: Option<String>,

    #[arg(long, env = "INPUT_PRBRANCHNAME")]
    pr_branch_name: Option<String>,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Webhook payload of the triggering event
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// File that receives step outputs
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,
}

impl DeployArgs {
    fn into_parts(self) -> (RawInputs, Option<PathBuf>, Option<PathBuf>) {
        let raw = RawInputs {
            firebase_service_account: self.firebase_service_account,
            firebase_token: self.firebase_token,
            expires: self.expires,
            comment_url_path: self.comment_url_path,
            project_id: self.project_id,
            channel_id: self.channel_id,
            targets: self.targets,
            repo_token: self.repo_token,
            github_token: self.github_token,
            entry_point: Some(self.entry_point),
            pr_number: self.pr_number,
            commit_sha: self.commit_sha,
            pr_branch_name: self.pr_branch_name,
            repository: self.repository,
            api_url: self.api_url,
        };
        (raw, self.event_path, self.output_file)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Stdout carries workflow commands, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hosting_deploy=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Deploy) {
        Command::Deploy => {
            let (raw, event_path, output_file) = cli.deploy.into_parts();
            let outcome = commands::deploy::run(raw, event_path, output_file).await?;
            if !outcome.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hosting-deploy", &mut io::stdout());
            Ok(())
        }
    }
}
