use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use hosting_deploy_core::{CheckReport, Conclusion, Repository};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

/// Name of the check run shown on the pull request
pub const CHECK_NAME: &str = "Deploy Preview";

const COMMENTS_PER_PAGE: usize = 100;

/// The pull request surfaces a run reports into: one check run and one
/// issue comment.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// Start an in-progress check on `head_sha`, returning its id
    async fn create_check_run(&self, head_sha: &str) -> Result<u64>;

    async fn complete_check_run(&self, check_run_id: u64, report: &CheckReport) -> Result<()>;

    /// All comments on a pull request, oldest first
    async fn list_issue_comments(&self, issue_number: u64) -> Result<Vec<IssueComment>>;

    async fn create_issue_comment(&self, issue_number: u64, body: &str) -> Result<()>;

    async fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub user: Option<CommentUser>,
}

impl IssueComment {
    pub fn is_from_bot(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.kind == "Bot")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommentUser {
    pub login: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct CheckRun {
    id: u64,
}

#[derive(Serialize)]
struct CreateCheckRun<'a> {
    name: &'a str,
    head_sha: &'a str,
    status: &'a str,
}

#[derive(Serialize)]
struct CompleteCheckRun<'a> {
    status: &'a str,
    completed_at: String,
    conclusion: Conclusion,
    #[serde(skip_serializing_if = "Option::is_none")]
    details_url: Option<&'a str>,
    output: CheckOutput<'a>,
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    title: &'a str,
    summary: &'a str,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// GitHub REST API client scoped to one repository
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    repository: Repository,
}

impl GitHubClient {
    pub fn new(token: &str, api_url: &str, repository: Repository) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GitHub token contains invalid header characters")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("hosting-deploy/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.repository.owner, self.repository.name, path
        )
    }
}

/// Turn a non-2xx response into an error carrying GitHub's message
async fn check_status(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("GitHub API error while {}: {} {}", action, status, body.trim());
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    async fn create_check_run(&self, head_sha: &str) -> Result<u64> {
        let response = self
            .client
            .post(self.repo_url("check-runs"))
            .json(&CreateCheckRun {
                name: CHECK_NAME,
                head_sha,
                status: "in_progress",
            })
            .send()
            .await?;

        let check: CheckRun = check_status(response, "creating the check run")
            .await?
            .json()
            .await
            .context("Failed to parse check run response")?;
        Ok(check.id)
    }

    async fn complete_check_run(&self, check_run_id: u64, report: &CheckReport) -> Result<()> {
        let response = self
            .client
            .patch(self.repo_url(&format!("check-runs/{}", check_run_id)))
            .json(&CompleteCheckRun {
                status: "completed",
                completed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                conclusion: report.conclusion,
                details_url: report.details_url.as_deref(),
                output: CheckOutput {
                    title: &report.title,
                    summary: &report.summary,
                },
            })
            .send()
            .await?;

        check_status(response, "completing the check run").await?;
        Ok(())
    }

    async fn list_issue_comments(&self, issue_number: u64) -> Result<Vec<IssueComment>> {
        let url = self.repo_url(&format!("issues/{}/comments", issue_number));
        let mut comments = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .client
                .get(&url)
                .query(&[("per_page", COMMENTS_PER_PAGE), ("page", page)])
                .send()
                .await?;

            let batch: Vec<IssueComment> = check_status(response, "listing comments")
                .await?
                .json()
                .await
                .context("Failed to parse comment list")?;

            let done = batch.len() < COMMENTS_PER_PAGE;
            comments.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        Ok(comments)
    }

    async fn create_issue_comment(&self, issue_number: u64, body: &str) -> Result<()> {
        let response = self
            .client
            .post(self.repo_url(&format!("issues/{}/comments", issue_number)))
            .json(&CommentBody { body })
            .send()
            .await?;

        check_status(response, "creating a comment").await?;
        Ok(())
    }

    async fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let response = self
            .client
            .patch(self.repo_url(&format!("issues/comments/{}", comment_id)))
            .json(&CommentBody { body })
            .send()
            .await?;

        check_status(response, "updating a comment").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn repository() -> Repository {
        Repository {
            owner: "octo".to_string(),
            name: "site".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_check_run() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/octo/site/check-runs")
            .match_header("authorization", "Bearer t0ken")
            .match_body(Matcher::Json(json!({
                "name": "Deploy Preview",
                "head_sha": "abc1234",
                "status": "in_progress"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 99, "status": "in_progress"}"#)
            .create_async()
            .await;

        let client = GitHubClient::new("t0ken", &server.url(), repository()).unwrap();
        assert_eq!(client.create_check_run("abc1234").await.unwrap(), 99);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_check_run_sends_report() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/repos/octo/site/check-runs/99")
            .match_body(Matcher::PartialJson(json!({
                "status": "completed",
                "conclusion": "failure",
                "output": {
                    "title": "Deploy preview failed",
                    "summary": "Error: boom"
                }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = GitHubClient::new("t0ken", &server.url(), repository()).unwrap();
        let report = CheckReport::failure("Deploy preview failed", "Error: boom");
        client.complete_check_run(99, &report).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_issue_comments() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/octo/site/issues/42/comments")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    { "id": 1, "body": "LGTM", "user": { "login": "octocat", "type": "User" } },
                    { "id": 2, "body": "preview", "user": { "login": "github-actions[bot]", "type": "Bot" } }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let client = GitHubClient::new("t0ken", &server.url(), repository()).unwrap();
        let comments = client.list_issue_comments(42).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert!(!comments[0].is_from_bot());
        assert!(comments[1].is_from_bot());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/repos/octo/site/issues/42/comments")
            .with_status(403)
            .with_body(r#"{"message":"Resource not accessible by integration"}"#)
            .create_async()
            .await;

        let client = GitHubClient::new("t0ken", &server.url(), repository()).unwrap();
        let err = client.create_issue_comment(42, "hi").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("403"), "{}", message);
        assert!(message.contains("Resource not accessible"), "{}", message);
    }
}
