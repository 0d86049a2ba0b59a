use chrono::{DateTime, Utc};
use hosting_deploy_core::{CheckReport, SiteDeploy};

pub const PREVIEW_SUCCESS_TITLE: &str = "Deploy preview succeeded";
pub const PREVIEW_FAILURE_TITLE: &str = "Deploy preview failed";
pub const PRODUCTION_SUCCESS_TITLE: &str = "Production deploy succeeded";

/// Footer every preview comment carries; used to find our earlier comment
const EXPIRES_FOOTER: &str = "<sub>(expires";

/// Live URL of a project's default hosting site
pub fn production_url(project_id: &str) -> String {
    format!("https://{}.web.app/", project_id)
}

pub fn production_report(project_id: &str) -> CheckReport {
    let url = production_url(project_id);
    CheckReport::success(
        PRODUCTION_SUCCESS_TITLE,
        format!("[{}.web.app]({})", project_id, url),
        url,
    )
}

/// One link for a single site, a bulleted list otherwise. Each link targets
/// the deployed URL with `url_path` appended.
pub fn url_list_markdown(urls: &[String], url_path: &str) -> String {
    let links: Vec<String> = urls
        .iter()
        .map(|url| format!("[{}]({}{})", url, url, url_path))
        .collect();

    match links.as_slice() {
        [single] => single.clone(),
        _ => links
            .iter()
            .map(|link| format!("- {}", link))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn preview_report(sites: &[SiteDeploy], url_path: &str) -> Option<CheckReport> {
    let urls: Vec<String> = sites.iter().map(|s| s.url.clone()).collect();
    let details_url = urls.first()?.clone();
    Some(CheckReport::success(
        PREVIEW_SUCCESS_TITLE,
        url_list_markdown(&urls, url_path),
        details_url,
    ))
}

pub fn failure_report(message: &str) -> CheckReport {
    CheckReport::failure(PREVIEW_FAILURE_TITLE, format!("Error: {}", message))
}

/// Body of the pull request comment for a preview deploy
pub fn preview_comment(commit_id: &str, urls_markdown: &str, expire_time: &str) -> String {
    format!(
        "Visit the preview URL for this PR (updated for commit {}):\n\n{}\n\n{} {})</sub>",
        commit_id,
        urls_markdown,
        EXPIRES_FOOTER,
        format_expiration(expire_time)
    )
}

/// Whether a comment body was written by [`preview_comment`]
pub fn is_preview_comment(body: &str) -> bool {
    body.contains(EXPIRES_FOOTER)
}

/// RFC 1123 rendering in UTC, e.g. `Tue, 14 Jul 2020 18:51:36 GMT`.
/// Unparseable timestamps are shown as given.
pub fn format_expiration(expire_time: &str) -> String {
    match DateTime::parse_from_rfc3339(expire_time) {
        Ok(time) => time
            .with_timezone(&Utc)
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string(),
        Err(_) => expire_time.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hosting_deploy_core::Conclusion;

    fn site(name: &str, url: &str) -> SiteDeploy {
        SiteDeploy {
            site: name.to_string(),
            target: None,
            url: url.to_string(),
            expire_time: "2020-07-14T18:51:36.123Z".to_string(),
        }
    }

    #[test]
    fn test_single_url_is_bare_link() {
        let urls = vec!["https://demo--pr42-abc.web.app".to_string()];
        assert_eq!(
            url_list_markdown(&urls, "/docs"),
            "[https://demo--pr42-abc.web.app](https://demo--pr42-abc.web.app/docs)"
        );
    }

    #[test]
    fn test_many_urls_are_bulleted() {
        let urls = vec![
            "https://a--pr1.web.app".to_string(),
            "https://b--pr1.web.app".to_string(),
            "https://c--pr1.web.app".to_string(),
        ];
        let markdown = url_list_markdown(&urls, "?ref=pr");
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "- [https://a--pr1.web.app](https://a--pr1.web.app?ref=pr)");
        assert!(lines.iter().all(|l| l.starts_with("- [")));
    }

    #[test]
    fn test_production_report() {
        let report = production_report("demo");
        assert_eq!(report.conclusion, Conclusion::Success);
        assert_eq!(report.details_url.as_deref(), Some("https://demo.web.app/"));
        assert_eq!(report.summary, "[demo.web.app](https://demo.web.app/)");
        assert_eq!(report.title, PRODUCTION_SUCCESS_TITLE);
    }

    #[test]
    fn test_preview_report_uses_first_url_for_details() {
        let sites = vec![site("a", "https://a--pr1.web.app"), site("b", "https://b--pr1.web.app")];
        let report = preview_report(&sites, "").unwrap();
        assert_eq!(report.details_url.as_deref(), Some("https://a--pr1.web.app"));
        assert_eq!(report.summary.lines().count(), 2);

        assert!(preview_report(&[], "").is_none());
    }

    #[test]
    fn test_failure_report() {
        let report = failure_report("firebase.json file not found");
        assert_eq!(report.conclusion, Conclusion::Failure);
        assert_eq!(report.title, "Deploy preview failed");
        assert_eq!(report.summary, "Error: firebase.json file not found");
        assert_eq!(report.details_url, None);
    }

    #[test]
    fn test_format_expiration() {
        assert_eq!(
            format_expiration("2020-07-14T18:51:36.123Z"),
            "Tue, 14 Jul 2020 18:51:36 GMT"
        );
        assert_eq!(
            format_expiration("2020-07-14T20:51:36+02:00"),
            "Tue, 14 Jul 2020 18:51:36 GMT"
        );
        assert_eq!(format_expiration("soon"), "soon");
    }

    #[test]
    fn test_preview_comment() {
        let body = preview_comment(
            "abc1234",
            "[https://x.web.app](https://x.web.app)",
            "2020-07-14T18:51:36Z",
        );
        assert_eq!(
            body,
            "Visit the preview URL for this PR (updated for commit abc1234):\n\n\
             [https://x.web.app](https://x.web.app)\n\n\
             <sub>(expires Tue, 14 Jul 2020 18:51:36 GMT)</sub>"
        );
        assert!(is_preview_comment(&body));
        assert!(!is_preview_comment("LGTM"));
    }
}
