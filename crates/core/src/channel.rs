use crate::config::LIVE_CHANNEL;
use crate::error::{Error, Result};
use crate::types::PrContext;
use tracing::info;

/// Branch names are cut to this many characters in derived channel ids
const MAX_BRANCH_CHARS: usize = 20;

/// Resolve the preview channel for this run.
///
/// An explicit channel wins and is used as given. Without one, the id is
/// derived from the pull request as `pr<number>-<branch>`, with the branch
/// truncated and every character outside `[A-Za-z0-9_.-]` replaced by `_`,
/// so the result is always usable as a channel name and subdomain label.
pub fn resolve_channel_id(configured: Option<&str>, pr: Option<&PrContext>) -> Result<String> {
    if let Some(channel) = configured.filter(|c| !c.is_empty() && *c != LIVE_CHANNEL) {
        return Ok(channel.to_string());
    }

    let pr = pr.ok_or_else(|| {
        Error::Configuration(
            "no channelId was configured and this run is not attached to a pull request, \
             so there is no preview channel to deploy to"
                .to_string(),
        )
    })?;

    let branch: String = pr.branch_name.chars().take(MAX_BRANCH_CHARS).collect();
    let raw = format!("pr{}-{}", pr.pr_number, branch);
    let channel = sanitize_channel_id(&raw);

    if channel != raw {
        info!(
            "ChannelId \"{}\" contains unsupported characters. Using \"{}\" instead.",
            raw, channel
        );
    }

    Ok(channel)
}

fn sanitize_channel_id(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(number: u64, branch: &str) -> PrContext {
        PrContext {
            pr_number: number,
            commit_sha: "abc1234def".to_string(),
            branch_name: branch.to_string(),
        }
    }

    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
    }

    #[test]
    fn test_configured_channel_used_verbatim() {
        let id = resolve_channel_id(Some("staging"), Some(&pr(1, "main"))).unwrap();
        assert_eq!(id, "staging");

        let id = resolve_channel_id(Some("qa/branch"), None).unwrap();
        assert_eq!(id, "qa/branch");
    }

    #[test]
    fn test_live_is_not_a_preview_override() {
        let id = resolve_channel_id(Some("live"), Some(&pr(9, "docs"))).unwrap();
        assert_eq!(id, "pr9-docs");
    }

    #[test]
    fn test_derived_from_pr() {
        let id = resolve_channel_id(None, Some(&pr(42, "feature-x"))).unwrap();
        assert_eq!(id, "pr42-feature-x");
    }

    #[test]
    fn test_derived_is_deterministic() {
        let context = pr(42, "feature/Añadir cosas");
        let first = resolve_channel_id(None, Some(&context)).unwrap();
        let second = resolve_channel_id(None, Some(&context)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_disallowed_characters_replaced() {
        let id = resolve_channel_id(None, Some(&pr(7, "dependabot/npm/ñ@1"))).unwrap();
        assert_eq!(id, "pr7-dependabot_npm___1");
        assert!(id.chars().all(is_allowed));
    }

    #[test]
    fn test_branch_truncated_to_twenty_chars() {
        let id = resolve_channel_id(
            None,
            Some(&pr(123, "a-very-long-branch-name-for-a-feature")),
        )
        .unwrap();
        assert_eq!(id, "pr123-a-very-long-branch-n");
    }

    #[test]
    fn test_length_bounded() {
        let id = resolve_channel_id(None, Some(&pr(u64::MAX, &"ü".repeat(200)))).unwrap();
        assert!(id.len() <= 63, "{} is too long", id);
        assert!(id.chars().all(is_allowed));
    }

    #[test]
    fn test_missing_pr_context_is_configuration_error() {
        let err = resolve_channel_id(None, None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = resolve_channel_id(Some(""), None).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
