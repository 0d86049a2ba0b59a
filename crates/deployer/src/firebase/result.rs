use hosting_deploy_core::{ChannelDeployResult, Error, ProductionDeployResult, Result};
use serde::de::DeserializeOwned;

/// How much of a bad payload to quote back in the error
const PAYLOAD_EXCERPT_CHARS: usize = 200;

/// Parse the payload of a `hosting:channel:deploy --json` run
pub fn classify_channel(payload: &str) -> Result<ChannelDeployResult> {
    parse_payload(payload)
}

/// Parse the payload of a `deploy --json` run
pub fn classify_production(payload: &str) -> Result<ProductionDeployResult> {
    parse_payload(payload)
}

fn parse_payload<T: DeserializeOwned>(payload: &str) -> Result<T> {
    serde_json::from_str(payload).map_err(|e| {
        let excerpt: String = payload.chars().take(PAYLOAD_EXCERPT_CHARS).collect();
        Error::PayloadParse(format!(
            "{} (deploy output was: {:?})",
            e, excerpt
        ))
    })
}
