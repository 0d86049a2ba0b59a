use hosting_deploy_core::{DeployAuth, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Turn the two mutually exclusive credential inputs into the one credential
/// the deploy tool will see.
///
/// Service-account material is written to a file under `scratch_dir` that is
/// left in place after the call; the tool reads it later.
pub fn resolve_auth(
    service_account: Option<&str>,
    token: Option<&str>,
    scratch_dir: &Path,
) -> Result<DeployAuth> {
    let service_account = service_account.filter(|s| !s.trim().is_empty());
    let token = token.filter(|t| !t.trim().is_empty());

    match (service_account, token) {
        (Some(_), Some(_)) => Err(Error::Configuration(
            "can only specify either 'firebaseServiceAccount' or 'firebaseToken', not both!"
                .to_string(),
        )),
        (Some(material), None) => {
            let path = write_credentials_file(material, scratch_dir)?;
            info!("Created a temporary file with Application Default Credentials.");
            Ok(DeployAuth::CredentialsFile(path))
        }
        (None, Some(token)) => {
            info!("authenticating with token.");
            Ok(DeployAuth::Token(token.to_string()))
        }
        (None, None) => Err(Error::Configuration(
            "must specify either 'firebaseServiceAccount' or 'firebaseToken'".to_string(),
        )),
    }
}

fn write_credentials_file(material: &str, scratch_dir: &Path) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix("gac-")
        .suffix(".json")
        .tempfile_in(scratch_dir)?;
    file.write_all(material.as_bytes())?;
    file.flush()?;

    let path = file
        .into_temp_path()
        .keep()
        .map_err(|e| Error::IoError(e.error))?;
    Ok(path)
}
