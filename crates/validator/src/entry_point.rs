use hosting_deploy_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Project file the deploy tool reads its hosting configuration from
pub const FIREBASE_JSON: &str = "firebase.json";

/// Resolve the directory the deploy tool will run in and make sure it holds
/// a `firebase.json`.
///
/// The directory is handed to the child process as its working directory,
/// so the process-wide current directory is never touched.
pub fn verify_entry_point(entry_point: &Path) -> Result<PathBuf> {
    if entry_point != Path::new(".") {
        info!("Changing to directory: {}", entry_point.display());

        let metadata = fs::metadata(entry_point).map_err(|e| {
            Error::Configuration(format!(
                "Error changing to directory {}: {}",
                entry_point.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(Error::Configuration(format!(
                "Error changing to directory {}: not a directory",
                entry_point.display()
            )));
        }
    }

    if entry_point.join(FIREBASE_JSON).is_file() {
        info!("firebase.json file found. Continuing deploy.");
        Ok(entry_point.to_path_buf())
    } else {
        Err(Error::Configuration(
            "firebase.json file not found. If your firebase.json file is not in the root of \
             your repo, edit the entryPoint option of this GitHub action."
                .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entry_point_with_firebase_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FIREBASE_JSON), "{}").unwrap();

        let resolved = verify_entry_point(dir.path()).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn test_missing_firebase_json() {
        let dir = TempDir::new().unwrap();

        let err = verify_entry_point(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.message().starts_with("firebase.json file not found"));
    }

    #[test]
    fn test_missing_entry_point_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("web");

        let err = verify_entry_point(&missing).unwrap_err();
        assert!(
            err.message()
                .starts_with(&format!("Error changing to directory {}", missing.display()))
        );
    }

    #[test]
    fn test_entry_point_must_be_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join(FIREBASE_JSON);
        fs::write(&file, "{}").unwrap();

        let err = verify_entry_point(&file).unwrap_err();
        assert!(err.message().ends_with("not a directory"));
    }
}
