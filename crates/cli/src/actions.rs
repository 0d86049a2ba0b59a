// GitHub Actions workflow commands

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

/// The CI surface a run writes to: log groups, step outputs and the step's
/// failure marker.
pub trait Workflow: Send + Sync {
    fn start_group(&self, title: &str);
    fn end_group(&self);
    fn set_output(&self, name: &str, value: &str);
    fn set_failed(&self, message: &str);
}

/// Writes workflow commands to stdout and outputs to `$GITHUB_OUTPUT`
pub struct GitHubActions {
    output_file: Option<PathBuf>,
}

impl GitHubActions {
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    fn append_output(&self, path: &Path, name: &str, value: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(output_file_entry(name, value).as_bytes())
    }
}

impl Workflow for GitHubActions {
    fn start_group(&self, title: &str) {
        println!("::group::{}", escape_data(title));
    }

    fn end_group(&self) {
        println!("::endgroup::");
    }

    fn set_output(&self, name: &str, value: &str) {
        match &self.output_file {
            Some(path) => {
                if let Err(e) = self.append_output(path, name, value) {
                    warn!("Failed to write output '{}' to {}: {}", name, path.display(), e);
                }
            }
            None => println!("::set-output name={}::{}", name, escape_data(value)),
        }
    }

    fn set_failed(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}

/// Escape a workflow command's data section
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// One `$GITHUB_OUTPUT` entry. Multi-line values use a heredoc with a
/// delimiter that does not occur in the value.
pub fn output_file_entry(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{}={}\n", name, value);
    }

    let mut delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    while value.contains(&delimiter) {
        delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    }
    format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
}
