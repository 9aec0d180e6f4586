use std::{io::ErrorKind, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use super::{ExtractorError, MediaExtractor, RawMediaInfo};

/// Runs the `yt-dlp` executable and reads its `-J` JSON dump.
pub struct YtDlpExtractor {
    program: PathBuf,
    leading_args: Vec<String>,
}

impl YtDlpExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    fn args(&self, url: &Url) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend([
            "-J".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            url.to_string(),
        ]);
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract(&self, url: &Url) -> Result<RawMediaInfo, ExtractorError> {
        // kill_on_drop: a caller timing out drops this future, which must not
        // leave the child running.
        let output = Command::new(&self.program)
            .args(self.args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|error| {
                if error.kind() == ErrorKind::NotFound {
                    ExtractorError::NotInstalled(self.program.clone())
                } else {
                    ExtractorError::Spawn(error)
                }
            })?;

        if !output.status.success() {
            return Err(ExtractorError::Failed(failure_message(
                &output.stderr,
                output.status,
            )));
        }

        debug!("yt-dlp returned {} bytes for {url}", output.stdout.len());
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

fn failure_message(stderr: &[u8], status: std::process::ExitStatus) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .map(ToString::to_string)
        .unwrap_or_else(|| format!("yt-dlp exited with {status}"))
}
