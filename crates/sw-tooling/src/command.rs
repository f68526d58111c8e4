//! Running external programs
//!
//! Every program is run to completion with piped output. A time limit only
//! applies when one is configured. A non-zero exit becomes [`ToolingError::CommandFailed`] carrying stderr.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ToolingError, ToolingResult};

/// Locations of the external programs and an optional limit per call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub berks: PathBuf,
    pub knife: PathBuf,
    /// Seconds a call may take; unlimited when unset
    #[serde(with = "seconds")]
    pub timeout: Option<Duration>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            berks: PathBuf::from("berks"),
            knife: PathBuf::from("knife"),
            timeout: None,
        }
    }
}

impl ToolPaths {
    #[must_use]
    pub fn with_berks(mut self, path: impl Into<PathBuf>) -> Self {
        self.berks = path.into();
        self
    }

    #[must_use]
    pub fn with_knife(mut self, path: impl Into<PathBuf>) -> Self {
        self.knife = path.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(limit) => serializer.serialize_some(&limit.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

/// Captured output of a successful run
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Run `program args..` in `cwd`
///
/// # Errors
/// - `ToolingError::Spawn` if the program cannot be started
/// - `ToolingError::Timeout` if it runs past `limit`, when given; the child
///   is killed
/// - `ToolingError::CommandFailed` on a non-zero exit
pub async fn run<I, S>(program: &Path, args: I, cwd: Option<&Path>, limit: Option<Duration>) -> ToolingResult<CommandOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }

    debug!(program = %name, "spawning");
    let start = Instant::now();
    let child = cmd.spawn().map_err(|source| ToolingError::Spawn {
        program: name.clone(),
        source,
    })?;

    let waited = match limit {
        Some(limit) => timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| ToolingError::Timeout {
                program: name.clone(),
                limit,
            })?,
        None => child.wait_with_output().await,
    };
    let output = waited.map_err(|source| ToolingError::Spawn {
        program: name.clone(),
        source,
    })?;

    let duration = start.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        return Err(ToolingError::CommandFailed {
            program: name,
            status: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    debug!(program = %name, duration_secs = duration.as_secs_f32(), "finished");
    Ok(CommandOutput {
        stdout,
        stderr,
        duration,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const LIMIT: Option<Duration> = Some(Duration::from_secs(10));

    #[tokio::test]
    async fn captures_stdout() {
        let output = run(Path::new("sh"), ["-c", "echo hello"], None, LIMIT).await.unwrap();
        assert_eq!(output.stdout, "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let err = run(Path::new("sh"), ["-c", "echo broken >&2; exit 3"], None, LIMIT)
            .await
            .unwrap_err();

        match err {
            ToolingError::CommandFailed { program, status, stderr } => {
                assert_eq!(program, "sh");
                assert_eq!(status, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();

        let output = run(Path::new("sh"), ["-c", "ls"], Some(dir.path()), LIMIT).await.unwrap();
        assert_eq!(output.stdout, "marker");
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let err = run(Path::new("/nonexistent/berks"), ["vendor"], None, LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolingError::Spawn { .. }));
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let err = run(Path::new("sh"), ["-c", "sleep 5"], None, Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolingError::Timeout { .. }));
    }

    #[test]
    fn tool_paths_deserialize_partial() {
        let paths: ToolPaths = serde_json::from_str(r#"{"berks": "/opt/chefdk/bin/berks", "timeout": 30}"#).unwrap();
        assert_eq!(paths.berks, PathBuf::from("/opt/chefdk/bin/berks"));
        assert_eq!(paths.knife, PathBuf::from("knife"));
        assert_eq!(paths.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn no_time_limit_by_default() {
        assert_eq!(ToolPaths::default().timeout, None);
        let paths: ToolPaths = serde_json::from_str(r#"{"knife": "/usr/bin/knife"}"#).unwrap();
        assert_eq!(paths.timeout, None);
    }

    #[tokio::test]
    async fn unlimited_run_waits_for_exit() {
        let output = run(Path::new("sh"), ["-c", "sleep 1; echo done"], None, None).await.unwrap();
        assert_eq!(output.stdout, "done");
    }
}
