//! Clone, checkout and build pipeline
//!
//! A build is a single `sh -c` process running every step chained with
//! `&&`, so the first failing step ends the pipeline and its exit code
//! becomes the build's exit code. Repository values reach the shell as
//! positional parameters and are never spliced into the script.

use crate::build::repository::Repository;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Subdirectory of a build directory holding the clone
pub const CLONE_DIR: &str = "repo";

/// File in a build directory holding the combined process output
pub const LOG_FILE: &str = "build.log";

/// How builds are executed
#[derive(Debug, Clone)]
pub struct Pipeline {
    build_command: String,
    timeout: Option<Duration>,
}

impl Pipeline {
    /// Pipeline running `build_command` inside the clone
    pub fn new(build_command: impl Into<String>) -> Self {
        Self {
            build_command: build_command.into(),
            timeout: None,
        }
    }

    /// Kill builds that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build_command(&self) -> &str {
        &self.build_command
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Shell script and its positional parameters for `repository`.
    ///
    /// The tag is checked out before the branch, so when both are given
    /// the branch decides the final working tree.
    pub fn script(&self, repository: &Repository) -> (String, Vec<String>) {
        let mut params = vec![repository.url.clone()];
        let mut script = format!("git clone -- \"$1\" {} && cd {}", CLONE_DIR, CLONE_DIR);

        for reference in [repository.tag(), repository.branch()].into_iter().flatten() {
            params.push(reference.to_string());
            script.push_str(&format!(" && git checkout \"${}\"", params.len()));
        }

        script.push_str(" && ");
        script.push_str(&self.build_command);
        (script, params)
    }

    /// Command that runs the pipeline for `repository` inside `workdir`.
    ///
    /// The process gets its own process group so cancellation can take
    /// down `git`/`make` children along with the shell.
    pub(crate) fn command(&self, repository: &Repository, workdir: &Path) -> Command {
        let (script, params) = self.script(repository);

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(script)
            .arg("buildy")
            .args(params)
            .current_dir(workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());

        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        cmd
    }
}

/// Read the log of the build living in `build_dir`. Invalid UTF-8 is replaced.
pub async fn read_log(build_dir: &Path) -> io::Result<String> {
    let bytes = tokio::fs::read(build_dir.join(LOG_FILE)).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new("make")
    }
}
