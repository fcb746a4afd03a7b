//! Build records and their lifecycle

use crate::build::pipeline::{self, Pipeline, LOG_FILE};
use crate::build::repository::Repository;
use crate::error::{BuildyError, BuildyResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Build identifier, also the name of the build's directory
pub type BuildId = Uuid;

/// Build status, derived from the pipeline process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Running,
    Success,
    Failure,
}

impl BuildStatus {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    fn from_exit(exit: ExitStatus) -> Self {
        if exit.success() {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
        };
        write!(f, "{}", name)
    }
}

/// Point-in-time view of a build, as served over HTTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub id: BuildId,
    pub status: BuildStatus,
    pub repository: Repository,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
enum Process {
    Running(Child),
    Finished(BuildStatus),
}

/// One execution of the pipeline for a repository.
///
/// A `Build` only exists once its directory has been created and its
/// process launched. Status is polled from the process on every call;
/// once terminal it never changes again.
#[derive(Debug)]
pub struct Build {
    id: BuildId,
    repository: Repository,
    directory: PathBuf,
    created_at: DateTime<Utc>,
    started: Instant,
    timeout: Option<Duration>,
    process: Mutex<Process>,
    /// Note recorded by a status poll, written to the log on the next flush
    pending_note: Mutex<Option<String>>,
}

impl Build {
    /// Create `<base>/<id>` and launch the pipeline with its output
    /// captured in `build.log`.
    ///
    /// Fails if the directory cannot be created or the process cannot be
    /// spawned. A failing clone or build is not an error here; it shows up
    /// as [`BuildStatus::Failure`].
    pub async fn start(
        base: &Path,
        repository: Repository,
        pipeline: &Pipeline,
    ) -> BuildyResult<Self> {
        let id = Uuid::new_v4();
        let directory = base.join(id.to_string());

        fs::create_dir(&directory).await.map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                BuildyError::BuildDirExists(directory.clone())
            } else {
                BuildyError::BuildDirCreate {
                    path: directory.clone(),
                    source: e,
                }
            }
        })?;

        let log_path = directory.join(LOG_FILE);
        let stdout = fs::File::create(&log_path)
            .await
            .map_err(|e| BuildyError::io(format!("creating {}", log_path.display()), e))?
            .into_std()
            .await;
        let stderr = stdout
            .try_clone()
            .map_err(|e| BuildyError::io("duplicating build log handle", e))?;

        let mut cmd = pipeline.command(&repository, &directory);
        cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));

        debug!("Spawning pipeline for build {}: {:?}", id, cmd);
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                append_note(&log_path, &format!("failed to start build: {}", e)).await;
                return Err(BuildyError::command_failed(
                    format!("sh -c <pipeline> for build {}", id),
                    e,
                ));
            }
        };

        info!("Started build {} ({})", id, repository);

        Ok(Self {
            id,
            repository,
            directory,
            created_at: Utc::now(),
            started: Instant::now(),
            timeout: pipeline.timeout(),
            process: Mutex::new(Process::Running(child)),
            pending_note: Mutex::new(None),
        })
    }

    pub fn id(&self) -> BuildId {
        self.id
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn log_path(&self) -> PathBuf {
        self.directory.join(LOG_FILE)
    }

    /// Current status. Never waits for the process.
    ///
    /// The first poll that sees the process gone records the outcome and
    /// releases the child handle. A build still running past its timeout
    /// is killed here and reported as a failure; the timeout note reaches
    /// the log on the next [`Build::flush_note`].
    pub fn status(&self) -> BuildStatus {
        let mut process = self.lock();
        let child = match &mut *process {
            Process::Finished(status) => return *status,
            Process::Running(child) => child,
        };

        let status = match child.try_wait() {
            Ok(Some(exit)) => {
                let status = BuildStatus::from_exit(exit);
                info!("Build {} finished: {} ({})", self.id, status, exit);
                status
            }
            Ok(None) => match self.timeout {
                Some(timeout) if self.started.elapsed() >= timeout => {
                    if let Err(e) = kill_tree(child) {
                        warn!("Failed to kill timed out build {}: {}", self.id, e);
                    }
                    self.set_note(format!("build timed out after {}s", timeout.as_secs()));
                    info!("Build {} timed out after {:?}", self.id, timeout);
                    BuildStatus::Failure
                }
                _ => return BuildStatus::Running,
            },
            Err(e) => {
                warn!("Failed to poll build {}: {}", self.id, e);
                BuildStatus::Failure
            }
        };

        *process = Process::Finished(status);
        status
    }

    /// Kill a running build. Returns false if it had already finished.
    pub async fn cancel(&self) -> bool {
        if !self.kill() {
            return false;
        }

        append_note(&self.log_path(), "build cancelled").await;
        info!("Cancelled build {}", self.id);
        true
    }

    fn kill(&self) -> bool {
        let mut process = self.lock();
        let Process::Running(child) = &mut *process else {
            return false;
        };

        if let Ok(Some(exit)) = child.try_wait() {
            *process = Process::Finished(BuildStatus::from_exit(exit));
            return false;
        }

        if let Err(e) = kill_tree(child) {
            warn!("Failed to kill build {}: {}", self.id, e);
        }
        *process = Process::Finished(BuildStatus::Failure);
        true
    }

    /// Write out a note left by a status poll, if any
    pub async fn flush_note(&self) {
        let note = self.note_lock().take();
        if let Some(note) = note {
            append_note(&self.log_path(), &note).await;
        }
    }

    /// Everything the pipeline has written so far
    pub async fn log(&self) -> BuildyResult<String> {
        self.flush_note().await;
        pipeline::read_log(&self.directory)
            .await
            .map_err(|e| BuildyError::io(format!("reading log of build {}", self.id), e))
    }

    pub fn summary(&self) -> BuildSummary {
        self.summary_with(self.status())
    }

    /// Summary reporting an already sampled `status`
    pub fn summary_with(&self, status: BuildStatus) -> BuildSummary {
        BuildSummary {
            id: self.id,
            status,
            repository: self.repository.clone(),
            created_at: self.created_at,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Process> {
        self.process.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn note_lock(&self) -> MutexGuard<'_, Option<String>> {
        self.pending_note.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_note(&self, note: String) {
        *self.note_lock() = Some(note);
    }
}

/// Kill the pipeline shell and everything it started.
fn kill_tree(child: &mut Child) -> io::Result<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        // The shell leads the process group created at spawn.
        if let Some(pid) = child.id() {
            return killpg(Pid::from_raw(pid as i32), Signal::SIGKILL).map_err(io::Error::from);
        }
    }
    child.start_kill()
}

/// Append a `buildy:` line to a build log. Best effort.
async fn append_note(log_path: &Path, note: &str) {
    if let Err(e) = write_note(log_path, note).await {
        warn!("Failed to write to {}: {}", log_path.display(), e);
    }
}

async fn write_note(log_path: &Path, note: &str) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().append(true).open(log_path).await?;
    file.write_all(format!("buildy: {}\n", note).as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn wait_until_done(build: &Build) -> BuildStatus {
        for _ in 0..300 {
            let status = build.status();
            if !status.is_running() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("build {} did not finish", build.id());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BuildStatus::Running).unwrap(),
            "\"running\""
        );
        assert_eq!(BuildStatus::Failure.to_string(), "failure");
        assert!(!BuildStatus::Success.is_running());
    }

    #[tokio::test]
    async fn start_creates_directory_and_log() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::new(temp.path().join("missing").display().to_string());

        let build = Build::start(temp.path(), repo, &Pipeline::default())
            .await
            .unwrap();

        assert_eq!(build.directory(), temp.path().join(build.id().to_string()));
        assert!(build.directory().is_dir());
        assert!(build.log_path().is_file());
        wait_until_done(&build).await;
    }

    #[tokio::test]
    async fn start_fails_without_base_directory() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("not-created");

        let err = Build::start(&base, Repository::new("/x"), &Pipeline::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BuildyError::BuildDirCreate { .. }));
    }

    #[tokio::test]
    async fn failed_clone_is_a_failure_status() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::new(temp.path().join("no-such-repo").display().to_string());

        let build = Build::start(temp.path(), repo, &Pipeline::default())
            .await
            .unwrap();

        assert_eq!(wait_until_done(&build).await, BuildStatus::Failure);

        let log = build.log().await.unwrap();
        assert!(!log.is_empty());
        assert_eq!(build.status(), BuildStatus::Failure);
        assert_eq!(build.log().await.unwrap(), log);
    }

    #[tokio::test]
    async fn cancel_after_finish_keeps_outcome() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::new(temp.path().join("no-such-repo").display().to_string());

        let build = Build::start(temp.path(), repo, &Pipeline::default())
            .await
            .unwrap();
        wait_until_done(&build).await;

        assert!(!build.cancel().await);
        assert!(!build.log().await.unwrap().contains("build cancelled"));
    }

    #[tokio::test]
    async fn pending_note_is_flushed_once() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::new(temp.path().join("no-such-repo").display().to_string());

        let build = Build::start(temp.path(), repo, &Pipeline::default())
            .await
            .unwrap();
        wait_until_done(&build).await;

        build.set_note("build timed out after 1s".to_string());
        let log = build.log().await.unwrap();
        assert!(log.ends_with("buildy: build timed out after 1s\n"));

        build.flush_note().await;
        assert_eq!(build.log().await.unwrap(), log);
    }

    #[tokio::test]
    async fn summary_with_uses_given_status() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::new(temp.path().join("no-such-repo").display().to_string());

        let build = Build::start(temp.path(), repo, &Pipeline::default())
            .await
            .unwrap();

        let summary = build.summary_with(BuildStatus::Running);
        assert_eq!(summary.status, BuildStatus::Running);
        assert_eq!(summary.id, build.id());
        wait_until_done(&build).await;
    }

    #[tokio::test]
    async fn summary_roundtrip() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::new(temp.path().join("no-such-repo").display().to_string())
            .with_tag("v1");

        let build = Build::start(temp.path(), repo.clone(), &Pipeline::default())
            .await
            .unwrap();
        wait_until_done(&build).await;

        let summary = build.summary();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"failure\""));

        let parsed: BuildSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, build.id());
        assert_eq!(parsed.status, BuildStatus::Failure);
        assert_eq!(parsed.repository, repo);
    }
}
