//! Integration tests for Buildy

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn buildy() -> Command {
        cargo_bin_cmd!("buildy")
    }

    #[test]
    fn help_displays() {
        buildy()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build-triggering service"));
    }

    #[test]
    fn version_displays() {
        buildy()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("buildy"));
    }

    #[test]
    fn config_path() {
        buildy()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_uses_given_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[builds]\ncapacity = 7\n").unwrap();

        buildy()
            .arg("--config")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("capacity = 7"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        buildy()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[server]"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[builds]\ncapacity = 0\n").unwrap();

        buildy()
            .arg("--config")
            .arg(&path)
            .args(["history"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("capacity"));
    }

    #[test]
    fn history_empty_json() {
        let temp = TempDir::new().unwrap();

        buildy()
            .args(["history", "--format", "json", "--directory"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn history_lists_build_dirs() {
        let temp = TempDir::new().unwrap();
        let id = "6f1c1f9e-3a52-4f0e-9d5b-3c2e8b7d9a10";
        std::fs::create_dir(temp.path().join(id)).unwrap();
        std::fs::create_dir(temp.path().join("not-a-build")).unwrap();

        buildy()
            .args(["history", "--format", "plain", "--directory"])
            .arg(temp.path())
            .assert()
            .success()
            .stdout(predicate::str::contains(id))
            .stdout(predicate::str::contains("not-a-build").not());
    }

    #[test]
    fn serve_rejects_zero_capacity() {
        let temp = TempDir::new().unwrap();

        buildy()
            .args(["serve", "--capacity", "0", "--directory"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("capacity"));
    }
}

mod build_tests {
    use buildy::build::{Build, BuildStatus, Pipeline, Repository, CLONE_DIR};
    use std::path::Path;
    use std::process::Command;
    use std::time::Duration;
    use tempfile::TempDir;

    const SLOW_MAKEFILE: &str = "all:\n\tsleep 2\n\ttouch build-complete.txt\n";
    const HANGING_MAKEFILE: &str = "all:\n\tsleep 30\n";

    fn tools_available() -> bool {
        ["git", "make"].iter().all(|tool| {
            Command::new(tool)
                .arg("--version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args([
                "-c",
                "user.name=Buildy Test",
                "-c",
                "user.email=buildy@example.com",
                "-c",
                "commit.gpgsign=false",
                "-c",
                "tag.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    /// A local repository whose default branch holds the given Makefile
    fn source_repo(makefile: &str) -> TempDir {
        let repo = TempDir::new().unwrap();
        git(repo.path(), &["init", "-q"]);
        std::fs::write(repo.path().join("Makefile"), makefile).unwrap();
        git(repo.path(), &["add", "Makefile"]);
        git(repo.path(), &["commit", "-q", "-m", "Add Makefile"]);
        repo
    }

    fn url(repo: &TempDir) -> String {
        repo.path().display().to_string()
    }

    async fn wait_until_done(build: &Build) -> BuildStatus {
        for _ in 0..600 {
            let status = build.status();
            if !status.is_running() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("build {} did not finish", build.id());
    }

    #[tokio::test]
    async fn local_build_runs_to_success() {
        if !tools_available() {
            eprintln!("skipping: git or make not available");
            return;
        }
        let source = source_repo(SLOW_MAKEFILE);
        let base = TempDir::new().unwrap();

        let build = Build::start(base.path(), Repository::new(url(&source)), &Pipeline::default())
            .await
            .unwrap();
        assert_eq!(build.status(), BuildStatus::Running);

        assert_eq!(wait_until_done(&build).await, BuildStatus::Success);
        assert!(build
            .directory()
            .join(CLONE_DIR)
            .join("build-complete.txt")
            .exists());

        let log = build.log().await.unwrap();
        assert!(log.contains("Cloning into"), "log was: {}", log);
    }

    #[tokio::test]
    async fn missing_repository_fails() {
        if !tools_available() {
            eprintln!("skipping: git or make not available");
            return;
        }
        let base = TempDir::new().unwrap();
        let missing = base.path().join("no-such-repo");

        let build = Build::start(
            base.path(),
            Repository::new(missing.display().to_string()),
            &Pipeline::default(),
        )
        .await
        .unwrap();

        assert_eq!(wait_until_done(&build).await, BuildStatus::Failure);
        let log = build.log().await.unwrap();
        assert!(log.contains("fatal"), "log was: {}", log);
    }

    #[tokio::test]
    async fn tag_checkout_uses_tagged_tree() {
        if !tools_available() {
            eprintln!("skipping: git or make not available");
            return;
        }
        let source = source_repo("all:\n\ttrue\n");
        std::fs::write(source.path().join("tag-v1.txt"), "v1").unwrap();
        git(source.path(), &["add", "tag-v1.txt"]);
        git(source.path(), &["commit", "-q", "-m", "Add tag file"]);
        git(source.path(), &["tag", "v1"]);
        git(source.path(), &["rm", "-q", "tag-v1.txt"]);
        git(source.path(), &["commit", "-q", "-m", "Drop tag file"]);

        let base = TempDir::new().unwrap();
        let build = Build::start(
            base.path(),
            Repository::new(url(&source)).with_tag("v1"),
            &Pipeline::default(),
        )
        .await
        .unwrap();

        assert_eq!(wait_until_done(&build).await, BuildStatus::Success);
        assert!(build.directory().join(CLONE_DIR).join("tag-v1.txt").exists());
    }

    #[tokio::test]
    async fn unknown_branch_fails() {
        if !tools_available() {
            eprintln!("skipping: git or make not available");
            return;
        }
        let source = source_repo("all:\n\ttrue\n");
        let base = TempDir::new().unwrap();

        let build = Build::start(
            base.path(),
            Repository::new(url(&source)).with_branch("no-such-branch"),
            &Pipeline::default(),
        )
        .await
        .unwrap();

        assert_eq!(wait_until_done(&build).await, BuildStatus::Failure);
    }

    #[tokio::test]
    async fn cancel_stops_running_build() {
        if !tools_available() {
            eprintln!("skipping: git or make not available");
            return;
        }
        let source = source_repo(HANGING_MAKEFILE);
        let base = TempDir::new().unwrap();

        let build = Build::start(base.path(), Repository::new(url(&source)), &Pipeline::default())
            .await
            .unwrap();
        assert!(build.cancel().await);
        assert_eq!(build.status(), BuildStatus::Failure);
        assert!(!build.cancel().await);

        let log = build.log().await.unwrap();
        assert!(log.contains("buildy: build cancelled"), "log was: {}", log);
    }

    #[tokio::test]
    async fn timeout_kills_long_build() {
        if !tools_available() {
            eprintln!("skipping: git or make not available");
            return;
        }
        let source = source_repo(HANGING_MAKEFILE);
        let base = TempDir::new().unwrap();
        let pipeline = Pipeline::default().with_timeout(Some(Duration::from_secs(1)));

        let build = Build::start(base.path(), Repository::new(url(&source)), &pipeline)
            .await
            .unwrap();

        assert_eq!(wait_until_done(&build).await, BuildStatus::Failure);
        let log = build.log().await.unwrap();
        assert!(log.contains("timed out after 1s"), "log was: {}", log);
    }
}
