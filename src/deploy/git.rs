//! Git-backed version control.
//!
//! Mutating operations shell out to the `git` binary with discrete argument
//! lists so user input is never interpreted by a shell. The repository is
//! located and inspected with git2.

use crate::deploy::{DeployError, VersionControl};
use git2::Repository;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Runs `git` inside a discovered work tree.
pub struct GitCli {
    repo: Repository,
    workdir: PathBuf,
}

impl GitCli {
    /// Locate the repository containing `start`.
    pub fn discover(start: &Path) -> Result<Self, DeployError> {
        let repo = Repository::discover(start)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| git2::Error::from_str("repository has no work tree"))?
            .to_path_buf();
        debug!("Using repository at {}", workdir.display());

        Ok(Self { repo, workdir })
    }

    /// Root of the work tree.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Name of the checked-out branch, if HEAD points at one.
    pub fn current_branch(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .filter(|head| head.is_branch())
            .and_then(|head| head.shorthand().map(String::from))
    }

    /// Abbreviated id of the HEAD commit.
    pub fn head_short_id(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .map(|commit| commit.id().to_string()[..8].to_string())
    }

    /// Run `git` with `args` and return trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String, DeployError> {
        let command = format!("git {}", args.join(" "));
        debug!("Running {}", command);

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| DeployError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn commit_args(message: &str) -> [&str; 3] {
    ["commit", "-m", message]
}

fn push_args<'a>(remote: &'a str, branch: &'a str) -> [&'a str; 3] {
    ["push", remote, branch]
}

impl VersionControl for GitCli {
    fn status(&mut self) -> Result<String, DeployError> {
        self.run(&["status", "--short"])
    }

    fn add_all(&mut self) -> Result<String, DeployError> {
        self.run(&["add", "-A"])
    }

    fn commit(&mut self, message: &str) -> Result<String, DeployError> {
        self.run(&commit_args(message))
    }

    fn push(&mut self, remote: &str, branch: &str) -> Result<String, DeployError> {
        self.run(&push_args(remote, branch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn has_git() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn init_repo(dir: &Path) {
        git(dir, &["init"]);
        git(dir, &["config", "user.email", "you@example.com"]);
        git(dir, &["config", "user.name", "Your Name"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
    }

    #[test]
    fn test_commit_message_is_single_argument() {
        let message = r#"Fix "quotes"; $(rm -rf /) && echo `id`"#;
        let args = commit_args(message);
        assert_eq!(args, ["commit", "-m", message]);
    }

    #[test]
    fn test_push_args() {
        assert_eq!(push_args("origin", "main"), ["push", "origin", "main"]);
    }

    #[test]
    fn test_discover_outside_repository_fails() {
        let temp_dir = TempDir::new().unwrap();
        // A fresh temp dir is not inside a repository unless TMPDIR is.
        if Repository::discover(temp_dir.path()).is_ok() {
            return;
        }
        assert!(matches!(
            GitCli::discover(temp_dir.path()),
            Err(DeployError::Repository(_))
        ));
    }

    #[test]
    fn test_status_add_commit_push() {
        if !has_git() {
            return;
        }

        let remote_dir = TempDir::new().unwrap();
        git(remote_dir.path(), &["init", "--bare"]);

        let work_dir = TempDir::new().unwrap();
        init_repo(work_dir.path());
        git(
            work_dir.path(),
            &["remote", "add", "origin", remote_dir.path().to_str().unwrap()],
        );

        let mut vcs = GitCli::discover(work_dir.path()).unwrap();
        assert_eq!(vcs.status().unwrap(), "");
        assert!(vcs.head_short_id().is_none());

        std::fs::write(work_dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        assert!(vcs.status().unwrap().contains("index.html"));

        let message = r#"Add "index"; $(echo injected)"#;
        vcs.add_all().unwrap();
        vcs.commit(message).unwrap();

        assert_eq!(git(work_dir.path(), &["log", "-1", "--format=%s"]), message);
        assert_eq!(vcs.status().unwrap(), "");
        assert_eq!(vcs.head_short_id().map(|id| id.len()), Some(8));

        let branch = vcs.current_branch().unwrap();
        vcs.push("origin", &branch).unwrap();
        assert_eq!(
            git(remote_dir.path(), &["log", "-1", "--format=%s", &branch]),
            message
        );
    }

    #[test]
    fn test_failed_command_reports_stderr() {
        if !has_git() {
            return;
        }

        let work_dir = TempDir::new().unwrap();
        init_repo(work_dir.path());
        std::fs::write(work_dir.path().join("a.txt"), "a").unwrap();

        let mut vcs = GitCli::discover(work_dir.path()).unwrap();
        vcs.add_all().unwrap();
        vcs.commit("first").unwrap();

        let err = vcs.push("nowhere", "main").unwrap_err();
        match err {
            DeployError::CommandFailed { command, stderr } => {
                assert_eq!(command, "git push nowhere main");
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
