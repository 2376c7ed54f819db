//! Commit-and-push deploy flow.
//!
//! Checks for pending changes, asks for a commit message, then stages,
//! commits and pushes. Any failing step ends the run.

pub mod git;

pub use git::GitCli;

use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while deploying.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A version control command exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// A version control command could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The repository could not be located or inspected.
    #[error("Repository error: {0}")]
    Repository(#[from] git2::Error),

    /// Reading the commit message failed.
    #[error("Failed to read input: {0}")]
    Input(#[source] std::io::Error),
}

/// Version control operations used by the deploy flow.
///
/// Each method returns the command's trimmed standard output.
pub trait VersionControl {
    fn status(&mut self) -> Result<String, DeployError>;
    fn add_all(&mut self) -> Result<String, DeployError>;
    fn commit(&mut self, message: &str) -> Result<String, DeployError>;
    fn push(&mut self, remote: &str, branch: &str) -> Result<String, DeployError>;
}

/// Source of the commit message.
pub trait Prompt {
    /// Ask `question` and return the trimmed answer.
    fn ask(&mut self, question: &str) -> Result<String, DeployError>;
}

/// Prompt reading one line from standard input.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Result<String, DeployError> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", question).map_err(DeployError::Input)?;
        stdout.flush().map_err(DeployError::Input)?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(DeployError::Input)?;

        Ok(line.trim().to_string())
    }
}

/// Prompt answering with a message given up front.
pub struct FixedPrompt(pub String);

impl Prompt for FixedPrompt {
    fn ask(&mut self, _question: &str) -> Result<String, DeployError> {
        Ok(self.0.trim().to_string())
    }
}

/// Where to push.
#[derive(Debug, Clone)]
pub struct DeployTarget {
    pub remote: String,
    pub branch: String,
    /// Public URL announced after a successful push.
    pub site_url: Option<String>,
    /// Stop after showing what would happen.
    pub dry_run: bool,
}

/// How a deploy run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The work tree was clean; nothing was asked or run.
    NothingToCommit,
    /// The user gave an empty commit message.
    Aborted,
    /// Dry run finished after listing the pending changes.
    DryRun,
    /// Changes were committed and pushed.
    Deployed,
}

impl DeployOutcome {
    /// Process exit code for the outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployOutcome::Aborted => 1,
            DeployOutcome::NothingToCommit | DeployOutcome::DryRun | DeployOutcome::Deployed => 0,
        }
    }
}

/// Run the deploy sequence against `vcs`.
pub fn run_deploy(
    vcs: &mut dyn VersionControl,
    prompt: &mut dyn Prompt,
    target: &DeployTarget,
) -> Result<DeployOutcome, DeployError> {
    let status = vcs.status()?;
    if status.is_empty() {
        println!("Nothing to commit — no changes detected.");
        return Ok(DeployOutcome::NothingToCommit);
    }

    println!("Changed files:");
    println!("{}", status);
    println!();

    if target.dry_run {
        println!("Dry run: would run");
        println!("   git add -A");
        println!("   git commit -m <message>");
        println!("   git push {} {}", target.remote, target.branch);
        return Ok(DeployOutcome::DryRun);
    }

    let message = prompt.ask("Commit message: ")?;
    if message.is_empty() {
        println!("Aborted — commit message cannot be empty.");
        return Ok(DeployOutcome::Aborted);
    }
    debug!("Commit message: {:?}", message);

    print_output(&vcs.add_all()?);
    print_output(&vcs.commit(&message)?);
    print_output(&vcs.push(&target.remote, &target.branch)?);

    info!("Pushed to {} {}", target.remote, target.branch);
    match target.site_url {
        Some(ref url) => println!("\nDone! Changes are live at {}", url),
        None => println!("\nDone!"),
    }

    Ok(DeployOutcome::Deployed)
}

fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{}", output);
    }
}
