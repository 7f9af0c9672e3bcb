//! Share and clipboard mechanisms backed by external commands.
//!
//! The brief text is written to the command's stdin. A share command is
//! only available when the user configures one; the clipboard looks for a
//! platform copy tool on `PATH`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::brief::{Clipboard, SharePayload, ShareTarget};

/// Copy tools tried in order: macOS, Wayland, X11, Windows.
const CLIPBOARD_CANDIDATES: &[&[&str]] = &[
    &["pbcopy"],
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["clip"],
];

/// Runs `program args...` with `input` on stdin and waits for a zero exit.
async fn pipe_to_command(argv: &[String], input: &str, envs: &[(&str, &str)]) -> Result<()> {
    let (program, args) = argv.split_first().context("Empty command")?;

    let mut child = Command::new(program)
        .args(args)
        .envs(envs.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start '{}'", program))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .await
            .with_context(|| format!("Failed to write to '{}'", program))?;
        // Dropping stdin closes the pipe so the child sees EOF
    }

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("Failed to wait for '{}'", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("'{}' exited with {}: {}", program, output.status, stderr.trim());
    }
    Ok(())
}

/// Share mechanism that hands the brief to a user-configured command.
///
/// The title and URL are exposed as `DAYBRIEF_SHARE_TITLE` and
/// `DAYBRIEF_SHARE_URL`.
#[derive(Debug, Clone)]
pub struct CommandShare {
    argv: Vec<String>,
}

impl CommandShare {
    /// `None` when `argv` is empty, meaning no share mechanism is available.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }
}

#[async_trait]
impl ShareTarget for CommandShare {
    async fn share(&self, payload: &SharePayload) -> Result<()> {
        let url = payload.url.as_deref().unwrap_or("");
        pipe_to_command(
            &self.argv,
            &payload.text,
            &[
                ("DAYBRIEF_SHARE_TITLE", payload.title.as_str()),
                ("DAYBRIEF_SHARE_URL", url),
            ],
        )
        .await
    }
}

/// Clipboard backed by the first copy tool found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct CommandClipboard {
    argv: Option<Vec<String>>,
}

impl CommandClipboard {
    /// Look up a copy tool on `PATH`.
    pub fn detect() -> Self {
        let path = std::env::var_os("PATH").unwrap_or_default();
        let argv: Option<Vec<String>> = CLIPBOARD_CANDIDATES
            .iter()
            .find(|candidate| {
                std::env::split_paths(&path).any(|dir| is_executable(&dir.join(candidate[0])))
            })
            .map(|candidate| candidate.iter().map(|s| s.to_string()).collect());

        if argv.is_none() {
            tracing::debug!("No clipboard tool found on PATH");
        }
        Self { argv }
    }

    /// Use an explicit command instead of detecting one.
    pub fn with_command(argv: Vec<String>) -> Self {
        Self {
            argv: (!argv.is_empty()).then_some(argv),
        }
    }
}

fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let Some(argv) = &self.argv else {
            bail!("No clipboard tool available (tried pbcopy, wl-copy, xclip, clip)");
        };
        pipe_to_command(argv, text, &[]).await
    }
}
