use async_trait::async_trait;
use thiserror::Error;

use super::types::CategoryResult;
use crate::util::truncate_chars;

/// Title attached to every shared brief.
pub const SHARE_TITLE: &str = "Daily Brief";
/// Characters of each summary kept in the share text.
pub const SUMMARY_PREVIEW_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

#[derive(Debug, Error)]
pub enum ExportError {
    /// The clipboard fallback could not be written.
    #[error("Failed to copy brief to clipboard: {0}")]
    Clipboard(#[source] anyhow::Error),
}

/// What gets handed to a share mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

/// An environment-provided share mechanism.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    async fn share(&self, payload: &SharePayload) -> anyhow::Result<()>;
}

/// Plain-text clipboard used when no share mechanism exists.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> anyhow::Result<()>;
}

/// How an export was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The share mechanism accepted the payload.
    Shared,
    /// The share mechanism rejected it. Logged only; no fallback is attempted.
    ShareFailed,
    /// No share mechanism was available; the text went to the clipboard.
    CopiedToClipboard,
}

/// Build the plain-text share body.
///
/// Each category becomes `Category: ...` and `Summary: ...` lines, the
/// summary cut to its first 200 characters with `...` appended. Categories
/// are separated by a blank line.
pub fn share_text(results: &[CategoryResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "Category: {}\nSummary: {}{}",
                r.category,
                truncate_chars(&r.summary, SUMMARY_PREVIEW_CHARS),
                ELLIPSIS
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Deliver the brief through `share` if present, otherwise the clipboard.
///
/// # Errors
///
/// Only a clipboard failure is returned. A share mechanism that exists but
/// fails is logged and reported as [`ExportOutcome::ShareFailed`].
pub async fn export(
    results: &[CategoryResult],
    share: Option<&dyn ShareTarget>,
    clipboard: &dyn Clipboard,
    url: Option<&str>,
) -> Result<ExportOutcome, ExportError> {
    let text = share_text(results);

    if let Some(target) = share {
        let payload = SharePayload {
            title: SHARE_TITLE.to_owned(),
            text,
            url: url.map(str::to_owned),
        };
        return match target.share(&payload).await {
            Ok(()) => {
                tracing::info!(categories = results.len(), "Brief shared");
                Ok(ExportOutcome::Shared)
            }
            Err(e) => {
                tracing::error!(error = %e, "Share failed");
                Ok(ExportOutcome::ShareFailed)
            }
        };
    }

    clipboard
        .write_text(&text)
        .await
        .map_err(ExportError::Clipboard)?;
    tracing::info!(categories = results.len(), "Brief copied to clipboard");
    Ok(ExportOutcome::CopiedToClipboard)
}
