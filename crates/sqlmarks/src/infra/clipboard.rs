//! Clipboard access for copying snippets.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};

/// System clipboard with shell-tool fallbacks for sessions without a native clipboard.
pub struct Clipboard {
    native: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(err) => {
                tracing::debug!(error = %err, "native clipboard unavailable");
                None
            }
        };
        Self { native }
    }

    /// Place a snippet on the clipboard, trimmed of surrounding whitespace.
    pub fn copy_snippet(&mut self, snippet: &str) -> Result<()> {
        let text = snippet.trim();

        if let Some(native) = self.native.as_mut() {
            match native.set_text(text.to_owned()) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::warn!(error = %err, "native clipboard rejected text, trying shell tools");
                    self.native = None;
                }
            }
        }

        copy_with_tools(text)
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_with_tools(text: &str) -> Result<()> {
    for tool in clipboard_tools() {
        match pipe_to(tool, text) {
            Ok(()) => return Ok(()),
            Err(err) => tracing::debug!(tool = tool[0], error = %err, "clipboard tool failed"),
        }
    }
    Err(anyhow!("no clipboard backend accepted the snippet"))
}

fn pipe_to(tool: &[&str], text: &str) -> Result<()> {
    let (program, args) = tool.split_first().context("clipboard tool missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .with_context(|| format!("failed to write to {program}"))?;
    }

    let status = child
        .wait()
        .with_context(|| format!("{program} did not exit cleanly"))?;
    if !status.success() {
        bail!("{program} exited with status {status}");
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn clipboard_tools() -> &'static [&'static [&'static str]] {
    &[&["pbcopy"]]
}

#[cfg(all(unix, not(target_os = "macos")))]
fn clipboard_tools() -> &'static [&'static [&'static str]] {
    &[&["wl-copy"], &["xclip", "-selection", "clipboard"], &["xsel", "--clipboard", "--input"]]
}

#[cfg(target_os = "windows")]
fn clipboard_tools() -> &'static [&'static [&'static str]] {
    &[&["clip.exe"]]
}

#[cfg(not(any(unix, target_os = "windows")))]
fn clipboard_tools() -> &'static [&'static [&'static str]] {
    &[]
}
