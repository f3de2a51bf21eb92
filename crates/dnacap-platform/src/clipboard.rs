//! Clipboard text readers.

use crate::PlatformError;
use dnacap_core::ClipboardSource;
use std::process::Command;
use tracing::debug;

/// Primary reader backed by `arboard`.
///
/// A fresh handle is opened per read; on X11 a long-lived handle can miss
/// ownership changes made by other applications.
pub struct ArboardClipboard;

impl ClipboardSource for ArboardClipboard {
    fn name(&self) -> &'static str {
        "arboard"
    }

    fn read_text(&self) -> Result<String, String> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| PlatformError::ClipboardFailed(e.to_string()).to_string())?;
        clipboard
            .get_text()
            .map_err(|e| PlatformError::ClipboardFailed(e.to_string()).to_string())
    }
}

/// One paste utility invocation.
#[derive(Debug, Clone)]
pub struct PasteCommand {
    program: &'static str,
    args: Vec<&'static str>,
    strip_crlf: bool,
}

impl PasteCommand {
    pub fn new(program: &'static str, args: Vec<&'static str>) -> Self {
        Self { program, args, strip_crlf: false }
    }

    /// Drop the single trailing CRLF the utility appends to its output.
    pub fn stripping_crlf(mut self) -> Self {
        self.strip_crlf = true;
        self
    }

    fn run(&self) -> Result<String, PlatformError> {
        let failed = |message: String| PlatformError::CommandFailed {
            program: self.program.to_string(),
            message,
        };
        let output = Command::new(self.program)
            .args(&self.args)
            .output()
            .map_err(|e| failed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!("{}: {}", output.status, stderr.trim())));
        }
        let text = String::from_utf8(output.stdout).map_err(|e| failed(e.to_string()))?;
        Ok(if self.strip_crlf { strip_one_crlf(text) } else { text })
    }
}

fn strip_one_crlf(mut text: String) -> String {
    if text.ends_with("\r\n") {
        text.truncate(text.len() - 2);
    }
    text
}

/// Fallback reader that shells out to the platform's paste utility.
///
/// Candidates are tried in order; the first that exits successfully wins.
pub struct CommandClipboard {
    candidates: Vec<PasteCommand>,
}

impl CommandClipboard {
    pub fn for_current_os() -> Self {
        let candidates = if cfg!(target_os = "macos") {
            vec![PasteCommand::new("pbpaste", vec![])]
        } else if cfg!(windows) {
            // Console output defaults to the OEM code page; Get-Clipboard ends with CRLF.
            vec![PasteCommand::new(
                "powershell",
                vec![
                    "-NoProfile",
                    "-Command",
                    "[Console]::OutputEncoding=[Text.Encoding]::UTF8; Get-Clipboard -Raw",
                ],
            )
            .stripping_crlf()]
        } else {
            vec![
                PasteCommand::new("wl-paste", vec!["--no-newline"]),
                PasteCommand::new("xclip", vec!["-selection", "clipboard", "-o"]),
                PasteCommand::new("xsel", vec!["--clipboard", "--output"]),
            ]
        };
        Self { candidates }
    }

    pub fn with_candidates(candidates: Vec<PasteCommand>) -> Self {
        Self { candidates }
    }
}

impl ClipboardSource for CommandClipboard {
    fn name(&self) -> &'static str {
        "system command"
    }

    fn read_text(&self) -> Result<String, String> {
        let mut errors = Vec::new();
        for command in &self.candidates {
            match command.run() {
                Ok(text) => return Ok(text),
                Err(e) => {
                    debug!(error = %e, "clipboard command failed");
                    errors.push(e.to_string());
                }
            }
        }
        if errors.is_empty() {
            return Err("no clipboard command available".to_string());
        }
        Err(errors.join("; "))
    }
}
