//! Line-oriented command shell driving a [`Studio`].
//!
//! One command per line:
//!
//! ```text
//! text <content>      set the encoded text (empty uses the placeholder)
//! clear               empty the text
//! dark <#hex>         dark module color
//! light <#hex>        background color
//! size <small|medium|large|N>
//! ecl <L|M|Q|H>
//! logo <path>         attach a logo (max 2MB)
//! nologo              remove the logo
//! save [dir]          write qr_code.png
//! copy                copy to the clipboard
//! status              print the pipeline snapshot
//! help
//! quit
//! ```

use std::path::PathBuf;

use qr_engine::{ErrorCorrection, SizePreset};

use crate::app::Studio;
use crate::notice::Notice;
use crate::{Result, StudioError};

pub const HELP: &str = "commands: text <content> | clear | dark <#hex> | light <#hex> | \
size <small|medium|large|N> | ecl <L|M|Q|H> | logo <path> | nologo | save [dir] | copy | \
status | help | quit";

/// Requested output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeArg {
    Preset(SizePreset),
    Pixels(u32),
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Text(String),
    Clear,
    Dark(String),
    Light(String),
    Size(SizeArg),
    Ecl(ErrorCorrection),
    Logo(PathBuf),
    NoLogo,
    Save(Option<PathBuf>),
    Copy,
    Status,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }

        let trimmed = line.trim_start();
        let (verb, rest) = match trimmed.split_once(' ') {
            Some((verb, rest)) => (verb, rest),
            None => (trimmed, ""),
        };
        let arg = rest.trim();
        let require = |what: &str| -> Result<String> {
            if arg.is_empty() {
                Err(StudioError::InvalidCommand(format!("{verb} needs {what}")))
            } else {
                Ok(arg.to_string())
            }
        };

        let cmd = match verb.to_lowercase().as_str() {
            // Content keeps its inner and trailing spaces.
            "text" => Self::Text(rest.to_string()),
            "clear" => Self::Clear,
            "dark" => Self::Dark(require("a color")?),
            "light" => Self::Light(require("a color")?),
            "size" => {
                let value = require("a size")?;
                match SizePreset::from_name(&value) {
                    Some(preset) => Self::Size(SizeArg::Preset(preset)),
                    None => Self::Size(SizeArg::Pixels(value.parse().map_err(|_| {
                        StudioError::InvalidCommand(format!("invalid size: {value}"))
                    })?)),
                }
            }
            "ecl" => Self::Ecl(require("a level")?.parse()?),
            "logo" => Self::Logo(PathBuf::from(require("a file path")?)),
            "nologo" => Self::NoLogo,
            "save" => Self::Save((!arg.is_empty()).then(|| PathBuf::from(arg))),
            "copy" => Self::Copy,
            "status" => Self::Status,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(StudioError::InvalidCommand(format!("unknown command: {other}"))),
        };
        Ok(Some(cmd))
    }
}

/// What the caller should do after a line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nothing,
    Output(String),
    Quit,
}

/// Execute a parsed command against the studio.
pub async fn execute(studio: &mut Studio, cmd: ShellCommand) -> Result<Reply> {
    match cmd {
        ShellCommand::Text(content) => studio.set_content(content).await.map(|_| Reply::Nothing),
        ShellCommand::Clear => studio.clear_content().await.map(|_| Reply::Nothing),
        ShellCommand::Dark(hex) => studio.set_dark_color(&hex).await.map(|_| Reply::Nothing),
        ShellCommand::Light(hex) => studio.set_light_color(&hex).await.map(|_| Reply::Nothing),
        ShellCommand::Size(SizeArg::Preset(p)) => studio.set_size_preset(p).await.map(|_| Reply::Nothing),
        ShellCommand::Size(SizeArg::Pixels(n)) => studio.set_pixel_size(n).await.map(|_| Reply::Nothing),
        ShellCommand::Ecl(level) => studio.set_error_correction(level).await.map(|_| Reply::Nothing),
        ShellCommand::Logo(path) => studio.choose_logo(&path).await.map(|_| Reply::Nothing),
        ShellCommand::NoLogo => studio.remove_logo().await.map(|_| Reply::Nothing),
        ShellCommand::Save(dir) => studio.download(dir.as_deref()).await.map(|_| Reply::Nothing),
        ShellCommand::Copy => studio.copy_to_clipboard().await.map(|_| Reply::Nothing),
        ShellCommand::Status => {
            let snapshot = studio.status().await?;
            let line = serde_json::json!({ "type": "status", "data": snapshot }).to_string();
            Ok(Reply::Output(line))
        }
        ShellCommand::Help => Ok(Reply::Output(HELP.to_string())),
        ShellCommand::Quit => Ok(Reply::Quit),
    }
}

/// Parse and execute one line. Errors the studio did not already report
/// come back as an error notice line.
pub async fn run_line(studio: &mut Studio, line: &str) -> Reply {
    let cmd = match ShellCommand::parse(line) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => return Reply::Nothing,
        Err(e) => return Reply::Output(Notice::error(e.to_string()).to_json_line()),
    };

    match execute(studio, cmd).await {
        Ok(reply) => reply,
        Err(e @ StudioError::SessionClosed) => {
            tracing::error!(error = %e, "Command failed");
            Reply::Output(Notice::error(e.to_string()).to_json_line())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Command failed (already reported)");
            Reply::Nothing
        }
    }
}
