// UI layer: line based terminal input/output for the selection prompt.
// `dialoguer` drives the prompt when attached to a terminal; piped input
// falls back to plain line reads so the tool can be scripted. Prompt text
// goes to stderr, stdout only ever carries the selected ids.

use crate::error::{Error, Result};
use dialoguer::console::Term;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::io::{BufRead, IsTerminal, Stderr, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Where the selector reads answers from and writes its text to.
pub trait Console {
    /// Read one line. `None` means input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    fn show(&mut self, text: &str);
}

/// Answers from stdin, prompt text to stderr (or any other writer).
pub struct StdConsole<W: Write = Stderr> {
    out: W,
}

impl StdConsole {
    pub fn new() -> Self {
        StdConsole { out: std::io::stderr() }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdConsole<W> {
    pub fn with_output(out: W) -> Self {
        StdConsole { out }
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

impl<W: Write> Console for StdConsole<W> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        if std::io::stdin().is_terminal() && Term::stderr().is_term() {
            let answer: String = Input::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?;
            return Ok(Some(answer));
        }
        self.out.flush()?;
        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn show(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            debug!("console: write failed: {}", e);
        }
    }
}

/// Ask for a secret (the API token) without echoing it.
pub fn read_secret(prompt: &str) -> Result<String> {
    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// A bar of `=` as wide as `text`.
pub fn dynamic_bars(text: &str) -> String {
    "=".repeat(text.chars().count())
}

/// Spinner shown while a blocking request is in flight.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Open `path` in an image viewer. A viewer that fails to start or exits
/// with an error status is a `MissingOptionalDependency`.
pub fn open_image(path: &Path, viewer: Option<&str>) -> Result<()> {
    let program = viewer.unwrap_or(default_viewer());
    debug!("preview: opening {} with {}", path.display(), program);
    let status = viewer_command(path, viewer)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::MissingOptionalDependency(format!(
                "No image viewer found (\"{}\"), set MANGADEX_IMAGE_VIEWER to preview covers",
                program
            )),
            _ => Error::Io(e),
        })?;
    if !status.success() {
        return Err(Error::MissingOptionalDependency(format!(
            "Image viewer \"{}\" failed ({}), set MANGADEX_IMAGE_VIEWER to preview covers",
            program, status
        )));
    }
    Ok(())
}

// The platform openers return immediately unless told to wait.
fn viewer_command(path: &Path, viewer: Option<&str>) -> Command {
    let mut cmd = Command::new(viewer.unwrap_or(default_viewer()));
    if viewer.is_none() {
        if cfg!(target_os = "windows") {
            cmd.args(["/C", "start", "/WAIT", ""]);
        } else if cfg!(target_os = "macos") {
            cmd.arg("-W");
        }
    }
    cmd.arg(path);
    cmd
}

fn default_viewer() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "cmd"
    } else {
        "xdg-open"
    }
}
