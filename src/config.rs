// Runtime configuration read from the environment, plus the helpers that
// keep the API token in the user's home directory between runs.

use crate::error::Result;
use log::debug;
use std::path::PathBuf;

const DEFAULT_API_URL: &str = "https://api.mangadex.org";
const DEFAULT_UPLOADS_URL: &str = "https://uploads.mangadex.org";
const TOKEN_FILE: &str = ".mangadex_cli_token";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub uploads_url: String,
    pub token: Option<String>,
    /// Program used to open cover previews. `None` means the platform default.
    pub image_viewer: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.into(),
            uploads_url: DEFAULT_UPLOADS_URL.into(),
            token: None,
            image_viewer: None,
        }
    }
}

impl Config {
    /// Build the configuration from `MANGADEX_API_URL`, `MANGADEX_UPLOADS_URL`,
    /// `MANGADEX_TOKEN` and `MANGADEX_IMAGE_VIEWER`. When no token is set in
    /// the environment, the persisted one (if any) is used.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let token = var("MANGADEX_TOKEN").or_else(|| load_token().ok());
        debug!("config: token {}", if token.is_some() { "present" } else { "absent" });
        Config {
            api_url: var("MANGADEX_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            uploads_url: var("MANGADEX_UPLOADS_URL").unwrap_or_else(|| DEFAULT_UPLOADS_URL.into()),
            token,
            image_viewer: var("MANGADEX_IMAGE_VIEWER"),
        }
    }
}

fn token_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(TOKEN_FILE)
}

/// Persist token into a file in the user's home directory.
pub fn persist_token(token: &str) -> Result<()> {
    std::fs::write(token_path(), token.trim())?;
    Ok(())
}

/// Load token from the user's home directory file.
pub fn load_token() -> Result<String> {
    let data = std::fs::read_to_string(token_path())?;
    Ok(data.trim().to_string())
}

/// Remove the persisted token. Returns false when there was none.
pub fn forget_token() -> Result<bool> {
    match std::fs::remove_file(token_path()) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
