use failure::{Error, ResultExt};
use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::token::validate_token;

pub const DEFAULT_DEST_DIR: &str = "~/GithubRepoDownloader_repos";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Everything needed to run a download, minus the access token.
///
/// The token lives elsewhere so it never ends up in a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    /// The directory every archive gets saved into.
    pub dest_dir: PathBuf,
    /// The minimum number of milliseconds between two downloads.
    pub min_delay_ms: u64,
}

impl Default for General {
    fn default() -> General {
        General {
            dest_dir: PathBuf::from(DEFAULT_DEST_DIR),
            min_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// The account whose repositories will be downloaded.
    pub username: String,
    /// The branch to download when we aren't using the listed default.
    pub branch: String,
    /// Use each repository's `default_branch` from the search results instead
    /// of always asking for `branch`.
    pub use_default_branch: bool,
    pub api_url: String,
    pub web_url: String,
}

impl Default for GitHubConfig {
    fn default() -> GitHubConfig {
        GitHubConfig {
            username: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            use_default_branch: false,
            api_url: DEFAULT_API_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
        }
    }
}

impl GitHubConfig {
    /// Figure out which branch to download, given the default branch the
    /// search results reported (if any).
    pub fn branch_for<'a>(&'a self, listed_default: Option<&'a str>) -> &'a str {
        match listed_default {
            Some(branch) if self.use_default_branch && !branch.is_empty() => branch,
            _ => &self.branch,
        }
    }
}

impl Config {
    /// Load a config from a TOML file, expanding any `~` or environment
    /// variables in its paths.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());

        let contents = fs::read_to_string(path)
            .with_context(|_| format!("Unable to read {}", path.display()))?;

        let mut cfg: Config = toml::from_str(&contents).context("Invalid config file")?;
        cfg.expand_paths()?;

        Ok(cfg)
    }

    /// An example config, suitable for printing to the user.
    pub fn example() -> Config {
        let mut cfg = Config::default();
        cfg.github.username = String::from("octocat");
        cfg
    }

    pub fn as_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self)
            .context("Unable to serialize the config")
            .map_err(Into::into)
    }

    /// Run `dest_dir` through `shellexpand`.
    pub fn expand_paths(&mut self) -> Result<(), Error> {
        self.general.dest_dir = expand_path(&self.general.dest_dir.to_string_lossy())?;
        Ok(())
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.general.min_delay_ms)
    }

    /// Make sure the config (and token) are usable before touching the
    /// network.
    pub fn validate(&self, token: &SecretString) -> Result<(), ConfigError> {
        if self.github.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }

        let dest_dir = &self.general.dest_dir;
        if dest_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDownloadPath);
        }
        if !dest_dir.is_absolute() {
            return Err(ConfigError::RelativeDownloadPath(
                dest_dir.display().to_string(),
            ));
        }

        if !validate_token(token.expose_secret()) {
            return Err(ConfigError::MalformedToken);
        }

        Ok(())
    }
}

/// Expand `~` and `$VARIABLES` in a path.
pub fn expand_path(raw: &str) -> Result<PathBuf, Error> {
    let expanded = shellexpand::full(raw)
        .with_context(|_| format!("Unable to expand \"{}\"", raw))?;

    Ok(PathBuf::from(expanded.into_owned()))
}
