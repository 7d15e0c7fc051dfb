use failure::{Error, ResultExt};
use reqwest::blocking::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::fmt::{self, Debug, Formatter};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::GitHubConfig;
use crate::errors::{DownloadError, ListingError};
use crate::{Provider, RepositoryDescriptor};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A HTTP client which signs every request with the user's credentials
/// using basic auth.
pub struct AuthenticatedSession {
    client: Client,
    username: String,
    token: SecretString,
}

impl AuthenticatedSession {
    pub fn new<S: Into<String>>(username: S, token: SecretString) -> Result<AuthenticatedSession, Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Unable to create the HTTP client")?;

        Ok(AuthenticatedSession {
            client,
            username: username.into(),
            token,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Start building an authenticated `GET` request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .basic_auth(&self.username, Some(self.token.expose_secret()))
    }
}

impl Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("username", &self.username)
            .field("token", &"XXXXXXXXXX")
            .finish()
    }
}

/// An interface to the repositories stored on GitHub.
#[derive(Debug)]
pub struct GitHub {
    session: AuthenticatedSession,
    cfg: GitHubConfig,
}

impl GitHub {
    /// Create a new `GitHub` for `cfg.username`, authenticating with `token`.
    pub fn new(cfg: GitHubConfig, token: SecretString) -> Result<GitHub, Error> {
        let session = AuthenticatedSession::new(cfg.username.clone(), token)?;
        Ok(GitHub { session, cfg })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.cfg
    }

    fn search_url(&self) -> String {
        format!("{}/search/repositories", self.cfg.api_url.trim_end_matches('/'))
    }

    fn archive_url(&self, repo: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/archive/{}.zip",
            self.cfg.web_url.trim_end_matches('/'),
            self.session.username(),
            repo,
            branch
        )
    }
}

impl Provider for GitHub {
    fn name(&self) -> &str {
        "github"
    }

    fn repositories(&self) -> Result<Vec<RepositoryDescriptor>, ListingError> {
        let url = self.search_url();
        let query = format!("user:{}", self.session.username());
        debug!("Sending request to {:?} (q={})", url, query);

        let response = self
            .session
            .get(&url)
            .query(&[("q", query.as_str())])
            .send()
            .map_err(ListingError::Request)?;

        let status = response.status();
        debug!("Received response ({})", status);

        if !status.is_success() {
            warn!("Request failed with {}", status);
            return Err(ListingError::Status { url, status });
        }

        let results: SearchResults = response.json().map_err(ListingError::Decode)?;

        // Only the first page is ever requested
        if results.incomplete_results || results.total_count > results.items.len() as u64 {
            warn!(
                "Only {} of {} repositories were returned, the rest will be ignored",
                results.items.len(),
                results.total_count
            );
        }

        let repos: Vec<RepositoryDescriptor> = results
            .items
            .iter()
            .map(RepositoryDescriptor::from_json)
            .collect();

        debug!("Found {} repos", repos.len());
        Ok(repos)
    }

    fn download_archive(
        &self,
        repo: &str,
        branch: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let url = self.archive_url(repo, branch);
        debug!("Downloading {}", url);

        let mut response = self
            .session
            .get(&url)
            .send()
            .map_err(DownloadError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status { url, status });
        }

        let dest = dest_dir.join(format!("{}.zip", repo));
        let mut file = File::create(&dest).map_err(DownloadError::Io)?;
        let written = io::copy(&mut response, &mut file).map_err(DownloadError::Io)?;
        trace!("Wrote {} bytes to {}", written, dest.display());

        Ok(dest)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    incomplete_results: bool,
    items: Vec<Value>,
}
