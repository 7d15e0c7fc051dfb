//! Download every repository belonging to a GitHub account as a zip archive.

#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod driver;
pub mod errors;
pub mod github;
pub mod logging;
pub mod pacing;
pub mod token;

pub use crate::config::Config;
pub use crate::driver::{download_all_repositories, Driver, Summary};
pub use crate::github::{AuthenticatedSession, GitHub};
pub use crate::pacing::{Clock, Pacer, SystemClock};
pub use crate::token::validate_token;

use crate::errors::{DownloadError, ListingError};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Something which can list an account's repositories and fetch their
/// archives.
pub trait Provider {
    fn name(&self) -> &str;

    /// Fetch the repositories to download, in the order they should be
    /// downloaded.
    fn repositories(&self) -> Result<Vec<RepositoryDescriptor>, ListingError>;

    /// Save the archive for `repo` at `branch` into `dest_dir`, returning the
    /// path that was written.
    fn download_archive(
        &self,
        repo: &str,
        branch: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, DownloadError>;
}

/// The bits of a listed repository we care about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositoryDescriptor {
    pub name: Option<String>,
    pub default_branch: Option<String>,
}

impl RepositoryDescriptor {
    pub fn named<S: Into<String>>(name: S) -> RepositoryDescriptor {
        RepositoryDescriptor {
            name: Some(name.into()),
            default_branch: None,
        }
    }

    /// Pull a descriptor out of one entry in a search result. Anything that
    /// isn't a string is treated as missing.
    pub fn from_json(value: &Value) -> RepositoryDescriptor {
        let string_field = |key: &str| value.get(key).and_then(Value::as_str).map(String::from);

        RepositoryDescriptor {
            name: string_field("name"),
            default_branch: string_field("default_branch"),
        }
    }

    /// The repository's name, if it's good enough to build a URL with.
    pub fn usable_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}
