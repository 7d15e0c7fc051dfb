//! The errors encountered in this crate.

use failure::Fail;
use reqwest::StatusCode;
use std::io;

/// Problems with the supplied configuration. These are always detected
/// before any network activity happens.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum ConfigError {
    #[fail(display = "The GitHub username is empty")]
    EmptyUsername,
    #[fail(display = "The download path is empty")]
    EmptyDownloadPath,
    #[fail(display = "The download path must be absolute, got \"{}\"", _0)]
    RelativeDownloadPath(String),
    #[fail(display = "The GitHub token isn't a recognised personal access token")]
    MalformedToken,
}

/// The download directory couldn't be created.
#[derive(Debug, Fail)]
#[fail(display = "Unable to create the download directory ({})", path)]
pub struct FilesystemError {
    pub path: String,
    #[fail(cause)]
    pub inner: io::Error,
}

/// Listing an account's repositories failed.
#[derive(Debug, Fail)]
pub enum ListingError {
    #[fail(display = "Unable to send the search request")]
    Request(#[fail(cause)] reqwest::Error),
    #[fail(display = "Search request to {} failed with {}", url, status)]
    Status { url: String, status: StatusCode },
    #[fail(display = "Unable to deserialize the search results")]
    Decode(#[fail(cause)] reqwest::Error),
}

/// Downloading a single archive failed.
#[derive(Debug, Fail)]
pub enum DownloadError {
    #[fail(display = "Unable to send the archive request")]
    Request(#[fail(cause)] reqwest::Error),
    #[fail(display = "Archive request to {} failed with {}", url, status)]
    Status { url: String, status: StatusCode },
    #[fail(display = "Unable to write the archive to disk")]
    Io(#[fail(cause)] io::Error),
}

impl DownloadError {
    /// The HTTP status the server responded with, if we got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match *self {
            DownloadError::Status { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// Render an error and everything that caused it on a single line.
pub fn display_chain(fail: &dyn Fail) -> String {
    let mut msg = fail.to_string();

    for cause in fail.iter_causes() {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn causes_are_appended() {
        let err = FilesystemError {
            path: String::from("/nope"),
            inner: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };

        assert_eq!(
            display_chain(&err),
            "Unable to create the download directory (/nope): permission denied"
        );
    }
}
