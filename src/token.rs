//! Syntactic checks for GitHub access tokens.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(gh[ps]_[a-zA-Z0-9]{36}|github_pat_[a-zA-Z0-9]{22}_[a-zA-Z0-9]{59})$")
        .unwrap()
});

/// Does `token` look like a GitHub personal access token?
///
/// Both classic (`ghp_`/`ghs_`) and fine-grained (`github_pat_`) formats are
/// recognised. This never touches the network, so a revoked token which is
/// still well formed will pass.
pub fn validate_token(token: &str) -> bool {
    TOKEN_PATTERN.is_match(token)
}
