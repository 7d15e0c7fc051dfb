use failure::Error;
use secrecy::SecretString;
use std::fs;
use std::path::PathBuf;

use crate::config::Config;
use crate::errors::{display_chain, FilesystemError};
use crate::github::GitHub;
use crate::pacing::{Clock, Pacer, SystemClock};
use crate::Provider;

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Each repository that was saved, and where it went.
    pub downloaded: Vec<(String, PathBuf)>,
    /// Repositories whose archive couldn't be downloaded.
    pub failed: Vec<String>,
    /// Listing entries without a usable name.
    pub skipped: usize,
    /// Listing the repositories failed, so nothing was attempted.
    pub listing_failed: bool,
}

impl Summary {
    pub fn attempted(&self) -> usize {
        self.downloaded.len() + self.failed.len()
    }

    fn log(&self) {
        if self.listing_failed {
            info!("Nothing was downloaded because the repositories couldn't be listed");
            return;
        }

        info!(
            "Downloaded {} of {} repositories ({} failed, {} skipped)",
            self.downloaded.len(),
            self.attempted(),
            self.failed.len(),
            self.skipped
        );

        for name in &self.failed {
            debug!("Failed: {}", name);
        }
    }
}

/// Downloads each repository a `Provider` lists, one at a time, with a
/// minimum gap between requests.
#[derive(Debug)]
pub struct Driver<P, C> {
    provider: P,
    pacer: Pacer<C>,
    config: Config,
}

impl<P: Provider, C: Clock> Driver<P, C> {
    pub fn new(provider: P, clock: C, config: Config) -> Driver<P, C> {
        let pacer = Pacer::new(clock, config.min_interval());

        Driver {
            provider,
            pacer,
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// List the repositories once and download each of them in order.
    ///
    /// Failing to list is the end of the run, while a failed download only
    /// skips that repository. Neither is reported as an `Err`.
    pub fn run(&mut self) -> Summary {
        info!("Fetching repositories from {}", self.provider.name());

        let repos = match self.provider.repositories() {
            Ok(repos) => repos,
            Err(e) => {
                error!("Failed to retrieve repositories. Error: {}", display_chain(&e));
                return Summary {
                    listing_failed: true,
                    ..Default::default()
                };
            }
        };

        info!("Found {} repos from {}", repos.len(), self.provider.name());

        let dest_dir = &self.config.general.dest_dir;
        let mut summary = Summary::default();
        self.pacer.mark();

        for repo in &repos {
            let name = match repo.usable_name() {
                Some(name) => name,
                None => {
                    warn!("Invalid name for repo: {:?}", repo);
                    // the next download is still timed from here
                    self.pacer.mark();
                    summary.skipped += 1;
                    continue;
                }
            };

            let branch = self
                .config
                .github
                .branch_for(repo.default_branch.as_deref());

            self.pacer.pace();

            match self.provider.download_archive(name, branch, dest_dir) {
                Ok(path) => {
                    info!("{} downloaded to {}", name, path.display());
                    summary.downloaded.push((name.to_string(), path));
                }
                Err(e) => {
                    error!("Failed to download {}. Error: {}", name, display_chain(&e));
                    summary.failed.push(name.to_string());
                }
            }
        }

        summary.log();
        summary
    }
}

/// Download every repository owned by `config.github.username` into
/// `config.general.dest_dir`.
///
/// The only hard errors are failing to create the download directory or the
/// HTTP client. Everything after that is logged and reported in the
/// `Summary`.
pub fn download_all_repositories(config: &Config, token: SecretString) -> Result<Summary, Error> {
    let dest_dir = &config.general.dest_dir;
    debug!("Making sure {} exists", dest_dir.display());

    fs::create_dir_all(dest_dir).map_err(|inner| FilesystemError {
        path: dest_dir.display().to_string(),
        inner,
    })?;

    let github = GitHub::new(config.github.clone(), token)?;
    let mut driver = Driver::new(github, SystemClock, config.clone());

    Ok(driver.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DownloadError, ListingError};
    use crate::pacing::fake::FakeClock;
    use crate::RepositoryDescriptor;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::path::Path;
    use std::time::Duration;

    /// A provider which records every download attempt (and when it happened)
    /// instead of touching the network.
    struct Recorder {
        clock: FakeClock,
        listing: Option<Vec<RepositoryDescriptor>>,
        broken: Vec<&'static str>,
        latency: Duration,
        calls: RefCell<Vec<(String, String, Duration)>>,
    }

    impl Recorder {
        fn new(clock: &FakeClock, listing: Vec<RepositoryDescriptor>) -> Recorder {
            Recorder {
                clock: clock.clone(),
                listing: Some(listing),
                broken: Vec::new(),
                latency: Duration::from_millis(0),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn names(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.0.clone()).collect()
        }

        fn times(&self) -> Vec<Duration> {
            self.calls.borrow().iter().map(|c| c.2).collect()
        }
    }

    impl Provider for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn repositories(&self) -> Result<Vec<RepositoryDescriptor>, ListingError> {
            self.listing.clone().ok_or_else(|| ListingError::Status {
                url: String::from("https://example.com/search"),
                status: StatusCode::UNAUTHORIZED,
            })
        }

        fn download_archive(
            &self,
            repo: &str,
            branch: &str,
            dest_dir: &Path,
        ) -> Result<PathBuf, DownloadError> {
            self.calls.borrow_mut().push((
                repo.to_string(),
                branch.to_string(),
                self.clock.elapsed(),
            ));
            self.clock.advance(self.latency);

            if self.broken.contains(&repo) {
                Err(DownloadError::Status {
                    url: format!("https://example.com/{}", repo),
                    status: StatusCode::NOT_FOUND,
                })
            } else {
                Ok(dest_dir.join(format!("{}.zip", repo)))
            }
        }
    }

    fn config(min_delay_ms: u64) -> Config {
        let mut cfg = Config::default();
        cfg.github.username = String::from("acme");
        cfg.general.dest_dir = PathBuf::from("/downloads");
        cfg.general.min_delay_ms = min_delay_ms;
        cfg
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn every_repo_is_downloaded_in_order_and_spaced_out() {
        let clock = FakeClock::new();
        let listing = vec!["a", "b", "c", "d"]
            .into_iter()
            .map(RepositoryDescriptor::named)
            .collect();
        let provider = Recorder::new(&clock, listing);
        let mut driver = Driver::new(provider, clock.clone(), config(100));

        let summary = driver.run();

        assert_eq!(driver.provider().names(), vec!["a", "b", "c", "d"]);
        let times = driver.provider().times();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= ms(100));
        }
        assert!(clock.elapsed() >= ms(3 * 100));
        assert_eq!(summary.downloaded.len(), 4);
        assert_eq!(
            summary.downloaded[0],
            (String::from("a"), PathBuf::from("/downloads/a.zip"))
        );
    }

    #[test]
    fn entries_without_a_name_are_skipped() {
        let clock = FakeClock::new();
        let listing = vec![
            RepositoryDescriptor::named("a"),
            RepositoryDescriptor::named("b"),
            RepositoryDescriptor::named(""),
        ];
        let provider = Recorder::new(&clock, listing);
        let mut driver = Driver::new(provider, clock.clone(), config(0));

        let summary = driver.run();

        assert_eq!(driver.provider().names(), vec!["a", "b"]);
        assert_eq!(summary.downloaded.len(), 2);
        assert_eq!(summary.skipped, 1);
        assert!(summary.failed.is_empty());
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn a_skipped_entry_still_restarts_the_pacing_clock() {
        let clock = FakeClock::new();
        let listing = vec![
            RepositoryDescriptor::named("a"),
            RepositoryDescriptor::default(),
            RepositoryDescriptor::named("b"),
        ];
        let mut provider = Recorder::new(&clock, listing);
        provider.latency = ms(30);
        let mut driver = Driver::new(provider, clock.clone(), config(100));

        let summary = driver.run();

        // "a" goes out at 100ms and takes 30ms, the skip marks 130ms
        assert_eq!(driver.provider().times(), vec![ms(100), ms(230)]);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn failed_downloads_dont_stop_the_batch() {
        let clock = FakeClock::new();
        let listing = vec!["a", "missing", "c"]
            .into_iter()
            .map(RepositoryDescriptor::named)
            .collect();
        let mut provider = Recorder::new(&clock, listing);
        provider.broken.push("missing");
        let mut driver = Driver::new(provider, clock.clone(), config(0));

        let summary = driver.run();

        assert_eq!(driver.provider().names(), vec!["a", "missing", "c"]);
        assert_eq!(summary.failed, vec![String::from("missing")]);
        assert_eq!(summary.downloaded.len(), 2);
        assert_eq!(summary.attempted(), 3);
    }

    #[test]
    fn a_failed_listing_ends_the_run_quietly() {
        let clock = FakeClock::new();
        let mut provider = Recorder::new(&clock, Vec::new());
        provider.listing = None;
        let mut driver = Driver::new(provider, clock.clone(), config(500));

        let summary = driver.run();

        assert!(summary.listing_failed);
        assert!(driver.provider().names().is_empty());
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn listed_default_branches_can_be_used() {
        let clock = FakeClock::new();
        let listing = vec![
            RepositoryDescriptor {
                name: Some(String::from("a")),
                default_branch: Some(String::from("main")),
            },
            RepositoryDescriptor::named("b"),
        ];
        let provider = Recorder::new(&clock, listing.clone());
        let mut cfg = config(0);
        let mut driver = Driver::new(provider, clock.clone(), cfg.clone());
        driver.run();

        let branches: Vec<String> = driver
            .provider()
            .calls
            .borrow()
            .iter()
            .map(|c| c.1.clone())
            .collect();
        assert_eq!(branches, vec!["master", "master"]);

        cfg.github.use_default_branch = true;
        let provider = Recorder::new(&clock, listing);
        let mut driver = Driver::new(provider, clock.clone(), cfg);
        driver.run();

        let branches: Vec<String> = driver
            .provider()
            .calls
            .borrow()
            .iter()
            .map(|c| c.1.clone())
            .collect();
        assert_eq!(branches, vec!["main", "master"]);
    }

    #[test]
    fn the_download_directory_is_created() {
        let temp = tempfile::tempdir().unwrap();
        let mut cfg = config(0);
        cfg.general.dest_dir = temp.path().join("nested").join("dir");
        cfg.github.api_url = String::from("http://127.0.0.1:9");
        let token = SecretString::from(format!("ghp_{}", "0".repeat(36)));

        let summary = download_all_repositories(&cfg, token).unwrap();

        assert!(cfg.general.dest_dir.is_dir());
        assert!(summary.listing_failed);
    }

    #[test]
    fn an_uncreatable_directory_is_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();
        let mut cfg = config(0);
        cfg.general.dest_dir = blocker.join("dir");
        let token = SecretString::from(format!("ghp_{}", "0".repeat(36)));

        let err = download_all_repositories(&cfg, token).unwrap_err();

        assert!(err.downcast_ref::<FilesystemError>().is_some());
    }
}
