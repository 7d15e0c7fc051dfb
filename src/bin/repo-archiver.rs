#[macro_use]
extern crate log;

use failure::{Error, ResultExt};
use repo_archiver::config::expand_path;
use repo_archiver::errors::{display_chain, ConfigError};
use repo_archiver::{logging, Config};
use secrecy::SecretString;
use std::process;
use structopt::StructOpt;

fn main() {
    let args = Args::from_args();

    if args.example_config {
        generate_example();
        return;
    }

    if let Err(e) = logging::initialize(args.verbosity) {
        eprintln!("Error: Unable to initialize logging, {}", e);
        process::exit(1);
    }

    if let Err(e) = run(args) {
        if let Some(cfg_err) = e.downcast_ref::<ConfigError>() {
            error!("{}", cfg_err);
        } else {
            error!("{}", display_chain(e.as_fail()));
        }

        process::exit(1);
    }
}

fn generate_example() {
    match Config::example().as_toml() {
        Ok(example) => println!("{}", example),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let cfg = args.config()?;

    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", cfg).lines() {
            debug!("{}", line);
        }
    }

    let token = SecretString::from(args.token.unwrap_or_default());
    cfg.validate(&token)?;

    info!("Download Started");
    repo_archiver::download_all_repositories(&cfg, token)?;
    info!("Download Ended");

    Ok(())
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Download every repository of a GitHub account as a zip archive.")]
struct Args {
    #[structopt(short = "c", long = "config", help = "A TOML config file to load settings from.")]
    config_file: Option<String>,
    #[structopt(
        short = "u",
        long = "username",
        env = "GITHUB_USERNAME",
        help = "The account whose repositories will be downloaded."
    )]
    username: Option<String>,
    #[structopt(
        short = "t",
        long = "token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "A GitHub personal access token."
    )]
    token: Option<String>,
    #[structopt(
        short = "d",
        long = "download-path",
        env = "DOWNLOAD_PATH",
        help = "Where to save the archives (defaults to ~/GithubRepoDownloader_repos)."
    )]
    download_path: Option<String>,
    #[structopt(long = "min-delay", help = "Minimum milliseconds between two downloads.")]
    min_delay: Option<u64>,
    #[structopt(long = "branch", help = "The branch to download (defaults to master).")]
    branch: Option<String>,
    #[structopt(
        long = "use-default-branch",
        help = "Download each repository's listed default branch instead of --branch."
    )]
    use_default_branch: bool,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Verbose output (repeat for more verbosity)"
    )]
    verbosity: u64,
    #[structopt(long = "example-config", help = "Generate an example config and immediately exit.")]
    example_config: bool,
}

impl Args {
    /// Load the config file (if any), then apply the command line overrides.
    fn config(&self) -> Result<Config, Error> {
        let mut cfg = match self.config_file {
            Some(ref file) => {
                let file = expand_path(file)?;
                Config::from_file(&file).context("Couldn't load the config")?
            }
            None => Config::default(),
        };

        if let Some(ref username) = self.username {
            cfg.github.username = username.clone();
        }
        if let Some(ref path) = self.download_path {
            cfg.general.dest_dir = path.into();
        }
        if let Some(delay) = self.min_delay {
            cfg.general.min_delay_ms = delay;
        }
        if let Some(ref branch) = self.branch {
            cfg.github.branch = branch.clone();
        }
        if self.use_default_branch {
            cfg.github.use_default_branch = true;
        }

        cfg.expand_paths()?;

        Ok(cfg)
    }
}
