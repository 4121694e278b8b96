//! gitup: keep many local git repositories in sync with their remotes
//! `discover` scans configured directories into a cache; `sync` updates every cached repository.

use anyhow::{anyhow, bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as ClapCommand};
use console::Term;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use gitup::core::{
    cache_age, create_spinner, default_cache_path, default_config_path, find_repositories,
    is_cache_stale, load_cache, resolve_concurrency, save_cache, set_terminal_title_and_flush,
    sync_repositories, AppConfig, SyncConfig, SyncProgress, NO_REPOS_MESSAGE, STALE_CACHE_DAYS,
};
use gitup::git::{RepositoryDescriptor, RepositoryUpdater};
use gitup::logging::init_tracing;
use gitup::utils::{supports_color, terminal_width};

const APP_NAME: &str = "gitup";

fn build_cli() -> ClapCommand {
    ClapCommand::new(APP_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep many local git repositories in sync with their remotes, in parallel")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: <config dir>/gitup/config.toml)"),
        )
        .arg(
            Arg::new("repos-file")
                .short('r')
                .long("repos-file")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Repository cache (default: <cache dir>/gitup/repositories.json)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print a line per repository and enable info logging"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Disable colored output"),
        )
        .subcommand(
            ClapCommand::new("discover")
                .visible_alias("scan")
                .about("Scan directories for repositories and save them to the cache")
                .arg(
                    Arg::new("directories")
                        .value_name("DIR")
                        .num_args(0..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directories to scan instead of the configured ones"),
                ),
        )
        .subcommand(
            ClapCommand::new("sync")
                .visible_alias("update")
                .about("Update every cached repository")
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .help("Number of repositories updated concurrently (default: CPU count)"),
                )
                .arg(
                    Arg::new("sequential")
                        .long("sequential")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("jobs")
                        .help("Update one repository at a time"),
                )
                .arg(
                    Arg::new("stat")
                        .short('s')
                        .long("stat")
                        .action(ArgAction::SetTrue)
                        .help("Show a diff-stat for every repository that changed"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_name("SECS")
                        .value_parser(value_parser!(u64))
                        .help("Stop starting new work and abort fetches after SECS seconds"),
                ),
        )
}

/// Loads the config file named on the command line, or the default one if it exists
fn load_app_config(matches: &ArgMatches) -> Result<Option<AppConfig>> {
    if let Some(path) = matches.get_one::<PathBuf>("config") {
        return AppConfig::load(path).map(Some);
    }
    match default_config_path() {
        Some(path) if path.exists() => AppConfig::load(&path).map(Some),
        _ => Ok(None),
    }
}

fn cache_path(matches: &ArgMatches) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>("repos-file")
        .cloned()
        .or_else(default_cache_path)
        .ok_or_else(|| anyhow!("cannot determine a cache directory; pass --repos-file"))
}

async fn discover(
    directories: Vec<PathBuf>,
    cache: &Path,
    verbose: bool,
) -> Result<Vec<RepositoryDescriptor>> {
    let spinner = create_spinner("🔍 Scanning for git repositories...")?;
    let counter = spinner.clone();
    let repos = tokio::task::spawn_blocking(move || {
        find_repositories(&directories, move |count| {
            counter.set_message(format!("🔍 Scanning for git repositories... {count} found"));
        })
    })
    .await
    .context("Repository discovery failed")?;
    spinner.finish_and_clear();

    save_cache(cache, &repos)?;
    info!(count = repos.len(), cache = %cache.display(), "saved repository cache");

    let repo_word = if repos.len() == 1 { "repository" } else { "repositories" };
    println!("Found {} {}", repos.len(), repo_word);
    if verbose {
        for repo in &repos {
            if repo.has_upstream {
                println!("  {} (has upstream)", repo.display_path());
            } else {
                println!("  {}", repo.display_path());
            }
        }
    }
    Ok(repos)
}

fn configured_directories(matches: &ArgMatches, sub: &ArgMatches) -> Result<Vec<PathBuf>> {
    let explicit: Vec<PathBuf> = sub
        .get_many::<PathBuf>("directories")
        .map(|dirs| dirs.cloned().collect())
        .unwrap_or_default();
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    let config = load_app_config(matches)?.ok_or_else(|| {
        anyhow!(
            "no config file found; create {} with `directories = [\"~/src\"]` or pass directories",
            default_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "config.toml".to_string())
        )
    })?;
    Ok(config.directories)
}

/// Asks whether to rescan when the cache is old; non-interactive runs only get a notice
fn confirm_rescan() -> bool {
    let term = Term::stdout();
    let notice = format!("Repository list is older than {STALE_CACHE_DAYS} days.");
    if !term.is_term() {
        println!("{notice} Run '{APP_NAME} discover' to refresh it.");
        return false;
    }
    if term
        .write_str(&format!("{notice} Scan again now? [Y/n] "))
        .is_err()
    {
        return false;
    }
    match term.read_line() {
        Ok(answer) => {
            let answer = answer.trim().to_lowercase();
            answer.is_empty() || answer == "y" || answer == "yes"
        }
        Err(_) => false,
    }
}

fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<u64>) {
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; finishing repositories already being written");
            on_interrupt.cancel();
        }
    });

    if let Some(secs) = timeout {
        let on_deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(seconds = secs, "deadline reached; cancelling remaining work");
            on_deadline.cancel();
        });
    }
}

async fn sync(
    matches: &ArgMatches,
    sub: &ArgMatches,
    verbose: bool,
    color: bool,
) -> Result<ExitCode> {
    let cache = cache_path(matches)?;
    let app_config = match load_app_config(matches) {
        Ok(config) => config,
        Err(e) if matches.get_one::<PathBuf>("config").is_none() => {
            warn!(error = %e, "ignoring unreadable default config");
            None
        }
        Err(e) => return Err(e),
    };

    let mut repos = load_cache(&cache)?;
    let stale = cache_age(&cache)?.is_some_and(is_cache_stale);
    if stale && confirm_rescan() {
        let directories = app_config
            .as_ref()
            .map(|c| c.directories.clone())
            .ok_or_else(|| anyhow!("no config file found; cannot rescan"))?;
        repos = discover(directories, &cache, verbose).await?;
    }
    if repos.is_empty() {
        bail!(NO_REPOS_MESSAGE);
    }

    let concurrency = resolve_concurrency(
        sub.get_one::<usize>("jobs").copied(),
        sub.get_flag("sequential"),
        app_config.as_ref().and_then(|c| c.concurrency),
    );
    let show_stats = sub.get_flag("stat") || app_config.as_ref().is_some_and(|c| c.show_stats);
    let config = SyncConfig::default()
        .with_concurrency(concurrency)
        .with_stats(show_stats)
        .with_verbose(verbose)
        .with_display(terminal_width(), color);

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, sub.get_one::<u64>("timeout").copied());

    let start_time = Instant::now();
    let mut progress = SyncProgress::new(repos.len(), &config)?;
    let report = sync_repositories(
        RepositoryUpdater::new(&config),
        repos,
        &config,
        cancel,
        &mut progress,
    )
    .await;

    println!("{}", report.generate_summary(start_time.elapsed()));
    let detailed_summary = report.generate_detailed_summary();
    if !detailed_summary.is_empty() {
        println!("\n{}", "━".repeat(70));
        println!("{}", detailed_summary);
        println!("{}", "━".repeat(70));
    }
    if let Some(stats) = report.diff_stats().filter(|s| !s.is_empty()) {
        println!("\n{stats}");
    }

    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Grace period for blocking git work still running when the command returns
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn main() -> Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let result = runtime.block_on(run());
    // A fetch abandoned on cancellation can keep its blocking thread busy until
    // the transport times out; don't hold the exit for it
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
    result
}

async fn run() -> Result<ExitCode> {
    let matches = build_cli().get_matches();
    let verbose = matches.get_flag("verbose");
    init_tracing(verbose);

    let no_color = matches.get_flag("no-color");
    if no_color {
        console::set_colors_enabled(false);
    }
    let color = !no_color && supports_color();

    let interactive = Term::stdout().is_term();
    if interactive {
        set_terminal_title_and_flush("🚀 gitup");
    }

    let result = match matches.subcommand() {
        Some(("discover", sub)) => {
            let cache = cache_path(&matches)?;
            let directories = configured_directories(&matches, sub)?;
            discover(directories, &cache, verbose)
                .await
                .map(|_| ExitCode::SUCCESS)
        }
        Some(("sync", sub)) => sync(&matches, sub, verbose, color).await,
        _ => unreachable!("clap requires a subcommand"),
    };

    // Set terminal title to green checkbox to indicate completion
    if interactive {
        set_terminal_title_and_flush("✅ gitup");
    }
    result
}
