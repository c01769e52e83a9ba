use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repofetch::{
    plan_tasks, spawn_interrupt_watcher, CancelHandle, Config, GitHubClient, RunOptions,
    RunSummary, TaskRunner,
};

#[derive(Parser)]
#[command(name = "repofetch")]
#[command(about = "Clone or update every repository of a GitHub user or organization")]
#[command(version)]
struct Cli {
    /// GitHub user or organization whose repositories to fetch
    account: Option<String>,

    /// Update (git pull) repositories that are already cloned
    #[arg(short, long)]
    update: bool,

    /// Exclude forked repositories
    #[arg(long)]
    skip_forks: bool,

    /// Forward git's output to the terminal
    #[arg(short, long)]
    verbose: bool,

    /// Store an API token for authenticated requests, then exit
    #[arg(long, value_name = "TOKEN")]
    save_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = Config::load_or_default()?;

    if let Some(token) = cli.save_token {
        return cmd_save_token(token, config);
    }

    let Some(account) = cli.account else {
        Cli::command().print_help()?;
        std::process::exit(1);
    };

    let options = RunOptions {
        update: cli.update,
        skip_forks: cli.skip_forks,
        verbose: cli.verbose,
    };

    match run(&account, &options, &config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<repofetch::Error>()
                .map(|err| err.exit_code())
                .unwrap_or(2);
            std::process::exit(code);
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Persist an API token for later runs.
fn cmd_save_token(token: String, mut config: Config) -> Result<()> {
    config.token = Some(token);
    let path = Config::default_config_path()?;
    config.save(&path)?;
    println!("Token saved to {}", path.display());
    Ok(())
}

/// The four phases of a run: discover pages, collect repos, plan tasks,
/// run tasks. Each phase short-circuits on error; only discovery-phase
/// errors are fatal for the run.
async fn run(account: &str, options: &RunOptions, config: &Config) -> Result<RunSummary> {
    let client = GitHubClient::new(config)?;

    println!("* Fetching repository pages");
    let pages = client.walk_pages(&client.list_url(account)).await?;

    println!("* Fetching repository urls");
    let repos = client.collect_repos(&pages, options.skip_forks).await?;

    let root = std::env::current_dir().context("Failed to determine working directory")?;
    let tasks = plan_tasks(&root, account, repos, options)?;

    if tasks.is_empty() {
        println!("* Nothing to do, all repositories are already in place");
        return Ok(RunSummary::default());
    }

    info!("Planned {} task(s)", tasks.len());

    let cancel = CancelHandle::new();
    spawn_interrupt_watcher(cancel.clone());

    let runner = TaskRunner::new(root, options.verbose, cancel.clone());
    let planned = tasks.len();
    let outcomes = runner.run(tasks).await;

    Ok(RunSummary::from_outcomes(&outcomes, planned))
}

fn print_summary(summary: &RunSummary) {
    println!("* Done!");
    if summary.total_tasks == 0 {
        return;
    }

    println!(
        "  {} succeeded, {} failed of {} task(s)",
        summary.succeeded, summary.failed, summary.total_tasks
    );
    if summary.cancelled > 0 {
        println!("  {} task(s) cancelled by interrupt", summary.cancelled);
    }
}
