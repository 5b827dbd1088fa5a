//! filabel CLI
//!
//! Command line tool for filename-pattern-based labeling of GitHub PRs

use std::path::PathBuf;

use clap::Parser;

use filabel::config::{load_rules, load_token, Reposlug};
use filabel::github::GitHubClient;
use filabel::output::print_reports;
use filabel::sync::{process_repositories, Context, Options};
use filabel::PullState;

/// CLI tool for filename-pattern-based labeling of GitHub PRs
#[derive(Parser, Debug)]
#[command(name = "filabel", version, about)]
struct Cli {
    /// Filter pulls by state
    #[arg(short = 's', long, value_enum, default_value = "open")]
    state: PullState,

    /// Delete labels that do not match anymore (default)
    #[arg(short = 'd', long = "delete-old", overrides_with = "no_delete_old")]
    delete_old: bool,

    /// Keep labels that do not match anymore
    #[arg(short = 'D', long = "no-delete-old")]
    no_delete_old: bool,

    /// Filter pulls by base (PR target) branch name
    #[arg(short = 'b', long = "base", value_name = "BRANCH")]
    base: Option<String>,

    /// File with authorization configuration
    #[arg(short = 'a', long = "config-auth", value_name = "FILE")]
    config_auth: PathBuf,

    /// File with labels configuration
    #[arg(short = 'l', long = "config-labels", value_name = "FILE")]
    config_labels: PathBuf,

    /// Use asynchronous (faster) logic
    #[arg(short = 'x', long = "async")]
    concurrent: bool,

    /// Repositories to process, as owner/name reposlugs
    #[arg(value_name = "REPOSLUG", required = true)]
    reposlugs: Vec<String>,
}

impl Cli {
    fn delete_old(&self) -> bool {
        !self.no_delete_old
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let mut slugs = Vec::with_capacity(cli.reposlugs.len());
    for raw in &cli.reposlugs {
        match raw.parse::<Reposlug>() {
            Ok(slug) => slugs.push(slug),
            Err(_) => {
                eprintln!("Reposlug {} not valid!", raw);
                return 1;
            }
        }
    }

    let token = match load_token(&cli.config_auth) {
        Ok(token) => token,
        Err(_) => {
            eprintln!("Auth configuration not usable!");
            return 1;
        }
    };
    let rules = match load_rules(&cli.config_labels) {
        Ok(rules) => rules,
        Err(_) => {
            eprintln!("Labels configuration not usable!");
            return 1;
        }
    };

    let github = match GitHubClient::new(&token) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", err);
            return 1;
        }
    };
    // Invalid credentials are the one run-fatal condition
    if let Err(err) = github.authenticated_user().await {
        eprintln!("{}", err);
        return 1;
    }

    let opts = Options {
        state: Some(cli.state),
        base: cli.base.clone(),
        delete_old: cli.delete_old(),
        concurrent: cli.concurrent,
    };
    let ctx = Context { github, rules };

    let reports = process_repositories(&ctx, &slugs, &opts).await;
    print_reports(&reports);
    0
}
