//! Curfew CLI - check hosts and credentials against a curfew configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use curfew::{AccessGate, Config, ListKind};

/// Exit code for a denied host or rejected credentials
const EXIT_DENIED: i32 = 2;

#[derive(Parser)]
#[command(name = "curfew")]
#[command(about = "Time-scheduled access control for a forward proxy")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a host may be reached
    Check {
        #[command(flatten)]
        lists: ListArgs,

        /// Host name as sent by the client
        #[arg(long)]
        host: String,

        /// Time to decide at, RFC 3339 (defaults to now, local time)
        #[arg(long)]
        at: Option<String>,
    },

    /// Check proxy credentials against the user list
    Auth {
        #[command(flatten)]
        lists: ListArgs,

        /// Username
        #[arg(short, long)]
        user: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },

    /// Load every configured file and print a summary
    ValidateConfig {
        #[command(flatten)]
        lists: ListArgs,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Blacklist schedule file (overrides config, "" disables)
    #[arg(long)]
    blacklist: Option<String>,

    /// Whitelist schedule file (overrides config, "" disables)
    #[arg(long)]
    whitelist: Option<String>,

    /// Proxy user list file (overrides config, "" disables)
    #[arg(long)]
    userlist: Option<String>,

    /// Verdict when no rule matches and both or neither lists are present
    #[arg(long)]
    default_allow: Option<bool>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long)]
    log_level: Option<String>,
}

impl ListArgs {
    /// Load the config file, apply overrides and start logging
    fn load(self) -> Config {
        let mut cfg = match &self.config {
            Some(path) => or_exit(Config::from_file(path)),
            None => Config::default(),
        };

        if let Some(path) = self.blacklist {
            cfg.lists.blacklist = path;
        }
        if let Some(path) = self.whitelist {
            cfg.lists.whitelist = path;
        }
        if let Some(path) = self.userlist {
            cfg.lists.userlist = path;
        }
        if let Some(allow) = self.default_allow {
            cfg.lists.default_allow = allow;
        }

        let level = self.log_level.unwrap_or_else(|| cfg.logging.level.clone());
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();

        if let Some(path) = &self.config {
            tracing::info!(path = %path.display(), "Loaded configuration");
        }

        cfg
    }
}

/// Print a configuration error and exit with status 1
fn or_exit<T>(result: curfew::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { lists, host, at } => {
            let cfg = lists.load();
            let gate = or_exit(AccessGate::from_config(&cfg));

            let decision = match at {
                Some(at) => {
                    let at = OffsetDateTime::parse(&at, &Rfc3339)
                        .map_err(|e| format!("Invalid --at time '{}': {}", at, e))?;
                    or_exit(gate.decide(at, &host))
                }
                None => or_exit(gate.decide_now(&host)),
            };

            let verdict = if decision.allowed { "ALLOW" } else { "DENY" };
            println!("{} {}", verdict, host);
            match &decision.matched {
                Some(m) => println!(
                    "  {} (line {} of {})",
                    decision,
                    m.rule.line(),
                    match m.list {
                        ListKind::Blacklist => cfg.lists.blacklist.as_str(),
                        ListKind::Whitelist => cfg.lists.whitelist.as_str(),
                    }
                ),
                None => println!("  {}", decision),
            }

            if !decision.allowed {
                std::process::exit(EXIT_DENIED);
            }
        }

        Commands::Auth {
            lists,
            user,
            password,
        } => {
            let cfg = lists.load();
            let gate = or_exit(AccessGate::from_config(&cfg));

            let Some(store) = gate.credentials() else {
                println!("Authentication disabled: no user list loaded");
                return Ok(());
            };

            if or_exit(store.authenticate(&user, &password)) {
                println!("Authenticated {}", user);
            } else {
                println!("Rejected {}", user);
                std::process::exit(EXIT_DENIED);
            }
        }

        Commands::ValidateConfig { lists } => {
            if let Some(path) = &lists.config {
                println!("Validating configuration: {}", path.display());
            }
            let cfg = lists.load();
            let gate = or_exit(AccessGate::from_config(&cfg));

            println!("Configuration is valid!");
            println!();
            println!("{}", or_exit(gate.summary()));
        }
    }

    Ok(())
}
