// ABOUTME: Entry point for the krouo CLI application.
// ABOUTME: Knocks each target's port sequence, then connects over SSH when asked to.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use krouo::config::{self, Config, TargetConfig};
use krouo::error::{Error, Result};
use krouo::knock::KnockClient;
use krouo::ssh::{Session, SessionConfig};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)?;
            println!("Wrote {}", config::CONFIG_FILENAME);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Knock { target } => {
            let config = Config::discover(&env::current_dir()?)?;
            for target in config.select_targets(target.as_deref())? {
                knock_target(target).await?;
                println!("✓ Knocked {}", target.host);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { target, command } => {
            let config = Config::discover(&env::current_dir()?)?;
            let command = command.join(" ");
            let mut exit = ExitCode::SUCCESS;
            for target in config.select_targets(target.as_deref())? {
                let code = run_on_target(target, &command).await?;
                if code != 0 {
                    exit = ExitCode::FAILURE;
                }
            }
            Ok(exit)
        }
    }
}

/// Knock a single target's sequence.
async fn knock_target(target: &TargetConfig) -> Result<()> {
    let client = KnockClient::new().attempt_timeout(target.knock_timeout);
    client
        .knock(&target.knock_spec())
        .await
        .map_err(|source| Error::Knock {
            host: target.host.clone(),
            source,
        })
}

/// Knock, then connect and run a command. The SSH step is only attempted
/// once the whole knock sequence has been delivered.
async fn run_on_target(target: &TargetConfig, command: &str) -> Result<u32> {
    knock_target(target).await?;

    let user = target
        .user
        .clone()
        .unwrap_or_else(|| env::var("USER").unwrap_or_else(|_| "root".to_string()));

    let ssh_config = SessionConfig::new(&target.host, &user)
        .port(target.port)
        .trust_on_first_use(target.trust_first_connection);

    let session = Session::connect(ssh_config)
        .await
        .map_err(|source| Error::Ssh {
            host: target.host.clone(),
            source,
        })?;

    let output = session
        .exec(command)
        .await
        .map_err(|source| Error::Ssh {
            host: target.host.clone(),
            source,
        })?;

    print!("{}", output.stdout);
    eprint!("{}", output.stderr);

    session.disconnect().await.map_err(|source| Error::Ssh {
        host: target.host.clone(),
        source,
    })?;

    Ok(output.exit_code)
}
