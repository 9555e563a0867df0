// ABOUTME: Entry point for the tunnelkeeper CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use output::Output;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tunnelkeeper::config::{self, TunnelFile};
use tunnelkeeper::error::{Error, Result};
use tunnelkeeper::ssh::{KeyGenerator, SshCommand};
use tunnelkeeper::Tunnel;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output);
    let result = run(cli.command, &mut output).await;

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(command: Commands, output: &mut Output) -> Result<()> {
    match command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Check { config } => check(config),
        Commands::Open {
            config,
            watch_interval,
        } => open(config, watch_interval, output).await,
        Commands::Keygen { out, program } => keygen(out.as_deref(), program, output),
    }
}

fn load_file(path: Option<PathBuf>) -> Result<TunnelFile> {
    match path {
        Some(path) => TunnelFile::load(&path),
        None => TunnelFile::discover(&env::current_dir()?),
    }
}

/// Validate the config and print the command that `open` would run.
fn check(path: Option<PathBuf>) -> Result<()> {
    let (params, options) = load_file(path)?.into_parts()?;
    let config = params.validate()?;
    let command = SshCommand::build(&config, Path::new("<key-file>"), &options);
    println!("{command}");
    Ok(())
}

async fn open(path: Option<PathBuf>, watch_interval: Duration, output: &mut Output) -> Result<()> {
    let (params, options) = load_file(path)?.into_parts()?;

    output.progress("Opening SSH tunnel...");
    output.start_timer();

    // open() blocks for the settle delay
    let tunnel = tokio::task::spawn_blocking(move || Tunnel::with_config(params, options))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

    if let Some(status) = tunnel.status() {
        output.status("SSH tunnel established", &status);
    }
    if let Some(addr) = tunnel.local_addr() {
        output.progress(&format!("Forwarding {addr}; press Ctrl-C to close"));
    }

    let mut ticker = tokio::time::interval(watch_interval);
    ticker.tick().await;

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            _ = ticker.tick() => {
                match tunnel.status() {
                    Some(status) if status.running => {
                        tracing::debug!(pid = status.pid, "tunnel alive");
                    }
                    Some(status) => {
                        break Err(Error::TunnelLost {
                            pid: status.pid,
                            exit_code: status.exit_code,
                        });
                    }
                    None => break Ok(()),
                }
            }
        }
    };

    tunnel.close();
    if result.is_ok() {
        output.success("SSH tunnel closed");
    }
    result
}

fn keygen(out: Option<&Path>, program: PathBuf, output: &Output) -> Result<()> {
    let generator = KeyGenerator::new().program(program);

    let Some(private_path) = out else {
        let pair = generator.generate()?;
        print!("{}", pair.private);
        print!("{}", pair.public);
        return Ok(());
    };

    let mut public_path = private_path.as_os_str().to_owned();
    public_path.push(".pub");
    let public_path = PathBuf::from(public_path);

    for path in [private_path, public_path.as_path()] {
        if path.exists() {
            return Err(Error::AlreadyExists(path.to_path_buf()));
        }
    }

    let pair = generator.generate()?;
    write_private(private_path, &pair.private)?;
    std::fs::write(&public_path, &pair.public)?;

    output.success(&format!(
        "Wrote {} and {}",
        private_path.display(),
        public_path.display()
    ));
    Ok(())
}

fn write_private(path: &Path, content: &str) -> Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
