use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use serde::Serialize;

use alecton::api::{Application, ApplicationsClient};

#[derive(Parser)]
#[command(name = "alectonctl", version)]
#[command(about = "Command-line client for the Alecton server", long_about = None)]
struct Cli {
    /// Base URL of the server's remote-call listener
    #[arg(long, global = true, env = "ALECTON_ADDRESS", default_value = "http://127.0.0.1:8080")]
    address: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with applications
    Application {
        #[command(subcommand)]
        command: Option<ApplicationCommand>,
    },
}

#[derive(Subcommand)]
enum ApplicationCommand {
    /// List applications
    List,
    /// Get an application
    Get {
        /// Application name
        name: String,
    },
    /// Create an application from a YAML file
    Create {
        /// Path to the YAML definition
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let Commands::Application { command } = cli.command;
    let Some(command) = command else {
        let mut cmd = Cli::command();
        cmd.build();
        if let Some(application) = cmd.find_subcommand_mut("application") {
            application.print_help()?;
        }
        return Ok(());
    };

    let client = ApplicationsClient::new(&cli.address, Duration::from_secs(cli.timeout))?;

    match command {
        ApplicationCommand::List => print_json(&client.list_applications().await?),
        ApplicationCommand::Get { name } => print_json(&client.get_application(&name).await?),
        ApplicationCommand::Create { file } => {
            let application = read_application(&file)?;
            print_json(&client.create_application(&application).await?)
        }
    }
}

fn read_application(path: &Path) -> anyhow::Result<Application> {
    let document = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Application::from_yaml(&document)
        .with_context(|| format!("failed to decode application from {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
