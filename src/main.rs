use clap::{Parser, Subcommand};
use std::path::PathBuf;

use audio_scribe::config::AppConfig;
use audio_scribe::serve;

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio transcription and summarization web service")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web application
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Port to listen on (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => {
            let config_content = std::fs::read_to_string(&config).map_err(|e| {
                format!("Failed to read config file '{}': {}", config.display(), e)
            })?;
            let mut app_config: AppConfig = toml::from_str(&config_content).map_err(|e| {
                format!("Failed to parse config file '{}': {}", config.display(), e)
            })?;
            if let Some(port) = port {
                app_config.port = port;
            }
            serve::run(app_config)?;
            Ok(())
        }
    }
}
