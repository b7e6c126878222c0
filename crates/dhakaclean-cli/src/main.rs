use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod render;

use dhakaclean_core::dashboard::sample_snapshot;
use dhakaclean_core::{AppConfig, AppServices, ImageFileCamera, UnavailableCamera};
use dhakaclean_server::state::AppState;

#[derive(Parser)]
#[command(name = "dhakaclean", version, about = "Dhaka waste scanner and eco-assistant")]
struct Cli {
    #[arg(long, global = true, help = "YAML config file (defaults apply when omitted)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Listen address, overrides server.bind")]
        bind: Option<String>,
    },
    #[command(about = "Chat with the eco-assistant on stdin")]
    Chat,
    #[command(about = "Classify a waste photo")]
    Scan {
        #[arg(help = "Image file to upload", required_unless_present = "camera")]
        file: Option<PathBuf>,
        #[arg(long, conflicts_with = "file", help = "Use an image file as the camera feed")]
        camera: Option<PathBuf>,
    },
    #[command(about = "Print the city waste overview")]
    Dashboard,
    #[command(about = "Validate the config file")]
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = AppConfig::load(cli.config.as_deref())?;

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("failed to create log dir {}", config.log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "dhakaclean.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    match command {
        Commands::Validate => {
            println!(
                "Config valid. provider: {:?}, model: {}, api key: {}.",
                config.provider.provider_type,
                config.provider.model,
                if config.has_api_key() { "present" } else { "missing" }
            );
        }
        Commands::Dashboard => {
            print!("{}", render::dashboard(&sample_snapshot()));
        }
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| config.server.bind.clone());
            let services = AppServices::from_config(config)?;
            let state = AppState::new(services, Arc::new(UnavailableCamera));
            dhakaclean_server::serve(state, &addr).await?;
        }
        Commands::Chat => {
            run_repl(AppServices::from_config(config)?).await?;
        }
        Commands::Scan { file, camera } => {
            let services = AppServices::from_config(config)?;
            run_scan(&services, file.as_deref(), camera.as_deref()).await?;
        }
    }

    Ok(())
}

async fn run_repl(services: AppServices) -> Result<()> {
    let session = services.conversation();

    for message in session.history() {
        println!("{}", message.text);
    }
    println!("Type 'quit' to exit.");
    println!("---");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input == "quit" || input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match session.send(input).await {
            Ok(reply) => println!("{}", reply.text),
            Err(err) => eprintln!("Error: {err}"),
        }
    }

    Ok(())
}

async fn run_scan(services: &AppServices, file: Option<&Path>, camera: Option<&Path>) -> Result<()> {
    let result = match (file, camera) {
        (_, Some(feed)) => {
            let mut pipeline = services.scanner(Arc::new(ImageFileCamera::new(feed)));
            pipeline.start_camera().await?;
            if let Some(message) = pipeline.camera_error() {
                bail!("{message}");
            }
            pipeline.capture().await?
        }
        (Some(path), None) => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut pipeline = services.scanner(Arc::new(UnavailableCamera));
            pipeline.upload(&bytes, &name).await?
        }
        (None, None) => bail!("scan needs an image file or --camera"),
    };

    print!("{}", render::analysis(&result));
    Ok(())
}
