mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use rf_av::ToolRegistry;
use rf_core::config::{self, Config};
use rf_server::context::build_orchestrator;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting reelforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    rf_server::start(config).await?;
    Ok(())
}

async fn run_once(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let output_dir = &config.pipeline.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let tools = ToolRegistry::discover(&config.tools);
    let orchestrator = build_orchestrator(&config, &tools)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; cancelling run");
            on_interrupt.cancel();
        }
    });

    match orchestrator.run(cancel).await {
        Ok(report) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Run {} completed", report.run_id);
                println!("  Title: {}", report.content.title);
                for artifact in &report.artifacts {
                    println!("  {:<10} {}", artifact.stage.as_str(), artifact.path().display());
                }
                match report.receipt.url {
                    Some(ref url) => println!("  Published: {url} ({})", report.receipt.video_id),
                    None => println!("  Published: {}", report.receipt.video_id),
                }
            }
            Ok(())
        }
        Err(failure) => {
            anyhow::bail!(
                "run {} failed at {} stage: {}",
                failure.run_id,
                failure.stage().as_str(),
                failure.error
            )
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelforge=trace,rf_pipeline=trace,rf_providers=debug,rf_av=debug,rf_server=debug,rf_core=debug,tower_http=debug".to_string()
        } else {
            "reelforge=info,rf_pipeline=info,rf_providers=info,rf_av=info,rf_server=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Run { json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_once(cli.config.as_deref(), json))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. ffmpeg is required to compose and caption videos.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Auth enabled: {}", config.server.api_key.is_some());
    println!("  Output dir: {}", config.pipeline.output_dir.display());
    println!(
        "  Background: {}",
        config.pipeline.background.path.display()
    );
    println!("  Subreddit: r/{}", config.reddit.subreddit);
    println!(
        "  Window: {}s at {}x{}",
        config.composition.window_secs, config.composition.width, config.composition.height
    );

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}
