use anyhow::Result;
use clap::Parser;
use console::Term;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use video_notes::api::{ArtifactDownloader, TranscriptApi};
use video_notes::app::terminal::{self, FormDefaults};
use video_notes::cli::{Cli, Commands};
use video_notes::form::FormState;
use video_notes::{output, App, AppUpdate, Config, HttpApiClient, UserAction};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "video_notes=debug,vidnotes=debug"
    } else {
        "video_notes=info,vidnotes=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load().await?;
    if let Some(backend_url) = &cli.backend_url {
        config = config.with_backend_url(backend_url.clone())?;
    }

    let client = Arc::new(HttpApiClient::from_config(&config).with_progress(!cli.quiet));

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => {
            let mut app = App::with_client(client, config.display_delay(), config.download_dir()?)
                .with_indicator(!cli.quiet);
            let defaults = FormDefaults {
                model_size: config.app.default_model_size,
                target_language: config.app.default_target_language.clone(),
            };

            tracing::info!("Using backend at {}", config.backend.base_url);
            let mut term = Term::stdout();
            terminal::run(&mut app, &mut term, &defaults).await?;
        }
        Commands::Process {
            url,
            model_size,
            language,
            json,
            download,
        } => {
            let mut form = FormState::with_defaults(
                model_size.unwrap_or(config.app.default_model_size),
                language.unwrap_or_else(|| config.app.default_target_language.clone()),
            );
            form.set_source_url(url);

            let download_dir = match &download {
                Some(dir) => dir.clone(),
                None => config.download_dir()?,
            };
            let mut app = App::with_client(client, config.display_delay(), download_dir)
                .with_indicator(!cli.quiet && !json);

            app.dispatch(UserAction::Start).await;
            match app.dispatch(UserAction::Submit(form)).await {
                AppUpdate::Completed(view) => {
                    match (json, app.orchestrator().last_result()) {
                        (true, Some(result)) => println!("{}", output::format_result_json(result)?),
                        _ => output::print_results(&view),
                    }
                }
                AppUpdate::FormRejected(errors) => {
                    output::print_form_errors(&errors);
                    anyhow::bail!("Invalid input");
                }
                AppUpdate::Failed { message, .. } => anyhow::bail!("Processing failed: {}", message),
                other => anyhow::bail!("Unexpected state: {:?}", other),
            }

            if download.is_some() {
                if let AppUpdate::Downloads(reports) = app.dispatch(UserAction::DownloadAll).await {
                    output::print_download_reports(&reports);
                    if reports.iter().any(|report| !report.is_success()) {
                        anyhow::bail!("Some downloads failed");
                    }
                }
            }
        }
        Commands::Progress { video_id } => {
            let status = client.query_progress(&video_id).await?;
            output::print_progress(&status);
        }
        Commands::Download {
            video_id,
            kind,
            output,
        } => {
            let dir: PathBuf = match output {
                Some(dir) => dir,
                None => config.download_dir()?,
            };
            let path = client.download(&video_id, kind, &dir).await?;
            println!("{} saved to: {}", kind.title(), path.display());
        }
        Commands::Languages => {
            println!("Target languages:");
            output::print_languages();
            println!();
            println!("Model sizes:");
            output::print_model_sizes();
        }
        Commands::Config { show, init } => {
            if init {
                let path = config.save().await?;
                println!("Configuration written to: {}", path.display());
            } else {
                config.display();
                if !show {
                    println!();
                    println!("Edit the config file to change these settings:");
                    println!("  {}", Config::config_path()?.display());
                }
            }
        }
    }

    Ok(())
}
