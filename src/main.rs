// src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;

use actix_web::{App, HttpServer, middleware, web};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::info;

use interior_designer::config::Settings;
use interior_designer::errors::truncate_chars;
use interior_designer::handlers::{self, OUTPUT_ROUTE};
use interior_designer::models::{Budget, DesignPreferences, ModelTier};
use interior_designer::pipeline::RunOptions;
use interior_designer::report::{self, RenderContext};
use interior_designer::services::SessionStore;
use interior_designer::AppState;

const SUMMARY_PREVIEW_CHARS: usize = 500;
const RECOMMENDATION_PREVIEW: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "interior-designer", version, about = "Room photos in, design report out")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze room photos and write a design report
    Analyze {
        /// Room images to analyze
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Preferred design style, e.g. "modern" or "scandinavian"
        #[arg(long)]
        style: Option<String>,

        #[arg(long, value_enum)]
        budget: Option<Budget>,

        /// Preferred colors, comma separated
        #[arg(long, value_delimiter = ',')]
        colors: Vec<String>,

        /// Specific needs or constraints
        #[arg(long)]
        needs: Option<String>,

        /// Model tier; defaults to CLAUDE_MODEL
        #[arg(long, value_enum)]
        model: Option<ModelTier>,

        /// Also write report.pdf
        #[arg(long)]
        pdf: bool,

        /// Skip visualization
        #[arg(long)]
        no_images: bool,
    },
    /// List model tiers
    Models,
    /// Run the HTTP API
    Serve,
    /// Render a canned report without calling any model
    SampleReport {
        #[arg(long)]
        pdf: bool,
    },
}

#[actix_web::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;

    match cli.command {
        Command::Analyze {
            images,
            style,
            budget,
            colors,
            needs,
            model,
            pdf,
            no_images,
        } => {
            let preferences = DesignPreferences {
                style,
                budget,
                color_preferences: colors
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
                specific_needs: needs,
            };
            let options = RunOptions {
                model: model.unwrap_or(settings.claude_model),
                generate_images: !no_images,
                include_pdf: pdf,
            };
            analyze(&settings, &images, &preferences, options).await
        }
        Command::Models => {
            for tier in ModelTier::ALL {
                let marker = if tier == settings.claude_model { "*" } else { " " };
                println!("{} {:<8} {}", marker, tier.as_str(), tier.description());
            }
            Ok(())
        }
        Command::Serve => serve(settings).await,
        Command::SampleReport { pdf } => sample_report(&settings, pdf),
    }
}

async fn analyze(
    settings: &Settings,
    images: &[PathBuf],
    preferences: &DesignPreferences,
    options: RunOptions,
) -> anyhow::Result<()> {
    let missing: Vec<_> = images.iter().filter(|p| !p.is_file()).collect();
    if !missing.is_empty() {
        let names: Vec<_> = missing.iter().map(|p| p.display().to_string()).collect();
        bail!("Image not found: {}", names.join(", "));
    }

    let state = AppState::from_settings(settings);
    let mut progress = |message: &str| println!("  {}", message);
    let output = state
        .pipeline
        .run(images, preferences, options, &mut progress)
        .await?;

    let report = &output.report;
    println!();
    println!("Summary:");
    println!("{}", truncate_chars(&report.summary, SUMMARY_PREVIEW_CHARS));

    if !report.recommendations.is_empty() {
        println!();
        println!("Top recommendations:");
        for (i, rec) in report.recommendations.iter().take(RECOMMENDATION_PREVIEW).enumerate() {
            println!("  {}. [{}] {}: {}", i + 1, rec.priority, rec.category, rec.recommendation);
        }
    }

    println!();
    println!("Session:  {}", output.session_dir.display());
    println!("Markdown: {}", output.files.markdown.display());
    if let Some(pdf) = &output.files.pdf {
        println!("PDF:      {}", pdf.display());
    }
    for image in &report.generated_images {
        println!("Image:    {}", image.path.display());
    }
    Ok(())
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let app_state = AppState::from_settings(&settings);
    let output_dir = app_state.pipeline.sessions().root().to_path_buf();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Cannot create {}", output_dir.display()))?;

    info!(
        "Starting HTTP server on {} (serving {})",
        settings.bind_addr,
        output_dir.display()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
            .service(actix_files::Files::new(OUTPUT_ROUTE, &output_dir))
    })
    .bind(&settings.bind_addr)
    .with_context(|| format!("Cannot bind {}", settings.bind_addr))?
    .run()
    .await?;
    Ok(())
}

fn sample_report(settings: &Settings, pdf: bool) -> anyhow::Result<()> {
    let store = SessionStore::new(&settings.output_dir);
    let session = store.create_session()?;
    let sample = report::sample_report(&session.id);
    let files = report::save_report(&sample, &session, pdf)?;

    println!("Markdown: {}", files.markdown.display());
    if let Some(pdf) = &files.pdf {
        let pages = report::layout_report(&sample, &RenderContext::new(&session.dir)).len();
        println!("PDF:      {} ({} pages)", pdf.display(), pages);
    }
    Ok(())
}
