// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markshot — annotated screenshot collections
//
// Entry point. Initialises logging, loads settings, opens the storage
// directory, and dispatches one subcommand.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use markshot_core::error::Result;
use markshot_core::types::{AnnotationId, AnnotationInput, ArtifactKind};
use markshot_core::AppConfig;

use services::app_services::{AppServices, parse_point, parse_screenshot_id};
use services::data_dir;

#[derive(Parser)]
#[command(name = "markshot")]
#[command(about = "Annotate screenshots and export them as a PDF collection")]
struct Cli {
    /// Settings file (JSON). Defaults to config.json in the data directory.
    #[arg(long, env = "MARKSHOT_CONFIG")]
    config: Option<PathBuf>,

    /// Storage directory for rasters and the record catalog
    #[arg(long, env = "MARKSHOT_STORAGE_DIR")]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store one or more screenshots
    Ingest {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// List stored screenshots and their annotations
    List,

    /// Add an annotation, or replace one with --replace
    Annotate {
        /// Screenshot id
        id: String,
        /// Label text
        text: String,
        /// Label anchor in display pixels, as `x,y`
        #[arg(long)]
        at: String,
        /// Arrow target in display pixels, as `x,y`
        #[arg(long)]
        pointer: String,
        /// Annotation id to overwrite instead of adding a new one
        #[arg(long)]
        replace: Option<String>,
    },

    /// Remove one annotation
    Unannotate {
        /// Screenshot id
        id: String,
        /// Annotation id
        annotation: String,
    },

    /// Render one screenshot with its annotations
    Preview {
        /// Screenshot id
        id: String,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Copy a stored raster out without annotations
    Raster {
        /// Screenshot id
        id: String,
        /// `original` or `display`
        #[arg(long, default_value = "display")]
        kind: String,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export every screenshot into a single PDF
    Export {
        #[arg(short, long)]
        output: PathBuf,
        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Report storage used by stored screenshots
    Usage,

    /// Delete a screenshot and its files
    Delete {
        /// Screenshot id
        id: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("markshot: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => data_dir::default_config(&data_dir::data_dir())?,
    };
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = dir.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let svc = AppServices::init(config)?;
    tracing::debug!(storage = %svc.config().storage_dir.display(), "Markshot starting");

    match cli.command {
        Commands::Ingest { images } => {
            for path in images {
                let record = svc.ingest_file(&path)?;
                println!(
                    "{}  {}  {}x{} -> {}x{}",
                    record.id,
                    path.display(),
                    record.original_width,
                    record.original_height,
                    record.display_width,
                    record.display_height
                );
            }
        }
        Commands::List => {
            for record in svc.records()? {
                println!(
                    "{}  {}  {}x{}  {}  ({} annotations)",
                    record.id,
                    record.filename,
                    record.display_width,
                    record.display_height,
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.annotation_count()
                );
                for annotation in &record.annotations {
                    println!(
                        "    {}  \"{}\"  ({}, {}) -> ({}, {})",
                        annotation.id,
                        annotation.text,
                        annotation.x,
                        annotation.y,
                        annotation.pointer_x,
                        annotation.pointer_y
                    );
                }
            }
        }
        Commands::Annotate {
            id,
            text,
            at,
            pointer,
            replace,
        } => {
            let id = parse_screenshot_id(&id)?;
            let input = AnnotationInput::new(text, parse_point(&at)?, parse_point(&pointer)?);
            match replace {
                Some(annotation) => {
                    let annotation = AnnotationId::parse(&annotation)?;
                    svc.update_annotation(id, annotation, input)?;
                    println!("{annotation}");
                }
                None => println!("{}", svc.add_annotation(id, input)?.id),
            }
        }
        Commands::Unannotate { id, annotation } => {
            let removed =
                svc.remove_annotation(parse_screenshot_id(&id)?, AnnotationId::parse(&annotation)?)?;
            println!("removed \"{}\"", removed.text);
        }
        Commands::Preview { id, output } => {
            let status = svc.preview(parse_screenshot_id(&id)?, &output)?;
            println!("{} ({status:?})", output.display());
        }
        Commands::Raster { id, kind, output } => {
            let kind = ArtifactKind::from_keyword(&kind)?;
            let written = svc.export_raster(parse_screenshot_id(&id)?, kind, &output)?;
            println!("{} ({written} bytes)", output.display());
        }
        Commands::Export { output, title } => {
            let report = svc.export(&output, title.as_deref())?;
            println!(
                "{}: {} pages, {} screenshots, {} annotations, {} degraded",
                output.display(),
                report.document.page_count,
                report.document.sections,
                report.document.total_annotations,
                report.degraded()
            );
        }
        Commands::Usage => {
            let usage = svc.usage()?;
            println!(
                "{} MB in {} files across {} screenshots",
                usage.total_mb, usage.file_count, usage.record_count
            );
        }
        Commands::Delete { id } => {
            let report = svc.delete(parse_screenshot_id(&id)?)?;
            println!(
                "freed {} bytes ({} files)",
                report.freed_bytes(),
                report.removed_files
            );
        }
    }
    Ok(())
}
