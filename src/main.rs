use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod changelog;
mod config;
mod git;

use changelog::{
    AssemblerOptions, ChangelogAssembler, ChangelogRenderer, GroupingMode, OutputFormat,
    RenderOptions,
};
use config::Config;
use git::{GitHistoryProvider, HistoryProvider};

#[derive(Parser)]
#[command(name = "changelog-gen")]
#[command(about = "Generate a Markdown changelog from a repository's tag history")]
struct Cli {
    /// Path to the git repository
    #[arg(short, long, env = "CHANGELOG_REPOSITORY", default_value = ".")]
    repository: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the changelog
    Generate {
        /// Output file path (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short = 'f', long)]
        format: Option<OutputFormat>,

        /// Handlebars template replacing the built-in layout
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Add a section for commits made since the newest tag
        #[arg(long)]
        unreleased: bool,

        /// Show annotated tag messages under release headings
        #[arg(long)]
        tag_annotations: bool,

        /// How commit messages are grouped (bracket, keyword)
        #[arg(short, long)]
        grouping: Option<GroupingMode>,
    },

    /// List the release tags the changelog would cover
    Tags {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut provider = GitHistoryProvider::new(&cli.repository);
    if let Some(pattern) = &config.git.tag_pattern {
        provider = provider
            .with_tag_pattern(pattern)
            .with_context(|| format!("invalid tag pattern '{pattern}'"))?;
    }

    match cli.command {
        Commands::Generate {
            output,
            format,
            template,
            unreleased,
            tag_annotations,
            grouping,
        } => {
            tracing::info!(repository = %cli.repository.display(), "generating changelog");

            let assembler = ChangelogAssembler::new(
                provider,
                AssemblerOptions {
                    grouping: grouping.unwrap_or(config.features.grouping),
                    include_unreleased: unreleased || config.features.unreleased,
                },
            );
            let document = assembler.assemble()?;

            let renderer = ChangelogRenderer::new(RenderOptions {
                format: format.unwrap_or(config.output.format),
                show_annotations: tag_annotations || config.features.tag_annotations,
                template: template.or(config.output.template),
            })?;
            let content = renderer.render(&document)?;

            if let Some(output_path) = output.or(config.output.path) {
                std::fs::write(&output_path, content)
                    .with_context(|| format!("failed to write {}", output_path.display()))?;
                println!("Changelog written to {}", output_path.display());
            } else {
                print!("{content}");
            }
        }
        Commands::Tags { limit } => {
            let releases = provider.list_releases()?;

            if releases.is_empty() {
                println!("No tags found");
            } else {
                for release in releases.iter().take(limit) {
                    println!(
                        "- {}: {} ({})",
                        release.name,
                        release.date.format("%Y-%m-%d"),
                        release.short_revision()
                    );
                }
            }
        }
    }

    Ok(())
}
