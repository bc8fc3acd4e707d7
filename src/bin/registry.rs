//! Content Registry CLI
//!
//! Validates a content registry and prints the artifacts derived from it.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use content_registry::generate::{
    generate_manifest, generate_robots, generate_routes, generate_sitemap, sitemap_to_xml,
    summarize_sitemap, RouteOptions, SidebarGenerator, SidebarOptions,
};
use content_registry::validate::{ContentValidator, Validator};
use content_registry::{load_document, report, EngineConfig, Environment, Registry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "registry-tool")]
#[command(about = "Validate a content registry and generate site artifacts")]
struct Cli {
    /// Config file layered over registry.toml and the environment
    #[arg(short, long)]
    config: Option<String>,

    /// Registry document (overrides [registry].path)
    #[arg(short, long)]
    registry: Option<PathBuf>,

    /// Build environment (overrides [build].default_environment)
    #[arg(short, long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every validation pass and print a report
    Validate {
        /// Report public documents that are not published
        #[arg(long)]
        strict: bool,
        /// Skip content file checks
        #[arg(long)]
        no_content: bool,
        /// Recompute stored content digests
        #[arg(long)]
        digests: bool,
        /// Fail on warnings
        #[arg(long)]
        warnings_as_errors: bool,
        /// Worker threads for content checks
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Print the route table as JSON
    Routes {
        #[arg(long)]
        project: Vec<String>,
        #[arg(long)]
        version: Vec<String>,
        #[arg(long)]
        lang: Vec<String>,
        /// Log every exclusion
        #[arg(long)]
        debug: bool,
    },

    /// Print the sidebar for one project, version and language as JSON
    Sidebar {
        #[arg(long)]
        project: String,
        #[arg(long)]
        version: Option<String>,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        base_path: Option<String>,
    },

    /// Print sitemap.xml
    Sitemap {
        /// Site root (overrides [sitemap].base_url)
        #[arg(long)]
        base_url: Option<String>,
        /// Print entry counts instead of XML
        #[arg(long)]
        summary: bool,
    },

    /// Print robots.txt
    Robots,

    /// Print the web-app manifest for a project
    Manifest {
        #[arg(long)]
        project: String,
        #[arg(long)]
        lang: Option<String>,
    },

    /// Recompute content digests and write the registry back
    RefreshDigests {
        /// Report changes without saving
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = EngineConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if let Some(path) = cli.registry {
        config.registry.path = path;
    }
    let environment: Environment = match &cli.env {
        Some(name) => name.parse()?,
        None => config.environment()?,
    };
    let registry_path = config.registry_path();

    match cli.command {
        Commands::Validate {
            strict,
            no_content,
            digests,
            warnings_as_errors,
            workers,
            format,
        } => {
            let mut options = config.validation_options();
            options.strict |= strict;
            options.check_content &= !no_content;
            options.check_digests |= digests;
            options.warnings_as_errors |= warnings_as_errors;
            if let Some(workers) = workers {
                options.workers = workers;
            }
            let fatal_warnings = options.warnings_as_errors;

            let document = load_document(&registry_path)
                .with_context(|| format!("loading {}", registry_path.display()))?;
            let outcome = Validator::new(options)?.validate(&document);

            match format {
                ReportFormat::Text => print!("{}", report::render_text(&outcome.diagnostics, fatal_warnings)),
                ReportFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&report::to_json(&outcome.diagnostics, fatal_warnings))?
                ),
            }
            Ok(if outcome.success() { 0 } else { 1 })
        }

        Commands::Routes {
            project,
            version,
            lang,
            debug,
        } => {
            let registry = open(&registry_path)?;
            let routes = generate_routes(
                &registry,
                &RouteOptions {
                    environment,
                    projects: project,
                    versions: version,
                    languages: lang,
                    debug,
                },
            );
            println!("{}", serde_json::to_string_pretty(&routes)?);
            Ok(0)
        }

        Commands::Sidebar {
            project,
            version,
            lang,
            base_path,
        } => {
            let registry = open(&registry_path)?;
            let entry = registry.require_project(&project)?;
            let version = match version {
                Some(v) => v,
                None => match entry.latest_version() {
                    Some(v) => v.id.clone(),
                    None => bail!("project '{}' has no latest version; pass --version", project),
                },
            };
            let lang = lang.unwrap_or_else(|| entry.default_language_code().to_string());

            let generator = SidebarGenerator::new(SidebarOptions {
                environment,
                base_path,
            });
            let sidebar = generator.generate(&registry, &project, &version, &lang)?;
            println!("{}", serde_json::to_string_pretty(&sidebar)?);
            Ok(0)
        }

        Commands::Sitemap { base_url, summary } => {
            let registry = open(&registry_path)?;
            let mut options = config.sitemap_options(environment)?;
            if let Some(base_url) = base_url {
                options.base_url = base_url;
            }
            let entries = generate_sitemap(&registry, &options);
            if summary {
                println!("{}", serde_json::to_string_pretty(&summarize_sitemap(&entries))?);
            } else {
                print!("{}", sitemap_to_xml(&entries));
            }
            Ok(0)
        }

        Commands::Robots => {
            print!("{}", generate_robots(&config.robots_options()));
            Ok(0)
        }

        Commands::Manifest { project, lang } => {
            let registry = open(&registry_path)?;
            let entry = registry.require_project(&project)?;
            let lang = lang.unwrap_or_else(|| entry.default_language_code().to_string());
            let manifest = generate_manifest(entry, &lang, &config.manifest);
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(0)
        }

        Commands::RefreshDigests { dry_run } => {
            let mut registry = open(&registry_path)?;
            let content = ContentValidator::new(config.validation_options().content_options());
            let outcome = content.refresh_digests(&mut registry);

            println!(
                "{} updated, {} unchanged, {} unresolved",
                outcome.updated,
                outcome.unchanged,
                outcome.unresolved.len()
            );
            for path in &outcome.unresolved {
                println!("  unresolved: {}", path);
            }
            if !dry_run && outcome.updated > 0 {
                registry.save(&registry_path)?;
                println!("Saved {}", registry_path.display());
            }
            Ok(0)
        }
    }
}

/// Load and decode the registry. Generators assume a structurally valid
/// document, so run `validate` first when in doubt.
fn open(path: &std::path::Path) -> anyhow::Result<Registry> {
    content_registry::load_registry(path).with_context(|| format!("loading {}", path.display()))
}
