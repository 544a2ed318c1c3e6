use clap::{Parser, Subcommand};
use cloud_gal::cache::PlaceholderCache;
use cloud_gal::catalog::{self, CATALOG_FILENAME};
use cloud_gal::config::{self, Credentials, SiteConfig};
use cloud_gal::media::CloudinaryCatalog;
use cloud_gal::{generate, output};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding extra `tracing` filter directives.
const LOG_ENV: &str = "CLOUD_GAL_LOG";

/// Shared flags for commands that fetch placeholders.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the placeholder cache and request every placeholder again
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "cloud-gal")]
#[command(about = "Static photo gallery for a media service folder")]
#[command(long_about = "\
Static photo gallery for a media service folder

Images stay on the media service; the gallery links to renditions the service
produces on request. The build fetches the folder listing and a tiny blur
placeholder per image, then renders a static site.

Project structure:

  project/
  ├── config.toml      # Site config (cloud name, folder, text, theme)
  ├── .env             # CLOUDINARY_API_KEY / CLOUDINARY_API_SECRET
  └── assets/          # Static assets (favicon, fonts) → copied to output root

Generated site:

  dist/
  ├── index.html       # Gallery with client-side lightbox
  └── p/{id}/index.html  # Permalink page per photo

Run 'cloud-gal gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project directory (holds config.toml and assets/)
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (catalog manifest, placeholder cache)
    #[arg(long, default_value = ".cloud-gal-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the collection and fetch blur placeholders into a manifest
    Fetch(CacheArgs),
    /// Produce the HTML site from the catalog manifest
    Generate,
    /// Run the full pipeline: fetch → generate
    Build(CacheArgs),
    /// Validate config and show resolved URLs without touching the network
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing()?;
    let cli = Cli::parse();

    match &cli.command {
        Command::Fetch(cache_args) => {
            let config = load_config(&cli.project)?;
            run_fetch(&cli.temp_dir, &config, cache_args.no_cache)?;
        }
        Command::Generate => {
            let config = load_config(&cli.project)?;
            run_generate(&cli, &config, &cli.temp_dir.join(CATALOG_FILENAME))?;
        }
        Command::Build(cache_args) => {
            let config = load_config(&cli.project)?;

            println!("==> Stage 1: Fetching {}", config.media.folder);
            let manifest_path = run_fetch(&cli.temp_dir, &config, cache_args.no_cache)?;

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            run_generate(&cli, &config, &manifest_path)?;

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.project.display());
            let config = load_config(&cli.project)?;
            output::print_check_output(&config);
            println!("==> Config is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr, filtered by `CLOUD_GAL_LOG` on top of `warn`.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let mut filter = EnvFilter::builder().parse("warn")?;
    if let Ok(value) = std::env::var(LOG_ENV) {
        for directive in value.split(',').filter(|d| !d.trim().is_empty()) {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(err) => eprintln!("WARN ignoring log directive: {directive:?}: {err}"),
            }
        }
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init()?;
    Ok(())
}

fn load_config(project: &Path) -> Result<SiteConfig, config::ConfigError> {
    config::load_config(project, |key| std::env::var(key).ok())
}

/// Fetch stage. Writes the manifest and cache only when the whole fetch
/// succeeds; returns the manifest path.
fn run_fetch(
    temp_dir: &Path,
    config: &SiteConfig,
    no_cache: bool,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let credentials = Credentials::from_env(|key| std::env::var(key).ok())?;
    let client = CloudinaryCatalog::new(config, credentials)?;
    let mut cache = if no_cache {
        PlaceholderCache::empty()
    } else {
        PlaceholderCache::load(temp_dir)
    };

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_fetch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(catalog::fetch_catalog(&client, config, &mut cache, Some(tx)));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    let result = result?;

    std::fs::create_dir_all(temp_dir)?;
    let manifest_path = temp_dir.join(CATALOG_FILENAME);
    let json = serde_json::to_string_pretty(&result.manifest)?;
    std::fs::write(&manifest_path, json)?;
    cache.save(temp_dir)?;
    output::print_fetch_summary(&result, &manifest_path);
    Ok(manifest_path)
}

fn run_generate(
    cli: &Cli,
    config: &SiteConfig,
    manifest_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let site = generate::generate(manifest_path, config, &cli.project, &cli.output)?;
    output::print_generate_output(&site);
    Ok(())
}
