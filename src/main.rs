use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use modman::application::ModManager;
use modman::commands::{self, Action, ListOptions};
use modman::config::{Config, DEFAULT_MAX_AGE_SECS, DEFAULT_TIMEOUT_SECS, Settings};
use modman::lifecycle::{AutoConfirmer, Confirmer, PromptConfirmer};
use modman::package::listing::{Filter, SortKey, StatusFilter};
use modman::runtime::{RealRuntime, Runtime};
use modman::section::Section;
use std::path::PathBuf;
use std::time::Duration;

/// modman - mod installer for Blasphemous and Blasphemous II
///
/// Installs, enables, disables and removes mods listed in the community
/// catalogs, resolving dependencies between them.
///
/// Examples:
///   modman --root ~/Games/Blasphemous list
///   modman install Randomizer
#[derive(Parser, Debug)]
#[command(author, version = env!("MODMAN_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Game folder the mods are installed into (also via MODMAN_ROOT)
    #[arg(long = "root", short = 'r', env = "MODMAN_ROOT", value_name = "PATH", global = true)]
    install_root: Option<PathBuf>,

    /// Download cache directory (also via MODMAN_CACHE_DIR)
    #[arg(long = "cache-dir", env = "MODMAN_CACHE_DIR", value_name = "PATH", global = true)]
    cache_dir: Option<PathBuf>,

    /// Catalog to work on
    #[arg(long, short = 's', value_enum, default_value_t = Section::Blas1Mods, global = true)]
    section: Section,

    /// Catalog document URL (defaults to the section's upstream catalog)
    #[arg(long = "catalog-url", value_name = "URL", global = true)]
    catalog_url: Option<String>,

    /// Fetch the catalog even if the local copy is fresh
    #[arg(long, global = true)]
    refresh: bool,

    /// Seconds a downloaded catalog stays fresh
    #[arg(long = "max-age", value_name = "SECS", default_value_t = DEFAULT_MAX_AGE_SECS, global = true)]
    max_age: u64,

    /// Network timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,

    /// Answer yes to every prompt
    #[arg(long, short = 'y', global = true)]
    yes: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the packages of the section
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show details of a package
    Show(NameArgs),

    /// Download and install a package (and its dependencies)
    Install(NameArgs),

    /// Remove a package and its files
    #[command(alias = "rm")]
    Uninstall(NameArgs),

    /// Enable an installed package
    Enable(NameArgs),

    /// Disable an installed package
    Disable(NameArgs),

    /// Reinstall a package at its latest catalog version
    Update(UpdateArgs),

    /// List the known catalogs
    Sections,
}

#[derive(clap::Args, Debug)]
struct NameArgs {
    /// Package name as it appears in the catalog
    name: String,
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    /// Sort order
    #[arg(long, value_enum, default_value_t = SortKey::Name)]
    sort: SortKey,

    /// Only names matching this glob (case-insensitive)
    #[arg(long, value_name = "GLOB")]
    filter: Option<String>,

    /// Only packages whose author contains this text
    #[arg(long)]
    author: Option<String>,

    /// Only packages in this state
    #[arg(long, value_enum)]
    status: Option<StatusFilter>,
}

#[derive(clap::Args, Debug)]
struct UpdateArgs {
    /// Package to update
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    name: Option<String>,

    /// Update every package with a newer version
    #[arg(long)]
    all: bool,
}

impl Cli {
    fn settings(&self) -> Result<Settings> {
        let root = self
            .install_root
            .clone()
            .context("No game folder given; pass --root or set MODMAN_ROOT")?;
        let mut settings = Settings::new(root, self.section);
        settings.cache_dir = self.cache_dir.clone();
        settings.catalog_url = self.catalog_url.clone();
        settings.max_age = Duration::from_secs(self.max_age);
        settings.timeout = Duration::from_secs(self.timeout);
        Ok(settings)
    }
}

impl ListArgs {
    fn options(&self) -> Result<ListOptions> {
        let mut filter = Filter {
            author: self.author.clone(),
            status: self.status,
            ..Default::default()
        };
        if let Some(pattern) = &self.filter {
            filter = filter
                .with_name_pattern(pattern)
                .with_context(|| format!("Invalid filter pattern '{}'", pattern))?;
        }
        Ok(ListOptions {
            sort: self.sort,
            filter,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Commands::Sections = cli.command {
        commands::sections();
        return Ok(());
    }

    let runtime = RealRuntime;
    let config = Config::new(RealRuntime, cli.settings()?)?;
    let mut manager = ModManager::new(config);
    match manager.refresh(cli.refresh).await {
        Ok(source) => debug!("Catalog loaded from {:?}", source),
        Err(e) => eprintln!("Warning: {:#}", e),
    }

    let prompt = PromptConfirmer::new(&runtime);
    let confirmer: &dyn Confirmer = if cli.yes { &AutoConfirmer } else { &prompt };

    match &cli.command {
        Commands::List(args) => commands::list(&manager, &args.options()?),
        Commands::Show(args) => commands::show(&manager, &args.name)?,
        Commands::Install(args) => commands::run(&manager, Action::Install, &args.name, confirmer).await?,
        Commands::Uninstall(args) => {
            if cli.yes || runtime.confirm(&format!("Uninstall {}? Are you sure?", args.name))? {
                commands::run(&manager, Action::Uninstall, &args.name, confirmer).await?
            } else {
                println!("Cancelled. No changes were made.");
            }
        }
        Commands::Enable(args) => commands::run(&manager, Action::Enable, &args.name, confirmer).await?,
        Commands::Disable(args) => commands::run(&manager, Action::Disable, &args.name, confirmer).await?,
        Commands::Update(args) => match &args.name {
            Some(name) => commands::run(&manager, Action::Update, name, confirmer).await?,
            None => commands::update_all(&manager, confirmer).await?,
        },
        // printed before the catalog is loaded
        Commands::Sections => {}
    }
    Ok(())
}
