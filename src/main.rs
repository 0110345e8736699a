use anyhow::{Context as AnyhowContext, Result};
use bookrec::config::ConfigManager;
use bookrec::context::{self, AppContext, Overrides};
use bookrec::recommender::{CategoryFilter, QueryFilters, Tone};
use bookrec::shell::{self, Shell};
use clap::{Parser, Subcommand};
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::debug;
use std::env;
use std::io;
use std::path::PathBuf;
use termcolor::{ColorChoice, StandardStream};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workspace holding the catalog files and .bookrec/config.toml
    /// (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Catalog CSV (overrides config)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Tagged-description file (overrides config)
    #[arg(long, global = true)]
    descriptions: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive recommendation shell (default command)
    Shell {
        /// Initial category filter
        #[arg(short, long, default_value = "All")]
        category: String,
        /// Initial tone
        #[arg(short, long, default_value = "All")]
        tone: Tone,
    },
    /// Recommend books for a single query
    Recommend {
        /// What you feel like reading
        query: String,
        /// Only books in this category
        #[arg(short, long, default_value = "All")]
        category: String,
        /// Sort results by emotional tone
        #[arg(short, long, default_value = "All")]
        tone: Tone,
        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the categories in the catalog
    Categories,
    /// List the available tones
    Tones,
    /// Write a commented config file into the workspace
    InitConfig,
}

fn init_logging(verbose: bool) -> Result<MultiProgress> {
    let default_level = if verbose { "debug" } else { "info" };
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .build();
    let level = logger.filter();

    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger)
        .try_init()
        .context("Failed to initialize logger")?;
    log::set_max_level(level);
    Ok(multi)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let progress = init_logging(cli.verbose)?;

    let base_path = match cli.path {
        Some(path) => path,
        None => env::current_dir().context("Failed to get current directory")?,
    };
    debug!("Workspace: {}", base_path.display());

    let mut overrides = Overrides {
        books_path: cli.catalog,
        descriptions_path: cli.descriptions,
        final_top_k: None,
    };

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    match cli.command {
        Some(Commands::Recommend {
            query,
            category,
            tone,
            limit,
            json,
        }) => {
            overrides.final_top_k = limit;
            let context = AppContext::new(&base_path, &overrides, Some(&progress))?;
            let filters = QueryFilters {
                query,
                category: CategoryFilter::parse(&category),
                tone,
            };

            let response = context.execute_recommend(&filters)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                match response.ensure_results() {
                    Ok(response) => shell::print_response(&mut stdout, &response)?,
                    Err(e) => shell::print_warning(&mut stdout, &e.to_string())?,
                }
            }
        }
        Some(Commands::Categories) => {
            let catalog = context::load_catalog(&base_path, &overrides)?;
            for category in catalog.category_choices() {
                println!("{}", category);
            }
        }
        Some(Commands::Tones) => {
            for tone in Tone::CHOICES {
                println!("{}", tone);
            }
        }
        Some(Commands::InitConfig) => {
            let config_manager = ConfigManager::new(Some(&base_path))?;
            let path = config_manager.init_local_config()?;
            println!("Config written to {}", path.display());
        }
        Some(Commands::Shell { category, tone }) => {
            let context = AppContext::new(&base_path, &overrides, Some(&progress))?;
            Shell::new(&context)
                .with_filters(CategoryFilter::parse(&category), tone)
                .run(io::stdin().lock(), &mut stdout)?;
        }
        None => {
            let context = AppContext::new(&base_path, &overrides, Some(&progress))?;
            Shell::new(&context).run(io::stdin().lock(), &mut stdout)?;
        }
    }

    Ok(())
}
