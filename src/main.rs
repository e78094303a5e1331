use clap::{Parser, Subcommand};
use quire::{config, output, pipeline};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Static site generator for a portfolio and blog")]
#[command(long_about = "\
Static site generator for a portfolio and blog

Markdown files are the data source. Every file under a source root becomes a
post whose route is its path: blog/2021-01-10-hello.md → /2021-01-10-hello/.
Posts are listed newest first by their front-matter date.

Site structure:

  site/
  ├── config.toml                       # Site config (optional)
  └── content/
      └── blog/                         # Source root 'blog' (default)
          ├── 2021-01-10-hello.md       # → /2021-01-10-hello/
          └── 2021-02-01-world/
              └── index.md              # → /2021-02-01-world/

Front matter:

  ---
  title: Hello            # falls back to the file name
  date: 2021-01-10        # YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, or RFC 3339
  description: First post # falls back to an excerpt of the body
  ---

Routes listed in `suppress` are never rendered, linked, or put in the sitemap.

Run 'quire gen-config' to generate a documented config.toml.
Set RUST_LOG=info (or debug) for per-stage diagnostics.")]
#[command(version)]
struct Cli {
    /// Site directory (holds config.toml and the content roots)
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (page plan)
    #[arg(long, default_value = ".quire-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan the site and write the final page list to pages.json
    Plan,
    /// Run the full pipeline and write the site
    Build,
    /// Validate config and content without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Plan => {
            let site_config = load_config(&cli)?;
            let nodes = pipeline::load_content(&cli.site, &site_config)?;
            let site = pipeline::plan_site(&site_config, &nodes)?;
            std::fs::create_dir_all(&cli.temp_dir)?;
            let plan_path = cli.temp_dir.join("pages.json");
            let json = serde_json::to_string_pretty(&site.pages)?;
            std::fs::write(&plan_path, json)?;
            let report = pipeline::report(&site_config, &nodes, &site, Vec::new());
            output::print_check_output(&report);
            println!("==> Plan written to {}", plan_path.display());
        }
        Command::Build => {
            let site_config = load_config(&cli)?;
            println!(
                "==> Building {} → {}",
                cli.site.display(),
                cli.output.display()
            );
            let report = pipeline::build(&cli.site, &site_config, &cli.output)?;
            output::print_build_output(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            let site_config = load_config(&cli)?;
            println!("==> Checking {}", cli.site.display());
            let report = pipeline::check(&cli.site, &site_config)?;
            output::print_check_output(&report);
            println!("==> Site is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load and validate config, then size the thread pool from it.
fn load_config(cli: &Cli) -> Result<config::SiteConfig, config::ConfigError> {
    let site_config = config::load_config(&cli.site)?;
    init_thread_pool(&site_config.processing);
    Ok(site_config)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
