use clap::{Parser, Subcommand, ValueEnum};
use site_assets::config::{self, LayoutConfig};
use site_assets::imaging::backend_from_config;
use site_assets::policy::{Remediate, ReportOnly};
use site_assets::reconcile::{Report, Session};
use site_assets::{output, repair, scan};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "site-assets")]
#[command(about = "Reconcile a Jekyll site's pages with its image tree")]
#[command(long_about = "\
Reconcile a Jekyll site's pages with its image tree

Every markdown source is scanned for asset references (bracket links,
quoted paths, {% slide %} and {% cover %} directives). Files under the
asset directories that nothing references are waste; references to files
that do not exist are missing.

Source layout:

  source/
  ├── site-assets.toml             # Optional config
  ├── _posts/                      # Dated posts (required)
  │   └── 2013-11-27-foo.markdown  # → foo.html
  ├── _images/                     # Derived variants (required)
  │   └── 2013/11/IMG_1234_t.jpg   # _t thumbnail, _c medium, _l large
  ├── assets/                      # Other referenced files
  └── about.markdown               # → about.html

References to /images/... are matched against /_images/...

Run 'site-assets gen-config' to generate a documented site-assets.toml.")]
#[command(version)]
struct Cli {
    /// Source directory (or its _posts / _site subdirectory)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Shared flags for commands that print a report.
#[derive(clap::Args, Clone)]
struct ReportArgs {
    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Subcommand)]
enum Command {
    /// Report waste and missing assets without changing anything
    Check(ReportArgs),
    /// Delete waste and stale variants, regenerate missing variants
    Fix(ReportArgs),
    /// Print a stock site-assets.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Check(args) => {
            let session = open_session(&cli.source)?;
            let report = session.validate(&mut ReportOnly)?;
            print(&report, args.format)?;
        }
        Command::Fix(args) => {
            let session = open_session(&cli.source)?;
            let backend = backend_from_config(&session.config().tools);
            let mut policy = Remediate::new(session.root(), session.config(), backend.as_ref());
            let report = session.validate(&mut policy)?;
            print(&report, args.format)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Locate the source root, load its config and build the reference index.
fn open_session(dir: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let dir = std::path::absolute(dir)?;
    let root = scan::find_source_dir(&dir, &LayoutConfig::default())?;
    tracing::info!(root = %root.display(), "using source directory");

    let config = config::load_config(&root)?;
    let renamer = repair::renamer_from_config(config.tools.rename);
    let mut session = Session::open(&root, config)?;
    session.scan(renamer.as_ref())?;
    Ok(session)
}

fn print(report: &Report, format: Format) -> Result<(), serde_json::Error> {
    match format {
        Format::Text => {
            output::print_report(report);
            Ok(())
        }
        Format::Json => output::print_report_json(report),
    }
}
