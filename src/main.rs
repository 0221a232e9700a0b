use clap::{Parser, Subcommand};
use release_site::assemble::{self, AssembleEvent};
use release_site::history::GitBackend;
use release_site::releases::FsReleaseRepository;
use release_site::types::Build;
use release_site::{config, generate, output, publish};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Where the builds come from.
#[derive(clap::Args, Clone)]
struct SourceArgs {
    /// Git repository the releases were built from
    #[arg(short, long)]
    source_dir: PathBuf,

    /// Release root (defaults to <target-dir>/files for `build`)
    #[arg(long)]
    files_dir: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "release-site")]
#[command(about = "Static download and changelog site for release builds")]
#[command(long_about = "\
Static download and changelog site for release builds

The release root is a directory of releases, each named after its version
and holding one directory per variant:

  files/
  ├── 9.3.0.b2174.g1a2b3c4/          # MAJOR.MINOR.PATCH.bBUILD.cCOMMIT
  │   ├── patcher/                   # Variant
  │   │   ├── patcher-9.3.0.zip      # Artifact
  │   │   └── patcher-9.3.0.zip.sha256sum
  │   └── utilities/
  │       └── utilities-9.3.0.zip
  └── 9.2.0.b2100.g0f9e8d7/
      └── ...

Each release's changelog is the git history between its commit and the
commit of the next older release.

Run 'release-site gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble, render, and publish the site
    Build {
        #[command(flatten)]
        source: SourceArgs,

        /// Target HTML output directory
        #[arg(short, long)]
        target_dir: PathBuf,

        /// Device definitions file (JSON)
        #[arg(short, long)]
        devices_file: PathBuf,

        /// Builds per download page (overrides config)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        items_per_page: Option<u64>,
    },
    /// Assemble the build model and print it without rendering
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the build model as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            source,
            target_dir,
            devices_file,
            items_per_page,
        } => {
            let mut site_config = config::load_config(cli.config.as_deref())?;
            if let Some(n) = items_per_page {
                site_config.pagination.items_per_page = usize::try_from(n)?;
            }
            init_thread_pool(&site_config.processing);

            let files_dir = source
                .files_dir
                .clone()
                .unwrap_or_else(|| target_dir.join("files"));

            println!("==> Assembling builds from {}", files_dir.display());
            let builds = run_assemble(&source.source_dir, &files_dir, &site_config, true)?;
            output::print_builds_output(&builds);

            let devices = generate::load_devices(&devices_file)?;

            // Staging directory is removed on drop, success or not
            let staging = tempfile::tempdir()?;
            println!("==> Rendering site");
            let written = generate::generate(&builds, &devices, &site_config, staging.path())?;
            output::print_generate_output(&written);

            println!("==> Publishing to {}", target_dir.display());
            publish::publish(staging.path(), &target_dir)?;
            println!("==> Build complete: {}", target_dir.display());
        }
        Command::Check { source, json } => {
            let site_config = config::load_config(cli.config.as_deref())?;
            init_thread_pool(&site_config.processing);

            let files_dir = source
                .files_dir
                .ok_or("check requires --files-dir")?;
            if json {
                let builds = run_assemble(&source.source_dir, &files_dir, &site_config, false)?;
                println!("{}", serde_json::to_string_pretty(&builds)?);
                return Ok(());
            }

            println!("==> Checking {}", files_dir.display());
            let builds = run_assemble(&source.source_dir, &files_dir, &site_config, true)?;
            output::print_builds_output(&builds);
            println!("==> Releases are consistent");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Assemble the build model. With `progress`, progress lines are streamed
/// from a printer thread.
fn run_assemble(
    source_dir: &Path,
    files_dir: &Path,
    site_config: &config::SiteConfig,
    progress: bool,
) -> Result<Vec<Build>, assemble::AssembleError> {
    let repo = FsReleaseRepository::new(files_dir);
    let history = GitBackend::new(source_dir).first_parent(site_config.history.first_parent);
    if !progress {
        return assemble::assemble(&repo, &history, None);
    }

    let (tx, rx) = mpsc::channel::<AssembleEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_assemble_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = assemble::assemble(&repo, &history, Some(tx));
    printer.join().ok();
    result
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
