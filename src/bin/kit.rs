//! kit - Keeps a local kubeconfig in sync with a shared remote copy.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kubekit::api::Config;
use kubekit::kit::{
    compute_incoming_diff, init_local, read_kubeconfig, read_local_data, write_kubeconfig, write_local_data, KitConfig,
    KitDir, KitError, RemoteCache,
};
use kubekit::machinery::{compute_diff, Diff, AUTO_RESOLVER};

#[derive(Parser, Debug)]
#[command(
    name = "kit",
    about = "Kubeconfig reconciliation toolkit",
    version = env!("CARGO_PKG_VERSION"),
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding kit's settings and remote cache (default: ~/.kit)
    #[arg(long, global = true, env = "KIT_HOME")]
    kit_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize kit using the local kubeconfig
    Init {
        /// Remote store URL
        #[arg(long, env = "VAULT_ADDR")]
        remote: String,
    },

    /// Record a kubeconfig file as the latest remote state
    Fetch {
        /// Kubeconfig exported from the remote store
        #[arg(long)]
        from: PathBuf,
    },

    /// Show the changes needed to turn EXISTING into INCOMING
    Diff {
        existing: PathBuf,
        incoming: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Apply the changes from INCOMING onto EXISTING
    Apply {
        existing: PathBuf,
        incoming: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Bring the local kubeconfig up to date with the remote cache
    Sync {
        /// Only print the changes
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Yaml,
    Json,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("kubekit={level},kit={level}"))),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<(), KitError> {
    let kit_dir = match cli.kit_dir {
        Some(path) => KitDir::new(path),
        None => KitDir::from_env()?,
    };

    match cli.command {
        Command::Init { remote } => init(&kit_dir, &remote),
        Command::Fetch { from } => fetch(&kit_dir, &from),
        Command::Diff {
            existing,
            incoming,
            format,
        } => {
            let existing = read_kubeconfig(&existing)?;
            let incoming = read_kubeconfig(&incoming)?;
            let diff = compute_diff(&existing, &incoming)?;
            print_diff(&diff, format)
        }
        Command::Apply {
            existing,
            incoming,
            output,
        } => apply(&existing, &incoming, output.as_deref()),
        Command::Sync { dry_run } => sync(&kit_dir, dry_run),
    }
}

fn init(kit_dir: &KitDir, remote: &str) -> Result<(), KitError> {
    match init_local(kit_dir, remote) {
        Ok(_) => {}
        Err(e) if e.is_already_initialized() => {
            warn!(dir = %kit_dir.path().display(), "local config already exists, nothing to do");
        }
        Err(e) => return Err(e),
    }

    let settings = KitConfig::read(kit_dir)?;
    info!("reading data from {}", settings.kubeconfig_path.display());
    let local = read_local_data(&settings)?;
    info!("found {} contexts", local.config.contexts.len());

    if RemoteCache::exists(kit_dir) {
        warn!("remote cache already exists, nothing to do");
    } else {
        RemoteCache::default().write(kit_dir)?;
    }
    Ok(())
}

fn fetch(kit_dir: &KitDir, from: &Path) -> Result<(), KitError> {
    let remote = read_kubeconfig(from)?;
    let mut cache = if RemoteCache::exists(kit_dir) {
        RemoteCache::read(kit_dir)?
    } else {
        RemoteCache::default()
    };
    info!("fetched {} contexts", remote.contexts.len());
    cache.record(remote);
    cache.write(kit_dir)
}

fn apply(existing_path: &Path, incoming_path: &Path, output: Option<&Path>) -> Result<(), KitError> {
    let mut existing = read_kubeconfig(existing_path)?;
    let incoming = read_kubeconfig(incoming_path)?;
    let diff = compute_diff(&existing, &incoming)?;
    diff.apply(&mut existing, &incoming, &AUTO_RESOLVER)?;
    write_config(&existing, output)
}

fn sync(kit_dir: &KitDir, dry_run: bool) -> Result<(), KitError> {
    let settings = KitConfig::read(kit_dir)?;
    let incoming = compute_incoming_diff(kit_dir, &settings)?;
    if incoming.diff.is_empty() {
        info!("already up to date");
        return Ok(());
    }
    print_diff(&incoming.diff, OutputFormat::Text)?;
    if dry_run {
        return Ok(());
    }
    let local = incoming.apply(&AUTO_RESOLVER)?;
    write_local_data(&local)?;
    info!("updated {}", local.path.display());
    Ok(())
}

fn print_diff(diff: &Diff, format: OutputFormat) -> Result<(), KitError> {
    let rendered = match format {
        OutputFormat::Text => diff.to_string(),
        OutputFormat::Yaml => serde_yaml::to_string(diff)?,
        OutputFormat::Json => serde_json::to_string_pretty(diff)?,
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end()).map_err(|e| KitError::io(Path::new("<stdout>"), e))
}

fn write_config(config: &Config, output: Option<&Path>) -> Result<(), KitError> {
    match output {
        Some(path) => write_kubeconfig(path, config),
        None => {
            let yaml = kubekit::api::to_yaml(config)?;
            io::stdout()
                .write_all(yaml.as_bytes())
                .map_err(|e| KitError::io(Path::new("<stdout>"), e))
        }
    }
}
