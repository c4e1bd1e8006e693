use nc_core::NodeConfig;
use nc_utils::error::FileIOError;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod context;
mod domains;
mod util;

use context::{Context, OutputFormat};
use domains::{
	config::ConfigCmd, export::ExportArgs, pages::PagesArgs, records::RecordsCmd,
	usage::UsageArgs,
};

const DEFAULT_LOG_FILTER: &str = "info,nc_core=debug";

#[derive(Parser, Debug)]
#[command(name = "nuclei", about = "Nuclei storage node tooling")]
struct Cli {
	/// Path to the nuclei data directory
	#[arg(long)]
	data_dir: Option<PathBuf>,

	/// Output format
	#[arg(long, value_enum, default_value = "human")]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Show how many bytes an owner is storing
	Usage(UsageArgs),
	/// Show an owner's records grouped in pages
	Pages(PagesArgs),
	/// Export every file of an owner into a directory
	Export(ExportArgs),
	/// Record maintenance
	#[command(subcommand)]
	Records(RecordsCmd),
	/// Node configuration
	#[command(subcommand)]
	Config(ConfigCmd),
}

fn default_data_dir() -> Result<PathBuf> {
	Ok(dirs::data_local_dir()
		.ok_or_else(|| anyhow!("Could not determine data directory"))?
		.join("nuclei"))
}

/// Logs go to stderr, keeping stdout for command output, and to a daily file in the data dir
fn init_logger(data_dir: &Path) -> Result<WorkerGuard> {
	let logs_dir = data_dir.join("logs");
	std::fs::create_dir_all(&logs_dir).map_err(|e| {
		FileIOError::from_std_io_err_with_msg(&logs_dir, e, "creating logs directory")
	})?;

	let (non_blocking, guard) =
		tracing_appender::non_blocking(rolling::daily(logs_dir, "nuclei.log"));

	tracing_subscriber::registry()
		.with(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
		)
		.with(fmt::layer().with_writer(std::io::stderr))
		.with(fmt::layer().with_writer(non_blocking).with_ansi(false))
		.try_init()?;

	Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	let data_dir = match cli.data_dir {
		Some(data_dir) => data_dir,
		None => default_data_dir()?,
	};

	let _guard = init_logger(&data_dir)?;

	let config = NodeConfig::load(&data_dir).await?;
	let ctx = Context::new(config, cli.format, data_dir);

	match cli.command {
		Commands::Usage(args) => domains::usage::run(&ctx, args).await,
		Commands::Pages(args) => domains::pages::run(ctx, args).await,
		Commands::Export(args) => domains::export::run(ctx, args).await,
		Commands::Records(cmd) => domains::records::run(&ctx, cmd).await,
		Commands::Config(cmd) => domains::config::run(&ctx, cmd),
	}
}
