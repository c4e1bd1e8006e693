use nc_core::{
	export::authorize, BulkExportPipeline, ExportItem, ExportStream, FailurePolicy, FileEnvelope,
	ItemFailureReport, OwnerId, RecordId,
};
use nc_utils::{error::FileIOError, human_bytes};

use std::{
	ffi::OsStr,
	path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use clap::Args;
use futures::StreamExt;
use serde::Serialize;
use tokio::{fs, signal};
use tracing::{info, warn};

use crate::{context::Context, print_output, util::output::table};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Args, Debug)]
pub struct ExportArgs {
	/// Owner whose files to export
	#[arg(long)]
	pub owner: OwnerId,

	/// Identity asking for the export, must be the owner
	#[arg(long)]
	pub requester: OwnerId,

	/// Directory to write the files and the manifest to
	#[arg(long)]
	pub dest: PathBuf,

	/// Override the configured number of simultaneous fetches
	#[arg(long)]
	pub concurrency: Option<usize>,

	/// Override the configured per file timeout, in seconds
	#[arg(long)]
	pub fetch_timeout_secs: Option<u64>,

	/// Stop at the first file that can't be fetched
	#[arg(long, default_value_t = false)]
	pub abort_on_failure: bool,

	/// Check contents against their recorded SHA-256 digests
	#[arg(long, default_value_t = false)]
	pub verify_integrity: bool,
}

#[derive(Debug, Serialize)]
struct ExportedFile {
	record_id: RecordId,
	file_name: String,
	file_type: String,
	file_cid: String,
	path: PathBuf,
	bytes: usize,
}

/// A file that was fetched but couldn't be written to the destination
#[derive(Debug, Serialize)]
struct WriteFailure {
	record_id: RecordId,
	file_name: String,
	path: PathBuf,
	message: String,
}

#[derive(Debug, Serialize)]
struct Manifest {
	owner_id: OwnerId,
	total_records: usize,
	cancelled: bool,
	exported: Vec<ExportedFile>,
	failures: Vec<ItemFailureReport>,
	write_failures: Vec<WriteFailure>,
}

pub async fn run(mut ctx: Context, args: ExportArgs) -> Result<()> {
	if let Some(concurrency) = args.concurrency {
		ctx.config.export.concurrency = concurrency;
	}
	if let Some(fetch_timeout_secs) = args.fetch_timeout_secs {
		ctx.config.export.fetch_timeout_secs = fetch_timeout_secs;
	}
	if args.abort_on_failure {
		ctx.config.export.failure_policy = FailurePolicy::Abort;
	}
	if args.verify_integrity {
		ctx.config.export.verify_integrity = true;
	}

	// Refused before the database is opened, which would create and migrate it
	authorize(args.requester, args.owner)?;

	let options = ctx.config.export_options()?;
	let pipeline = BulkExportPipeline::new(ctx.config.content_fetcher()?);
	let store = ctx.open_store().await?;

	let mut stream = pipeline
		.export(&store, args.requester, args.owner, options)
		.await?;

	fs::create_dir_all(&args.dest).await.map_err(|e| {
		FileIOError::from_std_io_err_with_msg(&args.dest, e, "creating export directory")
	})?;

	let cancel_token = stream.cancel_token();
	tokio::spawn(async move {
		let res = signal::ctrl_c().await;
		nc_utils::error::report_error(&res);
		if res.is_ok() {
			warn!("Interrupted, stopping export;");
			cancel_token.cancel();
		}
	});

	info!(
		records_count = stream.len(),
		client = pipeline.fetcher().client_name(),
		"Exporting files;"
	);

	let manifest = collect_manifest(&args.dest, args.owner, &mut stream).await;
	write_manifest(&args.dest, &manifest).await?;

	print_output!(ctx, &manifest, |manifest: &Manifest| {
		if !manifest.exported.is_empty() {
			let mut table = table(vec!["Id", "Name", "Size", "Path"]);
			for file in &manifest.exported {
				table.add_row(vec![
					file.record_id.to_string(),
					file.file_name.clone(),
					human_bytes(file.bytes as u64),
					file.path.display().to_string(),
				]);
			}
			println!("{table}");
		}

		if !manifest.failures.is_empty() {
			let mut table = table(vec!["Id", "Name", "CID", "Error"]);
			for failure in &manifest.failures {
				table.add_row(vec![
					failure.record_id.to_string(),
					failure.file_name.clone(),
					failure.cid.clone(),
					format!("{}: {}", failure.error_kind, failure.message),
				]);
			}
			println!("{table}");
		}

		if !manifest.write_failures.is_empty() {
			let mut table = table(vec!["Id", "Name", "Path", "Error"]);
			for failure in &manifest.write_failures {
				table.add_row(vec![
					failure.record_id.to_string(),
					failure.file_name.clone(),
					failure.path.display().to_string(),
					failure.message.clone(),
				]);
			}
			println!("{table}");
		}

		println!(
			"Exported {} of {} files, {} failed{}",
			manifest.exported.len(),
			manifest.total_records,
			manifest.failures.len() + manifest.write_failures.len(),
			if manifest.cancelled { " (cancelled)" } else { "" }
		);
	});

	if !manifest.write_failures.is_empty() {
		bail!(
			"{} fetched files could not be written to {}",
			manifest.write_failures.len(),
			args.dest.display()
		);
	}

	Ok(())
}

/// Drains `stream` into `dest`. A file that can't be written is recorded and the export goes on,
/// so the manifest always accounts for every record.
async fn collect_manifest(dest: &Path, owner_id: OwnerId, stream: &mut ExportStream) -> Manifest {
	let mut manifest = Manifest {
		owner_id,
		total_records: stream.len(),
		cancelled: false,
		exported: Vec::with_capacity(stream.len()),
		failures: Vec::new(),
		write_failures: Vec::new(),
	};

	while let Some(item) = stream.next().await {
		match item {
			ExportItem::Envelope(envelope) => {
				let record_id = envelope.record_id;
				let file_name = envelope.file_name.clone();

				match write_envelope(dest, envelope).await {
					Ok(exported) => manifest.exported.push(exported),
					Err(e) => {
						warn!(%record_id, ?e, "Failed to write exported file;");
						manifest.write_failures.push(WriteFailure {
							record_id,
							path: dest.join(output_file_name(record_id, &file_name)),
							file_name,
							message: e.to_string(),
						});
					}
				}
			}
			ExportItem::Failure(failure) => manifest.failures.push(failure.report()),
		}
	}

	manifest.cancelled = stream.cancel_token().is_cancelled();

	manifest
}

async fn write_manifest(dest: &Path, manifest: &Manifest) -> Result<()> {
	let path = dest.join(MANIFEST_FILE_NAME);

	fs::write(&path, serde_json::to_vec_pretty(manifest)?)
		.await
		.map_err(|e| FileIOError::from_std_io_err_with_msg(&path, e, "writing manifest"))?;

	Ok(())
}

async fn write_envelope(dest: &Path, envelope: FileEnvelope) -> Result<ExportedFile, FileIOError> {
	let path = dest.join(output_file_name(envelope.record_id, &envelope.file_name));

	fs::write(&path, &envelope.bytes)
		.await
		.map_err(|e| FileIOError::from_std_io_err(&path, e))?;

	Ok(ExportedFile {
		record_id: envelope.record_id,
		file_name: envelope.file_name,
		file_type: envelope.file_type,
		file_cid: envelope.file_cid,
		path,
		bytes: envelope.bytes.len(),
	})
}

/// Record names come from uploaders, only their last component is used and the record id
/// keeps files with the same name apart
fn output_file_name(record_id: RecordId, file_name: &str) -> String {
	let name = Path::new(file_name)
		.file_name()
		.and_then(OsStr::to_str)
		.filter(|name| !name.is_empty())
		.unwrap_or("file");

	format!("{record_id}-{name}")
}
