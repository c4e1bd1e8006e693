use nc_core::{DataStorageRecord, NewRecord, OwnerId, RecordId};
use nc_utils::human_bytes;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::{context::Context, print_output};

#[derive(Subcommand, Debug)]
pub enum RecordsCmd {
	/// Register a file that was already added to the content store
	Add(RecordAddArgs),
	/// Remove a record, the content itself is left untouched
	Remove {
		record_id: RecordId,
	},
}

#[derive(Args, Debug)]
pub struct RecordAddArgs {
	#[arg(long)]
	pub owner: OwnerId,
	#[arg(long)]
	pub name: String,
	#[arg(long, default_value = "application/octet-stream")]
	pub file_type: String,
	#[arg(long)]
	pub cid: String,
	/// File size in bytes
	#[arg(long)]
	pub size: u64,
	/// Hex SHA-256 digest of the contents
	#[arg(long, default_value = "")]
	pub hash: String,
}

pub async fn run(ctx: &Context, cmd: RecordsCmd) -> Result<()> {
	let store = ctx.open_store().await?;

	match cmd {
		RecordsCmd::Add(args) => {
			let record = store
				.insert(NewRecord::new(
					args.owner,
					args.name,
					args.file_type,
					args.cid,
					args.size,
					args.hash,
				))
				.await?;

			print_output!(ctx, &record, |record: &DataStorageRecord| {
				println!(
					"Added record {} ({}, {})",
					record.id,
					record.file_name,
					human_bytes(record.file_size)
				);
			});
		}
		RecordsCmd::Remove { record_id } => {
			if !store.delete(record_id).await? {
				bail!("Record {record_id} not found");
			}

			print_output!(ctx, &record_id, |record_id: &RecordId| {
				println!("Removed record {record_id}");
			});
		}
	}

	Ok(())
}
