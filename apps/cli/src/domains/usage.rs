use nc_core::{quota::compute_usage, OwnerId, UsageSnapshot};
use nc_utils::human_bytes;

use anyhow::Result;
use clap::Args;

use crate::{context::Context, print_output, util::output::table};

#[derive(Args, Debug)]
pub struct UsageArgs {
	/// Owner whose usage to compute
	#[arg(long)]
	pub owner: OwnerId,

	/// Also report how much room is left under this many bytes
	#[arg(long)]
	pub limit: Option<u64>,
}

pub async fn run(ctx: &Context, args: UsageArgs) -> Result<()> {
	let store = ctx.open_store().await?;
	let usage = compute_usage(&store, args.owner).await?;

	print_output!(ctx, &usage, |usage: &UsageSnapshot| {
		let mut table = table(vec!["Owner", "Files", "Total"]);
		table.add_row(vec![
			usage.owner_id.to_string(),
			usage.record_count.to_string(),
			human_bytes(usage.total_bytes),
		]);
		println!("{table}");

		if let Some(limit) = args.limit {
			if usage.exceeds(limit) {
				println!(
					"Over the limit of {} by {}",
					human_bytes(limit),
					human_bytes(usage.total_bytes - limit)
				);
			} else {
				println!(
					"{} left out of {}",
					human_bytes(usage.remaining(limit)),
					human_bytes(limit)
				);
			}
		}
	});

	Ok(())
}
