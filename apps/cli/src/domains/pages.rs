use nc_core::{
	paginator::{page, paginate},
	OwnerId, Page,
};
use nc_utils::human_bytes;

use anyhow::Result;
use clap::Args;

use crate::{context::Context, print_output, util::output::table};

#[derive(Args, Debug)]
pub struct PagesArgs {
	/// Owner whose records to paginate
	#[arg(long)]
	pub owner: OwnerId,

	/// Only show this page, starting at 1
	#[arg(long)]
	pub page: Option<usize>,

	/// Override the configured byte threshold
	#[arg(long)]
	pub byte_threshold: Option<u64>,

	/// Override the configured max number of records per page
	#[arg(long)]
	pub max_page_size: Option<usize>,
}

pub async fn run(mut ctx: Context, args: PagesArgs) -> Result<()> {
	if let Some(byte_threshold) = args.byte_threshold {
		ctx.config.pagination.byte_threshold = byte_threshold;
	}
	if let Some(max_page_size) = args.max_page_size {
		ctx.config.pagination.max_page_size = max_page_size;
	}
	let config = ctx.config.pagination_config()?;

	let store = ctx.open_store().await?;

	let pages = match args.page {
		Some(number) => page(&store, args.owner, config, number)
			.await?
			.into_iter()
			.collect(),
		None => paginate(&store, args.owner, config).await?,
	};

	print_output!(ctx, &pages, |pages: &Vec<Page>| {
		if pages.is_empty() {
			println!("No pages found");
			return;
		}

		let mut table = table(vec!["Page", "Id", "Name", "Type", "Size", "CID"]);
		for page in pages {
			for record in page.iter() {
				table.add_row(vec![
					page.number.to_string(),
					record.id.to_string(),
					record.file_name.clone(),
					record.file_type.clone(),
					human_bytes(record.file_size),
					record.file_cid.clone(),
				]);
			}
		}
		println!("{table}");

		for page in pages {
			println!(
				"Page {}: {} files, {}",
				page.number,
				page.len(),
				human_bytes(page.total_bytes)
			);
		}
	});

	Ok(())
}
