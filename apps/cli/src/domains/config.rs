use nc_core::{ContentStoreConfig, NodeConfig};

use anyhow::Result;
use clap::Subcommand;

use crate::{context::Context, print_output, util::output::table};

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
	/// Show the node configuration
	Show,
}

pub fn run(ctx: &Context, cmd: ConfigCmd) -> Result<()> {
	match cmd {
		ConfigCmd::Show => {
			print_output!(ctx, &ctx.config, |config: &NodeConfig| {
				let content_store = match &config.content_store {
					ContentStoreConfig::Ipget { binary } => format!("ipget ({})", binary.display()),
					ContentStoreConfig::Kubo { api_url } => format!("kubo ({api_url})"),
				};

				let mut table = table(vec!["Key", "Value"]);
				table.add_row(vec![
					"database_path".to_string(),
					config.database_path(&ctx.data_dir).display().to_string(),
				]);
				table.add_row(vec![
					"pagination.byte_threshold".to_string(),
					config.pagination.byte_threshold.to_string(),
				]);
				table.add_row(vec![
					"pagination.max_page_size".to_string(),
					config.pagination.max_page_size.to_string(),
				]);
				table.add_row(vec![
					"export.concurrency".to_string(),
					config.export.concurrency.to_string(),
				]);
				table.add_row(vec![
					"export.fetch_timeout_secs".to_string(),
					config.export.fetch_timeout_secs.to_string(),
				]);
				table.add_row(vec![
					"export.failure_policy".to_string(),
					format!("{:?}", config.export.failure_policy),
				]);
				table.add_row(vec![
					"export.verify_integrity".to_string(),
					config.export.verify_integrity.to_string(),
				]);
				table.add_row(vec![
					"max_concurrent_fetches".to_string(),
					config.max_concurrent_fetches.to_string(),
				]);
				table.add_row(vec!["content_store".to_string(), content_store]);

				println!("{table}");
				println!();
				println!(
					"Config file: {}",
					NodeConfig::config_path(&ctx.data_dir).display()
				);
			});
		}
	}

	Ok(())
}
