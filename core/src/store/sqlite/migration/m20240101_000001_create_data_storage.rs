//! Create the data storage table, keyed by owner for per user listings

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(DataStorage::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(DataStorage::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(DataStorage::FileName).text())
					.col(ColumnDef::new(DataStorage::FileCid).text())
					.col(ColumnDef::new(DataStorage::FileHash).text())
					.col(ColumnDef::new(DataStorage::FileSize).big_integer())
					.col(ColumnDef::new(DataStorage::FileType).text())
					.col(ColumnDef::new(DataStorage::FileUploadDate).timestamp())
					.col(ColumnDef::new(DataStorage::OwnerId).uuid().not_null())
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.name("idx_data_storage_owner_id")
					.table(DataStorage::Table)
					.col(DataStorage::OwnerId)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(DataStorage::Table).to_owned())
			.await
	}
}

#[derive(DeriveIden)]
enum DataStorage {
	Table,
	Id,
	FileName,
	FileCid,
	FileHash,
	FileSize,
	FileType,
	FileUploadDate,
	OwnerId,
}
