//! SQLite backed record store using SeaORM

use nc_utils::{
	db::{maybe_missing, size_from_db, size_to_db, MissingFieldError},
	error::FileIOError,
};

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use sea_orm::{
	ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, Database, DatabaseConnection,
	EntityTrait, QueryFilter, QueryOrder,
};
use sea_orm_migration::MigratorTrait;
use tokio::fs;
use tracing::{info, instrument, trace};

use crate::{
	error::StoreError,
	record::{DataStorageRecord, NewRecord, OwnerId, RecordId},
};

use super::RecordStore;

pub mod entity;
mod migration;

use entity::{ActiveModel, Column, Entity, Model};

#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
	conn: DatabaseConnection,
}

impl SqliteRecordStore {
	/// Opens the database at `path`, creating it and running migrations when needed
	pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
		let path = path.as_ref();

		if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
			fs::create_dir_all(parent).await.map_err(|e| {
				FileIOError::from_std_io_err_with_msg(parent, e, "creating database directory")
			})?;
		}

		let store = Self::connect(format!("sqlite://{}?mode=rwc", path.display())).await?;

		info!(path = %path.display(), "Opened records database;");

		Ok(store)
	}

	pub async fn connect(db_url: impl Into<String>) -> Result<Self, StoreError> {
		let mut opt = ConnectOptions::new(db_url.into());
		opt.max_connections(10)
			.min_connections(1)
			.connect_timeout(Duration::from_secs(8))
			.sqlx_logging(false); // We'll use tracing instead

		let conn = Database::connect(opt).await?;
		migration::Migrator::up(&conn, None).await?;

		Ok(Self { conn })
	}

	#[must_use]
	pub const fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}

	/// Commits a new record. Records are normally written by the upload path, this is here
	/// for tooling and tests.
	#[instrument(skip(self, new_record), fields(owner_id = %new_record.owner_id), err)]
	pub async fn insert(&self, new_record: NewRecord) -> Result<DataStorageRecord, StoreError> {
		let file_size = size_to_db(new_record.file_size)?;

		let model = ActiveModel {
			file_name: Set(Some(new_record.file_name.clone())),
			file_cid: Set(Some(new_record.file_cid.clone())),
			file_hash: Set(Some(new_record.file_hash.clone())),
			file_size: Set(Some(file_size)),
			file_type: Set(Some(new_record.file_type.clone())),
			file_upload_date: Set(Some(new_record.upload_timestamp)),
			owner_id: Set(*new_record.owner_id.as_uuid()),
			..Default::default()
		}
		.insert(&self.conn)
		.await?;

		trace!(record_id = model.id, "Inserted record;");

		Ok(new_record.into_record(model.id))
	}

	pub async fn delete(&self, record_id: RecordId) -> Result<bool, StoreError> {
		Entity::delete_by_id(record_id)
			.exec(&self.conn)
			.await
			.map(|res| res.rows_affected > 0)
			.map_err(Into::into)
	}
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
	#[instrument(skip(self), err)]
	async fn list_by_owner(&self, owner_id: OwnerId) -> Result<Vec<DataStorageRecord>, StoreError> {
		Entity::find()
			.filter(Column::OwnerId.eq(*owner_id.as_uuid()))
			.order_by_asc(Column::Id)
			.all(&self.conn)
			.await?
			.into_iter()
			.map(DataStorageRecord::try_from)
			.collect()
	}
}

impl TryFrom<Model> for DataStorageRecord {
	type Error = StoreError;

	fn try_from(model: Model) -> Result<Self, Self::Error> {
		let Model {
			id,
			file_name,
			file_cid,
			file_hash,
			file_size,
			file_type,
			file_upload_date,
			owner_id,
		} = model;

		let missing = |e: MissingFieldError| StoreError::missing_field(id, &e);

		Ok(Self {
			id,
			owner_id: OwnerId::from_uuid(owner_id),
			file_name: file_name.unwrap_or_default(),
			file_type: file_type.unwrap_or_default(),
			file_cid: maybe_missing(file_cid, "data_storage.file_cid").map_err(missing)?,
			file_size: size_from_db(
				maybe_missing(file_size, "data_storage.file_size").map_err(missing)?,
			)
			.map_err(|e| StoreError::bad_size(id, e))?,
			file_hash: file_hash.unwrap_or_default(),
			upload_timestamp: maybe_missing(file_upload_date, "data_storage.file_upload_date")
				.map_err(missing)?,
		})
	}
}
