//! Data storage entity, one row per file committed to the content-addressable store

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "data_storage")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i64,
	pub file_name: Option<String>,
	pub file_cid: Option<String>,
	pub file_hash: Option<String>,
	pub file_size: Option<i64>,
	pub file_type: Option<String>,
	pub file_upload_date: Option<DateTimeUtc>,
	pub owner_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
