//! Conversions between domain integers and the signed columns SQLite stores them in.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeConversionError {
	#[error("negative size in database: {0}")]
	Negative(i64),
	#[error("size {0} does not fit into a database column")]
	TooLarge(u64),
}

/// Sizes are stored as `BIGINT`, so a negative value means a corrupted row
pub fn size_from_db(db_size: i64) -> Result<u64, SizeConversionError> {
	u64::try_from(db_size).map_err(|_| SizeConversionError::Negative(db_size))
}

pub fn size_to_db(size: u64) -> Result<i64, SizeConversionError> {
	i64::try_from(size).map_err(|_| SizeConversionError::TooLarge(size))
}

#[derive(Error, Debug)]
#[error("Missing field {0}")]
pub struct MissingFieldError(&'static str);

impl MissingFieldError {
	#[must_use]
	pub const fn new(value: &'static str) -> Self {
		Self(value)
	}
}

/// Unwraps an optional column, failing with the column name when it is `NULL`
pub fn maybe_missing<T>(data: Option<T>, field: &'static str) -> Result<T, MissingFieldError> {
	data.ok_or(MissingFieldError::new(field))
}
