use std::{fmt::Display, path::Path};

use thiserror::Error;
use tracing::error;

/// Report an error with tracing
pub fn report_error(res: &Result<(), impl Display>) {
	if let Err(e) = res {
		error!("{e:#}");
	}
}

/// File I/O error that includes the path that caused the error
#[derive(Error, Debug)]
#[error("file I/O error{}: {source}; path: '{}'", context_suffix(.maybe_context), .path.display())]
pub struct FileIOError {
	pub path: Box<Path>,
	#[source]
	pub source: std::io::Error,
	pub maybe_context: Option<String>,
}

fn context_suffix(maybe_context: &Option<String>) -> String {
	maybe_context
		.as_ref()
		.map(|ctx| format!(" ({ctx})"))
		.unwrap_or_default()
}

impl FileIOError {
	pub fn from_std_io_err(path: impl AsRef<Path>, source: std::io::Error) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: None,
		}
	}

	pub fn from_std_io_err_with_msg(
		path: impl AsRef<Path>,
		source: std::io::Error,
		msg: impl Into<String>,
	) -> Self {
		Self {
			path: path.as_ref().into(),
			source,
			maybe_context: Some(msg.into()),
		}
	}
}

impl From<(&Path, std::io::Error)> for FileIOError {
	fn from((path, source): (&Path, std::io::Error)) -> Self {
		Self::from_std_io_err(path, source)
	}
}
