use checkguard_core::CoreError;
use rusqlite::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sql(#[source] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid data path: {0}")]
    InvalidDataPath(PathBuf),
    #[error("invalid stored row: {0}")]
    InvalidRow(String),
    #[error("invalid pool options: {0}")]
    InvalidPoolOptions(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            let input_constraint = failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_CHECK | rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL
                );
            if input_constraint {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                return StoreError::Constraint(detail);
            }
        }
        StoreError::Sql(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Io,
    Sql,
    Pool,
    Core,
    Constraint,
    NotFound,
    Migration,
    MissingHomeDir,
    InvalidDataPath,
    InvalidRow,
    InvalidPoolOptions,
}

/// Outcome classes a caller needs to tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rejected input; retrying with the same data fails again.
    InvalidInput,
    NotFound,
    /// The database could not be reached or the write failed.
    StoreUnavailable,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::Io(_) => StoreErrorKind::Io,
            StoreError::Sql(_) => StoreErrorKind::Sql,
            StoreError::Pool(_) => StoreErrorKind::Pool,
            StoreError::Core(_) => StoreErrorKind::Core,
            StoreError::Constraint(_) => StoreErrorKind::Constraint,
            StoreError::NotFound(_) => StoreErrorKind::NotFound,
            StoreError::Migration(_) => StoreErrorKind::Migration,
            StoreError::MissingHomeDir => StoreErrorKind::MissingHomeDir,
            StoreError::InvalidDataPath(_) => StoreErrorKind::InvalidDataPath,
            StoreError::InvalidRow(_) => StoreErrorKind::InvalidRow,
            StoreError::InvalidPoolOptions(_) => StoreErrorKind::InvalidPoolOptions,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.kind() {
            StoreErrorKind::Core
            | StoreErrorKind::Constraint
            | StoreErrorKind::InvalidPoolOptions => ErrorClass::InvalidInput,
            StoreErrorKind::NotFound => ErrorClass::NotFound,
            StoreErrorKind::Io
            | StoreErrorKind::Sql
            | StoreErrorKind::Pool
            | StoreErrorKind::Migration
            | StoreErrorKind::MissingHomeDir
            | StoreErrorKind::InvalidDataPath
            | StoreErrorKind::InvalidRow => ErrorClass::StoreUnavailable,
        }
    }
}
