//! HTTP handlers for all API routes.

pub mod health;
pub mod sensors;
pub mod predictions;
pub mod model;

use agrisense_common::error::ApiError;
use agrisense_db::DbError;

/// Record-store failures surface as 500s.
pub(crate) fn store_error(e: DbError) -> ApiError {
    ApiError::Internal(format!("record store: {}", e))
}
