//! Data query placeholder

use crate::AppError;

/// Stored events are read from the warehouse, never through this service
pub async fn query() -> AppError {
    AppError::NotAvailable
}
