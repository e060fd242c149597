use common_errors::AppError;
use sql_connection::{PgError, PoolError as DbPoolError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("Blog not found: {blog_id}")]
    NotFound { blog_id: Uuid },
    #[error("User {caller} is not the author of blog {blog_id}")]
    Forbidden { blog_id: Uuid, caller: Uuid },
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Database error: {0}")]
    Database(#[from] PgError),
    #[error("Database Pool error: {0}")]
    DatabasePool(#[from] DbPoolError),
}

impl From<BlogError> for AppError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::NotFound { .. } => {
                AppError::not_found("BLOG_NOT_FOUND", "Blog not found")
            }
            BlogError::Forbidden { .. } => {
                AppError::forbidden(
                    "NOT_BLOG_AUTHOR",
                    "You are not the author of this blog",
                )
            }
            BlogError::MissingFields(fields) => {
                AppError::bad_request_with_details(
                    "MISSING_FIELDS",
                    "Please fill all required fields",
                    &fields.join(", "),
                )
            }
            BlogError::Database(db_err) => {
                AppError::internal_server_error(&format!(
                    "Database error: {db_err}"
                ))
            }
            BlogError::DatabasePool(pool_err) => {
                AppError::internal_server_error(&format!(
                    "Database connection error: {pool_err}"
                ))
            }
        }
    }
}
