use blog_errors::BlogError;
use sql_connection::SqlConnect;
use tracing::{info, instrument};

const CREATE_BLOGS: &str =
    include_str!("../../../../domains/blogs/migrations/sql/001_create_blogs.sql");

/// Creates the `blogs` table and its indexes when missing
#[instrument(skip_all)]
pub async fn ensure_schema(db: &SqlConnect) -> Result<(), BlogError> {
    let client = db.get_client().await?;
    client.batch_execute(CREATE_BLOGS).await?;
    info!("Blog schema ready");
    Ok(())
}
