use async_trait::async_trait;
use blog_errors::BlogError;
use blog_models::{Blog, BlogChanges, BlogFilter, NewBlog};
use dao_utils::query_helpers::{WhereBuilder, contains_pattern};
use sql_connection::SqlConnect;
use tracing::instrument;
use uuid::Uuid;

use crate::BlogStore;

const COLUMNS: &str = "id, title, description, image, blog_content, \
                       category, author, created_at, updated_at";

#[derive(Clone)]
pub struct BlogDao {
    db: SqlConnect,
}

impl BlogDao {
    pub fn new(db: SqlConnect) -> Self { Self { db } }

    pub fn db(&self) -> &SqlConnect { &self.db }

    fn map_row(row: &tokio_postgres::Row) -> Blog {
        Blog {
            id: row.get(0),
            title: row.get(1),
            description: row.get(2),
            image: row.get(3),
            blog_content: row.get(4),
            category: row.get(5),
            author: row.get(6),
            created_at: row.get(7),
            updated_at: row.get(8),
        }
    }
}

#[async_trait]
impl BlogStore for BlogDao {
    #[instrument(skip(self))]
    async fn find(&self, filter: &BlogFilter) -> Result<Vec<Blog>, BlogError> {
        let client = self.db.get_client().await?;

        let mut conditions = WhereBuilder::new();
        if !filter.search.is_empty() {
            conditions.push(
                "(title ILIKE {} OR description ILIKE {})",
                contains_pattern(&filter.search),
            );
        }
        if !filter.category.is_empty() {
            conditions.push("category = {}", filter.category.clone());
        }

        let query = format!(
            "SELECT {COLUMNS} FROM blogs{} ORDER BY created_at DESC, id DESC",
            conditions.clause()
        );
        let stmt = client.prepare(&query).await?;
        let rows = client.query(&stmt, &conditions.params()).await?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>, BlogError> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare(&format!("SELECT {COLUMNS} FROM blogs WHERE id = $1"))
            .await?;
        let row = client.query_opt(&stmt, &[&id]).await?;

        Ok(row.as_ref().map(Self::map_row))
    }

    #[instrument(skip(self, blog), fields(blog.author = %blog.author))]
    async fn create(&self, blog: NewBlog) -> Result<Blog, BlogError> {
        let blog = Blog::from_new(blog);
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare(&format!(
                "INSERT INTO blogs ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, \
                 $6, $7, $8, $9) RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client
            .query_one(&stmt, &[
                &blog.id,
                &blog.title,
                &blog.description,
                &blog.image,
                &blog.blog_content,
                &blog.category,
                &blog.author,
                &blog.created_at,
                &blog.updated_at,
            ])
            .await?;

        Ok(Self::map_row(&row))
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self, id: Uuid, changes: BlogChanges,
    ) -> Result<Option<Blog>, BlogError> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare(&format!(
                "UPDATE blogs SET title = COALESCE($2, title), description = \
                 COALESCE($3, description), image = COALESCE($4, image), \
                 blog_content = COALESCE($5, blog_content), category = \
                 COALESCE($6, category), updated_at = NOW() WHERE id = $1 \
                 RETURNING {COLUMNS}"
            ))
            .await?;
        let row = client
            .query_opt(&stmt, &[
                &id,
                &changes.title,
                &changes.description,
                &changes.image,
                &changes.blog_content,
                &changes.category,
            ])
            .await?;

        Ok(row.as_ref().map(Self::map_row))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<bool, BlogError> {
        let client = self.db.get_client().await?;
        let stmt = client.prepare("DELETE FROM blogs WHERE id = $1").await?;
        let affected = client.execute(&stmt, &[&id]).await?;

        Ok(affected > 0)
    }
}
