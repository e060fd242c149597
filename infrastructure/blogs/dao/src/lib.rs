use async_trait::async_trait;
use blog_errors::BlogError;
use blog_models::{Blog, BlogChanges, BlogFilter, NewBlog};
use uuid::Uuid;

pub mod blogs;
pub mod memory;
pub mod schema;

pub use blogs::BlogDao;
pub use memory::MemoryBlogStore;
pub use schema::ensure_schema;

/// Source of record for blogs. Lists are ordered newest first.
#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn find(&self, filter: &BlogFilter) -> Result<Vec<Blog>, BlogError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>, BlogError>;

    async fn create(&self, blog: NewBlog) -> Result<Blog, BlogError>;

    /// `None` when no blog has this id
    async fn update(
        &self, id: Uuid, changes: BlogChanges,
    ) -> Result<Option<Blog>, BlogError>;

    /// True when a blog was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, BlogError>;
}
