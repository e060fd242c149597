use std::sync::Arc;

use blog_cache_keys::{changed_patterns, created_patterns};
use blog_commands::{CreateBlogCommand, DeleteBlogCommand, UpdateBlogCommand};
use blog_dao::BlogStore;
use blog_errors::BlogError;
use blog_models::Blog;
use event_bus::InvalidationPublisher;
use tracing::{info, instrument};
use uuid::Uuid;

/// Loads a blog and checks that `caller` wrote it
async fn owned_blog(
    store: &dyn BlogStore, blog_id: Uuid, caller: Uuid,
) -> Result<Blog, BlogError> {
    let blog = store
        .find_by_id(blog_id)
        .await?
        .ok_or(BlogError::NotFound { blog_id })?;

    if blog.author != caller {
        return Err(BlogError::Forbidden { blog_id, caller });
    }
    Ok(blog)
}

#[derive(Clone)]
pub struct CreateBlogHandler {
    store: Arc<dyn BlogStore>,
    publisher: Arc<InvalidationPublisher>,
}

impl CreateBlogHandler {
    pub fn new(
        store: Arc<dyn BlogStore>, publisher: Arc<InvalidationPublisher>,
    ) -> Self {
        Self { store, publisher }
    }

    #[instrument(skip(self, command), fields(blog.author = %command.author))]
    pub async fn execute(
        &self, command: CreateBlogCommand,
    ) -> Result<Blog, BlogError> {
        let missing = command.missing_fields();
        if !missing.is_empty() {
            return Err(BlogError::MissingFields(missing));
        }

        let blog = self.store.create(command.into()).await?;
        info!(blog.id = %blog.id, "Blog created");

        self.publisher
            .publish_invalidation(created_patterns())
            .await;

        Ok(blog)
    }
}

#[derive(Clone)]
pub struct UpdateBlogHandler {
    store: Arc<dyn BlogStore>,
    publisher: Arc<InvalidationPublisher>,
}

impl UpdateBlogHandler {
    pub fn new(
        store: Arc<dyn BlogStore>, publisher: Arc<InvalidationPublisher>,
    ) -> Self {
        Self { store, publisher }
    }

    #[instrument(skip(self, command), fields(blog.id = %command.blog_id))]
    pub async fn execute(
        &self, command: UpdateBlogCommand,
    ) -> Result<Blog, BlogError> {
        let blog_id = command.blog_id;
        owned_blog(self.store.as_ref(), blog_id, command.caller).await?;

        let blog = self
            .store
            .update(blog_id, command.changes())
            .await?
            .ok_or(BlogError::NotFound { blog_id })?;

        self.publisher
            .publish_invalidation(changed_patterns(&blog_id))
            .await;

        Ok(blog)
    }
}

#[derive(Clone)]
pub struct DeleteBlogHandler {
    store: Arc<dyn BlogStore>,
    publisher: Arc<InvalidationPublisher>,
}

impl DeleteBlogHandler {
    pub fn new(
        store: Arc<dyn BlogStore>, publisher: Arc<InvalidationPublisher>,
    ) -> Self {
        Self { store, publisher }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, command: DeleteBlogCommand,
    ) -> Result<(), BlogError> {
        let blog_id = command.blog_id;
        owned_blog(self.store.as_ref(), blog_id, command.caller).await?;

        if !self.store.delete(blog_id).await? {
            return Err(BlogError::NotFound { blog_id });
        }

        self.publisher
            .publish_invalidation(changed_patterns(&blog_id))
            .await;

        Ok(())
    }
}
