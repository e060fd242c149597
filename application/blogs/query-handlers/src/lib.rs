use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use blog_cache_keys::{CanonicalBlogListKey, blog_key, list_key, touches_lists};
use blog_dao::BlogStore;
use blog_errors::BlogError;
use blog_models::{Blog, BlogFilter};
use blog_queries::{GetBlogQuery, ListBlogsQuery};
use event_bus::{RebuildError, ViewRebuilder};
use redis_connection::{
    cache::{CacheJsonExt, CacheTrait, ReadThrough},
    core::CacheKey,
};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ListBlogsQueryHandler {
    store: Arc<dyn BlogStore>,
    cache: ReadThrough,
}

impl ListBlogsQueryHandler {
    pub fn new(store: Arc<dyn BlogStore>, cache: ReadThrough) -> Self {
        Self { store, cache }
    }

    #[instrument(skip(self))]
    pub async fn execute(
        &self, query: ListBlogsQuery,
    ) -> Result<Vec<Blog>, BlogError> {
        let filter = query.filter();
        let key = list_key(&filter);

        self.cache
            .get_or_load(&key, self.cache.ttl(), || {
                async {
                    debug!("Loading blog list for {}", key);
                    self.store.find(&filter).await
                }
            })
            .await
    }
}

#[derive(Clone)]
pub struct GetBlogQueryHandler {
    store: Arc<dyn BlogStore>,
    cache: ReadThrough,
}

impl GetBlogQueryHandler {
    pub fn new(store: Arc<dyn BlogStore>, cache: ReadThrough) -> Self {
        Self { store, cache }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, query: GetBlogQuery) -> Result<Blog, BlogError> {
        let blog_id = query.blog_id;

        self.cache
            .get_or_load(&blog_key(&blog_id), self.cache.ttl(), || {
                async move {
                    self.store
                        .find_by_id(blog_id)
                        .await?
                        .ok_or(BlogError::NotFound { blog_id })
                }
            })
            .await
    }
}

/// Recomputes the unfiltered, newest-first list stored under `blogs::`
pub struct CanonicalListRebuilder {
    store: Arc<dyn BlogStore>,
}

impl CanonicalListRebuilder {
    pub fn new(store: Arc<dyn BlogStore>) -> Self { Self { store } }
}

#[async_trait]
impl ViewRebuilder for CanonicalListRebuilder {
    fn name(&self) -> &str { "canonical-blog-list" }

    fn covers(&self, pattern: &str) -> bool { touches_lists(pattern) }

    #[instrument(skip_all)]
    async fn rebuild(
        &self, cache: &dyn CacheTrait, ttl: Duration,
    ) -> Result<(), RebuildError> {
        let blogs = self.store.find(&BlogFilter::default()).await?;
        let key = CanonicalBlogListKey.get_key();
        cache.set_json(&key, &blogs, ttl).await?;
        debug!("Stored {} blogs under {}", blogs.len(), key);
        Ok(())
    }
}
