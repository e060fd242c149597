use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use blog_errors::BlogError;
use blog_models::{Blog, BlogChanges, BlogFilter, NewBlog};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::BlogStore;

/// In-process store for single-process runs and tests
#[derive(Clone, Default)]
pub struct MemoryBlogStore {
    blogs: Arc<RwLock<HashMap<Uuid, Blog>>>,
}

impl MemoryBlogStore {
    pub fn new() -> Self { Self::default() }

    /// Inserts a fully formed blog, keeping its id and timestamps
    pub async fn insert(&self, blog: Blog) {
        self.blogs.write().await.insert(blog.id, blog);
    }

    pub async fn len(&self) -> usize { self.blogs.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.blogs.read().await.is_empty() }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn find(&self, filter: &BlogFilter) -> Result<Vec<Blog>, BlogError> {
        let blogs = self.blogs.read().await;
        let mut found: Vec<Blog> = blogs
            .values()
            .filter(|blog| filter.matches(blog))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
        });
        Ok(found)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>, BlogError> {
        Ok(self.blogs.read().await.get(&id).cloned())
    }

    async fn create(&self, blog: NewBlog) -> Result<Blog, BlogError> {
        let blog = Blog::from_new(blog);
        self.blogs.write().await.insert(blog.id, blog.clone());
        Ok(blog)
    }

    async fn update(
        &self, id: Uuid, changes: BlogChanges,
    ) -> Result<Option<Blog>, BlogError> {
        let mut blogs = self.blogs.write().await;
        Ok(blogs.get_mut(&id).map(|blog| {
            blog.apply(changes);
            blog.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, BlogError> {
        Ok(self.blogs.write().await.remove(&id).is_some())
    }
}
