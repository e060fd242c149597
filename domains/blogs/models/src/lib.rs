use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TypedBuilder,
    ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[builder(default = Uuid::now_v7())]
    pub id: Uuid,
    #[builder(setter(into))]
    pub title: String,
    #[builder(setter(into))]
    pub description: String,
    #[builder(default, setter(strip_option, into))]
    pub image: Option<String>,
    #[builder(setter(into))]
    pub blog_content: String,
    #[builder(setter(into))]
    pub category: String,
    pub author: Uuid,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a blog is written
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct NewBlog {
    #[builder(setter(into))]
    pub title: String,
    #[builder(setter(into))]
    pub description: String,
    #[builder(default, setter(strip_option, into))]
    pub image: Option<String>,
    #[builder(setter(into))]
    pub blog_content: String,
    #[builder(setter(into))]
    pub category: String,
    pub author: Uuid,
}

/// Partial update; `None` leaves a field unchanged
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub blog_content: Option<String>,
    pub category: Option<String>,
}

impl Blog {
    pub fn from_new(new: NewBlog) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: new.title,
            description: new.description,
            image: new.image,
            blog_content: new.blog_content,
            category: new.category,
            author: new.author,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: BlogChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(image) = changes.image {
            self.image = Some(image);
        }
        if let Some(blog_content) = changes.blog_content {
            self.blog_content = blog_content;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        self.updated_at = Utc::now();
    }
}

/// List filter. Empty strings mean "no filter", which is how the canonical
/// list is requested.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogFilter {
    /// Case-insensitive substring of title or description
    pub search: String,
    /// Exact category
    pub category: String,
}

impl BlogFilter {
    pub fn new(search: Option<String>, category: Option<String>) -> Self {
        Self {
            search: search.unwrap_or_default(),
            category: category.unwrap_or_default(),
        }
    }

    pub fn matches(&self, blog: &Blog) -> bool {
        let search_ok = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            blog.title.to_lowercase().contains(&needle)
                || blog.description.to_lowercase().contains(&needle)
        };
        let category_ok =
            self.category.is_empty() || blog.category == self.category;

        search_ok && category_ok
    }
}
