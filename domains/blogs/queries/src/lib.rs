use blog_models::BlogFilter;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBlogsQuery {
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    /// Exact category
    pub category: Option<String>,
}

impl ListBlogsQuery {
    pub fn filter(&self) -> BlogFilter {
        BlogFilter::new(self.search.clone(), self.category.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetBlogQuery {
    pub blog_id: Uuid,
}
