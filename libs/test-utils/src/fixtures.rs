use blog_models::{Blog, NewBlog};
use chrono::{Duration, Utc};
use uuid::Uuid;

/// A blog created `age_secs` seconds ago
pub fn blog_aged(title: &str, category: &str, age_secs: i64) -> Blog {
    let at = Utc::now() - Duration::seconds(age_secs);
    Blog::builder()
        .title(title)
        .description(format!("All about {title}"))
        .blog_content(format!("{title} body"))
        .category(category)
        .author(Uuid::now_v7())
        .created_at(at)
        .updated_at(at)
        .build()
}

pub fn blog(title: &str, category: &str) -> Blog { blog_aged(title, category, 0) }

pub fn new_blog(author: Uuid, title: &str, category: &str) -> NewBlog {
    NewBlog::builder()
        .title(title)
        .description(format!("All about {title}"))
        .blog_content(format!("{title} body"))
        .category(category)
        .author(author)
        .build()
}

pub fn titles(blogs: &[Blog]) -> Vec<&str> {
    blogs.iter().map(|b| b.title.as_str()).collect()
}
