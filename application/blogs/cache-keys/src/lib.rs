use std::borrow::Cow;

use blog_models::{Blog, BlogFilter};
use redis_connection::{
    cache_key,
    core::{CacheKey, pattern},
};
use uuid::Uuid;

cache_key!(BlogCacheKey::<Blog> => "blog:{}"[id: Uuid]);
cache_key!(BlogListCacheKey::<Vec<Blog>> => "blogs:{}:{}"[search: str, category: str]);
cache_key!(CanonicalBlogListKey::<Vec<Blog>> => "blogs::");

/// Namespace shared by every list view
pub const BLOG_LIST_NAMESPACE: &str = "blogs";
/// Matches every list view, filtered or not
pub const BLOG_LIST_PATTERN: &str = "blogs:*";

pub fn list_key(filter: &BlogFilter) -> Cow<'static, str> {
    BlogListCacheKey
        .get_key_with_args((filter.search.as_str(), filter.category.as_str()))
}

pub fn blog_key(id: &Uuid) -> Cow<'static, str> { BlogCacheKey.get_key_with(id) }

/// Patterns invalidated by creating a blog
pub fn created_patterns() -> Vec<String> { vec![BLOG_LIST_PATTERN.to_string()] }

/// Patterns invalidated by updating or deleting blog `id`
pub fn changed_patterns(id: &Uuid) -> Vec<String> {
    vec![
        BLOG_LIST_PATTERN.to_string(),
        pattern::escape(&blog_key(id)),
    ]
}

/// Whether keys deleted through `key_pattern` can include list views
pub fn touches_lists(key_pattern: &str) -> bool {
    pattern::namespace(key_pattern) == BLOG_LIST_NAMESPACE
        || pattern::glob_match(key_pattern, &CanonicalBlogListKey.get_key())
}

#[cfg(test)]
mod tests {
    use redis_connection::core::glob_match;

    use super::*;

    #[test]
    fn test_canonical_key_is_unfiltered_list_key() {
        assert_eq!(
            list_key(&BlogFilter::default()),
            CanonicalBlogListKey.get_key()
        );
        assert_eq!(
            list_key(&BlogFilter::new(None, Some("Tech".into()))),
            "blogs::Tech"
        );
        assert_eq!(
            list_key(&BlogFilter::new(Some("rust".into()), None)),
            "blogs:rust:"
        );
    }

    #[test]
    fn test_list_pattern_spares_single_blogs() {
        let id = Uuid::now_v7();

        assert!(glob_match(BLOG_LIST_PATTERN, "blogs::"));
        assert!(glob_match(BLOG_LIST_PATTERN, "blogs:rust:Tech"));
        assert!(!glob_match(BLOG_LIST_PATTERN, &blog_key(&id)));
    }

    #[test]
    fn test_changed_patterns() {
        let id = Uuid::now_v7();
        let patterns = changed_patterns(&id);

        assert_eq!(patterns[0], BLOG_LIST_PATTERN);
        assert!(glob_match(&patterns[1], &blog_key(&id)));
        assert!(!glob_match(&patterns[1], &blog_key(&Uuid::now_v7())));
        assert_eq!(created_patterns(), vec![BLOG_LIST_PATTERN.to_string()]);
    }

    #[test]
    fn test_touches_lists() {
        assert!(touches_lists(BLOG_LIST_PATTERN));
        assert!(touches_lists("blogs::Tech"));
        assert!(touches_lists("*"));
        assert!(!touches_lists("blog:42"));
    }
}
