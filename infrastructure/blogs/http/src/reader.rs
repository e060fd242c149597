use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use blog_models::Blog;
use blog_queries::{GetBlogQuery, ListBlogsQuery};
use blog_query_handlers::{GetBlogQueryHandler, ListBlogsQueryHandler};
use common_errors::{ApiResponse, AppError};
use tracing::instrument;
use uuid::Uuid;

use crate::extract::ApiPath;

/// Read side served by the blog service, backed by the read-through cache
#[derive(Clone)]
pub struct BlogReadServices {
    pub list_blogs: ListBlogsQueryHandler,
    pub get_blog: GetBlogQueryHandler,
}

impl BlogReadServices {
    pub fn new(
        list_blogs: ListBlogsQueryHandler, get_blog: GetBlogQueryHandler,
    ) -> Self {
        Self {
            list_blogs,
            get_blog,
        }
    }
}

pub struct BlogReadHandlers;

impl BlogReadHandlers {
    pub fn routes() -> Router<BlogReadServices> {
        Router::new()
            .route("/api/blogs", get(list_blogs))
            .route("/api/blogs/{id}", get(get_blog))
    }
}

#[utoipa::path(
    get,
    path = "/api/blogs",
    params(ListBlogsQuery),
    responses(
        (status = 200, description = "Blogs fetched", body = ApiResponse<Vec<Blog>>),
        (status = 500, description = "Internal server error", body = ApiResponse<common_errors::ApiErrorInfo>)
    ),
    tag = "blogs"
)]
#[instrument(skip_all)]
pub async fn list_blogs(
    State(services): State<BlogReadServices>, Query(query): Query<ListBlogsQuery>,
) -> Result<ApiResponse<Vec<Blog>>, AppError> {
    let blogs = services.list_blogs.execute(query).await?;
    Ok(ApiResponse::ok(blogs, "Blogs fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/api/blogs/{id}",
    params(
        ("id" = Uuid, Path, description = "Blog ID")
    ),
    responses(
        (status = 200, description = "Blog found", body = ApiResponse<Blog>),
        (status = 400, description = "Invalid blog id", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 404, description = "Blog not found", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 500, description = "Internal server error", body = ApiResponse<common_errors::ApiErrorInfo>)
    ),
    tag = "blogs"
)]
#[instrument(skip_all, fields(blog.id = %id))]
pub async fn get_blog(
    State(services): State<BlogReadServices>, ApiPath(id): ApiPath<Uuid>,
) -> Result<ApiResponse<Blog>, AppError> {
    let blog = services.get_blog.execute(GetBlogQuery { blog_id: id }).await?;
    Ok(ApiResponse::ok(blog, "Blog fetched successfully"))
}
