use axum::{
    Router,
    extract::State,
    routing::{post, put},
};
use blog_command_handlers::{
    CreateBlogHandler, DeleteBlogHandler, UpdateBlogHandler,
};
use blog_commands::{CreateBlogCommand, DeleteBlogCommand, UpdateBlogCommand};
use blog_models::Blog;
use common_errors::{ApiResponse, AppError};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    caller::Caller,
    extract::{ApiJson, ApiPath},
};

/// Write side served by the author service
#[derive(Clone)]
pub struct AuthorServices {
    pub create_blog: CreateBlogHandler,
    pub update_blog: UpdateBlogHandler,
    pub delete_blog: DeleteBlogHandler,
}

impl AuthorServices {
    pub fn new(
        create_blog: CreateBlogHandler, update_blog: UpdateBlogHandler,
        delete_blog: DeleteBlogHandler,
    ) -> Self {
        Self {
            create_blog,
            update_blog,
            delete_blog,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedBlog {
    pub id: Uuid,
}

pub struct AuthorHandlers;

impl AuthorHandlers {
    pub fn routes() -> Router<AuthorServices> {
        Router::new()
            .route("/api/blogs", post(create_blog))
            .route("/api/blogs/{id}", put(update_blog).delete(delete_blog))
    }
}

#[utoipa::path(
    post,
    path = "/api/blogs",
    request_body = CreateBlogCommand,
    params(
        ("x-user-id" = Uuid, Header, description = "Authenticated author")
    ),
    responses(
        (status = 201, description = "Blog created", body = ApiResponse<Blog>),
        (status = 400, description = "Required fields missing or body malformed", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 401, description = "Caller missing or invalid", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 500, description = "Internal server error", body = ApiResponse<common_errors::ApiErrorInfo>)
    ),
    tag = "author"
)]
#[instrument(skip_all, fields(caller = %caller))]
pub async fn create_blog(
    State(services): State<AuthorServices>, Caller(caller): Caller,
    ApiJson(mut command): ApiJson<CreateBlogCommand>,
) -> Result<ApiResponse<Blog>, AppError> {
    command.author = caller;
    let blog = services.create_blog.execute(command).await?;
    Ok(ApiResponse::created(blog, "Blog created successfully"))
}

#[utoipa::path(
    put,
    path = "/api/blogs/{id}",
    request_body = UpdateBlogCommand,
    params(
        ("id" = Uuid, Path, description = "Blog ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated author")
    ),
    responses(
        (status = 200, description = "Blog updated", body = ApiResponse<Blog>),
        (status = 400, description = "Invalid blog id or body", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 401, description = "Caller missing or invalid", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 403, description = "Caller is not the author", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 404, description = "Blog not found", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 500, description = "Internal server error", body = ApiResponse<common_errors::ApiErrorInfo>)
    ),
    tag = "author"
)]
#[instrument(skip_all, fields(blog.id = %id, caller = %caller))]
pub async fn update_blog(
    State(services): State<AuthorServices>, ApiPath(id): ApiPath<Uuid>,
    Caller(caller): Caller, ApiJson(mut command): ApiJson<UpdateBlogCommand>,
) -> Result<ApiResponse<Blog>, AppError> {
    command.blog_id = id;
    command.caller = caller;
    let blog = services.update_blog.execute(command).await?;
    Ok(ApiResponse::ok(blog, "Blog updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/blogs/{id}",
    params(
        ("id" = Uuid, Path, description = "Blog ID"),
        ("x-user-id" = Uuid, Header, description = "Authenticated author")
    ),
    responses(
        (status = 200, description = "Blog deleted", body = ApiResponse<DeletedBlog>),
        (status = 400, description = "Invalid blog id", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 401, description = "Caller missing or invalid", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 403, description = "Caller is not the author", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 404, description = "Blog not found", body = ApiResponse<common_errors::ApiErrorInfo>),
        (status = 500, description = "Internal server error", body = ApiResponse<common_errors::ApiErrorInfo>)
    ),
    tag = "author"
)]
#[instrument(skip_all, fields(blog.id = %id, caller = %caller))]
pub async fn delete_blog(
    State(services): State<AuthorServices>, ApiPath(id): ApiPath<Uuid>,
    Caller(caller): Caller,
) -> Result<ApiResponse<DeletedBlog>, AppError> {
    services
        .delete_blog
        .execute(DeleteBlogCommand {
            blog_id: id,
            caller,
        })
        .await?;
    Ok(ApiResponse::ok(DeletedBlog { id }, "Blog deleted successfully"))
}
