//! axum routers for the two services. The blog service mounts
//! [`BlogReadHandlers`]; the author service mounts [`AuthorHandlers`].

pub mod author;
pub mod caller;
pub mod extract;
pub mod reader;

pub use author::{AuthorHandlers, AuthorServices, DeletedBlog};
pub use caller::{CALLER_HEADER, Caller};
pub use extract::{ApiJson, ApiPath};
pub use reader::{BlogReadHandlers, BlogReadServices};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(reader::list_blogs, reader::get_blog),
    components(schemas(
        blog_models::Blog,
        common_errors::ApiErrorInfo,
    )),
    tags((name = "blogs", description = "Cached blog reads"))
)]
pub struct BlogReadApiDoc;

#[derive(OpenApi)]
#[openapi(
    paths(author::create_blog, author::update_blog, author::delete_blog),
    components(schemas(
        blog_models::Blog,
        blog_commands::CreateBlogCommand,
        blog_commands::UpdateBlogCommand,
        DeletedBlog,
        common_errors::ApiErrorInfo,
    )),
    tags((name = "author", description = "Blog writes by their authors"))
)]
pub struct AuthorApiDoc;
