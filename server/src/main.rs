mod config;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use blog_command_handlers::{
    CreateBlogHandler, DeleteBlogHandler, UpdateBlogHandler,
};
use blog_dao::{BlogDao, BlogStore, MemoryBlogStore, ensure_schema};
use blog_http::{
    AuthorApiDoc, AuthorHandlers, AuthorServices, BlogReadApiDoc,
    BlogReadHandlers, BlogReadServices,
};
use blog_query_handlers::{
    CanonicalListRebuilder, GetBlogQueryHandler, ListBlogsQueryHandler,
};
use clap::Parser;
use event_bus::{
    InvalidationConsumer, InvalidationPublisher, MemoryChannel, MessageChannel,
    MessageSource, PipelineConfig, RedisStreamChannel,
};
use redis_connection::{
    cache::{CacheTrait, MemoryCache, ReadThrough, RedisCache},
    connect_redis_db,
    connection::RedisConnectionManager,
};
use sql_connection::{SqlConnect, connect_postgres_db};
use tokio::{sync::watch, task::JoinHandle};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::config::{Cli, Service, ServiceArgs, StandaloneArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().service {
        Service::Author(args) => run_author(args).await,
        Service::Blog(args) => run_blog(args).await,
        Service::Standalone(args) => run_standalone(args).await,
    }
}

/// Pools shared by the author and blog services
struct Infra {
    db: SqlConnect,
    redis: RedisConnectionManager,
}

async fn connect(args: &ServiceArgs) -> anyhow::Result<Infra> {
    info!("Initializing connection pools...");

    let pg_pool = connect_postgres_db(&args.postgres_config())
        .await
        .context("Failed to create PostgreSQL pool")?;
    let db = SqlConnect::new(pg_pool);
    ensure_schema(&db)
        .await
        .context("Failed to prepare blog schema")?;
    info!("PostgreSQL connection pool initialized");

    let redis_pool = connect_redis_db(&args.redis_config())
        .await
        .context("Failed to create Redis pool")?;
    let redis = RedisConnectionManager::new(redis_pool);
    if let Err(e) = redis.ping().await {
        warn!("Redis not reachable at startup: {}", e);
    }
    info!("Redis connection pool initialized");

    Ok(Infra { db, redis })
}

async fn run_author(args: ServiceArgs) -> anyhow::Result<()> {
    let infra = connect(&args).await?;
    let pipeline = args.pipeline.config();

    let store: Arc<dyn BlogStore> = Arc::new(BlogDao::new(infra.db.clone()));
    let channel: Arc<dyn MessageChannel> = Arc::new(RedisStreamChannel::new(
        infra.redis.pool().clone(),
        &pipeline,
    ));
    let publisher = Arc::new(InvalidationPublisher::new(channel, &pipeline));

    let app =
        AuthorHandlers::routes().with_state(author_services(&store, &publisher));
    let health = Health {
        service: "author",
        db: Some(infra.db),
        redis: Some(infra.redis),
    };

    serve(app, AuthorApiDoc::openapi(), health, args.http.bind_addr).await
}

async fn run_blog(args: ServiceArgs) -> anyhow::Result<()> {
    let infra = connect(&args).await?;
    let pipeline = args.pipeline.config();

    let store: Arc<dyn BlogStore> = Arc::new(BlogDao::new(infra.db.clone()));
    let cache: Arc<dyn CacheTrait> =
        Arc::new(RedisCache::new(infra.redis.pool().clone()));
    let source: Arc<dyn MessageSource> = Arc::new(RedisStreamChannel::new(
        infra.redis.pool().clone(),
        &pipeline,
    ));

    let (stop, consumer) = start_consumer(source, &cache, &store, &pipeline);
    let app = BlogReadHandlers::routes()
        .with_state(read_services(&store, &cache, &pipeline));
    let health = Health {
        service: "blog",
        db: Some(infra.db),
        redis: Some(infra.redis),
    };

    let served =
        serve(app, BlogReadApiDoc::openapi(), health, args.http.bind_addr).await;
    stop_consumer(stop, consumer).await;
    served
}

async fn run_standalone(args: StandaloneArgs) -> anyhow::Result<()> {
    let pipeline = args.pipeline.config();
    info!("Running both services in-process on in-memory backends");

    let store: Arc<dyn BlogStore> = Arc::new(MemoryBlogStore::new());
    let cache: Arc<dyn CacheTrait> = Arc::new(MemoryCache::default());
    let channel = MemoryChannel::new(pipeline.queue_name.clone())
        .with_block(pipeline.read_block());
    let publisher = Arc::new(InvalidationPublisher::new(
        Arc::new(channel.clone()),
        &pipeline,
    ));

    let (stop, consumer) =
        start_consumer(Arc::new(channel), &cache, &store, &pipeline);
    let app = AuthorHandlers::routes()
        .with_state(author_services(&store, &publisher))
        .merge(
            BlogReadHandlers::routes()
                .with_state(read_services(&store, &cache, &pipeline)),
        );

    let mut doc = AuthorApiDoc::openapi();
    doc.merge(BlogReadApiDoc::openapi());
    let health = Health {
        service: "standalone",
        db: None,
        redis: None,
    };

    let served = serve(app, doc, health, args.http.bind_addr).await;
    stop_consumer(stop, consumer).await;
    served
}

fn author_services(
    store: &Arc<dyn BlogStore>, publisher: &Arc<InvalidationPublisher>,
) -> AuthorServices {
    AuthorServices::new(
        CreateBlogHandler::new(store.clone(), publisher.clone()),
        UpdateBlogHandler::new(store.clone(), publisher.clone()),
        DeleteBlogHandler::new(store.clone(), publisher.clone()),
    )
}

fn read_services(
    store: &Arc<dyn BlogStore>, cache: &Arc<dyn CacheTrait>,
    pipeline: &PipelineConfig,
) -> BlogReadServices {
    let read_through = ReadThrough::new(cache.clone(), pipeline.cache_ttl());
    BlogReadServices::new(
        ListBlogsQueryHandler::new(store.clone(), read_through.clone()),
        GetBlogQueryHandler::new(store.clone(), read_through),
    )
}

fn start_consumer(
    source: Arc<dyn MessageSource>, cache: &Arc<dyn CacheTrait>,
    store: &Arc<dyn BlogStore>, pipeline: &PipelineConfig,
) -> (watch::Sender<bool>, JoinHandle<()>) {
    let consumer = InvalidationConsumer::new(source, cache.clone(), pipeline)
        .with_rebuilder(Arc::new(CanonicalListRebuilder::new(store.clone())));

    let (stop, shutdown) = watch::channel(false);
    let handle = Arc::new(consumer).spawn(shutdown);
    info!("Invalidation consumer started");
    (stop, handle)
}

async fn stop_consumer(stop: watch::Sender<bool>, consumer: JoinHandle<()>) {
    info!("Stopping invalidation consumer...");
    let _ = stop.send(true);
    if let Err(e) = consumer.await {
        warn!("Invalidation consumer task failed: {}", e);
    }
}

async fn serve(
    app: Router, doc: utoipa::openapi::OpenApi, health: Health,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let mut api = HealthApiDoc::openapi();
    api.merge(doc);

    let app = Router::new()
        .route("/health", get(health_check))
        .with_state(health)
        .merge(app)
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/docs"))
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let api = api.clone();
                async move { Json(api) }
            }),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("🚀 blogmesh server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[derive(Clone)]
struct Health {
    service: &'static str,
    db: Option<SqlConnect>,
    redis: Option<RedisConnectionManager>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health_check),
    tags((name = "health", description = "Health check endpoints")),
    info(
        title = "blogmesh API",
        description = "Blog services with cross-service cache invalidation",
        version = "1.0.0"
    )
)]
struct HealthApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service up, with connection pool status", body = String)
    ),
    tag = "health"
)]
async fn health_check(State(health): State<Health>) -> impl IntoResponse {
    let mut info = format!("OK - {} service", health.service);

    if let Some(db) = &health.db {
        let (available, size) = db.get_pool_status();
        info.push_str(&format!(", Postgres pool: {available}/{size} available"));
    }
    if let Some(redis) = &health.redis {
        let (available, size) = redis.status();
        let reachable = if redis.ping().await.is_ok() { "up" } else { "down" };
        info.push_str(&format!(
            ", Redis {reachable}, pool: {available}/{size} available"
        ));
    }

    (StatusCode::OK, info)
}
