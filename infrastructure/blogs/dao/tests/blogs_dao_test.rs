//! Run with `cargo test -p blog-dao -- --ignored`.

use anyhow::Result;
use blog_dao::{BlogDao, BlogStore, ensure_schema};
use blog_models::{BlogChanges, BlogFilter};
use test_utils::{TestPostgresContainer, new_blog, titles};
use uuid::Uuid;

async fn dao() -> Result<(TestPostgresContainer, BlogDao)> {
    let postgres = TestPostgresContainer::new().await?;
    let dao = BlogDao::new(postgres.sql_connect());
    Ok((postgres, dao))
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_create_and_find_by_id() -> Result<()> {
    let (_postgres, dao) = dao().await?;
    let author = Uuid::now_v7();

    let created = dao.create(new_blog(author, "Rust", "Tech")).await?;
    let found = dao.find_by_id(created.id).await?.expect("blog stored");

    assert_eq!(found.id, created.id);
    assert_eq!(found.title, "Rust");
    assert_eq!(found.author, author);
    assert!(dao.find_by_id(Uuid::now_v7()).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_find_filters_and_orders_newest_first() -> Result<()> {
    let (postgres, dao) = dao().await?;
    let author = Uuid::now_v7();

    let oldest = dao.create(new_blog(author, "Rust ownership", "Tech")).await?;
    let middle = dao.create(new_blog(author, "Lisbon", "Travel")).await?;
    let newest = dao.create(new_blog(author, "Async rust", "Tech")).await?;
    for (blog, age) in [(&oldest, 30), (&middle, 20), (&newest, 10)] {
        postgres
            .execute_sql(&format!(
                "UPDATE blogs SET created_at = NOW() - INTERVAL '{age} \
                 seconds' WHERE id = '{}'",
                blog.id
            ))
            .await?;
    }

    let all = dao.find(&BlogFilter::default()).await?;
    assert_eq!(titles(&all), ["Async rust", "Lisbon", "Rust ownership"]);

    let tech = dao.find(&BlogFilter::new(None, Some("Tech".into()))).await?;
    assert_eq!(titles(&tech), ["Async rust", "Rust ownership"]);

    let search = dao.find(&BlogFilter::new(Some("RUST".into()), None)).await?;
    assert_eq!(search.len(), 2);

    let both = dao
        .find(&BlogFilter::new(Some("lisbon".into()), Some("Tech".into())))
        .await?;
    assert!(both.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_search_treats_wildcards_literally() -> Result<()> {
    let (_postgres, dao) = dao().await?;
    let author = Uuid::now_v7();
    dao.create(new_blog(author, "100% uptime", "Ops")).await?;
    dao.create(new_blog(author, "1000 users", "Ops")).await?;

    let found = dao.find(&BlogFilter::new(Some("100%".into()), None)).await?;

    assert_eq!(titles(&found), ["100% uptime"]);
    Ok(())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_update_and_delete() -> Result<()> {
    let (postgres, dao) = dao().await?;
    ensure_schema(&postgres.sql_connect()).await?;
    let created = dao
        .create(new_blog(Uuid::now_v7(), "Draft", "Tech"))
        .await?;

    let updated = dao
        .update(created.id, BlogChanges {
            title: Some("Final".into()),
            ..Default::default()
        })
        .await?
        .expect("blog exists");
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.category, "Tech");
    assert!(updated.updated_at >= updated.created_at);

    let missing = dao
        .update(Uuid::now_v7(), BlogChanges::default())
        .await?;
    assert!(missing.is_none());

    assert!(dao.delete(created.id).await?);
    assert!(!dao.delete(created.id).await?);
    assert!(dao.find_by_id(created.id).await?.is_none());
    Ok(())
}
