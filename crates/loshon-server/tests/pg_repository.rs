//! Repository tests against a real database. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use loshon_server::{
    db::{create_pool, run_migrations},
    repository::{DeletedScope, DocumentFilter, DocumentRepository, PgDocumentRepository, RepoError},
};
use loshon_shared::{Document, NewDocument};
use uuid::Uuid;

async fn repository() -> PgDocumentRepository {
    loshon_server::config::load_dotenv();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_pool(&url, 2).await.unwrap();
    run_migrations(&pool).await.unwrap();
    PgDocumentRepository::new(pool)
}

/// Fresh owner per test so runs don't see each other's rows.
fn owner() -> String {
    format!("test-{}", Uuid::new_v4())
}

async fn create(repo: &PgDocumentRepository, owner: &str, title: &str, parent: Option<Uuid>) -> Document {
    repo.save(Document::new(
        owner,
        NewDocument {
            title: title.to_string(),
            parent_id: parent,
            ..Default::default()
        },
    ))
    .await
    .unwrap()
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn save_keeps_store_owned_fields() {
    let repo = repository().await;
    let owner = owner();
    let doc = create(&repo, &owner, "Doc A", None).await;

    let mut changed = doc.clone();
    changed.title = "Doc A2".to_string();
    changed.owner_id = "someone-else".to_string();
    let saved = repo.save(changed).await.unwrap();

    assert_eq!(saved.title, "Doc A2");
    assert_eq!(saved.owner_id, owner);
    assert_eq!(saved.created_at, doc.created_at);
    assert!(saved.updated_at >= doc.updated_at);
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn archive_cascades_and_restore_ascends() {
    let repo = repository().await;
    let owner = owner();
    let a = create(&repo, &owner, "Doc A", None).await;
    let b = create(&repo, &owner, "Doc B", Some(a.id)).await;
    let c = create(&repo, &owner, "Doc C", Some(b.id)).await;

    let archived = repo.archive(a.clone()).await.unwrap();
    assert!(archived.is_archived);
    assert_eq!(archived.children.len(), 1);

    let all = repo.get(&DocumentFilter::owned_by(&owner)).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|d| d.is_archived));

    let c = repo.first(&DocumentFilter::by_id(c.id)).await.unwrap();
    repo.restore(c).await.unwrap();

    let live = repo
        .get(&DocumentFilter::owned_by(&owner).archived(false))
        .await
        .unwrap();
    assert_eq!(live.len(), 3);
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn stale_save_keeps_cascaded_archive() {
    let repo = repository().await;
    let owner = owner();
    let a = create(&repo, &owner, "Doc A", None).await;
    let b = create(&repo, &owner, "Doc B", Some(a.id)).await;

    repo.archive(a).await.unwrap();
    let mut stale = b;
    stale.title = "Doc B2".to_string();
    let saved = repo.save(stale).await.unwrap();

    assert_eq!(saved.title, "Doc B2");
    assert!(saved.is_archived);
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn restore_retry_reaches_archived_root() {
    let repo = repository().await;
    let owner = owner();
    let a = create(&repo, &owner, "Doc A", None).await;
    let b = create(&repo, &owner, "Doc B", Some(a.id)).await;
    let c = create(&repo, &owner, "Doc C", Some(b.id)).await;
    repo.archive(a.clone()).await.unwrap();

    // Leftover of an interrupted restore: c and b live, a archived.
    repo.unarchive(c.id).await.unwrap();
    repo.unarchive(b.id).await.unwrap();

    let c = repo.first(&DocumentFilter::by_id(c.id)).await.unwrap();
    repo.restore(c).await.unwrap();
    assert!(!repo.first(&DocumentFilter::by_id(a.id)).await.unwrap().is_archived);
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn delete_hides_subtree() {
    let repo = repository().await;
    let owner = owner();
    let a = create(&repo, &owner, "Doc A", None).await;
    let b = create(&repo, &owner, "Doc B", Some(a.id)).await;

    let deleted = repo.delete(a.clone()).await.unwrap();
    assert!(deleted.deleted_at.is_some());

    assert!(matches!(
        repo.first(&DocumentFilter::by_id(b.id)).await,
        Err(RepoError::NotFound)
    ));
    let gone = repo
        .get(&DocumentFilter::owned_by(&owner).deleted(DeletedScope::Only))
        .await
        .unwrap();
    assert_eq!(gone.len(), 2);
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn cascade_on_missing_root_is_not_found() {
    let repo = repository().await;
    let ghost = Document::new(
        owner(),
        NewDocument {
            title: "Ghost".to_string(),
            ..Default::default()
        },
    );
    assert!(matches!(repo.archive(ghost).await, Err(RepoError::NotFound)));
}

#[tokio::test]
#[ignore] // Requires Postgres
async fn list_filters_by_parent() {
    let repo = repository().await;
    let owner = owner();
    let a = create(&repo, &owner, "Doc A", None).await;
    create(&repo, &owner, "Doc B", Some(a.id)).await;
    create(&repo, &owner, "Doc C", Some(a.id)).await;

    let roots = repo
        .get(&DocumentFilter::owned_by(&owner).parent(None))
        .await
        .unwrap();
    assert_eq!(roots.len(), 1);

    let children = repo
        .get(&DocumentFilter::owned_by(&owner).parent(Some(a.id)))
        .await
        .unwrap();
    assert_eq!(children.iter().map(|d| d.title.as_str()).collect::<Vec<_>>(), ["Doc B", "Doc C"]);
}
