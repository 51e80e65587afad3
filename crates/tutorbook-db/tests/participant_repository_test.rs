//! Integration tests for the Participant repository using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tutorbook_core::error::BookingError;
use tutorbook_core::models::participant::CreateParticipant;
use tutorbook_core::repository::ParticipantRepository;
use tutorbook_db::repository::SurrealParticipantRepository;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tutorbook_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn create_and_get_participant() {
    let db = setup().await;
    let repo = SurrealParticipantRepository::new(db);

    let alice = repo
        .get_or_create(CreateParticipant {
            external_id: 1001,
            display_name: "alice".into(),
        })
        .await
        .unwrap();

    assert_eq!(alice.external_id, 1001);
    assert_eq!(alice.display_name, "alice");

    let fetched = repo.get_by_id(alice.id).await.unwrap();
    assert_eq!(fetched.id, alice.id);
    assert_eq!(fetched.external_id, 1001);

    let by_external = repo.get_by_external_id(1001).await.unwrap();
    assert_eq!(by_external.id, alice.id);
}

#[tokio::test]
async fn get_or_create_is_idempotent_per_external_id() {
    let db = setup().await;
    let repo = SurrealParticipantRepository::new(db);

    let first = repo
        .get_or_create(CreateParticipant {
            external_id: 42,
            display_name: "bob".into(),
        })
        .await
        .unwrap();

    // A second contact must observe the same record, display name
    // included: participants are immutable after creation.
    let second = repo
        .get_or_create(CreateParticipant {
            external_id: 42,
            display_name: "robert".into(),
        })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.display_name, "bob");
}

#[tokio::test]
async fn unknown_external_id_is_not_found() {
    let db = setup().await;
    let repo = SurrealParticipantRepository::new(db);

    let err = repo.get_by_external_id(999).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound { .. }));
}
