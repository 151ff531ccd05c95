use serde_json::json;
use versioned_state::{
    ClientError, InMemoryStateClient, RecordsExt, RepositoryConfig, RepositoryError,
    StateRepository, DEFAULT_DELETED_TYPE,
};

use crate::support::{Note, ScriptedClient};

#[tokio::test]
async fn delete_flags_tombstones_and_forgets() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("bye")).await.unwrap();
    let deleted = notes.delete_by_id(&created.id).await.unwrap();

    assert_eq!(deleted.id, created.id);
    assert_eq!(deleted.version, 2);
    assert!(deleted.deleted);
    assert_eq!(deleted.data, Note::new("bye"));

    let history = client.state_history(&created.id, "fi.nor.note", "").unwrap();
    assert_eq!(
        history.last().unwrap(),
        &json!({"data": {"title": "bye", "body": ""}, "version": 2, "deleted": true})
    );
    assert_eq!(
        client
            .state_history(&created.id, DEFAULT_DELETED_TYPE, "")
            .unwrap(),
        vec![json!({})]
    );
    assert!(!client.is_joined(&created.id).unwrap());
}

#[tokio::test]
async fn deleted_record_is_gone_for_point_reads() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("x")).await.unwrap();
    notes.delete_by_id(&created.id).await.unwrap();

    match notes.find_by_id(&created.id).await.unwrap() {
        None => {}
        Some(entry) => assert!(entry.deleted),
    }
}

#[tokio::test]
async fn deleted_record_cannot_be_updated_or_deleted_again() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("x")).await.unwrap();
    notes.delete_by_id(&created.id).await.unwrap();

    let err = notes.update(&created.id, Note::new("y")).await.unwrap_err();
    assert!(err.is_not_found());
    let err = notes.delete_by_id(&created.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_missing_record_is_not_found() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let err = notes.delete_by_id("!nothing:localhost").await.unwrap_err();
    assert_eq!(
        err,
        RepositoryError::NotFound {
            id: "!nothing:localhost".into()
        }
    );
}

#[tokio::test]
async fn custom_tombstone_slot() {
    let client = InMemoryStateClient::new();
    let notes = client.records_with::<Note>(
        RepositoryConfig::for_record::<Note>().with_tombstone("com.example.gone", "note"),
    );

    let created = notes.create(Note::new("x")).await.unwrap();
    notes.delete_by_id(&created.id).await.unwrap();

    assert_eq!(
        client
            .state_history(&created.id, "com.example.gone", "note")
            .unwrap()
            .len(),
        1
    );
    assert!(client
        .state_history(&created.id, DEFAULT_DELETED_TYPE, "")
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn interrupted_tombstone_resumes_without_second_bump() {
    let inner = InMemoryStateClient::new();
    let notes = StateRepository::<_, Note>::new(
        ScriptedClient::new(inner.clone()),
        RepositoryConfig::for_record::<Note>(),
    );

    let created = notes.create(Note::new("x")).await.unwrap();
    notes.client().fail_next_put(DEFAULT_DELETED_TYPE);

    let err = notes.delete_by_id(&created.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Transport(ClientError::Transport(_))));

    // Flag written, tombstone and forget not.
    let flagged = notes.find_by_id(&created.id).await.unwrap().unwrap();
    assert!(flagged.deleted);
    assert_eq!(flagged.version, 2);
    assert!(inner.is_joined(&created.id).unwrap());

    let deleted = notes.delete_by_id(&created.id).await.unwrap();
    assert_eq!(deleted.version, 2);
    assert!(deleted.deleted);

    assert_eq!(inner.state_history(&created.id, "fi.nor.note", "").unwrap().len(), 2);
    assert_eq!(
        inner
            .state_history(&created.id, DEFAULT_DELETED_TYPE, "")
            .unwrap()
            .len(),
        1
    );
    assert!(!inner.is_joined(&created.id).unwrap());
}

#[tokio::test]
async fn interrupted_forget_resumes_without_second_tombstone() {
    let inner = InMemoryStateClient::new();
    let notes = StateRepository::<_, Note>::new(
        ScriptedClient::new(inner.clone()),
        RepositoryConfig::for_record::<Note>(),
    );

    let created = notes.create(Note::new("x")).await.unwrap();
    notes.client().fail_next_forget();

    assert!(notes.delete_by_id(&created.id).await.is_err());
    assert!(inner.is_joined(&created.id).unwrap());

    // Still listed by the feed, but flagged.
    let listed = notes.get_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].deleted);
    assert!(notes.get_all_latest().await.unwrap().is_empty());

    let deleted = notes.delete_by_id(&created.id).await.unwrap();
    assert_eq!(deleted.version, 2);
    assert_eq!(
        inner
            .state_history(&created.id, DEFAULT_DELETED_TYPE, "")
            .unwrap()
            .len(),
        1
    );
    assert!(!inner.is_joined(&created.id).unwrap());
}

#[tokio::test]
async fn failed_flag_write_leaves_record_live() {
    let inner = InMemoryStateClient::new();
    let notes = StateRepository::<_, Note>::new(
        ScriptedClient::blind(inner.clone()),
        RepositoryConfig::for_record::<Note>()
            .with_write_policy(versioned_state::WritePolicy::LastWriterWins),
    );

    let created = notes.create(Note::new("x")).await.unwrap();
    notes.client().fail_next_put("fi.nor.note");

    assert!(notes.delete_by_id(&created.id).await.is_err());

    let current = notes.find_by_id(&created.id).await.unwrap().unwrap();
    assert!(!current.deleted);
    assert_eq!(current.version, 1);
}

#[tokio::test]
async fn delete_all_removes_every_live_record() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    for title in ["a", "b", "c"] {
        notes.create(Note::new(title)).await.unwrap();
    }

    let deleted = notes.delete_all().await.unwrap();
    assert_eq!(deleted.len(), 3);
    assert!(deleted.iter().all(|e| e.deleted && e.version == 2));
    assert!(notes.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_by_list_stops_at_first_failure() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let a = notes.create(Note::new("a")).await.unwrap();
    let b = notes.create(Note::new("b")).await.unwrap();
    notes.delete_by_id(&a.id).await.unwrap();

    let err = notes.delete_by_list(&[a.clone(), b.clone()]).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(notes.find_by_id(&b.id).await.unwrap().is_some());
}
