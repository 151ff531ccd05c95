use serde_json::json;
use versioned_state::{latest, InMemoryStateClient, RecordsExt, RepositoryConfig, StateClient};

use crate::support::Note;

#[tokio::test]
async fn get_all_lists_created_records() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let a = notes.create(Note::new("a")).await.unwrap();
    let b = notes.create(Note::new("b")).await.unwrap();

    let all = notes.get_all().await.unwrap();
    let ids: Vec<&str> = all.iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![a.id.as_str(), b.id.as_str()]);
    assert!(all.iter().all(|e| e.version == 1 && !e.deleted));
}

#[tokio::test]
async fn deleted_record_drops_out_of_listing() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let keep = notes.create(Note::new("keep")).await.unwrap();
    let gone = notes.create(Note::new("gone")).await.unwrap();

    let deleted = notes.delete_by_id(&gone.id).await.unwrap();
    assert_eq!(deleted.version, 2);
    assert!(deleted.deleted);

    let all = notes.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, keep.id);
}

#[tokio::test]
async fn redundant_observations_are_returned_then_reduced() {
    let client = InMemoryStateClient::new().with_redundant_history();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("v1")).await.unwrap();
    notes.update(&created.id, Note::new("v2")).await.unwrap();
    notes.update(&created.id, Note::new("v3")).await.unwrap();

    let all = notes.get_all().await.unwrap();
    assert_eq!(all.len(), 3);

    let reduced = latest(all);
    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].version, 3);
    assert_eq!(reduced[0].data, Note::new("v3"));

    let latest_view = notes.get_all_latest().await.unwrap();
    assert_eq!(latest_view, reduced);
}

#[tokio::test]
async fn feed_with_versions_one_and_three_reduces_to_three() {
    let client = InMemoryStateClient::new().with_redundant_history();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("first")).await.unwrap();
    client
        .push_raw_state(
            &created.id,
            "fi.nor.note",
            "",
            json!({"data": {"title": "third"}, "version": 3}),
        )
        .unwrap();

    let latest_view = notes.get_all_latest().await.unwrap();
    assert_eq!(latest_view.len(), 1);
    assert_eq!(latest_view[0].version, 3);
    assert_eq!(latest_view[0].data.title, "third");
}

#[tokio::test]
async fn listing_only_returns_matching_well_formed_observations() {
    let client = InMemoryStateClient::new().with_redundant_history();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("real")).await.unwrap();
    let id = created.id.as_str();

    // Foreign type, other state key, non-numeric version, missing version,
    // float version, data of the wrong shape.
    client
        .push_raw_state(id, "fi.nor.other", "", json!({"data": {"title": "x"}, "version": 9}))
        .unwrap();
    client
        .push_raw_state(id, "fi.nor.note", "side", json!({"data": {"title": "x"}, "version": 9}))
        .unwrap();
    client
        .push_raw_state(id, "fi.nor.note", "", json!({"data": {"title": "x"}, "version": "9"}))
        .unwrap();
    client
        .push_raw_state(id, "fi.nor.note", "", json!({"data": {"title": "x"}}))
        .unwrap();
    client
        .push_raw_state(id, "fi.nor.note", "", json!({"data": {"title": "x"}, "version": 1.5}))
        .unwrap();
    client
        .push_raw_state(id, "fi.nor.note", "", json!({"data": {"nope": 1}, "version": 9}))
        .unwrap();

    let all = notes.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], created);
}

#[tokio::test]
async fn negative_version_observation_is_dropped() {
    let client = InMemoryStateClient::new().with_redundant_history();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("real")).await.unwrap();
    client
        .push_raw_state(
            &created.id,
            "fi.nor.note",
            "",
            json!({"data": {"title": "x"}, "version": -1}),
        )
        .unwrap();

    let all = notes.get_all().await.unwrap();
    assert_eq!(all, vec![created.clone()]);
    assert_eq!(notes.get_all_latest().await.unwrap(), vec![created]);
}

#[tokio::test]
async fn containers_of_other_record_kinds_are_ignored() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();
    let others = client.records_with::<Note>(RepositoryConfig::new("fi.nor.other"));

    notes.create(Note::new("note")).await.unwrap();
    others.create(Note::new("other")).await.unwrap();

    let all = notes.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].data.title, "note");
}

#[tokio::test]
async fn tombstoned_but_joined_container_is_flagged_in_feed() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    let created = notes.create(Note::new("x")).await.unwrap();
    client
        .put_state(
            &created.id,
            "fi.nor.note",
            "",
            json!({"data": {"title": "x"}, "version": 2, "deleted": true}),
        )
        .await
        .unwrap();

    let all = notes.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].deleted);
    assert!(notes.get_all_latest().await.unwrap().is_empty());
}

#[tokio::test]
async fn predicates_run_over_live_records() {
    let client = InMemoryStateClient::new();
    let notes = client.records::<Note>();

    for title in ["apple", "avocado", "banana"] {
        notes.create(Note::new(title)).await.unwrap();
    }

    let a_notes = notes
        .find(|e| e.data.title.starts_with('a'))
        .await
        .unwrap();
    assert_eq!(a_notes.len(), 2);

    let banana = notes
        .find_one(|e| e.data.title == "banana")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(banana.version, 1);

    assert!(notes.exists(|e| e.data.title == "apple").await.unwrap());
    assert!(!notes.exists(|e| e.data.title == "cherry").await.unwrap());
    assert_eq!(notes.count(|_| true).await.unwrap(), 3);

    notes.delete_by_id(&banana.id).await.unwrap();
    assert_eq!(notes.count(|_| true).await.unwrap(), 2);
}
