//! Staged documents whose records vanish get hidden, never deleted.

mod common;

use common::*;
use std::fs;
use tempfile::TempDir;

use media_indexer::cancel::CancelFlag;
use media_indexer::shadow;
use media_indexer::sync;
use media_indexer::IndexDocument;

fn staged_library(root: &std::path::Path) -> media_indexer::sync::SyncSettings {
    let settings = settings(root);
    let catalog = MemoryCatalog::new(vec![
        collection("c1", None, "Recital Hall", "Music Library"),
        Media::new("m-kept", "c1").doc(),
        Media::new("m-gone", "c1").legacy("avalon:40").doc(),
        Media::new("m-flaky", "c1").doc(),
        Media::new("m-draft", "c1").unpublished().doc(),
    ]);
    let stats = sync::run(&settings, &catalog, None, &CancelFlag::new()).unwrap();
    assert_eq!(stats.indexed, 4);
    settings
}

#[test]
fn test_vanished_record_is_hidden_in_place() {
    let tmp = TempDir::new().unwrap();
    let settings = staged_library(tmp.path());
    let repository = TableRepository::default();
    repository.set("m-kept", true);
    repository.set("m-gone", false);
    repository.set("m-flaky", true);

    let gone = settings.staging_dir.join("avalon_40.xml");
    let before = fs::read_to_string(&gone).unwrap();

    let stats = shadow::reconcile(
        &settings.staging_dir,
        &settings.id_prefix,
        &repository,
        &CancelFlag::new(),
    )
    .unwrap();
    assert_eq!(stats.scanned, 4);
    assert_eq!(stats.already_hidden, 1);
    assert_eq!(stats.shadowed, 1);
    assert_eq!(stats.errors, 0);

    let after = fs::read_to_string(&gone).unwrap();
    let (old, new) = (
        IndexDocument::from_xml(&before).unwrap(),
        IndexDocument::from_xml(&after).unwrap(),
    );
    assert_eq!(new.first("shadowed_location_facet"), Some("HIDDEN"));
    // Every other field survives untouched
    for (a, b) in old.fields().iter().zip(new.fields()) {
        if a.name != "shadowed_location_facet" {
            assert_eq!(a, b);
        }
    }
    assert_eq!(old.fields().len(), new.fields().len());
    assert_eq!(before.len() - "VISIBLE".len(), after.len() - "HIDDEN".len());
}

#[test]
fn test_outage_leaves_artifact_alone() {
    let tmp = TempDir::new().unwrap();
    let settings = staged_library(tmp.path());
    let repository = TableRepository::default();
    repository.set("m-kept", true);
    repository.set("m-gone", true);
    // m-flaky has no answer: the lookup fails

    let flaky = settings.staging_dir.join("m-flaky.xml");
    let before = fs::read(&flaky).unwrap();

    let stats = shadow::reconcile(
        &settings.staging_dir,
        &settings.id_prefix,
        &repository,
        &CancelFlag::new(),
    )
    .unwrap();
    assert_eq!(stats.shadowed, 0);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.failed, vec![flaky.clone()]);
    assert_eq!(fs::read(&flaky).unwrap(), before);
}

#[test]
fn test_second_reconcile_is_quiet() {
    let tmp = TempDir::new().unwrap();
    let settings = staged_library(tmp.path());
    let repository = TableRepository::default();
    repository.set("m-kept", true);
    repository.set("m-gone", false);
    repository.set("m-flaky", false);

    let cancel = CancelFlag::new();
    let first =
        shadow::reconcile(&settings.staging_dir, &settings.id_prefix, &repository, &cancel)
            .unwrap();
    assert_eq!(first.shadowed, 2);

    let second =
        shadow::reconcile(&settings.staging_dir, &settings.id_prefix, &repository, &cancel)
            .unwrap();
    assert_eq!(second.shadowed, 0);
    assert_eq!(second.already_hidden, 3);
    assert_eq!(staging_count(&settings), 4);
}

#[test]
fn test_cancelled_reconcile_stops() {
    let tmp = TempDir::new().unwrap();
    let settings = staged_library(tmp.path());
    let cancel = CancelFlag::new();
    cancel.cancel();

    let stats = shadow::reconcile(
        &settings.staging_dir,
        &settings.id_prefix,
        &TableRepository::default(),
        &cancel,
    )
    .unwrap();
    assert!(stats.cancelled);
    assert_eq!(stats.scanned, 0);
}

#[test]
fn test_title_with_control_characters_can_be_shadowed() {
    let tmp = TempDir::new().unwrap();
    let settings = settings(tmp.path());
    let catalog = MemoryCatalog::new(vec![
        collection("c1", None, "Recital Hall", "Music Library"),
        Media::new("m-bell", "c1").title("Bell\u{1}Tower").doc(),
    ]);
    let stats = sync::run(&settings, &catalog, None, &CancelFlag::new()).unwrap();
    assert_eq!(stats.indexed, 1);

    let path = settings.staging_dir.join("m-bell.xml");
    let staged = IndexDocument::from_xml(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(staged.first("title_display"), Some("BellTower"));

    let repository = TableRepository::default();
    repository.set("m-bell", false);
    let shadowed = shadow::reconcile(
        &settings.staging_dir,
        &settings.id_prefix,
        &repository,
        &CancelFlag::new(),
    )
    .unwrap();
    assert_eq!(shadowed.errors, 0);
    assert_eq!(shadowed.shadowed, 1);
}

fn staging_count(settings: &media_indexer::sync::SyncSettings) -> usize {
    media_indexer::staging::list_artifacts(&settings.staging_dir)
        .unwrap()
        .len()
}
