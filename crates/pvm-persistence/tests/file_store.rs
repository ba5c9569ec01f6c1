//! Lifecycle manager driven over the file-backed repository.

use pvm_lifecycle::{LifecycleError, ProtocolVersionManager, RepositoryError};
use pvm_model::{AmendmentType, VersionCreateInput, VersionStatus};
use pvm_persistence::{FileRepository, StoreOptions, load_ledger};
use tempfile::tempdir;

#[tokio::test]
async fn lifecycle_persists_across_managers() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("protocol-versions.json");

    let mut manager = ProtocolVersionManager::open(FileRepository::new(&path), "STUDY-7")
        .await
        .expect("open manager");
    let first = manager
        .create_protocol_version(&VersionCreateInput::default())
        .await
        .expect("create first version");
    manager
        .submit_for_review(first.id)
        .await
        .expect("submit for review");

    let repo = FileRepository::with_options(&path, StoreOptions::default().with_pretty(false));
    let reopened = ProtocolVersionManager::open(repo, "STUDY-7")
        .await
        .expect("reopen manager");

    assert_eq!(reopened.protocol_versions().len(), 1);
    let version = &reopened.protocol_versions()[0];
    assert_eq!(version.version_number, "1.0");
    assert_eq!(version.amendment_type, AmendmentType::Initial);
    assert_eq!(version.status, VersionStatus::UnderReview);
    assert_eq!(
        reopened.current_protocol_version().map(|v| v.id),
        Some(first.id)
    );

    let ledger = load_ledger(&path).expect("load ledger");
    assert_eq!(ledger.status_changes(first.id).len(), 1);
}

#[tokio::test]
async fn corrupted_store_surfaces_as_storage_error() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("protocol-versions.json");
    std::fs::write(&path, "[1, 2, 3]").expect("write store");

    let mut manager = ProtocolVersionManager::new(FileRepository::new(&path), "STUDY-7");
    let err = manager
        .load_protocol_versions()
        .await
        .expect_err("corrupted store");

    assert!(matches!(
        err,
        LifecycleError::Repository(RepositoryError::Storage { .. })
    ));
    assert!(
        manager
            .error()
            .is_some_and(|message| message.contains("could not be read"))
    );
    assert!(!manager.loading());
}
