use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use companion_core::model::{QaRecordDraft, Topic};
use companion_core::time::fixed_now;
use storage::{FileLock, JsonFile, KnowledgeBaseDocument, RecordsDocument, StorageError};

#[test]
fn corrupt_file_fails_fast_and_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kb.json");
    fs::write(&path, "{ this is not json").unwrap();

    let file = JsonFile::<KnowledgeBaseDocument>::new(&path);
    let err = file.read(fixed_now(), |doc| doc.topics.len()).unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));

    let err = file
        .update(fixed_now(), |doc| {
            doc.topics.insert("A".into(), Topic::new(fixed_now()));
            Ok::<_, StorageError>(())
        })
        .unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ this is not json");
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kb.json");
    fs::write(
        &path,
        r#"{ "schema_version": 9, "topics": {}, "metadata": { "created_at": "2024-01-01T00:00:00Z" } }"#,
    )
    .unwrap();

    let file = JsonFile::<KnowledgeBaseDocument>::new(&path);
    let err = file.read(fixed_now(), |_| ()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::UnsupportedVersion { found: 9, supported: 1, .. }
    ));
}

#[test]
fn update_times_out_while_lock_is_held_elsewhere() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let file = JsonFile::<RecordsDocument>::new(&path).with_lock_timeout(Duration::from_millis(60));

    let _held = FileLock::acquire(&path, Duration::from_secs(1)).unwrap();
    let err = file
        .update(fixed_now(), |doc| {
            doc.student_name = "Sixi".into();
            Ok::<_, StorageError>(())
        })
        .unwrap_err();
    assert!(err.is_lock_timeout());
    assert!(!path.exists());
}

#[test]
fn concurrent_appends_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    let writers = 4;
    let per_writer = 5;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let file = JsonFile::<RecordsDocument>::new(path);
                barrier.wait();
                for i in 0..per_writer {
                    file.update(fixed_now(), |doc| {
                        let session = QaRecordDraft::new("T", format!("q{w}-{i}"), "q", 7)
                            .validate(fixed_now())
                            .unwrap();
                        doc.learning_sessions.push(session);
                        Ok::<_, StorageError>(())
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let file = JsonFile::<RecordsDocument>::new(&path);
    let sessions = file
        .read(fixed_now(), |doc| doc.learning_sessions.len())
        .unwrap();
    assert_eq!(sessions, writers * per_writer);

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["statistics"]["total_questions"], writers * per_writer);
}
