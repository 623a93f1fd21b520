use std::fs;
use std::time::Duration;

use companion_core::model::{QaRecordDraft, QuestionDraft};
use companion_core::time::fixed_now;
use services::{Clock, ErrorKind, KnowledgeStore, ModeCoordinator, ProgressTracker};
use storage::FileLock;

const CORRUPT: &str = "{ \"learning_sessions\": [ oops";

fn session() -> QaRecordDraft {
    QaRecordDraft::new("Python Concurrency", "GIL 是什么?", "What is the GIL?", 8)
}

#[test]
fn held_lock_reports_concurrency_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning_records.json");
    let tracker = ProgressTracker::new(Clock::fixed(fixed_now()), &path, "Sixi")
        .with_lock_timeout(Duration::from_millis(50));

    let held = FileLock::acquire(&path, Duration::from_secs(1)).unwrap();
    let err = tracker.add_qa_record(session()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConcurrencyTimeout);
    assert!(!path.exists());

    let coordinator = ModeCoordinator::new(Clock::fixed(fixed_now()), &path)
        .with_lock_timeout(Duration::from_millis(50));
    let err = coordinator.start_active_learning(["Topic A"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConcurrencyTimeout);

    drop(held);
    assert!(tracker.add_qa_record(session()).is_ok());
}

#[test]
fn corrupt_records_file_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("learning_records.json");
    fs::write(&path, CORRUPT).unwrap();
    let tracker = ProgressTracker::new(Clock::fixed(fixed_now()), &path, "Sixi");

    let err = tracker.add_qa_record(session()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(tracker.get_statistics().unwrap_err().kind(), ErrorKind::Persistence);
    assert_eq!(fs::read_to_string(&path).unwrap(), CORRUPT);
}

#[test]
fn corrupt_knowledge_base_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge_base.json");
    fs::write(&path, CORRUPT).unwrap();
    let kb = KnowledgeStore::new(Clock::fixed(fixed_now()), &path);

    let draft = QuestionDraft::new(
        "Python Concurrency",
        "GIL 是什么?",
        "What is the GIL?",
        "全局解释器锁",
        "Global interpreter lock",
    );
    let err = kb.add_question(draft.clone(), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    let err = kb.add_question(draft, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(fs::read_to_string(&path).unwrap(), CORRUPT);
}

#[test]
fn corrupt_coordinator_file_is_a_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coordination_state.json");
    fs::write(&path, CORRUPT).unwrap();
    let coordinator = ModeCoordinator::new(Clock::fixed(fixed_now()), &path);

    let err = coordinator.start_active_learning(["Topic A"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(
        coordinator.should_suppress_auto_teaching().unwrap_err().kind(),
        ErrorKind::Persistence
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), CORRUPT);
}
