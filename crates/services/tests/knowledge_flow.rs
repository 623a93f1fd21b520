use companion_core::model::{QuestionDraft, QuestionId};
use companion_core::time::fixed_now;
use services::{AddOutcome, Clock, ErrorKind, KnowledgeError, KnowledgeStore};

fn store(dir: &tempfile::TempDir) -> KnowledgeStore {
    KnowledgeStore::new(Clock::fixed(fixed_now()), dir.path().join("knowledge_base.json"))
}

fn gil_draft() -> QuestionDraft {
    QuestionDraft::new(
        "Python Concurrency",
        "Python 的 GIL 是什么?",
        "What is the Python GIL and why does it exist?",
        "全局解释器锁,保证同一时刻只有一个线程执行字节码。",
        "A global interpreter lock that lets one thread run bytecode at a time.",
    )
}

#[test]
fn added_question_reads_back_equal() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);

    let outcome = kb.add_question(gil_draft().with_tags(["python"]), false).unwrap();
    let added = outcome.added().cloned().unwrap();

    let fetched = kb.get_question("Python Concurrency", added.id).unwrap();
    assert_eq!(fetched, added);

    // A fresh handle on the same file sees the same record.
    assert_eq!(store(&dir).get_question("Python Concurrency", added.id).unwrap(), added);
}

#[test]
fn near_identical_question_is_reported_not_stored() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);
    let original = kb.add_question(gil_draft(), false).unwrap().added().cloned().unwrap();

    let near = QuestionDraft::new(
        "Python Concurrency",
        "GIL 在 Python 里指什么?",
        "What is the Python GIL, and why does it exist",
        "全局解释器锁",
        "Global interpreter lock",
    );
    match kb.add_question(near.clone(), false).unwrap() {
        AddOutcome::SimilarFound(matches) => {
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].id, original.id);
            assert!(matches[0].similarity >= KnowledgeStore::DEFAULT_SIMILARITY_THRESHOLD);
        }
        other => panic!("expected SimilarFound, got {other:?}"),
    }
    assert_eq!(kb.get_topic_questions("Python Concurrency").unwrap().len(), 1);

    let forced = kb.add_question(near, true).unwrap();
    assert!(forced.added().is_some());
    assert_eq!(kb.get_topic_questions("Python Concurrency").unwrap().len(), 2);
}

#[test]
fn exact_wording_is_a_duplicate_unless_forced() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);
    let original = kb.add_question(gil_draft(), false).unwrap().added().cloned().unwrap();

    assert_eq!(
        kb.add_question(gil_draft(), false).unwrap(),
        AddOutcome::ExactDuplicate {
            existing: original.id
        }
    );
    assert!(kb.add_question(gil_draft(), true).unwrap().added().is_some());
}

#[test]
fn similar_wording_in_another_topic_is_not_a_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);
    kb.add_question(gil_draft(), false).unwrap();

    let mut other = gil_draft();
    other.topic = "CPython Internals".into();
    assert!(kb.add_question(other, false).unwrap().added().is_some());

    let topics: Vec<_> = kb.list_topics().unwrap().into_iter().collect();
    assert_eq!(topics, vec!["CPython Internals", "Python Concurrency"]);
}

#[test]
fn removal_succeeds_once_then_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);
    let keep = kb
        .add_question(
            QuestionDraft::new("SQL", "什么是索引?", "What is an index?", "索引", "An index"),
            false,
        )
        .unwrap()
        .added()
        .cloned()
        .unwrap();
    let gone = kb.add_question(gil_draft(), false).unwrap().added().cloned().unwrap();

    let removed = kb.remove_question("Python Concurrency", gone.id).unwrap();
    assert_eq!(removed.id, gone.id);

    let err = kb.remove_question("Python Concurrency", gone.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // The emptied topic is gone; the other one is untouched.
    assert_eq!(kb.list_topics().unwrap().len(), 1);
    let err = kb.remove_question("SQL", QuestionId::generate()).unwrap_err();
    assert!(matches!(err, KnowledgeError::QuestionNotFound { .. }));
    assert!(kb.get_question("SQL", keep.id).is_ok());
}

#[test]
fn search_is_case_insensitive_and_ordered_by_topic() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);
    kb.add_question(
        QuestionDraft::new(
            "Threads",
            "线程与进程的区别?",
            "Thread vs process?",
            "线程共享内存",
            "Threads share memory; the GIL serializes them in CPython.",
        ),
        false,
    )
    .unwrap();
    kb.add_question(gil_draft(), false).unwrap();
    kb.add_question(
        QuestionDraft::new("Async", "什么是事件循环?", "What is an event loop?", "事件循环", "A loop"),
        false,
    )
    .unwrap();

    let hits = kb.search_questions("gil").unwrap();
    let topics: Vec<_> = hits.iter().map(|q| q.topic.as_str()).collect();
    assert_eq!(topics, vec!["Python Concurrency", "Threads"]);

    assert_eq!(kb.search_questions("全局解释器").unwrap().len(), 1);
    assert!(kb.search_questions("   ").unwrap().is_empty());
}

#[test]
fn topic_summaries_count_questions() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);
    kb.add_question(gil_draft(), false).unwrap();
    kb.add_question(
        QuestionDraft::new(
            "Python Concurrency",
            "asyncio 如何调度协程?",
            "How does asyncio schedule coroutines?",
            "事件循环",
            "Through the event loop",
        ),
        false,
    )
    .unwrap();

    let summaries = kb.topic_summaries().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].name, "Python Concurrency");
    assert_eq!(summaries[0].question_count, 2);
    assert_eq!(summaries[0].created_at, fixed_now());
}

#[test]
fn invalid_draft_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let kb = store(&dir);
    let mut draft = gil_draft();
    draft.question_en = "  ".into();

    let err = kb.add_question(draft, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!kb.path().exists());
}
