mod common;

use common::{doc, pipeline, tf};
use std::fs;
use webidx_core::persist::IndexReader;
use webidx_core::{Document, DuplicatePolicy, Error, IdScheme, Index, IndexStore};

fn store(dir: &tempfile::TempDir) -> IndexStore { IndexStore::open(dir.path(), DuplicatePolicy::Skip).unwrap() }

#[test]
fn first_document_bootstraps() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    assert!(store.load().unwrap().is_empty());

    let d = doc("https://example.com/cats", "Cats Eat Fish. Cats sleep.");
    let report = pipeline().index(&store, &d).unwrap();
    assert!(report.bootstrapped);
    assert!(!report.recovered);
    assert_eq!(report.num_terms, 4);

    let index = store.load().unwrap();
    assert_eq!(index.len(), 4);
    assert!(index.entries().iter().all(|e| e.postings.is_empty()));
    assert_eq!(store.documents().unwrap().get(&d.id), Some(&d.url));
    let meta = store.meta().unwrap().unwrap();
    assert_eq!((meta.num_docs, meta.num_terms), (1, 4));
}

#[test]
fn persisted_merge_matches_in_memory_merge() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let docs = [
        (doc("https://a.example", ""), tf(&["apple", "apple", "cat"])),
        (doc("https://b.example", ""), tf(&["cat", "cat", "cat", "dog"])),
        (doc("https://c.example", ""), tf(&["ant", "cat", "zebra"])),
    ];
    let mut expected = Index::new();
    for (d, record) in &docs {
        store.merge_document(d, record).unwrap();
        expected.merge(d.id, record, DuplicatePolicy::Skip);
    }
    assert_eq!(store.load().unwrap(), expected);
    assert_eq!(store.documents().unwrap().len(), 3);

    let on_disk: Vec<_> = IndexReader::open(&store.paths().index()).unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(on_disk.as_slice(), expected.entries());
    assert!(!store.paths().root.join("index.txt.tmp").exists());
}

#[test]
fn remerge_is_skipped_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let a = doc("https://a.example", "");
    let b = doc("https://b.example", "");
    store.merge_document(&a, &tf(&["apple", "cat"])).unwrap();
    store.merge_document(&b, &tf(&["cat", "dog"])).unwrap();
    let before = fs::read_to_string(store.paths().index()).unwrap();

    let report = store.merge_document(&b, &tf(&["cat", "dog"])).unwrap();
    assert_eq!(report.stats.skipped_duplicates, 2);
    assert_eq!(fs::read_to_string(store.paths().index()).unwrap(), before);
}

#[test]
fn malformed_index_is_rebuilt_from_current_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.merge_document(&doc("https://a.example", ""), &tf(&["apple"])).unwrap();
    fs::write(store.paths().index(), "zebra 1 5\napple 1 5\n").unwrap();
    assert!(matches!(store.load(), Err(Error::MalformedIndex { line: 2, .. })));

    let b = doc("https://b.example", "");
    let report = store.merge_document(&b, &tf(&["cat", "dog"])).unwrap();
    assert!(report.recovered && report.bootstrapped);
    assert_eq!(store.load().unwrap(), Index::bootstrap(b.id, &tf(&["cat", "dog"])));
    assert_eq!(fs::read_to_string(store.paths().corrupt()).unwrap(), "zebra 1 5\napple 1 5\n");
    assert_eq!(store.documents().unwrap().len(), 1);
}

#[test]
fn garbage_lines_are_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    fs::write(store.paths().index(), "cat not-a-number 1\n").unwrap();
    let report = store.merge_document(&doc("https://a.example", ""), &tf(&["cat"])).unwrap();
    assert!(report.recovered);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn failed_write_keeps_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.merge_document(&doc("https://a.example", ""), &tf(&["apple", "cat"])).unwrap();
    let before = fs::read_to_string(store.paths().index()).unwrap();

    // a directory where the temp file should go makes the write fail
    fs::create_dir(store.paths().root.join("index.txt.tmp")).unwrap();
    let b = doc("https://b.example", "");
    match store.merge_document(&b, &tf(&["cat", "dog"])) {
        Err(Error::MergeIo { doc_id, .. }) => assert_eq!(doc_id, b.id),
        other => panic!("expected merge io failure, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(store.paths().index()).unwrap(), before);
    assert!(!store.documents().unwrap().contains_key(&b.id));
}

#[test]
fn sidecar_write_failure_keeps_previous_index() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    store.merge_document(&doc("https://a.example", ""), &tf(&["apple", "cat"])).unwrap();
    let before = fs::read_to_string(store.paths().index()).unwrap();

    fs::create_dir(store.paths().root.join("docs.json.tmp")).unwrap();
    let b = doc("https://b.example", "");
    match store.merge_document(&b, &tf(&["cat", "dog"])) {
        Err(Error::MergeIo { doc_id, .. }) => assert_eq!(doc_id, b.id),
        other => panic!("expected merge io failure, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(store.paths().index()).unwrap(), before);
    assert!(!store.documents().unwrap().contains_key(&b.id));
    assert!(!store.paths().root.join("index.txt.tmp").exists());
    assert!(!store.paths().root.join("meta.json.tmp").exists());
}

#[test]
fn colliding_ids_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let first = Document::new("http://ab.com", "", IdScheme::CharSum);
    let second = Document::new("http://ba.com", "", IdScheme::CharSum);
    assert_eq!(first.id, second.id);

    store.merge_document(&first, &tf(&["apple"])).unwrap();
    let before = fs::read_to_string(store.paths().index()).unwrap();
    match store.merge_document(&second, &tf(&["banana"])) {
        Err(Error::IdCollision { existing, url, .. }) => {
            assert_eq!(existing, "http://ab.com");
            assert_eq!(url, "http://ba.com");
        }
        other => panic!("expected collision, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(store.paths().index()).unwrap(), before);
}
