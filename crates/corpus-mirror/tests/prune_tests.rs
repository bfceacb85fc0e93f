mod common;

use std::sync::Arc;

use common::{LIST_FILE, ListConvention, latin, text, text_files, write_work};
use corpus_mirror::{CorpusPruner, MetadataIndexer, PruneError, PruneSummary};
use tempfile::TempDir;

#[test]
fn prune_keeps_only_retained_language() {
    let root = TempDir::new().unwrap();
    write_work(
        root.path(),
        "phi0474",
        "phi001",
        &[
            latin("perseus-lat2"),
            text("perseus-eng2", "eng"),
            text("perseus-ger1", "ger"),
        ],
    );
    write_work(
        root.path(),
        "phi0690",
        "phi003",
        &[latin("perseus-lat1"), text("perseus-fre1", "fre")],
    );
    write_work(root.path(), "phi1348", "abo012", &[latin("perseus-lat3")]);

    let summary = CorpusPruner::default().prune(root.path(), "lat").unwrap();

    assert_eq!(summary, PruneSummary { removed: 3, kept: 3 });

    let remaining = text_files(root.path());
    assert_eq!(remaining.len(), 3);

    let docs: Vec<_> = MetadataIndexer::default()
        .index(root.path())
        .unwrap()
        .collect();
    assert_eq!(docs.len(), 3);
    assert!(docs.iter().all(|d| d.language == "lat"));
}

#[test]
fn prune_leaves_undeclared_files_alone() {
    let root = TempDir::new().unwrap();
    write_work(root.path(), "phi0474", "phi001", &[text("perseus-eng2", "eng")]);
    std::fs::write(root.path().join("README.md"), "corpus readme").unwrap();

    let summary = CorpusPruner::default().prune(root.path(), "lat").unwrap();

    assert_eq!(summary, PruneSummary { removed: 1, kept: 0 });
    assert!(root.path().join("README.md").is_file());
}

#[test]
fn prune_of_empty_tree_reports_nothing() {
    let root = TempDir::new().unwrap();

    let summary = CorpusPruner::default().prune(root.path(), "lat").unwrap();

    assert_eq!(summary, PruneSummary::default());
}

#[test]
fn prune_honours_other_languages() {
    let root = TempDir::new().unwrap();
    write_work(
        root.path(),
        "tlg0012",
        "tlg001",
        &[latin("perseus-lat1"), text("perseus-grc2", "grc")],
    );

    let summary = CorpusPruner::default().prune(root.path(), "grc").unwrap();

    assert_eq!(summary, PruneSummary { removed: 1, kept: 1 });
    let remaining = text_files(root.path());
    assert!(remaining[0].to_string_lossy().ends_with("perseus-grc2.xml"));
}

#[test]
fn prune_removes_shared_file_once() {
    let root = TempDir::new().unwrap();
    let work = root.path().join("data").join("a").join("b");
    std::fs::create_dir_all(&work).unwrap();
    std::fs::write(
        work.join("__cts__.xml"),
        r#"<ti:work xmlns:ti="http://chs.harvard.edu/xmlns/cts" urn="urn:cts:x:a.b" xml:lang="lat">
  <ti:edition urn="urn:cts:x:a.b.lat1"/>
  <ti:translation urn="urn:cts:x:a.b.eng1" xml:lang="eng"/>
  <ti:commentary urn="urn:cts:x:a.b.eng1" xml:lang="eng"/>
</ti:work>"#,
    )
    .unwrap();
    std::fs::write(work.join("a.b.lat1.xml"), "<TEI/>").unwrap();
    std::fs::write(work.join("a.b.eng1.xml"), "<TEI/>").unwrap();

    let summary = CorpusPruner::default().prune(root.path(), "lat").unwrap();

    assert_eq!(summary, PruneSummary { removed: 1, kept: 1 });
    assert!(!work.join("a.b.eng1.xml").exists());
    assert!(work.join("a.b.lat1.xml").is_file());
}

#[test]
fn prune_never_deletes_a_file_declared_in_kept_language() {
    let root = TempDir::new().unwrap();
    std::fs::write(
        root.path().join(LIST_FILE),
        "t1 lat shared.xml\nt2 eng shared.xml\n",
    )
    .unwrap();
    std::fs::write(root.path().join("shared.xml"), "<TEI/>").unwrap();

    let pruner = CorpusPruner::new(MetadataIndexer::new(Arc::new(ListConvention)));
    let summary = pruner.prune(root.path(), "lat").unwrap();

    assert_eq!(summary, PruneSummary { removed: 0, kept: 1 });
    assert!(root.path().join("shared.xml").is_file());
}

#[test]
fn failed_removal_stops_prune_and_keeps_earlier_removals() {
    let root = TempDir::new().unwrap();
    std::fs::write(
        root.path().join(LIST_FILE),
        "t1 eng first.xml\nt2 ger locked.xml\nt3 fre last.xml\nt4 lat kept.xml\n",
    )
    .unwrap();
    std::fs::write(root.path().join("first.xml"), "<TEI/>").unwrap();
    std::fs::write(root.path().join("last.xml"), "<TEI/>").unwrap();
    std::fs::write(root.path().join("kept.xml"), "<TEI/>").unwrap();
    // A non-empty directory where a text file is expected cannot be unlinked.
    let locked = root.path().join("locked.xml");
    std::fs::create_dir(&locked).unwrap();
    std::fs::write(locked.join("inner"), "x").unwrap();

    let pruner = CorpusPruner::new(MetadataIndexer::new(Arc::new(ListConvention)));
    let err = pruner.prune(root.path(), "lat").unwrap_err();

    match err {
        PruneError::DeleteFailed { path, .. } => assert_eq!(path, locked),
        other => panic!("expected DeleteFailed, got {other:?}"),
    }
    assert!(!root.path().join("first.xml").exists());
    assert!(root.path().join("last.xml").is_file());
    assert!(root.path().join("kept.xml").is_file());
}
