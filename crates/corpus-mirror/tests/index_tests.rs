mod common;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use common::{latin, text, write_work};
use corpus_mirror::{
    CacheError, DocumentMetadata, IndexCache, IndexError, MetadataIndexer, warm_cache,
};
use tempfile::TempDir;

/// Cache backed by a map, counting hits.
#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Vec<DocumentMetadata>)>>,
    hits: Mutex<usize>,
}

impl IndexCache for MemoryCache {
    fn lookup(&self, key: &str, stamp: &str) -> Result<Option<Vec<DocumentMetadata>>, CacheError> {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((s, docs)) if s == stamp => {
                *self.hits.lock().unwrap() += 1;
                Ok(Some(docs.clone()))
            }
            _ => Ok(None),
        }
    }

    fn store(
        &self,
        key: &str,
        stamp: &str,
        documents: &[DocumentMetadata],
    ) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), (stamp.to_owned(), documents.to_vec()));
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

fn languages(docs: &[DocumentMetadata]) -> Vec<&str> {
    docs.iter().map(|d| d.language.as_str()).collect()
}

#[test]
fn indexes_documents_with_declared_languages() {
    let root = TempDir::new().unwrap();
    write_work(
        root.path(),
        "phi0474",
        "phi001",
        &[latin("perseus-lat2"), text("perseus-eng2", "eng")],
    );
    write_work(root.path(), "phi0690", "phi003", &[latin("perseus-lat1")]);

    let indexer = MetadataIndexer::default();
    let docs: Vec<_> = indexer.index(root.path()).unwrap().collect();

    assert_eq!(docs.len(), 3);
    assert_eq!(languages(&docs), vec!["lat", "eng", "lat"]);
    assert_eq!(docs[0].id, "urn:cts:latinLit:phi0474.phi001.perseus-lat2");
    assert!(docs.iter().all(|d| d.path.is_file()));
}

#[test]
fn index_is_restartable() {
    let root = TempDir::new().unwrap();
    write_work(root.path(), "phi0474", "phi001", &[latin("perseus-lat2")]);

    let indexer = MetadataIndexer::default();
    assert_eq!(indexer.index(root.path()).unwrap().count(), 1);

    write_work(root.path(), "phi0690", "phi003", &[latin("perseus-lat1")]);
    assert_eq!(indexer.index(root.path()).unwrap().count(), 2);
}

#[test]
fn declared_text_without_file_is_not_indexed() {
    let root = TempDir::new().unwrap();
    let paths = write_work(
        root.path(),
        "phi0474",
        "phi001",
        &[latin("perseus-lat2"), text("perseus-eng2", "eng")],
    );
    std::fs::remove_file(&paths[1]).unwrap();

    let docs: Vec<_> = MetadataIndexer::default()
        .index(root.path())
        .unwrap()
        .collect();

    assert_eq!(languages(&docs), vec!["lat"]);
}

#[test]
fn malformed_inventory_is_skipped() {
    let root = TempDir::new().unwrap();
    write_work(root.path(), "phi0474", "phi001", &[latin("perseus-lat2")]);

    let broken = root.path().join("data/broken/work");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("__cts__.xml"), "<ti:work><ti:edition></ti:work>").unwrap();

    let docs: Vec<_> = MetadataIndexer::default()
        .index(root.path())
        .unwrap()
        .collect();

    assert_eq!(docs.len(), 1);
}

#[test]
fn leftover_staging_directories_are_not_indexed() {
    let root = TempDir::new().unwrap();
    write_work(&root.path().join("org_textA"), "phi0474", "phi001", &[latin("perseus-lat2")]);
    write_work(
        &root.path().join(".staging-abc123"),
        "phi0474",
        "phi001",
        &[latin("perseus-lat2"), text("perseus-eng2", "eng")],
    );

    let docs: Vec<_> = MetadataIndexer::default()
        .index(root.path())
        .unwrap()
        .collect();

    assert_eq!(docs.len(), 1);
    assert!(docs[0].path.starts_with(root.path().join("org_textA")));
}

#[test]
fn missing_root_is_unreadable_tree() {
    let indexer = MetadataIndexer::default();
    let result = indexer.index(Path::new("/nonexistent/corpus-mirror"));
    assert!(matches!(result, Err(IndexError::UnreadableTree { .. })));
}

#[test]
fn cached_index_reuses_unchanged_inventories() {
    let root = TempDir::new().unwrap();
    write_work(
        root.path(),
        "phi0474",
        "phi001",
        &[latin("perseus-lat2"), text("perseus-ger1", "ger")],
    );

    let indexer = MetadataIndexer::default();
    let cache = MemoryCache::default();

    let first: Vec<_> = indexer
        .index_with_cache(root.path(), &cache)
        .unwrap()
        .collect();
    assert_eq!(*cache.hits.lock().unwrap(), 0);

    let second: Vec<_> = indexer
        .index_with_cache(root.path(), &cache)
        .unwrap()
        .collect();

    assert_eq!(first, second);
    // one work inventory, one textgroup inventory
    assert_eq!(*cache.hits.lock().unwrap(), 2);
}

#[test]
fn warm_cache_clears_and_indexes_everything() {
    let root = TempDir::new().unwrap();
    write_work(root.path().join("org_a").as_path(), "phi0474", "phi001", &[latin("perseus-lat2")]);
    write_work(root.path().join("org_b").as_path(), "phi0690", "phi003", &[latin("perseus-lat1")]);

    let cache = MemoryCache::default();
    cache
        .store("/stale/__cts__.xml", "0-0", &[])
        .unwrap();

    let count = warm_cache(&MetadataIndexer::default(), root.path(), &cache).unwrap();

    assert_eq!(count, 2);
    let entries = cache.entries.lock().unwrap();
    assert!(!entries.contains_key("/stale/__cts__.xml"));
    assert_eq!(entries.len(), 4);
}
