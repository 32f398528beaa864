use std::fs::OpenOptions;

use bptree_index::{
    read_at, write_at, Backend, ByteStore, Config, Encode, IndexError, Metadata, PageId,
    METADATA_SIZE,
};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn reopen(file: &NamedTempFile) -> std::fs::File {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(file.path())
        .unwrap()
}

#[test]
fn create_commit_reopen() {
    let tmp = NamedTempFile::new().unwrap();

    let mut backend = Backend::create(reopen(&tmp), Config::default().page_size(8192)).unwrap();
    for key in [&b"apple"[..], b"banana", b"cherry"] {
        backend.record_insert(key).unwrap();
    }
    backend.record_delete(b"banana").unwrap();
    backend.set_root(PageId::new(2)).unwrap();
    backend.commit().unwrap();
    drop(backend);

    let backend = Backend::open(reopen(&tmp), Config::default()).unwrap();
    assert_eq!(backend.len(), 2);
    assert_eq!(backend.root(), PageId::new(2));
    assert_eq!(backend.page_size(), 8192);
    assert_eq!(backend.max_key_size(), 255);
    assert!(!backend.is_dirty());
}

#[test]
fn on_disk_bytes_match_layout() {
    let tmp = NamedTempFile::new().unwrap();
    Backend::create(reopen(&tmp), Config::default()).unwrap();

    let bytes = std::fs::read(tmp.path()).unwrap();
    assert_eq!(
        bytes,
        vec![0x01, 0x00, 0x00, 0xFF, 0x10, 0x00, 0, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn truncated_file_is_short_read() {
    let tmp = NamedTempFile::new().unwrap();
    let mut file = reopen(&tmp);
    let encoded = Metadata::new(4096, 64).encode().unwrap();
    file.write_at(0, &encoded[..9]).unwrap();

    match Backend::open(file, Config::default()) {
        Err(IndexError::ShortRead { expected, actual }) => {
            assert_eq!((expected, actual), (METADATA_SIZE, 9));
        }
        other => panic!("expected ShortRead, got {other:?}"),
    }
}

#[test]
fn read_only_file_stays_untouched() {
    let tmp = NamedTempFile::new().unwrap();
    let mut backend = Backend::create(reopen(&tmp), Config::default()).unwrap();
    backend.record_insert(b"k").unwrap();
    backend.commit().unwrap();
    drop(backend);
    let before = std::fs::read(tmp.path()).unwrap();

    let mut backend = Backend::open(reopen(&tmp), Config::default().read_only(true)).unwrap();
    let err = backend.record_insert(b"k2").unwrap_err();
    assert!(matches!(err, IndexError::Immutable));
    let err = backend.set_root(None).unwrap_err();
    assert!(matches!(err, IndexError::Immutable));
    backend.commit().unwrap();
    drop(backend);

    assert_eq!(std::fs::read(tmp.path()).unwrap(), before);
}

#[test]
fn page_size_overlapping_metadata_rejected() {
    let tmp = NamedTempFile::new().unwrap();
    let config = Config::default().page_size(5).max_key_size(1);

    let result = Backend::create(reopen(&tmp), config);

    assert!(matches!(result, Err(IndexError::InvalidMetadata(_))));
    assert!(std::fs::read(tmp.path()).unwrap().is_empty());
}

#[test]
fn codec_roundtrip_at_page_offset() {
    let mut file = tempfile::tempfile().unwrap();
    let meta = Metadata {
        size: 1_000_000,
        root: PageId::new(77),
        ..Metadata::new(16384, 1024)
    };

    write_at(&mut file, 3 * 16384, &meta).unwrap();

    let mut loaded = Metadata::default();
    read_at(&mut file, 3 * 16384, METADATA_SIZE, &mut loaded).unwrap();
    assert_eq!(loaded, meta);
}
