//! Integration tests exercising every backend through the shared traits.
//!
//! Generic helpers here take `P: FilePath`, so the same checks run against
//! disk, memory, zip and read-only paths.

use anypath::*;
use proptest::prelude::*;
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

// =============================================================================
// Generic helpers
// =============================================================================

fn names<P: FilePath>(root: &P) -> Vec<String> {
    root.walk()
        .map(|p| p.unwrap().segments_from(root).unwrap().join("/"))
        .collect()
}

fn assert_round_trip<P: FilePath>(file: &P, content: &[u8]) {
    file.set_content(content).unwrap();
    assert_eq!(file.get_content().unwrap(), content);
    assert_eq!(file.getsize().unwrap(), content.len() as u64);
}

fn assert_root_fixed_point<P: FilePath>(root: &P) {
    assert_eq!(&root.parent(), root);
    assert_eq!(root.parents().count(), 0);
}

fn assert_descendant_inverse<P: FilePath>(root: &P, segments: &[&str]) {
    let deep = root.descendant(segments).unwrap();
    assert_eq!(deep.segments_from(root).unwrap(), segments);
    assert_eq!(root.segments_from(root).unwrap(), Vec::<String>::new());
    assert!(matches!(
        root.segments_from(&deep),
        Err(PathError::NotAnAncestor { .. })
    ));
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn roots_are_parent_fixed_points() {
    let dir = tempfile::tempdir().unwrap();
    let disk = DiskPath::new(dir.path()).unwrap();
    let top = disk.parents().last().unwrap_or_else(|| disk.clone());
    assert_root_fixed_point(&top);
    assert_root_fixed_point(&MemoryFs::new().root());
    assert_root_fixed_point(&ReadOnlyPath::new(MemoryFs::new().root()));

    let zip = ZipArchive::create(dir.path().join("a.zip")).unwrap();
    assert_root_fixed_point(&zip.root());
}

#[test]
fn descendant_and_segments_from_are_inverse() {
    let dir = tempfile::tempdir().unwrap();
    assert_descendant_inverse(&DiskPath::new(dir.path()).unwrap(), &["a", "b", "c"]);
    assert_descendant_inverse(&MemoryFs::new().root(), &["a", "b", "c"]);
    let zip = ZipArchive::create(dir.path().join("a.zip")).unwrap();
    assert_descendant_inverse(&zip.root(), &["a", "b", "c"]);
}

#[test]
fn disk_child_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let base = DiskPath::new(dir.path()).unwrap();
    for name in ["../x", "a/b", "..", ".", ""] {
        assert!(
            matches!(base.child(name), Err(PathError::InsecurePath { .. })),
            "{name:?} was accepted"
        );
    }
    let nested = base.preauth_child("a/b").unwrap();
    assert_eq!(nested.parent().parent(), base);
    assert!(base.preauth_child("../x").is_err());
}

proptest! {
    #[test]
    fn child_then_parent_is_identity(name in "[A-Za-z0-9_][A-Za-z0-9_.-]{0,15}") {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskPath::new(dir.path()).unwrap();
        let child = disk.child(&name).unwrap();
        prop_assert_eq!(child.parent(), disk);
        prop_assert_eq!(child.basename(), name.clone());

        let mem = MemoryFs::new().root();
        prop_assert_eq!(mem.child(&name).unwrap().parent(), mem);
    }
}

// =============================================================================
// Content
// =============================================================================

#[test]
fn content_round_trips_on_writable_backends() {
    let dir = tempfile::tempdir().unwrap();
    let payload = b"some bytes\n\0with a nul";

    assert_round_trip(&DiskPath::new(dir.path().join("f")).unwrap(), payload);

    let mem = MemoryFs::new().root();
    mem.create_directory().unwrap();
    assert_round_trip(&mem.child("f").unwrap(), payload);

    let archive = ZipArchive::create(dir.path().join("a.zip")).unwrap();
    assert_round_trip(&archive.root().child("f").unwrap(), payload);
}

#[test]
fn read_only_view_rejects_writes_on_every_backend() {
    let dir = tempfile::tempdir().unwrap();
    let disk = DiskPath::new(dir.path().join("f")).unwrap();
    disk.set_content(b"kept").unwrap();
    let ro = disk.clone().layer(ReadOnlyLayer);
    assert!(matches!(ro.set_content(b"lost"), Err(PathError::ReadOnly { .. })));
    assert!(matches!(ro.open(OpenMode::Append), Err(PathError::ReadOnly { .. })));
    assert_eq!(ro.get_content().unwrap(), b"kept");
}

#[test]
fn disk_replacement_is_atomic_for_readers() {
    const LEN: usize = 64 * 1024;
    let dir = tempfile::tempdir().unwrap();
    let file = DiskPath::new(dir.path().join("data")).unwrap();
    file.set_content(&[b'a'; LEN]).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let file = file.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut reads = 0;
            while !stop.load(Ordering::Relaxed) {
                let data = file.get_content().unwrap();
                assert_eq!(data.len(), LEN);
                assert!(data.iter().all(|&b| b == data[0]), "torn read");
                reads += 1;
            }
            reads
        })
    };

    for round in 0..50 {
        let fill = if round % 2 == 0 { b'b' } else { b'a' };
        file.set_content(&[fill; LEN]).unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    assert!(reader.join().unwrap() > 0);

    let leftovers: Vec<_> = DiskPath::new(dir.path())
        .unwrap()
        .listdir()
        .unwrap()
        .into_iter()
        .filter(|n| n != "data")
        .collect();
    assert!(leftovers.is_empty(), "staging files left: {leftovers:?}");
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn memory_scenario() {
    let root = MemoryFs::new().root();
    root.create_directory().unwrap();
    let docs = root.child("docs").unwrap();
    docs.create_directory().unwrap();

    let mut h = docs.child("a.txt").unwrap().open(OpenMode::Write).unwrap();
    h.write_all(b"alpha").unwrap();
    assert!(!docs.child("a.txt").unwrap().exists().unwrap());
    h.close().unwrap();

    docs.child("b.txt").unwrap().set_content(b"beta").unwrap();
    assert_eq!(names(&root), ["", "docs", "docs/a.txt", "docs/b.txt"]);
    assert_eq!(docs.child("a.txt").unwrap().path(), "/mem/docs/a.txt");
    assert!(matches!(
        docs.child("a.txt").unwrap().listdir(),
        Err(PathError::NotListable { .. })
    ));
}

#[test]
fn zip_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bundle.zip");
    {
        let archive = ZipArchive::create(&file).unwrap();
        let root = archive.root();
        root.child("conf").unwrap().create_directory().unwrap();
        root.descendant(&["conf", "app.toml"]).unwrap().set_content(b"k = 1").unwrap();
        let mut h = root.child("notes").unwrap().open(OpenMode::Write).unwrap();
        h.write_all(b"written through a handle").unwrap();
        h.close().unwrap();
        archive.finish().unwrap();
    }

    let archive = ZipArchive::open(&file).unwrap();
    let root = archive.root();
    let mut walked = names(&root);
    walked.sort();
    assert_eq!(walked, ["", "conf", "conf/app.toml", "notes"]);

    let mut out = String::new();
    root.child("notes")
        .unwrap()
        .open(OpenMode::Read)
        .unwrap()
        .read_to_string(&mut out)
        .unwrap();
    assert_eq!(out, "written through a handle");
    assert!(root.child("notes").unwrap().set_content(b"x").unwrap_err().is_unsupported());
    assert!(root.path().starts_with(&file.display().to_string()));
}

/// A minimal ISO 9660 image: root holding `README.TXT;1` and `DOCS.`,
/// listed as `readme.txt` and `docs`.
fn iso_image() -> Vec<u8> {
    const S: usize = 2048;
    fn record(name: &[u8], extent: u32, size: u32, dir: bool) -> Vec<u8> {
        let len = (33 + name.len() + 1) & !1;
        let mut r = vec![0u8; len];
        r[0] = len as u8;
        r[2..6].copy_from_slice(&extent.to_le_bytes());
        r[10..14].copy_from_slice(&size.to_le_bytes());
        r[18..24].copy_from_slice(&[120, 1, 2, 3, 4, 5]);
        r[25] = if dir { 2 } else { 0 };
        r[32] = name.len() as u8;
        r[33..33 + name.len()].copy_from_slice(name);
        r
    }
    fn put(img: &mut [u8], at: usize, bytes: &[u8]) {
        img[at..at + bytes.len()].copy_from_slice(bytes);
    }

    let mut img = vec![0u8; 21 * S];
    put(&mut img, 16 * S, b"\x01CD001\x01");
    put(&mut img, 16 * S + 7 + 33, format!("{:<32}", "ITEST").as_bytes());
    put(&mut img, 16 * S + 7 + 149, &record(b"\0", 18, S as u32, true));
    put(&mut img, 17 * S, b"\xffCD001\x01");
    let mut at = 18 * S;
    for r in [
        record(b"\0", 18, S as u32, true),
        record(b"\x01", 18, S as u32, true),
        record(b"README.TXT;1", 20, 6, false),
        record(b"DOCS.", 19, S as u32, true),
    ] {
        put(&mut img, at, &r);
        at += r.len();
    }
    at = 19 * S;
    for r in [
        record(b"\0", 19, S as u32, true),
        record(b"\x01", 18, S as u32, true),
    ] {
        put(&mut img, at, &r);
        at += r.len();
    }
    put(&mut img, 20 * S, b"readme");
    img
}

#[test]
fn iso_image_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let file = DiskPath::new(dir.path().join("disc.iso")).unwrap();
    file.set_content(&iso_image()).unwrap();

    let image = IsoImage::open(file.clone()).unwrap();
    assert_eq!(image.identifier(), "ITEST");
    let root = image.root();
    assert_eq!(root.listdir().unwrap(), ["readme.txt", "docs"]);
    assert_eq!(root.child("readme.txt").unwrap().get_content().unwrap(), b"readme");
    assert!(root.child("docs").unwrap().is_dir().unwrap());
    assert!(root.child("docs").unwrap().listdir().unwrap().is_empty());
    assert!(!root.child("readme.txt;1").unwrap().exists().unwrap());
    assert_eq!(names(&root), ["", "readme.txt", "docs"]);
    assert!(root.child("new").unwrap().create_directory().unwrap_err().is_unsupported());
}

// =============================================================================
// Links
// =============================================================================

#[cfg(unix)]
#[test]
fn walk_reports_symlink_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let root = DiskPath::new(dir.path()).unwrap();
    let sub = root.child("sub").unwrap();
    sub.create_directory().unwrap();
    root.link_to(&sub.child("up").unwrap()).unwrap();

    let results: Vec<_> = root.walk().collect();
    assert!(matches!(
        results.last(),
        Some(Err(PathError::LinkCycle { .. }))
    ));
    assert!(results.iter().filter(|r| r.is_err()).count() == 1);
}

#[cfg(unix)]
#[test]
fn self_referential_link_is_a_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let root = DiskPath::new(dir.path()).unwrap();
    let me = root.child("me").unwrap();
    me.link_to(&me).unwrap();
    assert!(matches!(me.realpath(), Err(PathError::LinkCycle { .. })));
    assert!(root.walk().any(|r| matches!(r, Err(PathError::LinkCycle { .. }))));
}

#[cfg(unix)]
#[test]
fn walk_with_reports_self_referential_link() {
    let dir = tempfile::tempdir().unwrap();
    let root = DiskPath::new(dir.path()).unwrap();
    let sub = root.child("sub").unwrap();
    sub.create_directory().unwrap();
    let me = root.child("me").unwrap();
    me.link_to(&me).unwrap();
    let deep = sub.child("me").unwrap();
    deep.link_to(&deep).unwrap();

    for descend in [true, false] {
        let results: Vec<_> = root.walk_with(move |_| descend).collect();
        assert!(
            matches!(results.last(), Some(Err(PathError::LinkCycle { .. }))),
            "descend = {descend}: {results:?}"
        );
        assert!(!results.iter().any(|r| matches!(r, Err(PathError::Io { .. }))));
    }
}

#[cfg(unix)]
#[test]
fn remove_clears_tree_with_self_referential_link() {
    let dir = tempfile::tempdir().unwrap();
    let root = DiskPath::new(dir.path()).unwrap();
    let d = root.child("d").unwrap();
    d.create_directory().unwrap();
    d.child("keep").unwrap().set_content(b"x").unwrap();
    let me = d.child("me").unwrap();
    me.link_to(&me).unwrap();

    d.remove().unwrap();
    assert!(!d.exists().unwrap());
    assert!(root.listdir().unwrap().is_empty());
}
