use std::fs;
use std::path::PathBuf;

use stx_core::reader::FormatReader;
use stx_formats::PatternReader;

fn touch(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"").expect("touch");
    path
}

fn pattern(dir: &tempfile::TempDir, name: &str, line: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, format!("{line}\n")).expect("write pattern");
    path
}

#[test]
fn blocks_multiply_the_named_axis() {
    let dir = tempfile::tempdir().expect("tmp");
    for t in 1..=3 {
        touch(&dir, &format!("image_t{t}&sizeZ=2&.fake"));
    }
    let path = pattern(&dir, "group.pattern", "image_t<1-3>&sizeZ=2&.fake");
    let reader = PatternReader::open(&path).expect("open");
    let shape = reader.shape();
    assert_eq!(shape.size_t, 3);
    assert_eq!(shape.size_z, 2);
    assert_eq!(reader.series_count(), 1);
    assert_eq!(reader.plate_count(), 0);
}

#[test]
fn series_blocks_extend_the_series_count() {
    let dir = tempfile::tempdir().expect("tmp");
    for s in 0..2 {
        touch(&dir, &format!("image_s{s}.fake"));
    }
    let path = pattern(&dir, "group.pattern", "image_s<0-1>.fake");
    let reader = PatternReader::open(&path).expect("open");
    assert_eq!(reader.series_count(), 2);
}

#[test]
fn missing_members_fail_the_open() {
    let dir = tempfile::tempdir().expect("tmp");
    touch(&dir, "image_t1.fake");
    // image_t2.fake deliberately absent.
    let path = pattern(&dir, "group.pattern", "image_t<1-2>.fake");
    assert!(PatternReader::open(&path).is_err());
}

#[test]
fn padded_blocks_resolve_padded_members() {
    let dir = tempfile::tempdir().expect("tmp");
    for t in 1..=10 {
        touch(&dir, &format!("image_t{t:02}.fake"));
    }
    let path = pattern(&dir, "group.pattern", "image_t<01-10>.fake");
    let reader = PatternReader::open(&path).expect("open");
    assert_eq!(reader.shape().size_t, 10);
}

#[test]
fn planes_delegate_to_the_member_reader() {
    let dir = tempfile::tempdir().expect("tmp");
    for t in 1..=2 {
        touch(&dir, &format!("image_t{t}&sizeX=4&sizeY=4&.fake"));
    }
    let path = pattern(&dir, "group.pattern", "image_t<1-2>&sizeX=4&sizeY=4&.fake");
    let mut reader = PatternReader::open(&path).expect("open");
    let plane = reader.read_plane(0, 0, 1).expect("plane");
    assert_eq!(plane.len(), 16);
}
