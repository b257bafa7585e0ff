use std::fs;
use std::path::PathBuf;

use stx_convert::guess::{guess_pattern, write_pattern_file};

fn touch(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"").expect("touch");
    path
}

#[test]
fn varying_digit_runs_become_blocks() {
    let dir = tempfile::tempdir().expect("tmp");
    let input = touch(&dir, "image_t1.fake");
    touch(&dir, "image_t2.fake");
    touch(&dir, "image_t3.fake");
    let pattern = guess_pattern(&input).expect("guess");
    assert_eq!(pattern, "image_t<1-3>.fake");
}

#[test]
fn constant_digit_runs_stay_literal() {
    let dir = tempfile::tempdir().expect("tmp");
    let input = touch(&dir, "well7_t1.fake");
    touch(&dir, "well7_t2.fake");
    let pattern = guess_pattern(&input).expect("guess");
    assert_eq!(pattern, "well7_t<1-2>.fake");
}

#[test]
fn uniform_zero_padding_is_preserved() {
    let dir = tempfile::tempdir().expect("tmp");
    let input = touch(&dir, "image_t01.fake");
    for t in 2..=12 {
        touch(&dir, &format!("image_t{t:02}.fake"));
    }
    let pattern = guess_pattern(&input).expect("guess");
    assert_eq!(pattern, "image_t<01-12>.fake");
}

#[test]
fn lone_files_guess_their_own_name() {
    let dir = tempfile::tempdir().expect("tmp");
    let input = touch(&dir, "image_t1.fake");
    let pattern = guess_pattern(&input).expect("guess");
    assert_eq!(pattern, "image_t1.fake");
}

#[test]
fn unrelated_siblings_are_ignored() {
    let dir = tempfile::tempdir().expect("tmp");
    let input = touch(&dir, "image_t1.fake");
    touch(&dir, "image_t2.fake");
    touch(&dir, "other_t9.fake");
    touch(&dir, "notes.txt");
    let pattern = guess_pattern(&input).expect("guess");
    assert_eq!(pattern, "image_t<1-2>.fake");
}

#[test]
fn pattern_files_must_use_the_suffix() {
    let dir = tempfile::tempdir().expect("tmp");
    let err = write_pattern_file("image_t<1-2>.fake", &dir.path().join("out.txt")).unwrap_err();
    assert_eq!(err.exit_code(), 9);
}

#[test]
fn pattern_files_must_not_preexist() {
    let dir = tempfile::tempdir().expect("tmp");
    let target = dir.path().join("group.pattern");
    fs::write(&target, b"old").expect("seed");
    let err = write_pattern_file("image_t<1-2>.fake", &target).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn written_patterns_round_trip_through_the_reader() {
    let dir = tempfile::tempdir().expect("tmp");
    let input = touch(&dir, "image_t1.fake");
    touch(&dir, "image_t2.fake");
    let pattern = guess_pattern(&input).expect("guess");
    let target = dir.path().join("group.pattern");
    write_pattern_file(&pattern, &target).expect("write");

    let reader = stx_formats::PatternReader::open(&target).expect("open");
    use stx_core::reader::FormatReader;
    assert_eq!(reader.shape().size_t, 2);
}
