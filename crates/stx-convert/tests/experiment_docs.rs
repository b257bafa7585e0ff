use std::fs;
use std::sync::Arc;

use assert_json_diff::assert_json_eq;
use serde_json::{json, Value};
use stx_convert::ExperimentWriter;
use stx_core::naming::StandardNaming;

fn read_json(dir: &tempfile::TempDir, name: &str) -> Value {
    let bytes = fs::read(dir.path().join(name)).expect("read document");
    serde_json::from_slice(&bytes).expect("parse document")
}

#[test]
fn manifest_contents_are_ascending_regardless_of_completion_order() {
    let dir = tempfile::tempdir().expect("tmp");
    let writer = ExperimentWriter::new(Arc::new(StandardNaming), dir.path(), None);
    writer.add_fov(2).expect("add");
    writer.add_fov(0).expect("add");
    writer.add_fov(1).expect("add");

    let manifest = read_json(&dir, "primary_image-fov.json");
    assert_json_eq!(
        manifest,
        json!({
            "contents": {
                "fov_000": "primary_image-fov_000.json",
                "fov_001": "primary_image-fov_001.json",
                "fov_002": "primary_image-fov_002.json",
            },
            "extras": null,
            "version": "0.0.0",
        })
    );
}

#[test]
fn experiment_descriptor_references_the_manifest_and_codebook() {
    let dir = tempfile::tempdir().expect("tmp");
    let writer = ExperimentWriter::new(Arc::new(StandardNaming), dir.path(), None);
    writer.add_fov(0).expect("add");

    let experiment = read_json(&dir, "experiment.json");
    assert_json_eq!(
        experiment,
        json!({
            "version": "5.0.0",
            "images": { "primary": "primary_image-fov.json" },
            "extras": {},
            "codebook": "codebook.json",
        })
    );
}

#[test]
fn stub_codebook_is_the_single_placeholder_entry() {
    let dir = tempfile::tempdir().expect("tmp");
    let writer = ExperimentWriter::new(Arc::new(StandardNaming), dir.path(), None);
    writer.flush().expect("flush");

    let codebook = read_json(&dir, "codebook.json");
    assert_json_eq!(
        codebook,
        json!([
            {
                "codeword": [ { "r": 0, "c": 0, "v": 1 } ],
                "target": "PLEASE_REPLACE_ME",
            }
        ])
    );
}

#[test]
fn attached_codebooks_are_copied_verbatim() {
    let dir = tempfile::tempdir().expect("tmp");
    let source = dir.path().join("my-codes.json");
    let body = r#"[{"codeword":[{"r":1,"c":2,"v":3}],"target":"ACTB"}]"#;
    fs::write(&source, body).expect("write codebook");

    let out = tempfile::tempdir().expect("tmp out");
    let writer = ExperimentWriter::new(Arc::new(StandardNaming), out.path(), Some(source));
    writer.flush().expect("flush");

    let copied = fs::read_to_string(out.path().join("codebook.json")).expect("read copy");
    assert_eq!(copied, body);
}

#[test]
fn flush_without_fovs_still_writes_all_documents() {
    let dir = tempfile::tempdir().expect("tmp");
    let writer = ExperimentWriter::new(Arc::new(StandardNaming), dir.path(), None);
    writer.flush().expect("flush");

    let manifest = read_json(&dir, "primary_image-fov.json");
    assert_json_eq!(manifest["contents"], json!({}));
    assert!(dir.path().join("experiment.json").is_file());
    assert!(dir.path().join("codebook.json").is_file());
}

#[test]
fn concurrent_completions_settle_into_one_ascending_manifest() {
    let dir = tempfile::tempdir().expect("tmp");
    let writer = Arc::new(ExperimentWriter::new(
        Arc::new(StandardNaming),
        dir.path(),
        None,
    ));

    let handles: Vec<_> = (0..8usize)
        .map(|fov| {
            let writer = Arc::clone(&writer);
            std::thread::spawn(move || writer.add_fov(fov).expect("add"))
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }

    let manifest = read_json(&dir, "primary_image-fov.json");
    let contents = manifest["contents"].as_object().expect("object");
    assert_eq!(contents.len(), 8);
    let keys: Vec<&String> = contents.keys().collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn repeated_completions_are_idempotent() {
    let dir = tempfile::tempdir().expect("tmp");
    let writer = ExperimentWriter::new(Arc::new(StandardNaming), dir.path(), None);
    writer.add_fov(0).expect("add");
    writer.add_fov(0).expect("add again");
    let manifest = read_json(&dir, "primary_image-fov.json");
    let contents = manifest["contents"].as_object().expect("object");
    assert_eq!(contents.len(), 1);
}
