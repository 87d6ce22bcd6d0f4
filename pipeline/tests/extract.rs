#![cfg(unix)]

use std::time::Duration;

use pipeline::extract::{self, CommandExtractor, Extractor};
use pipeline::PipelineError;
use pretty_assertions::assert_eq;

fn extractor(tools: &[&str]) -> CommandExtractor {
    CommandExtractor::new(tools.iter().map(|t| t.to_string()).collect(), Duration::from_secs(10))
}

#[test]
fn falls_through_to_the_first_working_tool() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("match.rar");
    std::fs::write(&archive, b"").unwrap();

    let used = extractor(&["cs2-pipeline-no-such-tool", "false", "true"])
        .extract(&archive, &dir.path().join("out"))
        .unwrap();

    assert_eq!("true", used);
    assert!(dir.path().join("out").is_dir());
}

#[test]
#[tracing_test::traced_test]
fn every_tool_failing() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("match.rar");
    std::fs::write(&archive, b"").unwrap();

    let result = extractor(&["cs2-pipeline-no-such-tool", "false"]).extract(&archive, &dir.path().join("out"));

    match result {
        Err(PipelineError::Extraction { tried, .. }) => assert_eq!("cs2-pipeline-no-such-tool, false", tried),
        other => panic!("expected an extraction error, got {:?}", other),
    }
    assert!(logs_contain("Extractor failed"));
}

#[test]
fn only_archives_are_extracted() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("a.rar"), b"").unwrap();
    std::fs::write(input.path().join("b.ZIP"), b"").unwrap();
    std::fs::write(input.path().join("notes.txt"), b"").unwrap();

    let report = extract::extract_all(&extractor(&["true"]), input.path(), output.path()).unwrap();

    assert_eq!(vec!["a".to_owned(), "b".to_owned()], report.processed);
    assert!(report.skipped.is_empty());
}

#[test]
fn failed_archives_are_skipped() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("a.7z"), b"").unwrap();

    let report = extract::extract_all(&extractor(&["false"]), input.path(), output.path()).unwrap();

    assert!(report.processed.is_empty());
    assert_eq!("a", report.skipped[0].0);
}
