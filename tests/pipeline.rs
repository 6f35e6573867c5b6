//! End-to-end pipeline tests driven by scripted fake search tools.
//!
//! Each test stands in for the external tool with `sh -c <script>`; the
//! extra argv elements the pipeline appends (`--`, pattern, paths) land in
//! the script's positional parameters, so `$1` is the resolved pattern.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use rg_stream::{
    start_search, Batch, InputKind, PipelineOptions, QueryTransform, SearchError, SearchHandle,
    SearchItem, SearchRequest,
};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn script_request(script: &str, pattern: &str, cwd: PathBuf) -> SearchRequest {
    SearchRequest {
        pattern: pattern.to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        globs: vec![],
        paths: vec![],
        cwd,
    }
}

async fn collect(handle: &mut SearchHandle) -> Vec<Batch> {
    let mut batches = Vec::new();
    while let Some(batch) = handle.next_batch().await {
        batches.push(batch);
    }
    batches
}

fn matches_of(batches: &[Batch]) -> Vec<&rg_stream::MatchRecord> {
    batches
        .iter()
        .flatten()
        .filter_map(|item| match item {
            SearchItem::Match(record) => Some(record),
            SearchItem::FileHeader { .. } => None,
        })
        .collect()
}

#[tokio::test]
async fn plain_lines_stream_in_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();

    let script = r"printf 'a.txt:1:3:foo\na.txt:2:5:foobar\nb.txt:7:1:foo baz\n'";
    let request = script_request(script, "foo", dir.path().to_path_buf());
    let mut handle = start_search("sh", request, PipelineOptions::default(), None)
        .await
        .unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    let records = matches_of(&batches);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].display, "a.txt:1:3: foo");
    assert_eq!(records[1].line, 2);
    assert_eq!(records[2].path, dir.path().join("b.txt").to_string_lossy());
    assert_eq!(records[2].text, "foo baz");
}

#[tokio::test]
async fn crlf_output_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();

    let script = r"printf 'a.txt:1:3:foo\r\n'";
    let request = script_request(script, "foo", dir.path().to_path_buf());
    let mut handle = start_search("sh", request, PipelineOptions::default(), None)
        .await
        .unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    let records = matches_of(&batches);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "foo");
}

#[tokio::test]
async fn json_lines_use_submatch_offsets() {
    let dir = tempfile::tempdir().unwrap();

    // printf '%s\n' keeps the embedded "\n" escape literal, which a POSIX
    // echo would expand into a real line break.
    let script = concat!(
        r#"printf '%s\n' '{"type":"begin","data":{"path":{"text":"src/lib.rs"}}}'; "#,
        r#"printf '%s\n' '{"type":"match","data":{"path":{"text":"src/lib.rs"},"lines":{"text":"pub fn search() {}\n"},"line_number":42,"submatches":[{"match":{"text":"search"},"start":7,"end":13}]}}'; "#,
        r#"printf '%s\n' '{"type":"end","data":{"path":{"text":"src/lib.rs"}}}'"#,
    );
    let mut request = script_request(script, "search", dir.path().to_path_buf());
    request.args.push("--json".to_string());
    let mut handle = start_search("sh", request, PipelineOptions::default(), None)
        .await
        .unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    let records = matches_of(&batches);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].col, 8);
    assert_eq!(records[0].display, "src/lib.rs:42:7: pub fn search() {}");
    let word = records[0]
        .highlights
        .iter()
        .find(|s| s.field == rg_stream::SpanField::Word)
        .unwrap();
    assert_eq!(word.width, 6);
}

#[tokio::test]
async fn empty_query_spawns_nothing_and_closes_cleanly() {
    let dir = tempfile::tempdir().unwrap();

    // A spawn attempt would fail loudly on this path.
    let request = script_request("exit 1", "", dir.path().to_path_buf());
    let mut handle = start_search(
        "/nonexistent/search-tool",
        request,
        PipelineOptions::default(),
        None,
    )
    .await
    .unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn short_volatile_query_short_circuits() {
    let dir = tempfile::tempdir().unwrap();

    let request = script_request("exit 1", "f", dir.path().to_path_buf());
    let options = PipelineOptions {
        volatile: true,
        min_volatile_input_len: 2,
        ..PipelineOptions::default()
    };
    let mut handle = start_search("/nonexistent/search-tool", request, options, None)
        .await
        .unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn missing_executable_fails_to_spawn() {
    let dir = tempfile::tempdir().unwrap();

    let request = script_request("exit 0", "foo", dir.path().to_path_buf());
    let err = start_search(
        "/nonexistent/search-tool",
        request,
        PipelineOptions::default(),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SearchError::Spawn { .. }));
}

struct Upper;

impl QueryTransform for Upper {
    fn transform<'a>(&'a self, input: &'a str) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move { Ok(input.to_uppercase()) })
    }
}

#[tokio::test]
async fn transliterated_pattern_reaches_the_tool() {
    let dir = tempfile::tempdir().unwrap();

    // The script echoes the pattern it received back as a match line.
    let script = r#"printf 'a.txt:1:1:%s\n' "$1""#;
    let request = script_request(script, "foo", dir.path().to_path_buf());
    let options = PipelineOptions {
        input_kind: InputKind::Transliterated,
        ..PipelineOptions::default()
    };
    let mut handle = start_search("sh", request, options, Some(Arc::new(Upper)))
        .await
        .unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    let records = matches_of(&batches);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "FOO");
}

#[tokio::test]
async fn transliterated_without_transform_errors() {
    let dir = tempfile::tempdir().unwrap();

    let request = script_request("exit 0", "foo", dir.path().to_path_buf());
    let options = PipelineOptions {
        input_kind: InputKind::Transliterated,
        ..PipelineOptions::default()
    };
    let err = start_search("sh", request, options, None).await.unwrap_err();
    assert!(matches!(err, SearchError::TransformUnavailable(_)));
}

#[tokio::test]
async fn ceiling_bounds_results_and_terminates_the_process() {
    let dir = tempfile::tempdir().unwrap();

    // Emits far more lines than the ceiling, then blocks; only a kill ends it.
    let script = r#"i=1; while [ $i -le 100 ]; do echo "a.txt:$i:1:foo"; i=$((i+1)); done; exec sleep 30"#;
    let request = script_request(script, "foo", dir.path().to_path_buf());
    let options = PipelineOptions {
        max_items: 10,
        one_item_batches: true,
        ..PipelineOptions::default()
    };
    let mut handle = start_search("sh", request, options, None).await.unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .expect("ceiling must terminate the process, not wait for it");
    let records = matches_of(&batches);
    assert_eq!(records.len(), 10);
    // Prefix of the unbounded run: lines 1..=10 in source order.
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.line, i as u64 + 1);
    }
}

#[tokio::test]
async fn cancellation_stops_batches_and_the_process() {
    let dir = tempfile::tempdir().unwrap();

    let script = r"printf 'a.txt:1:1:foo\n'; exec sleep 30";
    let request = script_request(script, "foo", dir.path().to_path_buf());
    let options = PipelineOptions {
        one_item_batches: true,
        ..PipelineOptions::default()
    };
    let mut handle = start_search("sh", request, options, None).await.unwrap();

    let first = tokio::time::timeout(TEST_TIMEOUT, handle.next_batch())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 1);

    handle.cancel();
    let rest = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .expect("cancellation must terminate the process");
    assert!(rest.is_empty(), "no batch may follow cancellation");
}

#[tokio::test]
async fn category_mode_emits_one_header_per_file() {
    let dir = tempfile::tempdir().unwrap();

    let script = r"printf 'a.txt:1:3:foo\na.txt:2:5:bar\nb.txt:1:1:baz\n'";
    let request = script_request(script, "foo", dir.path().to_path_buf());
    let options = PipelineOptions {
        category: true,
        ..PipelineOptions::default()
    };
    let mut handle = start_search("sh", request, options, None).await.unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    let items: Vec<&SearchItem> = batches.iter().flatten().collect();
    assert_eq!(items.len(), 5);

    match items[0] {
        SearchItem::FileHeader { display, .. } => assert_eq!(display, "a.txt:"),
        SearchItem::Match(_) => panic!("expected header for a.txt first"),
    }
    assert!(items[1].is_match() && items[2].is_match());
    match items[3] {
        SearchItem::FileHeader { display, .. } => assert_eq!(display, "b.txt:"),
        SearchItem::Match(_) => panic!("expected header for b.txt"),
    }
    assert!(items[4].is_match());

    let SearchItem::Match(first) = items[1] else {
        panic!("expected match");
    };
    assert_eq!(first.display, "  foo");
}

#[tokio::test]
async fn failing_process_yields_clean_empty_close() {
    let dir = tempfile::tempdir().unwrap();

    let script = r#"echo 'regex parse error: unclosed group' >&2; exit 2"#;
    let request = script_request(script, "foo(", dir.path().to_path_buf());
    let options = PipelineOptions {
        volatile: true,
        ..PipelineOptions::default()
    };
    let mut handle = start_search("sh", request, options, None).await.unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn malformed_lines_are_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let script = r"printf 'garbage without columns\na.txt:1:3:foo\n'";
    let request = script_request(script, "foo", dir.path().to_path_buf());
    let mut handle = start_search("sh", request, PipelineOptions::default(), None)
        .await
        .unwrap();

    let batches = tokio::time::timeout(TEST_TIMEOUT, collect(&mut handle))
        .await
        .unwrap();
    let records = matches_of(&batches);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "foo");
}
