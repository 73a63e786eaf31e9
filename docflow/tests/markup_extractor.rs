use tokio_util::sync::CancellationToken;

use docflow::processing::extractors::{HtmlExtractor, JsonExtractor};
use docflow::processing::{Extractor, SilentReporter};

mod common;
use common::{default_registry, pipeline_with, read_records, write_file};

#[tokio::test]
async fn test_html_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "page.html",
        br#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Report</title><style>p { color: red; }</style></head>
<body><h1>Heading</h1><script>var x = 1;</script><p>First paragraph</p></body>
</html>"#,
    );

    let units = HtmlExtractor
        .extract(&path, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].metadata["title"], "Report");
    assert_eq!(units[0].metadata["language"], "en");
    assert_eq!(units[0].metadata["encoding"], "UTF-8");
    assert!(units[0].content.contains("First paragraph"));
    assert!(!units[0].content.contains("var x"));
    assert!(!units[0].content.contains("color: red"));
}

#[tokio::test]
async fn test_mislabelled_gbk_page_through_pipeline() {
    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();

    let mut page = b"<html><head><meta charset=\"utf-8\"><title>t</title></head><body><p>".to_vec();
    page.extend_from_slice(&[0xD6, 0xD0, 0xCE, 0xC4]);
    page.extend_from_slice(b"</p></body></html>");
    write_file(input.path(), "legacy.htm", &page);

    let summary = pipeline_with(default_registry(), out.path())
        .run(input.path(), &SilentReporter)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    let records = read_records(out.path(), "htm");
    assert_eq!(records.len(), 1);
    let unit = &records[0].1.documents[0];
    assert!(unit.content.contains("中文"));
    assert_eq!(unit.metadata["encoding"], "GBK");
}

#[tokio::test]
async fn test_json_is_compacted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "data.json", b"{\n  \"a\": 1,\n  \"b\": [true, null]\n}\n");

    let units = JsonExtractor
        .extract(&path, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(units.len(), 1);
    assert_eq!(units[0].content, r#"{"a":1,"b":[true,null]}"#);
    assert_eq!(units[0].metadata["seq_num"], 1);
}
