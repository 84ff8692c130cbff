use csv_batch::{Columns, Field, ParseOptions, parse_str};
use serde_json::json;

#[tokio::test]
async fn empty_input_yields_empty_result() {
    let result = parse_str("", ParseOptions::new()).await;
    assert_eq!(result.total_records, 0);
    assert!(result.errors.is_empty());
    let records = result.into_accumulator().unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn empty_input_invokes_no_callbacks() {
    let mut options = ParseOptions::new();
    options.batch = true;
    let options = options
        .map(|_record| async move {
            panic!("map must not run on empty input");
            #[allow(unreachable_code)]
            Ok(None)
        })
        .batch_execution(|_acc: Vec<csv_batch::Record>| async move {
            panic!("batch execution must not run on empty input");
            #[allow(unreachable_code)]
            Ok(Some(()))
        });
    let result = parse_str("", options).await;
    assert_eq!(result.total_records, 0);
    assert_eq!(result.into_batches(), Some(vec![]));
}

#[tokio::test]
async fn empty_string_stays_distinct_from_null() {
    let csv = "a,b,c,d\n\"\",,\"\"\"\",\r\n1,2,3,";
    let mut options = ParseOptions::new();
    options.null_on_empty = true;
    let result = parse_str(csv, options).await;

    assert_eq!(result.total_records, 2);
    assert!(result.errors.is_empty());
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([
            {"a": "", "b": null, "c": "\"", "d": null},
            {"a": "1", "b": "2", "c": "3", "d": null},
        ])
    );
}

#[tokio::test]
async fn supplied_columns_map_records_without_a_header() {
    let csv = "1,2,3\n4,5,6";
    let mut options = ParseOptions::new();
    options.header = false;
    options.columns = Columns::names(["a", "b", "c"]);
    let result = parse_str(csv, options).await;

    assert_eq!(result.total_records, 2);
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([
            {"a": "1", "b": "2", "c": "3"},
            {"a": "4", "b": "5", "c": "6"},
        ])
    );
}

#[tokio::test]
async fn matching_first_row_is_consumed_as_header() {
    let csv = "A,B,C\n1,2,3";
    let mut options = ParseOptions::new();
    options.header = false;
    options.columns = Columns::names(["a", "b", "c"]);
    let result = parse_str(csv, options).await;

    assert_eq!(result.total_records, 1);
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{"a": "1", "b": "2", "c": "3"}])
    );
}

#[tokio::test]
async fn header_match_ignores_accents() {
    // First row carries a decomposed accent; the configured column is precomposed.
    let csv = "CAFE\u{301}\nespresso";
    let mut options = ParseOptions::new();
    options.header = false;
    options.columns = Columns::names(["café"]);
    let result = parse_str(csv, options).await;

    assert_eq!(result.total_records, 1);
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        records[0].get("café").and_then(Field::as_str),
        Some("espresso")
    );
}

#[tokio::test]
async fn extra_fields_beyond_the_header_are_dropped() {
    let csv = "a,b,c\n1,2,3,4\n5,6,7,8";
    let result = parse_str(csv, ParseOptions::new()).await;

    assert_eq!(result.total_records, 2);
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([
            {"a": "1", "b": "2", "c": "3"},
            {"a": "5", "b": "6", "c": "7"},
        ])
    );
}

#[tokio::test]
async fn short_rows_omit_missing_columns() {
    let csv = "a,b,c\n1,2";
    let result = parse_str(csv, ParseOptions::new()).await;
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{"a": "1", "b": "2"}])
    );
}

#[tokio::test]
async fn no_header_emits_raw_rows() {
    let csv = "1,2,3\n4,5,6";
    let mut options = ParseOptions::new();
    options.header = false;
    let result = parse_str(csv, options).await;

    assert_eq!(result.total_records, 2);
    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([["1", "2", "3"], ["4", "5", "6"]])
    );
}

#[tokio::test]
async fn detail_attaches_line_and_raw_text() {
    let csv = "a,b,c\n1,2,3\n4,5,6";
    let mut options = ParseOptions::new();
    options.detail = true;
    let result = parse_str(csv, options).await;

    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([
            {"line": 2, "raw": "1,2,3", "data": {"a": "1", "b": "2", "c": "3"}},
            {"line": 3, "raw": "4,5,6", "data": {"a": "4", "b": "5", "c": "6"}},
        ])
    );
}

#[tokio::test]
async fn detail_lines_start_at_one_without_a_header() {
    let csv = "1,2,3\n4,5,6";
    let mut options = ParseOptions::new();
    options.header = false;
    options.detail = true;
    let result = parse_str(csv, options).await;

    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([
            {"line": 1, "raw": "1,2,3", "data": ["1", "2", "3"]},
            {"line": 2, "raw": "4,5,6", "data": ["4", "5", "6"]},
        ])
    );
}

#[tokio::test]
async fn detail_uses_the_starting_line_of_multi_line_records() {
    let csv = "a\n\"x\ny\"\nz";
    let mut options = ParseOptions::new();
    options.detail = true;
    let result = parse_str(csv, options).await;

    let records = result.into_accumulator().unwrap();
    assert_eq!(records[0].line, 2);
    assert_eq!(records[0].raw.as_deref(), Some("\"x\ny\""));
    assert_eq!(records[1].line, 4);
}

#[tokio::test]
async fn unterminated_final_record_is_emitted() {
    let csv = "a,b\n1,2\n3,4";
    let result = parse_str(csv, ParseOptions::new()).await;
    assert_eq!(result.total_records, 2);
}

#[tokio::test]
async fn custom_delimiter_and_quote() {
    let csv = "a;b\n'1;1';2";
    let mut options = ParseOptions::new();
    options.delimiter = ';';
    options.quote = '\'';
    let result = parse_str(csv, options).await;

    let records = result.into_accumulator().unwrap();
    assert_eq!(
        serde_json::to_value(&records).unwrap(),
        json!([{"a": "1;1", "b": "2"}])
    );
}

#[tokio::test]
async fn map_can_drop_records_silently() {
    let csv = "a\n1\n2\n3";
    let options = ParseOptions::new().map(|record| async move {
        if record.get("a").and_then(Field::as_str) == Some("2") {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    });
    let result = parse_str(csv, options).await;

    assert_eq!(result.total_records, 2);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn map_failures_are_tagged_with_the_record_line() {
    let csv = "a\n1\nboom\n3";
    let options = ParseOptions::new().map(|record| async move {
        if record.get("a").and_then(Field::as_str) == Some("boom") {
            Err("map exploded".into())
        } else {
            Ok(Some(record))
        }
    });
    let result = parse_str(csv, options).await;

    assert_eq!(result.total_records, 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line, Some(3));
    assert_eq!(result.errors[0].error.to_string(), "map exploded");
}

#[tokio::test]
async fn round_trip_reproduces_the_same_mapping() {
    let csv = "1,2,3\n4,5,6";
    let columns = Columns::names(["a", "b", "c"]);

    let mut direct = ParseOptions::new();
    direct.header = false;
    direct.columns = columns.clone();
    let expected = parse_str(csv, direct).await.into_accumulator().unwrap();

    let mut raw = ParseOptions::new();
    raw.header = false;
    let rows = parse_str(csv, raw).await.into_accumulator().unwrap();
    let rebuilt = rows
        .iter()
        .map(|record| {
            record
                .values()
                .map(|f| f.as_str().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut again = ParseOptions::new();
    again.header = false;
    again.columns = columns;
    let reparsed = parse_str(&rebuilt, again).await.into_accumulator().unwrap();

    assert_eq!(
        serde_json::to_value(&reparsed).unwrap(),
        serde_json::to_value(&expected).unwrap()
    );
}
