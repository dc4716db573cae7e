use serde_json::json;
use siumai_object::prelude::*;
use siumai_object::types::ResponseFormat;

use crate::support::*;

async fn run(values: &[&str], chunks: &[&str]) -> (Vec<serde_json::Value>, Vec<String>, Result<serde_json::Value, LlmError>) {
    let model = MockLanguageModel::from_chunks(chunks).into_arc();
    let options = StreamObjectOptions::enumeration(values.iter().copied());
    let result = stream_object(model, "prompt", options).unwrap();
    let object = result.object();
    let parts = collect_parts(result).await;
    (partials(&parts), text_deltas(&parts), object.await)
}

#[tokio::test]
async fn unique_prefix_publishes_the_full_value() {
    let chunks = ["{ ", "\"result\": ", "\"su", "nny", "\"", " }"];
    let (partials, deltas, object) = run(&["sunny", "rainy", "snowy"], &chunks).await;

    assert_eq!(partials, vec![json!("sunny")]);
    assert_eq!(deltas, vec!["{ \"result\": \"su", "nny\" }"]);
    assert_eq!(deltas.concat(), chunks.concat());
    assert_eq!(object.unwrap(), json!("sunny"));
}

#[tokio::test]
async fn unknown_value_is_withheld_and_rejected() {
    let chunks = ["{ ", "\"result\": ", "\"foo", "bar", "\"", " }"];
    let (partials, _, object) = run(&["sunny", "rainy", "snowy"], &chunks).await;

    assert!(partials.is_empty());
    let err = object.unwrap_err();
    let inner = err.as_no_object_generated().expect("no object generated");
    assert_eq!(
        inner.message,
        "No object generated: response did not match schema."
    );
    assert_eq!(inner.text.as_deref(), Some("{ \"result\": \"foobar\" }"));
}

#[tokio::test]
async fn ambiguous_prefix_publishes_the_raw_prefix() {
    let chunks = ["{ ", "\"result\": ", "\"foo", "bar", "\"", " }"];
    let (partials, _, object) = run(&["foobar", "foobar2"], &chunks).await;

    assert_eq!(partials, vec![json!("foo"), json!("foobar")]);
    // exact match wins even though it is also a prefix of another value
    assert_eq!(object.unwrap(), json!("foobar"));
}

#[tokio::test]
async fn prefix_narrowing_to_one_value_publishes_once() {
    let chunks = ["{ ", "\"result\": ", "\"foo", "bar", "\"", " }"];
    let (partials, _, object) = run(&["foobar", "barfoo"], &chunks).await;

    assert_eq!(partials, vec![json!("foobar")]);
    assert_eq!(object.unwrap(), json!("foobar"));
}

#[tokio::test]
async fn requests_a_result_wrapper() {
    let model = std::sync::Arc::new(MockLanguageModel::from_chunks(&["{\"result\":\"a\"}"]));
    let result = stream_object(
        model.clone(),
        "prompt",
        StreamObjectOptions::enumeration(["a", "b"]),
    )
    .unwrap();
    assert_eq!(result.output_type().to_string(), "enum");
    let _ = collect_parts(result).await;

    match model.last_call().expect("called").response_format {
        Some(ResponseFormat::Json { schema: Some(schema), name, .. }) => {
            assert_eq!(schema["properties"]["result"]["enum"], json!(["a", "b"]));
            assert_eq!(schema["required"], json!(["result"]));
            assert!(name.is_none());
        }
        other => panic!("unexpected response format: {other:?}"),
    }
}
