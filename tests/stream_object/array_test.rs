use serde_json::json;
use siumai_object::prelude::*;

use crate::support::*;

const ELEMENT_CHUNKS: [&str; 15] = [
    "{\"elements\":[",
    "{",
    "\"content\":",
    "\"element 1\"",
    "},",
    "{ ",
    "\"content\": ",
    "\"element 2\"",
    "},",
    "{",
    "\"content\":",
    "\"element 3\"",
    "}",
    "]",
    "}",
];

fn options() -> StreamObjectOptions {
    StreamObjectOptions::array(content_schema())
}

#[tokio::test]
async fn publishes_only_completed_elements() {
    let model = MockLanguageModel::from_chunks(&ELEMENT_CHUNKS).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;

    assert_eq!(
        partials(&parts),
        vec![
            json!([]),
            json!([{ "content": "element 1" }]),
            json!([{ "content": "element 1" }, { "content": "element 2" }]),
            json!([
                { "content": "element 1" },
                { "content": "element 2" },
                { "content": "element 3" }
            ]),
        ]
    );
    assert_eq!(
        object.await.unwrap(),
        json!([
            { "content": "element 1" },
            { "content": "element 2" },
            { "content": "element 3" }
        ])
    );
}

#[tokio::test]
async fn text_deltas_describe_the_published_array() {
    let model = MockLanguageModel::from_chunks(&ELEMENT_CHUNKS).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();

    let deltas: Vec<String> = result.text_stream().collect().await;
    assert_eq!(
        deltas,
        vec![
            "[",
            "{\"content\":\"element 1\"}",
            ",{\"content\":\"element 2\"}",
            ",{\"content\":\"element 3\"}]",
        ]
    );

    let joined: serde_json::Value = serde_json::from_str(&deltas.concat()).unwrap();
    assert_eq!(joined.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn element_stream_yields_each_element_once() {
    let model = MockLanguageModel::from_chunks(&ELEMENT_CHUNKS).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();

    let elements: Vec<serde_json::Value> = result.element_stream().unwrap().collect().await;
    assert_eq!(
        elements,
        vec![
            json!({ "content": "element 1" }),
            json!({ "content": "element 2" }),
            json!({ "content": "element 3" }),
        ]
    );
}

#[tokio::test]
async fn single_chunk_is_published_whole() {
    let text = r#"{"elements":[{"content":"a"},{"content":"b"}]}"#;
    let model = MockLanguageModel::from_chunks(&[text]).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();

    let parts = collect_parts(result).await;
    assert_eq!(
        partials(&parts),
        vec![json!([{ "content": "a" }, { "content": "b" }])]
    );
    assert_eq!(
        text_deltas(&parts),
        vec![r#"[{"content":"a"},{"content":"b"}]"#]
    );
}

#[tokio::test]
async fn empty_array_is_valid() {
    let model = MockLanguageModel::from_chunks(&["{\"elements\":[]}"]).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert_eq!(partials(&parts), vec![json!([])]);
    assert_eq!(text_deltas(&parts), vec!["[]"]);
    assert_eq!(object.await.unwrap(), json!([]));
}

#[tokio::test]
async fn empty_array_split_across_chunks_closes_text() {
    let model = MockLanguageModel::from_chunks(&["{\"elements\":[", "]", "}"]).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert_eq!(partials(&parts), vec![json!([])]);
    assert_eq!(text_deltas(&parts).concat(), "[]");
    assert_eq!(object.await.unwrap(), json!([]));
}

#[tokio::test]
async fn trailing_whitespace_is_not_echoed_into_text() {
    let model = MockLanguageModel::from_chunks(&["{\"elements\":[]}", "\n"]).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();

    let parts = collect_parts(result).await;
    assert_eq!(text_deltas(&parts), vec!["[]"]);
}

#[tokio::test]
async fn rejected_last_element_still_closes_text() {
    let model = MockLanguageModel::from_chunks(&[
        "{\"elements\":[{\"content\":\"a\"},",
        "{\"content\":1}",
        "]}",
    ])
    .into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert_eq!(partials(&parts), vec![json!([]), json!([{ "content": "a" }])]);

    let text = text_deltas(&parts).concat();
    assert_eq!(text, "[{\"content\":\"a\"}]");
    let joined: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(joined, json!([{ "content": "a" }]));

    assert!(object.await.unwrap_err().is_no_object_generated());
}

#[tokio::test]
async fn unpublished_array_text_is_empty_brackets() {
    let model =
        MockLanguageModel::from_chunks(&["{\"elements\":[{\"content\":\"a\"},{\"content\":1}]}"])
            .into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();

    let parts = collect_parts(result).await;
    assert_eq!(text_deltas(&parts), vec!["[]"]);
}

#[tokio::test]
async fn invalid_element_fails_final_validation() {
    let model =
        MockLanguageModel::from_chunks(&["{\"elements\":[{\"content\":\"a\"},{\"content\":1}]}"])
            .into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert!(partials(&parts).is_empty());

    let err = object.await.unwrap_err();
    let inner = err.as_no_object_generated().expect("no object generated");
    assert_eq!(
        inner.message,
        "No object generated: response did not match schema."
    );
}

#[tokio::test]
async fn missing_elements_wrapper_fails() {
    let model = MockLanguageModel::from_chunks(&["[{\"content\":\"a\"}]"]).into_arc();
    let result = stream_object(model, "prompt", options()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert!(partials(&parts).is_empty());
    assert!(object.await.unwrap_err().is_no_object_generated());
}

#[tokio::test]
async fn element_stream_requires_array_output() {
    let model = MockLanguageModel::from_chunks(&["{\"content\":\"a\"}"]).into_arc();
    let result = stream_object(model, "prompt", StreamObjectOptions::object(content_schema()))
        .unwrap();

    assert!(matches!(
        result.element_stream(),
        Err(LlmError::UnsupportedOperation(_))
    ));
}

#[tokio::test]
async fn requests_the_wrapped_schema() {
    let model = std::sync::Arc::new(MockLanguageModel::from_chunks(&ELEMENT_CHUNKS));
    let result = stream_object(model.clone(), "prompt", options()).unwrap();
    let _ = collect_parts(result).await;

    let call = model.last_call().expect("called");
    match call.response_format {
        Some(siumai_object::types::ResponseFormat::Json { schema: Some(schema), .. }) => {
            assert_eq!(schema["required"], json!(["elements"]));
            assert_eq!(schema["properties"]["elements"]["items"], content_schema());
        }
        other => panic!("unexpected response format: {other:?}"),
    }
}
