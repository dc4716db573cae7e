use serde_json::json;
use siumai_object::prelude::*;
use siumai_object::types::ResponseFormat;

use crate::support::*;

#[tokio::test]
async fn accepts_any_object() {
    let model = MockLanguageModel::from_chunks(&["{\"a\": ", "[1, ", "2]}"]).into_arc();
    let result = stream_object(model, "prompt", StreamObjectOptions::no_schema()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert_eq!(
        partials(&parts),
        vec![json!({}), json!({ "a": [1] }), json!({ "a": [1, 2] })]
    );
    assert_eq!(text_deltas(&parts).concat(), "{\"a\": [1, 2]}");
    assert_eq!(object.await.unwrap(), json!({ "a": [1, 2] }));
}

#[tokio::test]
async fn accepts_a_top_level_array() {
    let model = MockLanguageModel::from_chunks(&["[1,", " 2,", " 3]"]).into_arc();
    let result = stream_object(model, "prompt", StreamObjectOptions::no_schema()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert_eq!(
        partials(&parts),
        vec![json!([1]), json!([1, 2]), json!([1, 2, 3])]
    );
    assert_eq!(object.await.unwrap(), json!([1, 2, 3]));
}

#[tokio::test]
async fn accepts_a_growing_string() {
    let model = MockLanguageModel::from_chunks(&["\"hel", "lo\""]).into_arc();
    let result = stream_object(model, "prompt", StreamObjectOptions::no_schema()).unwrap();
    let object = result.object();

    let partials: Vec<_> = result.partial_object_stream().collect().await;
    assert_eq!(partials, vec![json!("hel"), json!("hello")]);
    assert_eq!(object.await.unwrap(), json!("hello"));
}

#[tokio::test]
async fn empty_text_cannot_be_parsed() {
    let model = MockLanguageModel::from_chunks(&[]).into_arc();
    let result = stream_object(model, "prompt", StreamObjectOptions::no_schema()).unwrap();
    let object = result.object();

    let parts = collect_parts(result).await;
    assert!(partials(&parts).is_empty());

    let err = object.await.unwrap_err();
    let inner = err.as_no_object_generated().expect("no object generated");
    assert_eq!(
        inner.message,
        "No object generated: could not parse the response."
    );
    assert_eq!(inner.usage, Some(usage()));
}

#[tokio::test]
async fn requests_json_without_a_schema() {
    let model = std::sync::Arc::new(MockLanguageModel::from_chunks(&["{}"]));
    let result = stream_object(model.clone(), "prompt", StreamObjectOptions::no_schema()).unwrap();
    assert_eq!(result.output_type().to_string(), "no-schema");
    let _ = collect_parts(result).await;

    assert_eq!(
        model.last_call().expect("called").response_format,
        Some(ResponseFormat::Json {
            schema: None,
            name: None,
            description: None,
        })
    );
}
