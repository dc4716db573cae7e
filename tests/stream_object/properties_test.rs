//! Chunking-independence of the published stream.

use proptest::prelude::*;
use serde_json::Value;
use siumai_object::prelude::*;

use crate::support::*;

const OBJECT_TEXT: &str =
    r#"{ "content": "Hello, \"world\"! [1, 2] {nested}", "extra": [true, null, 3.5, {"k": "v"}] }"#;

fn chunk(text: &str, sizes: &[usize]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;
    let mut sizes = sizes.iter().cycle();
    while !rest.is_empty() {
        let size = (*sizes.next().unwrap_or(&1)).min(rest.len());
        let (head, tail) = rest.split_at(size);
        chunks.push(head.to_string());
        rest = tail;
    }
    chunks
}

fn run(chunks: &[String], options: StreamObjectOptions) -> (Vec<ObjectStreamPart>, Result<Value, LlmError>) {
    tokio_test::block_on(async {
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let model = MockLanguageModel::from_chunks(&refs).into_arc();
        let result = stream_object(model, "prompt", options).unwrap();
        let object = result.object();
        let parts = collect_parts(result).await;
        (parts, object.await)
    })
}

fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": { "content": { "type": "string" } },
        "required": ["content"]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn object_stream_is_chunking_independent(sizes in proptest::collection::vec(1usize..8, 1..24)) {
        let chunks = chunk(OBJECT_TEXT, &sizes);
        let (parts, object) = run(&chunks, StreamObjectOptions::object(schema()));
        let expected: Value = serde_json::from_str(OBJECT_TEXT).unwrap();

        let published = partials(&parts);
        for pair in published.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
        prop_assert_eq!(published.last(), Some(&expected));
        prop_assert_eq!(text_deltas(&parts).concat(), OBJECT_TEXT);
        prop_assert!(errors(&parts).is_empty());
        prop_assert_eq!(object.unwrap(), expected);
    }

    #[test]
    fn no_schema_stream_is_chunking_independent(sizes in proptest::collection::vec(1usize..8, 1..24)) {
        let text = r#"[{"a": 1}, {"b": [2, 3]}, "four", 5]"#;
        let chunks = chunk(text, &sizes);
        let (parts, object) = run(&chunks, StreamObjectOptions::no_schema());
        let expected: Value = serde_json::from_str(text).unwrap();

        let published = partials(&parts);
        for pair in published.windows(2) {
            prop_assert_ne!(&pair[0], &pair[1]);
        }
        prop_assert_eq!(published.last(), Some(&expected));
        prop_assert_eq!(text_deltas(&parts).concat(), text);
        prop_assert_eq!(object.unwrap(), expected);
    }

    #[test]
    fn array_elements_arrive_in_order(sizes in proptest::collection::vec(1usize..8, 1..24)) {
        let text = r#"{"elements": [{"content": "a"}, {"content": "b,c"}, {"content": "]"}]}"#;
        let chunks = chunk(text, &sizes);
        let (parts, object) = run(&chunks, StreamObjectOptions::array(schema()));

        let published = partials(&parts);
        let mut previous = 0;
        for partial in &published {
            let len = partial.as_array().map_or(0, Vec::len);
            prop_assert!(len > previous || (previous == 0 && len == 0));
            previous = len;
        }
        prop_assert_eq!(previous, 3);
        let final_value = object.unwrap();
        prop_assert_eq!(published.last(), Some(&final_value));

        let joined: Value = serde_json::from_str(&text_deltas(&parts).concat()).unwrap();
        prop_assert_eq!(joined, final_value);
    }
}
