use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use siumai_object::prelude::*;

use crate::support::*;

async fn final_object(chunks: &[&str], options: StreamObjectOptions) -> Result<serde_json::Value, LlmError> {
    let model = MockLanguageModel::from_chunks(chunks).into_arc();
    let result = stream_object(model, "prompt", options).unwrap();
    let object = result.object();
    let _ = collect_parts(result).await;
    object.await
}

#[tokio::test]
async fn repairs_unparseable_text() {
    let seen: Arc<Mutex<Vec<(String, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let options = StreamObjectOptions::object(content_schema()).with_repair(move |text, err| {
        sink.lock()
            .unwrap()
            .push((text.to_string(), matches!(err, LlmError::JsonParse { .. })));
        Some(format!("{text}}}"))
    });

    let object = final_object(&["{ \"content\": ", "\"ok\""], options).await;

    assert_eq!(object.unwrap(), json!({ "content": "ok" }));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("{ \"content\": \"ok\"".to_string(), true)]
    );
}

#[tokio::test]
async fn repairs_schema_mismatch() {
    let saw_validation = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&saw_validation);
    let options = StreamObjectOptions::object(content_schema()).with_repair(move |_, err| {
        *flag.lock().unwrap() = matches!(err, LlmError::TypeValidation { .. });
        Some("{\"content\":\"1\"}".to_string())
    });

    let object = final_object(&["{\"content\": 1}"], options).await;

    assert_eq!(object.unwrap(), json!({ "content": "1" }));
    assert!(*saw_validation.lock().unwrap());
}

#[tokio::test]
async fn declined_repair_keeps_the_original_error() {
    let options = StreamObjectOptions::object(content_schema()).with_repair(|_, _| None);

    let err = final_object(&["{ \"content\": "], options).await.unwrap_err();
    let inner = err.as_no_object_generated().expect("no object generated");
    assert_eq!(
        inner.message,
        "No object generated: could not parse the response."
    );
    assert_eq!(inner.text.as_deref(), Some("{ \"content\": "));
}

#[tokio::test]
async fn repair_is_attempted_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = StreamObjectOptions::object(content_schema()).with_repair(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Some("{\"content\": 2}".to_string())
    });

    let err = final_object(&["{\"content\": 1}"], options).await.unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let inner = err.as_no_object_generated().expect("no object generated");
    // the failure describes the repaired text
    assert_eq!(inner.text.as_deref(), Some("{\"content\": 2}"));
}

#[tokio::test]
async fn valid_output_skips_repair() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = StreamObjectOptions::object(content_schema()).with_repair(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        None
    });

    let object = final_object(&["{\"content\":\"fine\"}"], options).await;

    assert_eq!(object.unwrap(), json!({ "content": "fine" }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repaired_value_reaches_on_finish() {
    let finished = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&finished);
    let options = StreamObjectOptions::no_schema()
        .with_repair(|text, _| Some(format!("{text}]")))
        .with_on_finish(move |event| {
            *sink.lock().unwrap() = event.object;
            Ok(())
        });

    let object = final_object(&["[1, ", "2"], options).await;

    assert_eq!(object.unwrap(), json!([1, 2]));
    assert_eq!(*finished.lock().unwrap(), Some(json!([1, 2])));
}
