//! Scripted language model for driving `stream_object` in tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use siumai_object::prelude::*;
use siumai_object::types::{ProviderMetadata, RequestMetadata, ResponseHeaders};

pub const MODEL_ID: &str = "mock-model-id";
pub const RESPONSE_ID: &str = "id-0";

pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(0, 0).unwrap()
}

pub fn provider_metadata() -> ProviderMetadata {
    json!({ "testProvider": { "testKey": "testValue" } })
        .as_object()
        .cloned()
        .unwrap()
}

pub fn usage() -> Usage {
    Usage::new(3, 10)
}

/// Parts a typical provider sends around the given text chunks.
pub fn text_parts(chunks: &[&str]) -> Vec<Result<ModelStreamPart, LlmError>> {
    let mut parts = vec![
        Ok(ModelStreamPart::StreamStart { warnings: vec![] }),
        Ok(ModelStreamPart::ResponseMetadata {
            id: Some(RESPONSE_ID.to_string()),
            timestamp: Some(epoch()),
            model_id: Some(MODEL_ID.to_string()),
        }),
    ];
    parts.extend(chunks.iter().map(|c| Ok(ModelStreamPart::text(*c))));
    parts.push(Ok(ModelStreamPart::Finish {
        finish_reason: FinishReason::Stop,
        usage: usage(),
        provider_metadata: Some(provider_metadata()),
    }));
    parts
}

/// Replays a fixed list of parts.
pub struct MockLanguageModel {
    parts: Vec<Result<ModelStreamPart, LlmError>>,
    start_error: Option<LlmError>,
    connect_delay: Option<Duration>,
    part_delay: Option<Duration>,
    hang_at_end: bool,
    request: Option<RequestMetadata>,
    headers: Option<ResponseHeaders>,
    pub calls: Arc<Mutex<Vec<CallOptions>>>,
}

impl MockLanguageModel {
    pub fn new(parts: Vec<Result<ModelStreamPart, LlmError>>) -> Self {
        Self {
            parts,
            start_error: None,
            connect_delay: None,
            part_delay: None,
            hang_at_end: false,
            request: None,
            headers: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_chunks(chunks: &[&str]) -> Self {
        Self::new(text_parts(chunks))
    }

    /// `do_stream` itself fails.
    pub fn failing(error: LlmError) -> Self {
        let mut model = Self::new(vec![]);
        model.start_error = Some(error);
        model
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub fn with_part_delay(mut self, delay: Duration) -> Self {
        self.part_delay = Some(delay);
        self
    }

    /// Never end the stream after the scripted parts.
    pub fn hanging(mut self) -> Self {
        self.hang_at_end = true;
        self
    }

    pub fn with_request(mut self, request: RequestMetadata) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_headers(mut self, headers: ResponseHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn into_arc(self) -> Arc<dyn LanguageModel> {
        Arc::new(self)
    }

    pub fn last_call(&self) -> Option<CallOptions> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        MODEL_ID
    }

    async fn do_stream(&self, options: CallOptions) -> Result<StreamResponse, LlmError> {
        self.calls.lock().unwrap().push(options);

        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.start_error {
            return Err(error.clone());
        }

        let parts = self.parts.clone();
        let part_delay = self.part_delay;
        let hang = self.hang_at_end;
        let stream = async_stream::stream! {
            for part in parts {
                if let Some(delay) = part_delay {
                    tokio::time::sleep(delay).await;
                }
                yield part;
            }
            if hang {
                std::future::pending::<()>().await;
            }
        };

        Ok(StreamResponse {
            stream: Box::pin(stream),
            request: self.request.clone(),
            response: self.headers.clone(),
        })
    }
}

/// Collect every part of a result's full stream.
pub async fn collect_parts(result: StreamObjectResult) -> Vec<ObjectStreamPart> {
    result.full_stream().collect().await
}

pub fn partials(parts: &[ObjectStreamPart]) -> Vec<serde_json::Value> {
    parts
        .iter()
        .filter_map(|p| match p {
            ObjectStreamPart::Object { object } => Some(object.clone()),
            _ => None,
        })
        .collect()
}

pub fn text_deltas(parts: &[ObjectStreamPart]) -> Vec<String> {
    parts
        .iter()
        .filter_map(|p| match p {
            ObjectStreamPart::TextDelta { text_delta } => Some(text_delta.clone()),
            _ => None,
        })
        .collect()
}

pub fn errors(parts: &[ObjectStreamPart]) -> Vec<LlmError> {
    parts
        .iter()
        .filter_map(|p| match p {
            ObjectStreamPart::Error { error } => Some(error.clone()),
            _ => None,
        })
        .collect()
}

/// Options with a pinned id and clock.
pub fn pinned(options: StreamObjectOptions) -> StreamObjectOptions {
    options
        .with_id_generator(siumai_object::utils::fixed_id("aiobj-fixed"))
        .with_clock(siumai_object::utils::fixed_clock(epoch()))
}

pub fn content_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": { "content": { "type": "string" } },
        "required": ["content"],
        "additionalProperties": false
    })
}
