//! Gemini streaming adapter.
//!
//! Speaks the `streamGenerateContent?alt=sse` surface of the Generative
//! Language API using browser `fetch()` via gloo-net, reading the
//! response body incrementally through a `ReadableStream` reader. Each
//! SSE `data:` line carries a JSON chunk with candidate text parts and,
//! on the final chunks, usage metadata.

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use gloo_net::http::Request;
use js_sys::Uint8Array;
use serde::Deserialize;
use serde_json::{json, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use tangle_core::ports::{GenerateRequest, HistoryEntry, ModelPort, ModelStreamEvent};
use tangle_types::message::Role;
use tangle_types::{ChatError, Result};

const API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Provider backed by the hosted Gemini API.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: API_BASE.to_string(),
        }
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url, model, self.api_key
        )
    }
}

#[async_trait(?Send)]
impl ModelPort for GeminiProvider {
    fn stream_generate(
        &self,
        req: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = ModelStreamEvent>>> {
        if self.api_key.trim().is_empty() {
            return Box::pin(stream::once(async {
                ModelStreamEvent::Error(ChatError::Auth("no API key configured".to_string()))
            }));
        }

        let url = self.stream_url(&req.model);
        let body = build_request_body(&req);

        Box::pin(stream::unfold(
            SseState::Connect { url, body },
            |mut state| async move {
                loop {
                    match state {
                        SseState::Connect { url, body } => match open_sse(&url, &body).await {
                            Ok(reader) => {
                                state = SseState::Reading {
                                    reader,
                                    pending: Vec::new(),
                                    queued: VecDeque::new(),
                                    source_done: false,
                                };
                            }
                            Err(err) => {
                                return Some((ModelStreamEvent::Error(err), SseState::Finished));
                            }
                        },
                        SseState::Reading {
                            reader,
                            mut pending,
                            mut queued,
                            source_done,
                        } => {
                            if let Some(event) = queued.pop_front() {
                                return Some((
                                    event,
                                    SseState::Reading {
                                        reader,
                                        pending,
                                        queued,
                                        source_done,
                                    },
                                ));
                            }
                            if source_done {
                                return Some((ModelStreamEvent::Done, SseState::Finished));
                            }
                            match read_chunk(&reader).await {
                                Ok(Some(bytes)) => {
                                    pending.extend_from_slice(&bytes);
                                    drain_complete_lines(&mut pending, &mut queued);
                                    state = SseState::Reading {
                                        reader,
                                        pending,
                                        queued,
                                        source_done: false,
                                    };
                                }
                                Ok(None) => {
                                    // Flush a final line without a trailing newline.
                                    if !pending.is_empty() {
                                        let tail = String::from_utf8_lossy(&pending).to_string();
                                        parse_sse_line(tail.trim_end(), &mut queued);
                                        pending.clear();
                                    }
                                    state = SseState::Reading {
                                        reader,
                                        pending,
                                        queued,
                                        source_done: true,
                                    };
                                }
                                Err(err) => {
                                    return Some((
                                        ModelStreamEvent::Error(err),
                                        SseState::Finished,
                                    ));
                                }
                            }
                        }
                        SseState::Finished => return None,
                    }
                }
            },
        ))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        if self.api_key.trim().is_empty() {
            return Err(ChatError::Auth("no API key configured".to_string()));
        }
        let url = format!("{}/v1beta/models?key={}", self.base_url, self.api_key);

        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_http_error(status, &text));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Provider(e.to_string()))?;

        let models = data["models"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["name"].as_str())
                    .map(|name| name.trim_start_matches("models/").to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }
}

enum SseState {
    Connect {
        url: String,
        body: Value,
    },
    Reading {
        reader: ReadableStreamDefaultReader,
        /// Bytes of an incomplete trailing line; chunk boundaries can
        /// fall anywhere, including inside a UTF-8 sequence.
        pending: Vec<u8>,
        queued: VecDeque<ModelStreamEvent>,
        source_done: bool,
    },
    Finished,
}

async fn open_sse(url: &str, body: &Value) -> Result<ReadableStreamDefaultReader> {
    let response = Request::post(url)
        .header("Content-Type", "application/json")
        .json(body)
        .map_err(|e| ChatError::Network(e.to_string()))?
        .send()
        .await
        .map_err(|e| ChatError::Network(e.to_string()))?;

    if !response.ok() {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(classify_http_error(status, &text));
    }

    let body_stream = response
        .body()
        .ok_or_else(|| ChatError::Provider("response has no body".to_string()))?;
    body_stream
        .get_reader()
        .dyn_into::<ReadableStreamDefaultReader>()
        .map_err(|_| ChatError::Provider("streaming reader unavailable".to_string()))
}

/// One `reader.read()` round trip: `Ok(Some(bytes))` for a chunk,
/// `Ok(None)` at end of stream.
async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<Vec<u8>>> {
    let result = JsFuture::from(reader.read())
        .await
        .map_err(|e| ChatError::Network(format!("{:?}", e)))?;

    let done = js_sys::Reflect::get(&result, &JsValue::from_str("done"))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if done {
        return Ok(None);
    }

    let value = js_sys::Reflect::get(&result, &JsValue::from_str("value"))
        .map_err(|e| ChatError::Network(format!("{:?}", e)))?;
    Ok(Some(Uint8Array::new(&value).to_vec()))
}

fn drain_complete_lines(pending: &mut Vec<u8>, queued: &mut VecDeque<ModelStreamEvent>) {
    while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
        let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&line_bytes);
        parse_sse_line(line.trim_end(), queued);
    }
}

fn parse_sse_line(line: &str, queued: &mut VecDeque<ModelStreamEvent>) {
    let Some(payload) = line.strip_prefix("data:") else {
        return;
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return;
    }

    match serde_json::from_str::<SseChunk>(payload) {
        Ok(chunk) => {
            for candidate in chunk.candidates {
                let Some(content) = candidate.content else {
                    continue;
                };
                for part in content.parts {
                    if let Some(text) = part.text {
                        if !text.is_empty() {
                            queued.push_back(ModelStreamEvent::Delta(text));
                        }
                    }
                }
            }
            if let Some(usage) = chunk.usage_metadata {
                queued.push_back(ModelStreamEvent::Usage {
                    input_tokens: usage.prompt_token_count,
                    output_tokens: usage.candidates_token_count,
                });
            }
        }
        Err(e) => log::warn!("Skipping unparseable SSE payload: {}", e),
    }
}

fn classify_http_error(status: u16, body: &str) -> ChatError {
    if status == 401
        || status == 403
        || body.contains("API_KEY_INVALID")
        || body.contains("API key not valid")
    {
        ChatError::Auth(format!("HTTP {}: {}", status, body))
    } else {
        ChatError::Provider(format!("HTTP {}: {}", status, body))
    }
}

// ─── Request serialization ───────────────────────────────────

fn build_request_body(req: &GenerateRequest) -> Value {
    let contents: Vec<Value> = req.history.iter().map(entry_to_json).collect();
    json!({
        "contents": contents,
        "generationConfig": {
            "temperature": req.temperature,
            "topK": req.top_k,
            "topP": req.top_p,
            "maxOutputTokens": req.max_output_tokens,
        }
    })
}

fn entry_to_json(entry: &HistoryEntry) -> Value {
    let role = match entry.role {
        Role::User => "user",
        Role::Model => "model",
    };

    let mut parts = vec![json!({ "text": entry.content })];
    for attachment in &entry.attachments {
        parts.push(json!({
            "inline_data": {
                "mime_type": attachment.mime_type,
                "data": attachment.data,
            }
        }));
    }

    json!({ "role": role, "parts": parts })
}

// ─── Response chunk types ────────────────────────────────────

#[derive(Deserialize)]
struct SseChunk {
    #[serde(default)]
    candidates: Vec<SseCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<SseUsage>,
}

#[derive(Deserialize)]
struct SseCandidate {
    content: Option<SseContent>,
}

#[derive(Deserialize)]
struct SseContent {
    #[serde(default)]
    parts: Vec<SsePart>,
}

#[derive(Deserialize)]
struct SsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct SseUsage {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}
