//! Server-Sent Events (SSE) parser for OpenAI streaming responses

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::{ChatCompletionChunk, ErrorEnvelope, OpenAiSseEvent};

const DONE_SENTINEL: &str = "[DONE]";

/// Parse a stream of bytes as OpenAI SSE events
///
/// OpenAI's SSE format only uses `data:` lines:
/// ```text
/// data: {"id":"chatcmpl-1","choices":[{"delta":{"content":"He"}}]}
///
/// data: [DONE]
/// ```
///
/// Bytes are buffered until a blank line closes an event, so events split
/// across network chunks (including inside a multi-byte character) are
/// reassembled before decoding.
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<OpenAiSseEvent, LlmError>> + Send>> {
    let mut buffer: Vec<u8> = Vec::new();

    let event_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        buffer.extend_from_slice(&chunk);

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = find_event_boundary(&buffer) {
            let raw: Vec<u8> = buffer.drain(..end + delimiter_len).take(end).collect();

            let event_text = match String::from_utf8(raw) {
                Ok(text) => text,
                Err(e) => {
                    events.push(Err(LlmError::StreamError(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))));
                    continue;
                }
            };

            if let Some(parsed_event) = parse_event(&event_text) {
                events.push(parsed_event);
            }
        }

        futures::stream::iter(events)
    });

    Box::pin(event_stream)
}

/// Locate the first blank line, returning its offset and delimiter length
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Parse a single SSE event from its text representation
fn parse_event(event_text: &str) -> Option<Result<OpenAiSseEvent, LlmError>> {
    let mut data_lines: Vec<&str> = Vec::new();

    for line in event_text.lines() {
        let line = line.trim_end_matches('\r');

        // Comments and keep-alives
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        if let Some(data_val) = line.strip_prefix("data:") {
            data_lines.push(data_val.strip_prefix(' ').unwrap_or(data_val));
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    let data = data.trim();

    if data.is_empty() {
        return None;
    }

    if data == DONE_SENTINEL {
        return Some(Ok(OpenAiSseEvent::Done));
    }

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(data) {
        return Some(Ok(OpenAiSseEvent::Error(envelope.error)));
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => Some(Ok(OpenAiSseEvent::Chunk(chunk))),
        Err(e) => Some(Err(LlmError::SerializationError(format!(
            "Failed to parse OpenAI SSE chunk: {}. Data: {}",
            e, data
        )))),
    }
}
