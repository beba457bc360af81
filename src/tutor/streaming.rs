//! Server-sent events decoding for streamed answers

use futures_util::StreamExt;
use reqwest::Response;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::TutorError;
use super::models::StreamEvent;

/// Incremental SSE decoder
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event_type: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk and collect any complete events
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end();

            if let Some(event_type) = line.strip_prefix("event:") {
                self.event_type = event_type.trim().to_string();
            } else if let Some(data) = line.strip_prefix("data:") {
                if let Some(event) = parse_event(&self.event_type, data.trim_start()) {
                    events.push(event);
                }
            }
            // Blank lines and ":" comments carry nothing
        }

        events
    }
}

fn parse_event(event_type: &str, data: &str) -> Option<StreamEvent> {
    match event_type {
        "content_block_delta" => {
            let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
            let text = parsed["delta"]["text"].as_str()?;
            Some(StreamEvent::TextDelta(text.to_string()))
        }
        "message_stop" => Some(StreamEvent::MessageStop),
        "error" => {
            let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
            let message = parsed["error"]["message"].as_str().unwrap_or("Unknown error");
            Some(StreamEvent::Error(message.to_string()))
        }
        "message_start" | "content_block_start" | "content_block_stop" | "message_delta"
        | "ping" => None,
        _ => {
            tracing::debug!("Unknown SSE event type: {}", event_type);
            None
        }
    }
}

/// Forward the text of a streamed response through `tx`
///
/// Returns once the message stops, the body ends or the receiver goes away.
pub async fn forward_text(
    response: Response,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) -> Result<(), TutorError> {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TutorError::Cancelled),

            chunk = stream.next() => {
                let Some(chunk) = chunk else { return Ok(()) };
                for event in decoder.push(&chunk?) {
                    match event {
                        StreamEvent::TextDelta(text) => {
                            if tx.send(text).await.is_err() {
                                return Ok(());
                            }
                        }
                        StreamEvent::MessageStop => return Ok(()),
                        StreamEvent::Error(message) => return Err(TutorError::Stream(message)),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const DELTA: &str = concat!(
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,",
        "\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello\"}}\n\n",
    );

    #[test]
    fn decodes_text_delta() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.push(DELTA.as_bytes()), vec![StreamEvent::TextDelta("Hello".into())]);
    }

    #[test]
    fn waits_for_complete_lines() {
        let mut decoder = SseDecoder::new();
        let (a, b) = DELTA.split_at(40);
        assert!(decoder.push(a.as_bytes()).is_empty());
        assert_eq!(decoder.push(b.as_bytes()), vec![StreamEvent::TextDelta("Hello".into())]);
    }

    #[test]
    fn multibyte_text_split_across_chunks() {
        let event = "event: content_block_delta\ndata: {\"delta\":{\"text\":\"ação\"}}\n";
        let bytes = event.as_bytes();
        // Split inside the two-byte "ç"
        let split = event.find('ç').unwrap() + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&bytes[..split]).is_empty());
        assert_eq!(decoder.push(&bytes[split..]), vec![StreamEvent::TextDelta("ação".into())]);
    }

    #[test]
    fn decodes_stop_and_error() {
        let mut decoder = SseDecoder::new();
        let stream = concat!(
            "event: error\n",
            "data: {\"type\":\"error\",\"error\":{\"message\":\"Overloaded\"}}\n\n",
            "event: message_stop\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let events = decoder.push(stream.as_bytes());
        assert_eq!(events, vec![StreamEvent::Error("Overloaded".into()), StreamEvent::MessageStop]);
    }

    #[test]
    fn ignores_bookkeeping_events() {
        let mut decoder = SseDecoder::new();
        let stream = concat!(
            "event: ping\ndata: {}\n\n",
            ": comment\n\n",
            "event: message_start\ndata: {\"message\":{\"id\":\"m\"}}\n\n",
        );
        let events = decoder.push(stream.as_bytes());
        assert!(events.is_empty());
    }
}
