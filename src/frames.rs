use crate::models::SocketFrame;

/// Serialize an outbound socket frame
pub fn encode_frame(frame: &SocketFrame) -> String {
    // Only string fields, so serialization cannot fail in practice
    serde_json::to_string(frame).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "content": e.to_string() }).to_string()
    })
}

/// Create a chunk frame carrying one relayed fragment
pub fn create_chunk_frame(content: String) -> String {
    encode_frame(&SocketFrame::Chunk { content })
}

/// Create a done frame to signal the end of one reply
pub fn create_done_frame() -> String {
    encode_frame(&SocketFrame::Done)
}

/// Create an error frame with a human-readable description
pub fn create_error_frame(content: String) -> String {
    encode_frame(&SocketFrame::Error { content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_create_chunk_frame() {
        let frame = create_chunk_frame("Hello world".to_string());
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "chunk");
        assert_eq!(value["content"], "Hello world");
    }

    #[test]
    fn test_create_done_frame() {
        assert_eq!(create_done_frame(), r#"{"type":"done"}"#);
    }

    #[test]
    fn test_create_error_frame() {
        let frame = create_error_frame("Rate limit exceeded".to_string());
        let decoded: SocketFrame = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            decoded,
            SocketFrame::Error {
                content: "Rate limit exceeded".to_string()
            }
        );
    }

    #[test]
    fn test_chunk_content_is_escaped() {
        let frame = create_chunk_frame("line \"one\"\nline two".to_string());
        let decoded: SocketFrame = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            decoded,
            SocketFrame::Chunk {
                content: "line \"one\"\nline two".to_string()
            }
        );
    }
}
