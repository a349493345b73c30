//! Testing utilities for the transport layer.
//!
//! Provides an in-memory transport and a helper for building raw frames.

mod memory;

pub use memory::MemoryTransport;

use serde::Serialize;

/// Build a raw Content-Length frame around a JSON-serializable message.
///
/// # Example
///
/// ```
/// use transport::testing::frame_message;
/// use serde_json::json;
///
/// let bytes = frame_message(&json!({"type": "stream", "out": "hello"}));
///
/// assert!(bytes.starts_with(b"Content-Length: "));
/// ```
pub fn frame_message(msg: &impl Serialize) -> Vec<u8> {
    let json = serde_json::to_string(msg).expect("failed to serialize message");
    format!("Content-Length: {}\r\n\r\n{}", json.len(), json).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_message() {
        let bytes = frame_message(&json!({"type": "stream", "quit": true}));
        let s = String::from_utf8(bytes).unwrap();

        assert!(s.starts_with("Content-Length: 29\r\n\r\n"));
        assert!(s.contains(r#""quit":true"#));
    }
}
