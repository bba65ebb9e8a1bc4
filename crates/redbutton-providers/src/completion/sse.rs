//! Server-sent-event frame decoding for the completion stream
//!
//! The provider's streaming endpoint answers with `text/event-stream`
//! frames separated by blank lines. Chunk boundaries from the transport do
//! not align with frame boundaries, so the decoder buffers partial input
//! between `feed` calls and yields only complete `data:` payloads.

/// Incremental decoder for `data:` payloads in an SSE byte stream
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: String,
}

impl SseDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every complete `data:` payload found
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        let mut payloads = Vec::new();
        while let Some((pos, sep_len)) = find_frame_end(&self.buffer) {
            let frame: String = self.buffer.drain(..pos + sep_len).collect();
            for line in frame.lines() {
                let line = line.trim_end_matches('\r');
                if let Some(data) = line.strip_prefix("data:") {
                    payloads.push(data.trim_start().to_string());
                }
            }
        }
        payloads
    }
}

/// Position and length of the earliest blank-line frame separator
fn find_frame_end(buffer: &str) -> Option<(usize, usize)> {
    let lf = buffer.find("\n\n").map(|pos| (pos, 2));
    let crlf = buffer.find("\r\n\r\n").map(|pos| (pos, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: {\"a\":1}\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"a\"").is_empty());
        assert!(decoder.feed(b":1}\n").is_empty());
        let payloads = decoder.feed(b"\n");
        assert_eq!(payloads, vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: one\n\ndata: two\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, vec!["one", "two", "[DONE]"]);
    }

    #[test]
    fn test_crlf_frames() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: one\r\n\r\ndata: two\n\n");
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn test_non_data_lines_ignored() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b": keep-alive\nevent: ping\ndata: x\n\n");
        assert_eq!(payloads, vec!["x"]);
    }
}
