//! Line framing over arbitrarily split network reads

/// Turns raw byte chunks into complete lines.
///
/// Chunk boundaries may fall anywhere: inside a line, inside a JSON document,
/// or inside a multi-byte UTF-8 sequence. Bytes after the last `\n` are kept
/// until the next [`push`](Self::push). Lines are returned without the `\n`
/// and without a trailing `\r`.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and collect every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);

        lines
    }

    /// Flush the trailing fragment at end of stream.
    ///
    /// The gateway does not promise a terminal newline, so a non-empty
    /// fragment counts as a final line. An empty fragment yields nothing.
    pub fn finish(&mut self) -> Option<String> {
        let bytes = std::mem::take(&mut self.pending);
        let line = decode_line(&bytes);
        if line.is_empty() { None } else { Some(line) }
    }

    /// Number of buffered bytes not yet terminated by a newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
