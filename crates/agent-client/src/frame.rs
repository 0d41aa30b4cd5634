//! Incremental reassembly of newline-delimited frames.

/// Turns raw byte chunks into complete lines, tolerating frames split
/// across read boundaries. Only the trailing incomplete fragment is
/// retained between pushes, so memory stays bounded by one frame.
///
/// Reassembly happens on bytes and UTF-8 is decoded per complete line,
/// so a multi-byte character split across a chunk boundary survives
/// intact instead of decoding as replacement characters.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    partial: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk and get back every line completed by it.
    /// A line is eligible only once its terminator has been observed;
    /// trailing `\r` from CRLF terminators is stripped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.partial.extend_from_slice(&rest[..pos]);
            if self.partial.last() == Some(&b'\r') {
                self.partial.pop();
            }
            let raw = std::mem::take(&mut self.partial);
            lines.push(String::from_utf8_lossy(&raw).into_owned());
            rest = &rest[pos + 1..];
        }

        self.partial.extend_from_slice(rest);
        lines
    }

    /// End of stream. The protocol requires terminated frames, so any
    /// buffered-but-unterminated tail is discarded; it is returned here
    /// so the caller can log what was dropped.
    pub fn finish(self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.partial).into_owned())
        }
    }
}
