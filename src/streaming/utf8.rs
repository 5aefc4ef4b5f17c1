use bytes::{Buf, BytesMut};

const REPLACEMENT: char = '\u{FFFD}';
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Incremental, non-fatal UTF-8 decoder
///
/// A multi-byte character cut by a chunk boundary stays in `pending` until the
/// rest of its bytes arrive. Invalid sequences decode as U+FFFD. A byte order
/// mark at the very start of the stream is dropped.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: BytesMut,
    bom_checked: bool,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self {
            pending: BytesMut::with_capacity(4),
            bom_checked: false,
        }
    }

    /// Decode `chunk`, appending complete characters to `out`
    pub fn decode_into(&mut self, chunk: &[u8], out: &mut String) {
        if self.bom_checked && self.pending.is_empty() {
            let rest = decode_valid_prefix(chunk, out);
            self.pending.extend_from_slice(rest);
            return;
        }

        self.pending.extend_from_slice(chunk);
        if !self.bom_checked && !self.skip_bom() {
            return;
        }
        let rest_len = decode_valid_prefix(&self.pending, out).len();
        let consumed = self.pending.len() - rest_len;
        self.pending.advance(consumed);
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut out = String::with_capacity(chunk.len());
        self.decode_into(chunk, &mut out);
        out
    }

    /// Bytes held back waiting for the rest of a character
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop a leading BOM. Returns false while `pending` could still become one.
    fn skip_bom(&mut self) -> bool {
        let n = self.pending.len().min(BOM.len());
        if self.pending[..n] == BOM[..n] {
            if n < BOM.len() {
                return false;
            }
            self.pending.advance(BOM.len());
        }
        self.bom_checked = true;
        true
    }
}

/// Decode as much of `bytes` as possible, returning the incomplete tail
fn decode_valid_prefix<'a>(mut bytes: &'a [u8], out: &mut String) -> &'a [u8] {
    loop {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str(text);
                return &[];
            }
            Err(e) => {
                let (valid, after) = bytes.split_at(e.valid_up_to());
                // `valid_up_to` is a checked boundary, this never falls back
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(invalid) => {
                        out.push(REPLACEMENT);
                        bytes = &after[invalid..];
                    }
                    None => return after,
                }
            }
        }
    }
}
