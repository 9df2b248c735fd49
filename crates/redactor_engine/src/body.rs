use std::fmt;

use bytes::Bytes;
use encoding_rs::{CoderResult, UTF_8};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::store::StoreError;

/// The shapes a storage response body can arrive in. Which one a backend
/// hands back depends on the service and runtime, so the decoder carries one
/// strategy per variant instead of probing shapes at runtime.
pub enum ObjectBody {
    /// Already decoded by the storage layer.
    Text(String),
    /// A complete in-memory buffer.
    Bytes(Bytes),
    /// A pull-based stream of byte chunks.
    Stream(BoxStream<'static, Result<Bytes, StoreError>>),
    /// A push-based channel of byte chunks fed by another task.
    Channel(mpsc::Receiver<Result<Bytes, StoreError>>),
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            ObjectBody::Text(_) => "Text",
            ObjectBody::Bytes(_) => "Bytes",
            ObjectBody::Stream(_) => "Stream",
            ObjectBody::Channel(_) => "Channel",
        };
        f.write_str(variant)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("body is not valid UTF-8")]
    InvalidUtf8,
    #[error("error while reading body: {0}")]
    Read(String),
}

/// Decode a body to text, one strategy per variant.
pub async fn decode_text(body: ObjectBody) -> Result<String, DecodeError> {
    match body {
        ObjectBody::Text(text) => Ok(text),
        ObjectBody::Bytes(bytes) => decode_buffer(&bytes),
        ObjectBody::Stream(mut stream) => {
            let mut decoder = Utf8StreamDecoder::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|err| DecodeError::Read(err.to_string()))?;
                decoder.push(&chunk)?;
            }
            decoder.finish()
        }
        ObjectBody::Channel(mut rx) => {
            // Push-shaped bodies are drained fully and their buffers
            // concatenated before decoding.
            let mut chunks = Vec::new();
            while let Some(chunk) = rx.recv().await {
                chunks.push(chunk.map_err(|err| DecodeError::Read(err.to_string()))?);
            }
            let total = chunks.iter().map(Bytes::len).sum();
            let mut bytes = Vec::with_capacity(total);
            for chunk in &chunks {
                bytes.extend_from_slice(chunk);
            }
            decode_buffer(&bytes)
        }
    }
}

fn decode_buffer(bytes: &[u8]) -> Result<String, DecodeError> {
    // BOM removal only; no encoding sniffing. The pipeline's output is UTF-8
    // by contract, anything else is a decode failure.
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(DecodeError::InvalidUtf8);
    }
    Ok(text.into_owned())
}

/// Incremental UTF-8 decoder for chunked bodies; the final flush catches a
/// codepoint truncated at the end of the stream.
struct Utf8StreamDecoder {
    decoder: encoding_rs::Decoder,
    out: String,
}

impl Utf8StreamDecoder {
    fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            out: String::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        self.decode(chunk, false)
    }

    fn finish(mut self) -> Result<String, DecodeError> {
        self.decode(&[], true)?;
        Ok(self.out)
    }

    fn decode(&mut self, chunk: &[u8], last: bool) -> Result<(), DecodeError> {
        let needed = self
            .decoder
            .max_utf8_buffer_length(chunk.len())
            .ok_or_else(|| DecodeError::Read("body chunk too large".to_string()))?;
        self.out.reserve(needed);
        let (result, _read, had_errors) = self.decoder.decode_to_string(chunk, &mut self.out, last);
        if had_errors {
            return Err(DecodeError::InvalidUtf8);
        }
        // The reservation above covers the worst case, so the decoder always
        // consumes the whole chunk.
        debug_assert!(matches!(result, CoderResult::InputEmpty));
        Ok(())
    }
}
