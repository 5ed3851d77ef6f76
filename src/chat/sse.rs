use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};

use crate::error::CompletionError;

pub(crate) type LineStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

pub(crate) fn create_line_stream(response: reqwest::Response) -> LineStream {
    line_stream(response.bytes_stream())
}

/// Splits a byte stream into non-empty text lines.
///
/// Lines may arrive split across reads, and so may multi-byte UTF-8
/// sequences. A trailing line without a terminator is yielded at EOF.
pub(crate) fn line_stream<S>(bytes: S) -> LineStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let stream = bytes
        .map(Some)
        .chain(futures::stream::once(async { None }))
        .scan(LineState::default(), |state, chunk| {
            let results = match chunk {
                Some(chunk) => handle_chunk(state, chunk),
                None => state.finish(),
            };
            async move { Some(results) }
        })
        .flat_map(futures::stream::iter);

    Box::pin(stream)
}

#[derive(Default)]
struct LineState {
    buffer: String,
    utf8_buffer: Vec<u8>,
}

fn handle_chunk(
    state: &mut LineState,
    chunk: Result<Bytes, reqwest::Error>,
) -> Vec<Result<String, CompletionError>> {
    let bytes = match chunk {
        Ok(bytes) => bytes,
        Err(err) => return vec![Err(CompletionError::from(err))],
    };

    state.push_bytes(&bytes);
    state.drain_lines()
}

impl LineState {
    fn push_bytes(&mut self, bytes: &[u8]) {
        self.utf8_buffer.extend_from_slice(bytes);
        loop {
            let (valid_up_to, invalid_len) = match std::str::from_utf8(&self.utf8_buffer) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.utf8_buffer.clear();
                    return;
                }
                Err(err) => (err.valid_up_to(), err.error_len()),
            };
            self.consume_valid_prefix(valid_up_to);
            match invalid_len {
                // Bytes that can never start a valid sequence.
                Some(len) => {
                    self.buffer.push(char::REPLACEMENT_CHARACTER);
                    self.utf8_buffer.drain(..len);
                }
                // Incomplete sequence at the end; wait for the next read.
                None => return,
            }
        }
    }

    fn consume_valid_prefix(&mut self, valid_up_to: usize) {
        if valid_up_to == 0 {
            return;
        }

        let valid = String::from_utf8_lossy(&self.utf8_buffer[..valid_up_to]);
        self.buffer.push_str(&valid);
        self.utf8_buffer.drain(..valid_up_to);
    }

    fn drain_lines(&mut self) -> Vec<Result<String, CompletionError>> {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line() {
            if !line.is_empty() {
                lines.push(Ok(line));
            }
        }
        lines
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.find('\n')?;
        let mut line: String = self.buffer.drain(..=pos).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    fn finish(&mut self) -> Vec<Result<String, CompletionError>> {
        if !self.utf8_buffer.is_empty() {
            let rest = String::from_utf8_lossy(&self.utf8_buffer).into_owned();
            self.buffer.push_str(&rest);
            self.utf8_buffer.clear();
        }
        let mut lines = self.drain_lines();
        let tail = std::mem::take(&mut self.buffer);
        let tail = tail.strip_suffix('\r').unwrap_or(&tail);
        if !tail.is_empty() {
            lines.push(Ok(tail.to_string()));
        }
        lines
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
