//! Minimal server-sent-events line splitter shared by the OpenAI and
//! Claude streaming clients. Turns a chunked HTTP response into a stream
//! of `data:` payload strings, one per event; everything else (blank
//! lines, `event:` lines, comments) is dropped.

use crate::error::LlmError;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Response;

struct SseState {
    inner: futures::stream::BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: String,
    finished: bool,
}

pub fn data_lines(response: Response) -> BoxStream<'static, Result<String, LlmError>> {
    let state = SseState {
        inner: Box::pin(response.bytes_stream().map(|r| r.map(|b| b.to_vec()))),
        buffer: String::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(pos) = state.buffer.find('\n') {
                let line = state.buffer[..pos].trim_end_matches('\r').to_string();
                state.buffer.drain(..=pos);
                if let Some(payload) = line
                    .strip_prefix("data: ")
                    .or_else(|| line.strip_prefix("data:"))
                {
                    return Some((Ok(payload.to_string()), state));
                }
                continue;
            }

            if state.finished {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.push_str(&String::from_utf8_lossy(&bytes));
                }
                Some(Err(err)) => return Some((Err(LlmError::HttpError(err)), state)),
                None => state.finished = true,
            }
        }
    }))
}
