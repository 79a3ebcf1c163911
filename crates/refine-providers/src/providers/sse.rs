//! Incremental Server-Sent Events parsing
//!
//! Providers deliver streaming responses as SSE. The byte stream is cut
//! into lines as chunks arrive (a chunk boundary can fall mid-line), and
//! only `data:` payloads are passed on.

use async_stream::try_stream;
use futures::{Stream, StreamExt};

use crate::error::ProviderError;

/// Extract `data:` payloads from a stream of raw body chunks
pub(crate) fn data_events<S>(body: S) -> impl Stream<Item = Result<String, ProviderError>>
where
    S: Stream<Item = Result<Vec<u8>, ProviderError>>,
{
    try_stream! {
        futures::pin_mut!(body);
        let mut buf = String::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            buf.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(pos) = buf.find('\n') {
                let line = buf[..pos].trim_end_matches('\r').to_string();
                buf.drain(..=pos);
                if let Some(data) = line.strip_prefix("data: ") {
                    yield data.to_string();
                } else if let Some(data) = line.strip_prefix("data:") {
                    yield data.to_string();
                }
            }
        }
    }
}

/// Adapt a reqwest body into the chunk stream `data_events` expects
pub(crate) fn body_chunks(
    response: reqwest::Response,
) -> impl Stream<Item = Result<Vec<u8>, ProviderError>> {
    response.bytes_stream().map(|chunk| {
        chunk
            .map(|bytes| bytes.to_vec())
            .map_err(|e| ProviderError::NetworkError(e.to_string()))
    })
}
