//! Bounded buffering of upstream bodies.

use bytes::{Bytes, BytesMut};
use futures_util::{stream::BoxStream, StreamExt};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Upstream body as delivered by the forwarder.
pub type BodyStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// Why a textual body was delivered without rewriting.
#[derive(Debug, Error)]
pub enum BodyRewriteFailure {
    #[error("body is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("body exceeds the {limit} byte rewrite limit")]
    TooLarge { limit: usize },

    #[error("failed to read upstream body: {0}")]
    Read(String),
}

/// Result of draining a body up to a size limit.
pub enum Buffered {
    /// The whole body fit under the limit.
    Complete(Bytes),
    /// The limit was crossed. `prefix` holds what was read; `rest` continues
    /// the original stream.
    Exceeded {
        prefix: Bytes,
        rest: BodyStream,
        limit: usize,
    },
    /// The stream failed part way through.
    Failed { prefix: Bytes, error: BoxError },
}

/// Read `body` into memory, stopping once more than `limit` bytes arrive.
pub async fn buffer_body(mut body: BodyStream, limit: usize) -> Buffered {
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(chunk) => {
                buf.extend_from_slice(&chunk);
                if buf.len() > limit {
                    return Buffered::Exceeded {
                        prefix: buf.freeze(),
                        rest: body,
                        limit,
                    };
                }
            }
            Err(error) => {
                return Buffered::Failed {
                    prefix: buf.freeze(),
                    error,
                }
            }
        }
    }
    Buffered::Complete(buf.freeze())
}
