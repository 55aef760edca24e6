//! Response-writing capability handed to handlers.
//!
//! Follows HTTP/1.1 semantics: the status line and headers are committed by
//! the first `write_status` or `write_body`; later status or header writes
//! have no effect on what the client receives.

use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};

pub trait ResponseWriter {
    fn write_status(&mut self, status: StatusCode);

    /// Append `headers` to the pending header block.
    fn write_headers(&mut self, headers: &HeaderMap);

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status)
    }

    fn write_headers(&mut self, headers: &HeaderMap) {
        (**self).write_headers(headers)
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        (**self).write_body(chunk)
    }
}

/// In-memory writer that assembles a complete [`Response`].
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed status, if any write has happened yet.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut resp = Response::new(self.body.freeze());
        *resp.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *resp.headers_mut() = self.headers;
        resp
    }
}

impl ResponseWriter for ResponseBuffer {
    fn write_status(&mut self, status: StatusCode) {
        match self.status {
            None => self.status = Some(status),
            Some(committed) => {
                tracing::warn!(
                    committed = committed.as_u16(),
                    ignored = status.as_u16(),
                    "superfluous write_status"
                );
            }
        }
    }

    fn write_headers(&mut self, headers: &HeaderMap) {
        if self.status.is_some() {
            tracing::warn!("headers written after status; ignored");
            return;
        }
        for (name, value) in headers {
            self.headers.append(name, value.clone());
        }
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(chunk);
        Ok(())
    }
}
