use std::io;

use http::{HeaderMap, StatusCode};

use super::writer::ResponseWriter;

/// Wraps a [`ResponseWriter`] and remembers the status the client will see.
///
/// Every call is forwarded unchanged. Only the first `write_status` is
/// recorded, and a body write with no prior status records the implicit 200.
#[derive(Debug)]
pub struct StatusRecorder<W> {
    inner: W,
    status: Option<StatusCode>,
}

impl<W: ResponseWriter> StatusRecorder<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, status: None }
    }

    /// Recorded status, 200 when the handler never wrote one.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Whether the handler set a status or wrote body bytes.
    pub fn was_written(&self) -> bool {
        self.status.is_some()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for StatusRecorder<W> {
    fn write_status(&mut self, status: StatusCode) {
        self.status.get_or_insert(status);
        self.inner.write_status(status);
    }

    fn write_headers(&mut self, headers: &HeaderMap) {
        self.inner.write_headers(headers);
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.status.get_or_insert(StatusCode::OK);
        self.inner.write_body(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::writer::ResponseBuffer;

    #[test]
    fn records_first_status_and_forwards_all() {
        let mut rec = StatusRecorder::new(ResponseBuffer::new());
        rec.write_status(StatusCode::NOT_FOUND);
        rec.write_status(StatusCode::BAD_GATEWAY);
        assert_eq!(rec.status(), StatusCode::NOT_FOUND);
        assert_eq!(rec.into_inner().status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn defaults_to_ok() {
        let rec = StatusRecorder::new(ResponseBuffer::new());
        assert!(!rec.was_written());
        assert_eq!(rec.status(), StatusCode::OK);

        let mut rec = StatusRecorder::new(ResponseBuffer::new());
        rec.write_body(b"x").unwrap();
        rec.write_status(StatusCode::IM_A_TEAPOT);
        assert_eq!(rec.status(), StatusCode::OK);
    }
}
