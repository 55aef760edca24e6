//! Static file handler serving a directory tree.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use routemeter_core::middleware::{Handler, ResponseWriter};

pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a URI path under the root. Segments are percent-decoded before
    /// any check, so `%2e%2e` is refused like `..`.
    fn locate(&self, uri_path: &str) -> Option<PathBuf> {
        let mut out = self.root.clone();
        for raw in uri_path.split('/') {
            let seg = percent_decode_str(raw).decode_utf8().ok()?;
            match seg.as_ref() {
                "" | "." => continue,
                ".." => return None,
                s if s.contains(['/', '\\', '\0']) => return None,
                s => out.push(s),
            }
        }
        Some(out)
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

fn plain(w: &mut dyn ResponseWriter, status: StatusCode, msg: &[u8]) {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    w.write_headers(&headers);
    w.write_status(status);
    let _ = w.write_body(msg);
}

/// Answer `/dir` with a 301 to `/dir/`, keeping the query string.
fn redirect_to_dir(w: &mut dyn ResponseWriter, req: &Request<Bytes>) {
    let mut location = format!("{}/", req.uri().path());
    if let Some(q) = req.uri().query() {
        location.push('?');
        location.push_str(q);
    }
    let Ok(location) = HeaderValue::try_from(location) else {
        plain(w, StatusCode::NOT_FOUND, b"404 page not found\n");
        return;
    };
    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, location);
    w.write_headers(&headers);
    plain(w, StatusCode::MOVED_PERMANENTLY, b"301 moved permanently\n");
}

impl Handler for StaticFiles {
    fn serve(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        let head = req.method() == Method::HEAD;
        if req.method() != Method::GET && !head {
            let mut headers = HeaderMap::new();
            headers.insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
            w.write_headers(&headers);
            plain(w, StatusCode::METHOD_NOT_ALLOWED, b"405 method not allowed\n");
            return;
        }

        let uri_path = req.uri().path();
        let Some(mut path) = self.locate(uri_path) else {
            plain(w, StatusCode::NOT_FOUND, b"404 page not found\n");
            return;
        };

        if path.is_dir() {
            if !uri_path.ends_with('/') {
                redirect_to_dir(w, req);
                return;
            }
            path.push("index.html");
        }

        match std::fs::read(&path) {
            Ok(data) => {
                let mut headers = HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type(&path)));
                headers.insert(header::CONTENT_LENGTH, HeaderValue::from(data.len()));
                w.write_headers(&headers);
                w.write_status(StatusCode::OK);
                if !head {
                    if let Err(e) = w.write_body(&data) {
                        tracing::warn!(error = %e, path = %path.display(), "static body write failed");
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                plain(w, StatusCode::NOT_FOUND, b"404 page not found\n");
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "static file read failed");
                plain(w, StatusCode::INTERNAL_SERVER_ERROR, b"500 internal server error\n");
            }
        }
    }
}
