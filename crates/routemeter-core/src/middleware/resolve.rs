//! Route resolution: request -> bounded route label.
//!
//! Labels must come from a closed set of route templates, never from raw
//! request content, so the number of series per metric stays bounded.

use bytes::Bytes;
use http::Request;

pub trait RouteResolver: Send + Sync {
    /// Route template matching `req`, or `None` if no route matched.
    fn resolve(&self, req: &Request<Bytes>) -> Option<String>;
}

/// Matches request paths against a fixed template list, first match wins.
///
/// Template syntax: literal segments, `{name}` for exactly one segment and a
/// trailing `{*name}` for the remainder of the path.
#[derive(Debug, Clone, Default)]
pub struct TemplateResolver {
    templates: Vec<String>,
}

impl TemplateResolver {
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn match_path(&self, path: &str) -> Option<&str> {
        self.templates
            .iter()
            .find(|t| template_matches(t, path))
            .map(String::as_str)
    }
}

impl RouteResolver for TemplateResolver {
    fn resolve(&self, req: &Request<Bytes>) -> Option<String> {
        self.match_path(req.uri().path()).map(str::to_string)
    }
}

fn segments(s: &str) -> impl Iterator<Item = &str> {
    s.split('/').filter(|seg| !seg.is_empty())
}

fn template_matches(template: &str, path: &str) -> bool {
    let mut want = segments(template);
    let mut got = segments(path);
    loop {
        match (want.next(), got.next()) {
            (None, None) => return true,
            (Some(w), rest) if w.starts_with("{*") && w.ends_with('}') => {
                return rest.is_some();
            }
            (Some(w), Some(_)) if w.starts_with('{') && w.ends_with('}') => {}
            (Some(w), Some(g)) if w == g => {}
            _ => return false,
        }
    }
}
