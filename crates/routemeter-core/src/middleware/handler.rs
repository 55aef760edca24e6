use std::sync::Arc;

use bytes::Bytes;
use http::Request;

use super::writer::ResponseWriter;

/// A synchronous request handler writing its response through `w`.
pub trait Handler: Send + Sync {
    fn serve(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter);
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        (**self).serve(req, w)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        (**self).serve(req, w)
    }
}

/// Handler built from a closure, see [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Request<Bytes>, &mut dyn ResponseWriter) + Send + Sync,
{
    fn serve(&self, req: &Request<Bytes>, w: &mut dyn ResponseWriter) {
        (self.f)(req, w)
    }
}

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request<Bytes>, &mut dyn ResponseWriter) + Send + Sync,
{
    HandlerFn { f }
}
