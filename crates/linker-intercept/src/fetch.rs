//! Fetch surface: a tower layer around any `Request<Bytes> -> Response<Bytes>`
//! service.

use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use http::{Request, Response};
use tower::{Layer, Service};

use crate::interceptor::Interceptor;

/// Set on requests already observed by an outer capture service, so stacked
/// layers forward each response once.
#[derive(Debug, Clone, Copy)]
struct Observed;

#[derive(Clone, Debug)]
pub struct CaptureLayer {
    interceptor: Arc<Interceptor>,
}

impl CaptureLayer {
    pub fn new(interceptor: Arc<Interceptor>) -> Self {
        Self { interceptor }
    }
}

impl<S> Layer<S> for CaptureLayer {
    type Service = CaptureService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CaptureService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// Passes every request through unchanged. On a signature match the full
/// response body is inspected before the response is handed back untouched.
#[derive(Clone, Debug)]
pub struct CaptureService<S> {
    inner: S,
    interceptor: Arc<Interceptor>,
}

impl<S> CaptureService<S> {
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Service<Request<Bytes>> for CaptureService<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Bytes>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Bytes>) -> Self::Future {
        let outermost = req.extensions().get::<Observed>().is_none();
        let url = req.uri().to_string();
        let matched = outermost && self.interceptor.should_capture(&url);
        if outermost {
            req.extensions_mut().insert(Observed);
        }

        // The readied service handles this call; keep a fresh clone for the next one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let interceptor = self.interceptor.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;
            if matched {
                interceptor.inspect(&url, response.body());
            }
            Ok(response)
        })
    }
}
