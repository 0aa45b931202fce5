use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
};
use futures_util::future::{Ready, ok, ready};
use log::warn;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Rejects requests whose declared Content-Length exceeds a fixed ceiling,
/// before any body bytes are read.
///
/// Only the declared length is checked: requests without a Content-Length
/// header (e.g. chunked transfer) pass through unchecked.
#[derive(Clone)]
pub struct MaxBodySize {
    max_bytes: u64,
}

impl MaxBodySize {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl<S, B> Transform<S, ServiceRequest> for MaxBodySize
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = MaxBodySizeService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(MaxBodySizeService {
            service: Arc::new(service),
            max_bytes: self.max_bytes,
        })
    }
}

pub struct MaxBodySizeService<S> {
    service: Arc<S>,
    max_bytes: u64,
}

impl<S, B> Service<ServiceRequest> for MaxBodySizeService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(value) = req.headers().get(header::CONTENT_LENGTH) {
            // Validity first: a malformed header is a 400 regardless of the
            // configured ceiling.
            let declared = value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok());

            match declared {
                None => {
                    warn!("Rejecting request with invalid Content-Length header");
                    let (request, _payload) = req.into_parts();
                    let response = HttpResponse::BadRequest().body("Invalid Content-Length header");
                    return Box::pin(ready(Ok(
                        ServiceResponse::new(request, response).map_into_right_body()
                    )));
                }
                Some(len) if len > self.max_bytes => {
                    warn!(
                        "Rejecting request with declared body of {} bytes (limit {})",
                        len, self.max_bytes
                    );
                    let (request, _payload) = req.into_parts();
                    let response = HttpResponse::PayloadTooLarge().body("Request body too large");
                    return Box::pin(ready(Ok(
                        ServiceResponse::new(request, response).map_into_right_body()
                    )));
                }
                Some(_) => {}
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) })
    }
}
