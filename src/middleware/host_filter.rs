use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_util::future::{Ready, ok, ready};
use log::warn;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Rejects requests whose Host header is not in the configured allow
/// list. A list containing "*" disables filtering entirely.
#[derive(Clone)]
pub struct HostFilter {
    allowed_hosts: Arc<Vec<String>>,
    allow_all: bool,
}

impl HostFilter {
    pub fn new(allowed_hosts: Vec<String>) -> Self {
        let allow_all = allowed_hosts.iter().any(|h| h == "*");
        Self {
            allowed_hosts: Arc::new(
                allowed_hosts.into_iter().map(|h| h.to_lowercase()).collect(),
            ),
            allow_all,
        }
    }

    fn is_allowed(&self, host: &str) -> bool {
        if self.allow_all {
            return true;
        }
        // Compare on the hostname alone, ignoring any port component.
        let hostname = host.split(':').next().unwrap_or(host).to_lowercase();
        self.allowed_hosts.iter().any(|h| *h == hostname)
    }
}

impl<S, B> Transform<S, ServiceRequest> for HostFilter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = HostFilterService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(HostFilterService {
            service: Arc::new(service),
            filter: self.clone(),
        })
    }
}

pub struct HostFilterService<S> {
    service: Arc<S>,
    filter: HostFilter,
}

impl<S, B> Service<ServiceRequest> for HostFilterService<S>
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
        let allowed = {
            let info = req.connection_info();
            self.filter.is_allowed(info.host())
        };

        if !allowed {
            warn!(
                "Rejected request for {} with disallowed host header",
                req.path()
            );
            let (request, _payload) = req.into_parts();
            let response = HttpResponse::BadRequest().body("Invalid host header");
            return Box::pin(ready(Ok(
                ServiceResponse::new(request, response).map_into_right_body(),
            )));
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) })
    }
}
