//! The CORS Arbiter (§4.3): answers preflight directly and stamps
//! `Access-Control-Allow-*` headers on every other response, both gated on
//! the Policy Cache's allowed-origin membership check.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{header, Method, StatusCode};
use actix_web::{Error, HttpResponse};
use futures::future::{ok, FutureExt, LocalBoxFuture, Ready};

use selfdb_policy::OriginPolicy;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "authorization, apikey, content-type";
const MAX_AGE: &str = "600";

pub struct CorsArbiter {
    origins: Arc<OriginPolicy>,
}

impl CorsArbiter {
    pub fn new(origins: Arc<OriginPolicy>) -> Self {
        CorsArbiter { origins }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsArbiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsArbiterMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsArbiterMiddleware {
            service: Rc::new(RefCell::new(service)),
            origins: self.origins.clone(),
        })
    }
}

pub struct CorsArbiterMiddleware<S> {
    service: Rc<RefCell<S>>,
    origins: Arc<OriginPolicy>,
}

impl<S, B> Service<ServiceRequest> for CorsArbiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let origins = self.origins.clone();
        let service = self.service.clone();
        let is_preflight = req.method() == Method::OPTIONS;

        async move {
            let Some(origin) = origin else {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            };

            let allowed = origins.is_allowed(&origin).await;

            if is_preflight {
                let response = if allowed {
                    HttpResponse::Ok()
                        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.as_str()))
                        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS))
                        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS))
                        .insert_header((header::ACCESS_CONTROL_MAX_AGE, MAX_AGE))
                        .insert_header((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"))
                        .finish()
                } else {
                    HttpResponse::build(StatusCode::FORBIDDEN).finish()
                };
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = service.call(req).await?;
            if allowed {
                if let Ok(value) = header::HeaderValue::from_str(&origin) {
                    res.headers_mut().insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
                }
                res.headers_mut().insert(
                    header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                    header::HeaderValue::from_static("true"),
                );
            }
            Ok(res.map_into_left_body())
        }
        .boxed_local()
    }
}
