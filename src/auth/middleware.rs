use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;

use crate::{
    auth::{Claims, JwtService},
    errors::AppError,
};

/// Attaches `Claims` to the request when a valid bearer token is sent.
/// Requests without an `Authorization` header pass through anonymously so
/// each operation decides how to treat them; a malformed or invalid token is
/// rejected outright.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(AUTHORIZATION)
                .map(|h| h.to_str().map(str::to_string));

            if let Some(header) = auth_header {
                let jwt_service = req
                    .app_data::<web::Data<JwtService>>()
                    .ok_or_else(|| AppError::InternalError("JWT service not configured".to_string()))?;

                let token = header
                    .ok()
                    .and_then(|h| h.strip_prefix("Bearer ").map(str::to_string))
                    .ok_or(AppError::Unauthenticated)?;

                let claims = jwt_service.validate_token(&token)?;
                req.extensions_mut().insert(claims);
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Extractor for handlers that require a caller.
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &str {
        self.0.user_id()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req
            .extensions()
            .get::<Claims>()
            .cloned()
            .ok_or(AppError::Unauthenticated);

        ready(claims.map(AuthenticatedUser))
    }
}

/// Extractor for handlers that make the unauthenticated decision themselves.
pub struct MaybeAuthenticated(pub Option<Claims>);

impl MaybeAuthenticated {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(Claims::user_id)
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(MaybeAuthenticated(req.extensions().get::<Claims>().cloned())))
    }
}
