//! Request identity: verification, profile resolution and the suspension gate.
//!
//! [`IdentityGate`] runs once per request ahead of every API handler. It reads
//! the `Authorization` header, asks the identity service who the caller is,
//! attaches the local profile and refuses suspended members with `403`. The
//! resulting [`IdentityContext`] is stored in request extensions, where the
//! [`Caller`] extractor hands it to handlers.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{FromRequest, HttpMessage, HttpRequest, web};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{error, info};

use crate::domain::{Error, GateDecision, IdentityClaim, IdentityContext, check_suspension};

use super::state::HttpState;

/// Middleware establishing the [`IdentityContext`] for each request.
///
/// Requires `web::Data<HttpState>` to be registered on the application.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use library_backend::inbound::http::identity::IdentityGate;
///
/// let _scope = web::scope("/api/v1").wrap(IdentityGate);
/// ```
#[derive(Clone, Copy)]
pub struct IdentityGate;

impl<S, B> Transform<S, ServiceRequest> for IdentityGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = IdentityGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityGateMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Service wrapper produced by [`IdentityGate`].
pub struct IdentityGateMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for IdentityGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<HttpState>>().cloned() else {
                error!("identity gate installed without HTTP state");
                let err = Error::internal("identity gate is not configured");
                return Ok(req.error_response(err).map_into_right_body());
            };

            let ctx = match establish_identity(&state, &req).await {
                Ok(ctx) => ctx,
                Err(err) => return Ok(req.error_response(err).map_into_right_body()),
            };

            req.extensions_mut().insert(ctx);
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

async fn establish_identity(
    state: &HttpState,
    req: &ServiceRequest,
) -> Result<IdentityContext, Error> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let outcome = state.verifier.verify(authorization).await;
    let ctx = state.resolver.resolve(outcome).await?;

    match check_suspension(&ctx) {
        GateDecision::Allow => Ok(ctx),
        GateDecision::Deny { reason } => {
            info!(
                subject = ?ctx.subject(),
                path = req.path(),
                "refused request from suspended account"
            );
            Err(Error::forbidden("account suspended").with_detail("reason", reason))
        }
    }
}

/// Identity of the caller as established by [`IdentityGate`].
///
/// Requests that bypassed the gate are treated as anonymous.
#[derive(Debug, Clone)]
pub struct Caller(IdentityContext);

impl Caller {
    #[must_use]
    pub const fn new(ctx: IdentityContext) -> Self {
        Self(ctx)
    }

    #[must_use]
    pub const fn context(&self) -> &IdentityContext {
        &self.0
    }

    /// Verified claim, or `401 Unauthorized` for anonymous callers.
    pub fn require_claim(&self) -> Result<&IdentityClaim, Error> {
        self.0
            .claim()
            .ok_or_else(|| Error::unauthorized("sign in required"))
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let ctx = req
            .extensions()
            .get::<IdentityContext>()
            .cloned()
            .unwrap_or_else(IdentityContext::anonymous);
        ready(Ok(Self(ctx)))
    }
}
