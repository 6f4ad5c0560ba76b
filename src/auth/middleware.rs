use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{Claims, TokenKeys};
use crate::error::AppError;

/// Authorization gate for individual routes.
///
/// Requires a valid `Authorization: Bearer <token>` header and, in admin
/// mode, an `admin` claim. Verified claims are placed in the request
/// extensions for [`AuthenticatedUser`](super::extractors::AuthenticatedUser).
/// Rejections are answered directly with the [`AppError`] response.
/// The [`TokenKeys`] must be registered as application data.
#[derive(Debug, Clone, Copy)]
pub struct AuthGuard {
    require_admin: bool,
}

impl AuthGuard {
    /// Any valid token passes.
    pub fn authenticated() -> Self {
        Self {
            require_admin: false,
        }
    }

    /// Only tokens carrying the admin claim pass.
    pub fn admin() -> Self {
        Self {
            require_admin: true,
        }
    }

    fn check(&self, req: &ServiceRequest) -> Result<Claims, AppError> {
        let keys = req
            .app_data::<web::Data<TokenKeys>>()
            .ok_or_else(|| AppError::InternalServerError("Token keys are not configured".into()))?;

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

        let claims = keys.verify(token)?;
        if self.require_admin && !claims.admin {
            return Err(AppError::Forbidden("Admins only".into()));
        }
        Ok(claims)
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGuardService {
            service,
            guard: *self,
        }))
    }
}

pub struct AuthGuardService<S> {
    service: S,
    guard: AuthGuard,
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.guard.check(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(err) => {
                log::debug!("Rejected {} {}: {}", req.method(), req.path(), err);
                let response = req.error_response(err).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    fn keys() -> TokenKeys {
        TokenKeys::from_secret("middleware_test_secret", "demoBackend", 3600)
    }

    fn token_for(admin: bool) -> String {
        keys()
            .issue(&User {
                id: None,
                email: "guard@example.com".into(),
                password: "hash".into(),
                full_name: "Guard Test".into(),
                admin,
                created_at: chrono::Utc::now(),
            })
            .unwrap()
    }

    async fn status_for(guard: AuthGuard, authorization: Option<String>) -> StatusCode {
        let app = test::init_service(
            App::new().app_data(web::Data::new(keys())).service(
                web::resource("/guarded")
                    .wrap(guard)
                    .to(|| async { HttpResponse::Ok().finish() }),
            ),
        )
        .await;

        let mut req = test::TestRequest::get().uri("/guarded");
        if let Some(value) = authorization {
            req = req.insert_header((header::AUTHORIZATION, value));
        }
        test::call_service(&app, req.to_request()).await.status()
    }

    #[actix_rt::test]
    async fn test_missing_token_is_unauthorized() {
        assert_eq!(status_for(AuthGuard::admin(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(AuthGuard::admin(), Some("Basic abc".into())).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_rt::test]
    async fn test_invalid_token_is_unauthorized() {
        let status = status_for(AuthGuard::authenticated(), Some("Bearer nonsense".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_non_admin_is_forbidden_in_admin_mode() {
        let bearer = format!("Bearer {}", token_for(false));
        assert_eq!(
            status_for(AuthGuard::admin(), Some(bearer.clone())).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(AuthGuard::authenticated(), Some(bearer)).await,
            StatusCode::OK
        );
    }

    #[actix_rt::test]
    async fn test_admin_passes() {
        let bearer = format!("Bearer {}", token_for(true));
        assert_eq!(status_for(AuthGuard::admin(), Some(bearer)).await, StatusCode::OK);
    }
}
