//! Authentication middleware
//!
//! Protected routes run an ordered chain of interceptors before the
//! handler. Each interceptor either lets the request continue (optionally
//! attaching data to its extensions) or short-circuits it with an error
//! response; the first short-circuit wins and later interceptors and the
//! handler never run.
//!
//! Request logging is not part of the chain. `TraceLayer` sits outside
//! it on the router, so rejected requests are logged exactly once too.

use super::{AuthError, TokenService, UserId};
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Authenticated caller, placed in request extensions by `BearerInterceptor`
///
/// Handlers take this as an extractor; the identity always comes from
/// the verified token, never from the request body or path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(ApiError::Unauthorized(AuthError::Malformed))
    }
}

/// One step of the request pipeline
pub trait Interceptor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// `Ok` continues to the next step; `Err` ends the request with that error.
    fn intercept(&self, request: &mut Request) -> Result<(), ApiError>;
}

/// Ordered interceptors, run front to back
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor to the end of the chain
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every interceptor in order, stopping at the first rejection
    pub fn run(&self, request: &mut Request) -> Result<(), ApiError> {
        for interceptor in &self.interceptors {
            if let Err(err) = interceptor.intercept(request) {
                debug!(interceptor = interceptor.name(), "Request short-circuited");
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Axum middleware adapter for an `InterceptorChain`
///
/// Install with `axum::middleware::from_fn_with_state(chain, run_interceptors)`.
pub async fn run_interceptors(
    State(chain): State<InterceptorChain>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    chain.run(&mut request)?;
    Ok(next.run(request).await)
}

/// Verifies `Authorization: Bearer <token>` and attaches `AuthUser`
pub struct BearerInterceptor {
    tokens: TokenService,
}

impl BearerInterceptor {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl Interceptor for BearerInterceptor {
    fn name(&self) -> &'static str {
        "bearer"
    }

    fn intercept(&self, request: &mut Request) -> Result<(), ApiError> {
        let verified = bearer_token(request.headers())
            .ok_or(AuthError::Malformed)
            .and_then(|token| self.tokens.verify(token));

        match verified {
            Ok(user_id) => {
                request.extensions_mut().insert(AuthUser { user_id });
                Ok(())
            }
            Err(reason) => {
                warn!(
                    %reason,
                    method = %request.method(),
                    path = %request.uri().path(),
                    "Rejected bearer credential"
                );
                Err(ApiError::Unauthorized(reason))
            }
        }
    }
}

/// Token part of a `Bearer` authorization header, if present and non-empty
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn tokens() -> TokenService {
        TokenService::new(b"middleware-test-secret", Duration::hours(1)).unwrap()
    }

    fn protected_app(chain: InterceptorChain, reached: Arc<AtomicBool>) -> Router {
        Router::new()
            .route(
                "/protected",
                get(move |user: AuthUser| {
                    let reached = reached.clone();
                    async move {
                        reached.store(true, Ordering::SeqCst);
                        user.user_id.to_string()
                    }
                }),
            )
            .route_layer(middleware::from_fn_with_state(chain, run_interceptors))
    }

    fn request(auth: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/protected");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_rejected_requests_never_reach_handler() {
        let expired = TokenService::new(b"middleware-test-secret", Duration::seconds(-60))
            .unwrap()
            .issue(5)
            .unwrap();
        let forged = TokenService::new(b"other-secret", Duration::hours(1))
            .unwrap()
            .issue(5)
            .unwrap();

        let cases = vec![
            None,
            Some("".to_string()),
            Some("Bearer ".to_string()),
            Some("Basic dXNlcjpwYXNz".to_string()),
            Some("Bearer invalid.token.here".to_string()),
            Some(format!("Bearer {}", expired)),
            Some(format!("Bearer {}", forged)),
        ];

        for auth in cases {
            let reached = Arc::new(AtomicBool::new(false));
            let chain = InterceptorChain::new().with(BearerInterceptor::new(tokens()));
            let app = protected_app(chain, reached.clone());

            let response = app.oneshot(request(auth.as_deref())).await.unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "case {:?}", auth);
            assert!(!reached.load(Ordering::SeqCst), "handler ran for {:?}", auth);
        }
    }

    #[tokio::test]
    async fn test_rejections_share_one_body() {
        let expired = TokenService::new(b"middleware-test-secret", Duration::seconds(-60))
            .unwrap()
            .issue(5)
            .unwrap();

        let mut bodies = Vec::new();
        for auth in [None, Some(format!("Bearer {}", expired))] {
            let chain = InterceptorChain::new().with(BearerInterceptor::new(tokens()));
            let app = protected_app(chain, Arc::new(AtomicBool::new(false)));
            let response = app.oneshot(request(auth.as_deref())).await.unwrap();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            bodies.push(body);
        }

        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler_with_identity() {
        let service = tokens();
        let token = service.issue(99).unwrap();
        let reached = Arc::new(AtomicBool::new(false));
        let chain = InterceptorChain::new().with(BearerInterceptor::new(service));
        let app = protected_app(chain, reached.clone());

        let response = app
            .oneshot(request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(reached.load(Ordering::SeqCst));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"99");
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
        reject: bool,
    }

    impl Interceptor for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn intercept(&self, _request: &mut Request) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                Err(ApiError::Forbidden("blocked".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_chain_stops_at_first_rejection() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let chain = InterceptorChain::new()
            .with(Counting { calls: first.clone(), reject: true })
            .with(Counting { calls: second.clone(), reject: false });

        let mut req = request(None);
        assert!(chain.run(&mut req).is_err());
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_extractor_without_chain_is_unauthorized() {
        let app = Router::new().route("/open", get(|_user: AuthUser| async { "ok" }));
        let response = app
            .oneshot(HttpRequest::builder().uri("/open").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
