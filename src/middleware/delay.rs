//! Response delay middleware.
//!
//! # Responsibilities
//! - Decorate an inner service without touching its request path
//! - Detect the committed status code the moment the inner response resolves
//! - Sleep once per matching rule before releasing the response
//!
//! # Design Decisions
//! - The sleep happens inside the response future, so it holds up exactly
//!   this request's task; unrelated requests are unaffected
//! - Inner service errors propagate unchanged and are never delayed
//! - Dropping the response future (client disconnect, outer timeout layer)
//!   drops an in-flight sleep with it

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::config::resolve::{DelayConfigError, RuleSet};
use crate::config::schema::DelayRule;

/// Layer that decorates a service with status-keyed response delays.
#[derive(Debug, Clone)]
pub struct AuthDelayLayer {
    rules: RuleSet,
    name: Arc<str>,
}

impl AuthDelayLayer {
    /// Resolve `rules` and build the layer.
    ///
    /// Fails on the first malformed rule, so a bad configuration can never
    /// be installed into a middleware chain. `name` is diagnostics-only and
    /// shows up in log lines.
    pub fn new(rules: &[DelayRule], name: impl Into<String>) -> Result<Self, DelayConfigError> {
        Ok(Self::from_rule_set(RuleSet::resolve(rules)?, name))
    }

    /// Build the layer from an already-resolved rule set.
    pub fn from_rule_set(rules: RuleSet, name: impl Into<String>) -> Self {
        Self {
            rules,
            name: name.into().into(),
        }
    }
}

impl<S> Layer<S> for AuthDelayLayer {
    type Service = AuthDelayService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthDelayService {
            inner,
            rules: self.rules.clone(),
            name: self.name.clone(),
        }
    }
}

/// Service produced by [`AuthDelayLayer`].
#[derive(Debug, Clone)]
pub struct AuthDelayService<S> {
    inner: S,
    rules: RuleSet,
    name: Arc<str>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AuthDelayService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let rules = self.rules.clone();
        let name = self.name.clone();
        let response = self.inner.call(request);

        Box::pin(async move {
            let response = response.await?;
            let status = response.status();

            // Delays are additive: every matching rule sleeps in turn
            // before the status line leaves for the client.
            for rule in rules.iter() {
                if rule.matches(status) {
                    let delay = rule.pick_delay();
                    tracing::info!(
                        middleware = %name,
                        status = status.as_u16(),
                        delay = ?delay,
                        "Delaying response"
                    );
                    tokio::time::sleep(delay).await;
                }
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::time::{Duration, Instant};

    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::util::BoxCloneService;
    use tower::{service_fn, ServiceExt};

    type InnerService = BoxCloneService<Request<Body>, Response<Body>, Infallible>;

    fn rule(min_code: u16, max_code: u16, min_delay: &str, max_delay: &str) -> DelayRule {
        DelayRule {
            min_code,
            max_code,
            min_delay: min_delay.to_string(),
            max_delay: max_delay.to_string(),
        }
    }

    fn delayed_service(rules: &[DelayRule], status: StatusCode) -> AuthDelayService<InnerService> {
        let layer = AuthDelayLayer::new(rules, "authDelay").unwrap();
        let inner = service_fn(move |_request: Request<Body>| async move {
            let response = Response::builder()
                .status(status)
                .body(Body::from("inner body"))
                .unwrap();
            Ok::<_, Infallible>(response)
        });
        layer.layer(BoxCloneService::new(inner))
    }

    async fn timed_call(service: AuthDelayService<InnerService>) -> (Response<Body>, Duration) {
        let request = Request::builder().body(Body::empty()).unwrap();
        let start = Instant::now();
        let response = service.oneshot(request).await.unwrap();
        (response, start.elapsed())
    }

    #[tokio::test]
    async fn test_matching_status_is_delayed() {
        let service = delayed_service(
            &[rule(403, 403, "50ms", "50ms"), rule(401, 401, "50ms", "50ms")],
            StatusCode::FORBIDDEN,
        );

        let (response, elapsed) = timed_call(service).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(elapsed >= Duration::from_millis(50), "too fast: {elapsed:?}");
        assert!(
            elapsed < Duration::from_millis(100),
            "only one rule matches, delay must not double: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_non_matching_status_not_delayed() {
        let service = delayed_service(&[rule(403, 403, "1s", "1s")], StatusCode::OK);

        let (response, elapsed) = timed_call(service).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(elapsed < Duration::from_millis(500), "delayed: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_overlapping_rules_are_additive() {
        let service = delayed_service(
            &[rule(403, 403, "50ms", "50ms"), rule(400, 404, "50ms", "50ms")],
            StatusCode::FORBIDDEN,
        );

        let (_, elapsed) = timed_call(service).await;
        assert!(
            elapsed >= Duration::from_millis(100),
            "delays must sum, not max: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_empty_rule_set_is_passthrough() {
        let service = delayed_service(&[], StatusCode::FORBIDDEN);

        let (response, elapsed) = timed_call(service).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(elapsed < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_headers_and_body_pass_through_unchanged() {
        let layer = AuthDelayLayer::new(&[rule(403, 403, "1ms", "1ms")], "authDelay").unwrap();
        let inner = service_fn(|_request: Request<Body>| async {
            let response = Response::builder()
                .status(StatusCode::FORBIDDEN)
                .header("x-upstream", "auth-core")
                .body(Body::from("inner body"))
                .unwrap();
            Ok::<_, Infallible>(response)
        });
        let service = layer.layer(inner);

        let request = Request::builder().body(Body::empty()).unwrap();
        let response = service.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers().get("x-upstream").unwrap(), "auth-core");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"inner body");
    }

    #[tokio::test]
    async fn test_inner_error_propagates_undelayed() {
        // A rule that would match any failure status; the error path must
        // never reach rule evaluation.
        let layer = AuthDelayLayer::new(&[rule(400, 599, "1s", "1s")], "authDelay").unwrap();
        let inner = service_fn(|_request: Request<Body>| async {
            Err::<Response<Body>, std::io::Error>(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "upstream dropped",
            ))
        });
        let service = layer.layer(inner);

        let request = Request::builder().body(Body::empty()).unwrap();
        let start = Instant::now();
        let err = service.oneshot(request).await.unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
        assert_eq!(err.to_string(), "upstream dropped");
        assert!(
            elapsed < Duration::from_secs(1),
            "error was delayed: {elapsed:?}"
        );
    }
}
