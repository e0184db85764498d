//! Axum middleware enforcing canonical URLs.
//!
//! The layer sits in front of the application router. Requests that satisfy
//! every configured policy are passed through untouched; all others receive a
//! `301 Moved Permanently` pointing at their canonical URL, and the inner
//! service never sees them.
use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use url::Url;

use crate::{
    adapters::request_view::HttpRequestView,
    core::{Decision, RedirectEngine},
    metrics,
};

/// Body of the response sent when the redirect target cannot be built.
pub const REDIRECTION_ERROR_BODY: &str = "redirection error";

/// What the redirect layer decided for one request.
#[derive(Debug)]
pub enum RedirectOutcome {
    /// No policy fired; hand the request to the inner service
    Pass,
    /// Redirect to the given canonical URL
    Redirect(Url),
    /// A policy fired but the target could not be reconstructed
    Error,
}

/// Run the engine against `req` without consuming it.
pub fn redirect_outcome(engine: &RedirectEngine, req: &Request) -> RedirectOutcome {
    let view = HttpRequestView::new(req);
    let decision = engine.evaluate(&view);
    if !decision.should_redirect() {
        return RedirectOutcome::Pass;
    }

    match engine.redirect_url_for(&view, &decision) {
        Ok(location) => {
            log_redirect(req, &decision, &location);
            RedirectOutcome::Redirect(location)
        }
        Err(e) => {
            tracing::error!(
                method = %req.method(),
                uri = %req.uri(),
                error = %e,
                "Failed to build redirect target"
            );
            RedirectOutcome::Error
        }
    }
}

fn log_redirect(req: &Request, decision: &Decision, location: &Url) {
    let policies = decision.policies();
    for policy in &policies {
        metrics::increment_redirect_policy(*policy);
    }
    tracing::debug!(
        method = %req.method(),
        uri = %req.uri(),
        location = %location,
        policies = ?policies,
        "Redirecting to canonical URL"
    );
}

/// Build a `301 Moved Permanently` response for `location`.
pub fn permanent_redirect(location: &Url) -> Response {
    match HeaderValue::from_str(location.as_str()) {
        Ok(value) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(e) => {
            tracing::error!("Redirect target is not a valid header value: {}", e);
            redirection_error()
        }
    }
}

/// Generic `500` response for a failed redirect.
pub fn redirection_error() -> Response {
    let mut response = Response::new(Body::from(REDIRECTION_ERROR_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Redirect non-canonical requests, pass the rest on to `next`.
pub async fn redirect_middleware(
    req: Request,
    next: Next,
    engine: Arc<RedirectEngine>,
) -> Response {
    let outcome = redirect_outcome(&engine, &req);
    match outcome {
        RedirectOutcome::Pass => {
            metrics::increment_request_outcome(metrics::Outcome::Passed);
            next.run(req).await
        }
        RedirectOutcome::Redirect(location) => {
            metrics::increment_request_outcome(metrics::Outcome::Redirected);
            permanent_redirect(&location)
        }
        RedirectOutcome::Error => {
            metrics::increment_request_outcome(metrics::Outcome::Error);
            redirection_error()
        }
    }
}

/// Create a cloneable closure wrapping [`redirect_middleware`], suitable for
/// `axum::middleware::from_fn`.
pub fn create_redirect_middleware(
    engine: Arc<RedirectEngine>,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
+ Clone {
    move |req, next| {
        let engine = engine.clone();
        Box::pin(async move { redirect_middleware(req, next, engine).await })
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt; // for oneshot

    use super::*;

    fn app(engine: RedirectEngine) -> Router {
        Router::new()
            .route("/", get(|| async { "Hello" }))
            .route("/{*path}", get(|| async { "Hello" }))
            .layer(middleware::from_fn(create_redirect_middleware(Arc::new(
                engine,
            ))))
    }

    fn get_request(host: &str, uri: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_passes_through_without_policies() {
        let response = app(RedirectEngine::default())
            .oneshot(get_request("foo.com", "/Foo/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello");
    }

    #[tokio::test]
    async fn test_force_tls_redirects_plain_http() {
        let engine = RedirectEngine::builder().force_tls(true).build().unwrap();
        let response = app(engine)
            .oneshot(get_request("foo.com", "/ok?page=2"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://foo.com/ok?page=2"
        );
    }

    #[tokio::test]
    async fn test_forwarded_host_is_compared() {
        let engine = RedirectEngine::builder()
            .force_host("www.foo.com")
            .build()
            .unwrap();
        let req = Request::builder()
            .uri("/")
            .header(header::HOST, "10.0.0.1:8080")
            .header("X-Forwarded-Host", "www.foo.com")
            .body(Body::empty())
            .unwrap();

        let response = app(engine).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unbuildable_target_is_internal_error() {
        let engine = RedirectEngine::builder().force_tls(true).build().unwrap();
        let response = app(engine)
            .oneshot(get_request("bad host", "/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], REDIRECTION_ERROR_BODY.as_bytes());
    }

    #[test]
    fn test_permanent_redirect_sets_location() {
        let url = Url::parse("https://www.foo.com/foo").unwrap();
        let response = permanent_redirect(&url);

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "https://www.foo.com/foo"
        );
    }
}
