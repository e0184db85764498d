// End-to-end checks of the redirect layer through the full router
#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use canonize::{RedirectEngine, adapters::REDIRECTION_ERROR_BODY, server::build_router};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn canonical_engine() -> RedirectEngine {
        RedirectEngine::builder()
            .force_host("www.foo.com")
            .force_lower_case(true)
            .force_no_trailing_slash(true)
            .force_no_trailing_slash_ignore("^/ignore/(.*)")
            .force_lower_case_ignore("^/ignore/(.*)")
            .build()
            .unwrap()
    }

    fn static_site() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("ignore")).unwrap();
        std::fs::write(dir.path().join("ignore").join("Foo"), "static Foo").unwrap();
        std::fs::write(dir.path().join("index.html"), "home").unwrap();
        dir
    }

    fn app(engine: RedirectEngine, root: Option<&TempDir>) -> Router {
        let root = root.map(|dir| dir.path().to_string_lossy().into_owned());
        build_router(Arc::new(engine), root.as_deref())
    }

    async fn get(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, location, String::from_utf8_lossy(&body).into_owned())
    }

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root_on_wrong_host_redirects_to_forced_host() {
        let (status, location, _) = get(
            app(canonical_engine(), None),
            request("http://foo.com/"),
        )
        .await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://www.foo.com/"));
    }

    #[tokio::test]
    async fn test_trailing_slash_and_host_are_fixed_together() {
        let (status, location, _) = get(
            app(canonical_engine(), None),
            request("http://foo.com/foo/"),
        )
        .await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://www.foo.com/foo"));
    }

    #[tokio::test]
    async fn test_upper_case_path_is_lowered_and_query_kept() {
        let (status, location, _) = get(
            app(canonical_engine(), None),
            request("http://www.foo.com/Some/Path/?Key=Value&x=1"),
        )
        .await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            location.as_deref(),
            Some("http://www.foo.com/some/path?Key=Value&x=1")
        );
    }

    #[tokio::test]
    async fn test_ignored_path_reaches_static_files() {
        let site = static_site();
        let (status, location, body) = get(
            app(canonical_engine(), Some(&site)),
            request("http://www.foo.com/ignore/Foo"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(location, None);
        assert_eq!(body, "static Foo");
    }

    #[tokio::test]
    async fn test_canonical_request_without_static_root_is_not_found() {
        let (status, location, _) = get(
            app(canonical_engine(), None),
            request("http://www.foo.com/already/canonical"),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(location, None);
    }

    #[tokio::test]
    async fn test_index_is_served_for_canonical_root() {
        let site = static_site();
        let (status, _, body) = get(
            app(canonical_engine(), Some(&site)),
            request("http://www.foo.com/"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "home");
    }

    #[tokio::test]
    async fn test_forwarded_host_is_honoured() {
        let req = Request::builder()
            .uri("/Foo")
            .header(header::HOST, "internal:8080")
            .header("x-forwarded-host", "www.foo.com")
            .body(Body::empty())
            .unwrap();

        let (status, location, _) = get(app(canonical_engine(), None), req).await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://www.foo.com/foo"));
    }

    #[tokio::test]
    async fn test_repeated_forwarded_host_falls_back_to_host() {
        let req = Request::builder()
            .uri("/foo")
            .header(header::HOST, "www.foo.com")
            .header("x-forwarded-host", "a.foo.com")
            .header("x-forwarded-host", "b.foo.com")
            .body(Body::empty())
            .unwrap();

        let (status, location, _) = get(app(canonical_engine(), None), req).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(location, None);
    }

    #[tokio::test]
    async fn test_force_tls_keeps_host_and_path() {
        let engine = RedirectEngine::builder().force_tls(true).build().unwrap();

        let (status, location, _) =
            get(app(engine, None), request("http://foo.com/Bar?q=1")).await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("https://foo.com/Bar?q=1"));
    }

    #[tokio::test]
    async fn test_regex_then_exact_redirect() {
        let engine = RedirectEngine::builder()
            .regex_redirect("^/old/(.*)", "/new/$1")
            .unwrap()
            .redirect("/new/page", "/final")
            .build()
            .unwrap();

        let (status, location, _) =
            get(app(engine, None), request("http://foo.com/old/page")).await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://foo.com/final"));
    }

    #[tokio::test]
    async fn test_encoded_lower_case_path_passes() {
        let engine = RedirectEngine::builder()
            .force_lower_case(true)
            .build()
            .unwrap();

        let (status, location, _) =
            get(app(engine, None), request("http://foo.com/caf%C3%A9")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(location, None);
    }

    #[tokio::test]
    async fn test_encoded_upper_case_path_is_lowered() {
        let engine = RedirectEngine::builder()
            .force_lower_case(true)
            .build()
            .unwrap();

        let (status, location, _) =
            get(app(engine, None), request("http://foo.com/CAF%C3%89?q=%41")).await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://foo.com/caf%C3%A9?q=%41"));
    }

    #[tokio::test]
    async fn test_exact_keys_match_decoded_paths() {
        let engine = RedirectEngine::builder()
            .redirect("/über", "/ueber")
            .redirect("/a b", "/ab")
            .build()
            .unwrap();
        let app = app(engine, None);

        let (status, location, _) = get(app.clone(), request("http://foo.com/%C3%BCber")).await;
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://foo.com/ueber"));

        let (status, location, _) = get(app, request("http://foo.com/a%20b")).await;
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://foo.com/ab"));
    }

    #[tokio::test]
    async fn test_replacement_with_fragment_keeps_query() {
        let engine = RedirectEngine::builder()
            .redirect("/foo", "/bar#x")
            .build()
            .unwrap();

        let (status, location, _) =
            get(app(engine, None), request("http://foo.com/foo?q=1")).await;

        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(location.as_deref(), Some("http://foo.com/bar%23x?q=1"));
    }

    #[tokio::test]
    async fn test_unbuildable_target_is_server_error() {
        let engine = RedirectEngine::builder()
            .force_lower_case(true)
            .build()
            .unwrap();
        let req = Request::builder()
            .uri("/Foo")
            .header(header::HOST, "bad host")
            .body(Body::empty())
            .unwrap();

        let (status, location, body) = get(app(engine, None), req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(location, None);
        assert_eq!(body, REDIRECTION_ERROR_BODY);
    }
}
