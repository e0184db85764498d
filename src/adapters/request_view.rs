//! [`RequestView`] adapters for `http`/`axum` requests and parsed URLs.
use std::borrow::Cow;

use http::{HeaderMap, Request, header, uri::Scheme};
use url::Url;

use crate::ports::RequestView;

/// Header consulted for the host a client originally asked for when the
/// server sits behind a proxy.
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Request extension marking a request that arrived over TLS.
///
/// Servers that terminate TLS themselves insert it so the redirect layer can
/// tell secure requests apart; `http` server requests usually carry no
/// scheme in their URI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecureTransport;

/// Value of `name` when the header is present exactly once, is valid
/// visible ASCII and is not empty.
pub fn single_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let mut values = headers.get_all(name).into_iter();
    let value = values.next()?;
    if values.next().is_some() {
        return None;
    }
    value.to_str().ok().filter(|value| !value.is_empty())
}

/// Percent-decode a request path.
///
/// Paths that do not decode to UTF-8 are decoded lossily.
pub fn decode_path(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(path) => path,
        Err(_) => {
            let bytes = urlencoding::decode_binary(raw.as_bytes());
            Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Borrowed view over an `http::Request`.
#[derive(Debug, Clone)]
pub struct HttpRequestView<'a> {
    secure: bool,
    host: &'a str,
    forwarded_host: Option<&'a str>,
    path: Cow<'a, str>,
    query: Option<&'a str>,
}

impl<'a> HttpRequestView<'a> {
    pub fn new<B>(req: &'a Request<B>) -> Self {
        let uri = req.uri();
        let secure = uri.scheme() == Some(&Scheme::HTTPS)
            || req.extensions().get::<SecureTransport>().is_some();

        let host = uri
            .authority()
            .map(|authority| {
                let authority = authority.as_str();
                authority
                    .rsplit_once('@')
                    .map_or(authority, |(_, host)| host)
            })
            .or_else(|| {
                req.headers()
                    .get(header::HOST)
                    .and_then(|value| value.to_str().ok())
            })
            .unwrap_or_default();

        Self {
            secure,
            host,
            forwarded_host: single_header_value(req.headers(), X_FORWARDED_HOST),
            path: decode_path(uri.path()),
            query: uri.query(),
        }
    }
}

impl RequestView for HttpRequestView<'_> {
    fn is_secure(&self) -> bool {
        self.secure
    }

    fn host(&self) -> &str {
        self.host
    }

    fn forwarded_host(&self) -> Option<&str> {
        self.forwarded_host
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self) -> Option<&str> {
        self.query
    }
}

/// View over an absolute URL, used by the `check` command and in tests.
#[derive(Debug, Clone)]
pub struct UrlRequestView<'a> {
    url: &'a Url,
    host: String,
    path: Cow<'a, str>,
    forwarded_host: Option<&'a str>,
}

impl<'a> UrlRequestView<'a> {
    pub fn new(url: &'a Url) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        Self {
            url,
            host,
            path: decode_path(url.path()),
            forwarded_host: None,
        }
    }

    /// Pretend the request carried a forwarded-host header. Empty values are
    /// treated as absent.
    pub fn with_forwarded_host(mut self, forwarded_host: Option<&'a str>) -> Self {
        self.forwarded_host = forwarded_host.filter(|host| !host.is_empty());
        self
    }
}

impl RequestView for UrlRequestView<'_> {
    fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn forwarded_host(&self) -> Option<&str> {
        self.forwarded_host
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn query(&self) -> Option<&str> {
        self.url.query()
    }
}
