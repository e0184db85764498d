//! Redirect decision and target computation.
//!
//! The `RedirectEngine` is a frozen set of canonicalization policies. For a
//! request it answers two questions:
//! * does any policy require a redirect ([`RedirectEngine::evaluate`])
//! * where should the client go ([`RedirectEngine::redirect_url`])
//!
//! Policies are checked in a fixed order: TLS, host, lower case, trailing
//! slash, no trailing slash, regex redirects, exact redirects. Every policy is
//! evaluated for every request; the target applies each transformation whose
//! policy fired, in that same order.
//!
//! The engine holds no interior state and performs no I/O, so one instance is
//! shared behind an `Arc` by every request handler.
use std::{borrow::Cow, fmt};

use thiserror::Error;
use url::Url;

use crate::{
    core::{
        builder::RedirectEngineBuilder,
        rules::{ExactRedirects, PathPolicy, RegexRedirects},
    },
    ports::RequestView,
};

/// Error type for redirect target computation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RewriteError {
    /// Scheme and host of the target do not form a valid URL
    #[error("Failed to reconstruct redirect URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// One canonicalization policy, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    Tls,
    Host,
    LowerCase,
    TrailingSlash,
    NoTrailingSlash,
    RegexRedirect,
    ExactRedirect,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Tls => "tls",
            Policy::Host => "host",
            Policy::LowerCase => "lower_case",
            Policy::TrailingSlash => "trailing_slash",
            Policy::NoTrailingSlash => "no_trailing_slash",
            Policy::RegexRedirect => "regex_redirect",
            Policy::ExactRedirect => "exact_redirect",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating every policy against one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decision {
    pub tls: bool,
    pub host: bool,
    pub lower_case: bool,
    pub trailing_slash: bool,
    pub no_trailing_slash: bool,
    pub regex_redirect: bool,
    pub exact_redirect: bool,
}

impl Decision {
    /// True when at least one policy fired
    pub fn should_redirect(&self) -> bool {
        self.tls
            || self.host
            || self.lower_case
            || self.trailing_slash
            || self.no_trailing_slash
            || self.regex_redirect
            || self.exact_redirect
    }

    /// Policies that fired, in evaluation order
    pub fn policies(&self) -> Vec<Policy> {
        [
            (self.tls, Policy::Tls),
            (self.host, Policy::Host),
            (self.lower_case, Policy::LowerCase),
            (self.trailing_slash, Policy::TrailingSlash),
            (self.no_trailing_slash, Policy::NoTrailingSlash),
            (self.regex_redirect, Policy::RegexRedirect),
            (self.exact_redirect, Policy::ExactRedirect),
        ]
        .into_iter()
        .filter_map(|(fired, policy)| fired.then_some(policy))
        .collect()
    }
}

/// Immutable redirect configuration. Construct with [`RedirectEngine::builder`].
#[derive(Debug, Clone, Default)]
pub struct RedirectEngine {
    force_host: Option<String>,
    force_tls: bool,
    lower_case: PathPolicy,
    trailing_slash: PathPolicy,
    no_trailing_slash: PathPolicy,
    regex_redirects: RegexRedirects,
    exact_redirects: ExactRedirects,
}

impl RedirectEngine {
    pub fn builder() -> RedirectEngineBuilder {
        RedirectEngineBuilder::new()
    }

    pub(crate) fn from_parts(
        force_host: Option<String>,
        force_tls: bool,
        lower_case: PathPolicy,
        trailing_slash: PathPolicy,
        no_trailing_slash: PathPolicy,
        regex_redirects: RegexRedirects,
        exact_redirects: ExactRedirects,
    ) -> Self {
        Self {
            force_host,
            force_tls,
            lower_case,
            trailing_slash,
            no_trailing_slash,
            regex_redirects,
            exact_redirects,
        }
    }

    pub fn force_host(&self) -> Option<&str> {
        self.force_host.as_deref()
    }

    pub fn force_tls(&self) -> bool {
        self.force_tls
    }

    pub fn lower_case(&self) -> &PathPolicy {
        &self.lower_case
    }

    pub fn trailing_slash(&self) -> &PathPolicy {
        &self.trailing_slash
    }

    pub fn no_trailing_slash(&self) -> &PathPolicy {
        &self.no_trailing_slash
    }

    pub fn regex_redirects(&self) -> &RegexRedirects {
        &self.regex_redirects
    }

    pub fn exact_redirects(&self) -> &ExactRedirects {
        &self.exact_redirects
    }

    /// Evaluate every policy against `req`.
    pub fn evaluate(&self, req: &impl RequestView) -> Decision {
        let path = req.path();
        let not_root = path != "/";

        Decision {
            tls: self.force_tls && !req.is_secure(),
            host: self
                .force_host
                .as_deref()
                .is_some_and(|host| req.effective_host() != host),
            lower_case: self.lower_case.applies_to(path) && path.to_lowercase() != path,
            trailing_slash: not_root && !path.ends_with('/') && self.trailing_slash.applies_to(path),
            no_trailing_slash: not_root
                && path.ends_with('/')
                && self.no_trailing_slash.applies_to(path),
            regex_redirect: self.regex_redirects.first_match(path).is_some(),
            exact_redirect: self.exact_redirects.contains(path),
        }
    }

    /// Whether any policy requires `req` to be redirected.
    pub fn should_redirect(&self, req: &impl RequestView) -> bool {
        self.evaluate(req).should_redirect()
    }

    /// Compute the redirect target for `req`.
    pub fn redirect_url(&self, req: &impl RequestView) -> Result<Url, RewriteError> {
        let decision = self.evaluate(req);
        self.redirect_url_for(req, &decision)
    }

    /// Compute the redirect target for `req` from an already computed
    /// `decision`.
    ///
    /// The regex and exact tables are matched against the path produced by
    /// the earlier transformations, so an exact redirect may target the
    /// lower-cased or slash-normalized form of a path.
    ///
    /// The path is percent-encoded again on output and `.`/`..` segments are
    /// resolved. The query string is copied unchanged.
    pub fn redirect_url_for(
        &self,
        req: &impl RequestView,
        decision: &Decision,
    ) -> Result<Url, RewriteError> {
        let scheme = if decision.tls || req.is_secure() {
            "https"
        } else {
            "http"
        };

        let host = match self.force_host.as_deref() {
            Some(forced) if decision.host => forced,
            _ => req.effective_host(),
        };

        let mut path = req.path().to_string();
        if decision.lower_case {
            path = path.to_lowercase();
        }
        if decision.trailing_slash {
            path.push('/');
        } else if decision.no_trailing_slash {
            path.pop();
        }
        if let Some(rule) = self.regex_redirects.first_match(&path) {
            path = rule.apply(&path).into_owned();
        }
        if let Some(target) = self.exact_redirects.get(&path) {
            path = target.to_string();
        }

        let base = format!("{scheme}://{host}/");
        let mut location = Url::parse(&base).map_err(|source| RewriteError::InvalidUrl {
            url: base,
            source,
        })?;
        location.set_path(&escape_path(&path));
        location.set_query(req.query().filter(|query| !query.is_empty()));
        Ok(location)
    }
}

/// Prepare a decoded path for [`Url::set_path`].
///
/// `set_path` escapes `?`, `#`, spaces and non-ASCII itself but keeps `%`
/// as is, so a literal `%` is escaped here.
fn escape_path(path: &str) -> Cow<'_, str> {
    let path = if path.contains('%') {
        Cow::Owned(path.replace('%', "%25"))
    } else {
        Cow::Borrowed(path)
    };
    if path.starts_with('/') {
        path
    } else {
        Cow::Owned(format!("/{path}"))
    }
}
