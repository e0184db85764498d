/// RequestView defines the port (interface) through which the engine reads an
/// inbound request.
///
/// The engine never mutates the request; adapters expose whatever their HTTP
/// stack knows about transport, host and target.
pub trait RequestView {
    /// Whether the request arrived over a secure transport (TLS).
    fn is_secure(&self) -> bool;

    /// Host of the request as seen by the server, including a port if one
    /// was given.
    fn host(&self) -> &str;

    /// Value of the forwarded-host header.
    ///
    /// Adapters return `None` when the header is absent, repeated or empty.
    fn forwarded_host(&self) -> Option<&str>;

    /// Percent-decoded URL path, always starting with `/`.
    fn path(&self) -> &str;

    /// Raw query string without the leading `?`.
    fn query(&self) -> Option<&str>;

    /// The host the client asked for: the forwarded host when one is set,
    /// otherwise [`RequestView::host`].
    fn effective_host(&self) -> &str {
        self.forwarded_host().unwrap_or_else(|| self.host())
    }
}
