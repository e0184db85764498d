use crate::{
    core::{
        engine::RedirectEngine,
        rules::{ExactRedirects, PathPolicy, RegexRedirect, RegexRedirects, RuleError, compile_pattern},
    },
    ports::RuleSource,
};

#[derive(Debug, Clone, Default)]
struct PolicySpec {
    enabled: bool,
    ignore: Option<String>,
}

impl PolicySpec {
    fn compile(self, field: &str) -> Result<PathPolicy, RuleError> {
        if !self.enabled {
            return Ok(PathPolicy::disabled());
        }
        let ignore = self
            .ignore
            .as_deref()
            .map(|pattern| compile_pattern(field, pattern))
            .transpose()?;
        Ok(PathPolicy::enabled(ignore))
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Builder for [`RedirectEngine`].
///
/// This is the only place redirect configuration can change. Loading rule
/// tables appends to the builder; [`RedirectEngineBuilder::build`] consumes it
/// and returns an engine that is never mutated again.
///
/// ```
/// use canonize::core::RedirectEngine;
///
/// let engine = RedirectEngine::builder()
///     .force_host("www.example.com")
///     .force_lower_case(true)
///     .force_lower_case_ignore("^/assets/")
///     .redirect("/old", "/new")
///     .regex_redirect("^/de/(.*)", "/$1")?
///     .build()?;
/// assert_eq!(engine.regex_redirects().len(), 1);
/// # Ok::<(), canonize::core::RuleError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RedirectEngineBuilder {
    force_host: Option<String>,
    force_tls: bool,
    lower_case: PolicySpec,
    trailing_slash: PolicySpec,
    no_trailing_slash: PolicySpec,
    exact_redirects: ExactRedirects,
    regex_redirects: RegexRedirects,
}

impl RedirectEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce an exact host. An empty string disables the policy.
    pub fn force_host(mut self, host: impl Into<String>) -> Self {
        self.force_host = non_empty(host.into());
        self
    }

    /// Enforce the `https` scheme
    pub fn force_tls(mut self, enabled: bool) -> Self {
        self.force_tls = enabled;
        self
    }

    /// Enforce lower-case paths
    pub fn force_lower_case(mut self, enabled: bool) -> Self {
        self.lower_case.enabled = enabled;
        self
    }

    /// Exempt paths matching `pattern` from the lower-case policy
    pub fn force_lower_case_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.lower_case.ignore = non_empty(pattern.into());
        self
    }

    /// Enforce a trailing slash on every path except `/`
    pub fn force_trailing_slash(mut self, enabled: bool) -> Self {
        self.trailing_slash.enabled = enabled;
        self
    }

    /// Exempt paths matching `pattern` from the trailing slash policy
    pub fn force_trailing_slash_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.trailing_slash.ignore = non_empty(pattern.into());
        self
    }

    /// Strip the trailing slash from every path except `/`
    pub fn force_no_trailing_slash(mut self, enabled: bool) -> Self {
        self.no_trailing_slash.enabled = enabled;
        self
    }

    /// Exempt paths matching `pattern` from the no trailing slash policy
    pub fn force_no_trailing_slash_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.no_trailing_slash.ignore = non_empty(pattern.into());
        self
    }

    /// Add an exact `path -> target` redirect
    pub fn redirect(mut self, path: impl Into<String>, target: impl Into<String>) -> Self {
        self.exact_redirects.insert(path, target);
        self
    }

    /// Add a `pattern -> template` redirect after the ones already configured.
    pub fn regex_redirect(
        mut self,
        pattern: &str,
        replacement: impl Into<String>,
    ) -> Result<Self, RuleError> {
        self.regex_redirects
            .push(RegexRedirect::new(pattern, replacement)?);
        Ok(self)
    }

    /// Append every record of `source` to the exact redirect table.
    ///
    /// The source is read completely first; on error the table is left as it
    /// was. Returns the number of records appended.
    pub fn append_redirects(&mut self, source: &impl RuleSource) -> Result<usize, RuleError> {
        let records = source.read_records()?;
        let count = records.len();
        self.exact_redirects
            .extend(records.into_iter().map(|record| (record.key, record.value)));

        tracing::info!(source = %source.name(), count, "Loaded exact redirects");
        Ok(count)
    }

    /// Append every record of `source` to the regex redirect table, keeping
    /// the source order.
    ///
    /// All patterns are compiled before anything is appended, so one invalid
    /// pattern rejects the whole source.
    pub fn append_regex_redirects(&mut self, source: &impl RuleSource) -> Result<usize, RuleError> {
        let rules = source
            .read_records()?
            .into_iter()
            .map(|record| RegexRedirect::new(&record.key, record.value))
            .collect::<Result<Vec<_>, _>>()?;
        let count = rules.len();
        self.regex_redirects.extend(rules);

        tracing::info!(source = %source.name(), count, "Loaded regex redirects");
        Ok(count)
    }

    /// Compile the remaining patterns and freeze the configuration.
    pub fn build(self) -> Result<RedirectEngine, RuleError> {
        let trailing_slash = self.trailing_slash.compile("force_trailing_slash_ignore")?;
        let no_trailing_slash = self
            .no_trailing_slash
            .compile("force_no_trailing_slash_ignore")?;

        if trailing_slash.is_enabled() && no_trailing_slash.is_enabled() {
            tracing::warn!(
                "Both force_trailing_slash and force_no_trailing_slash are enabled; the trailing slash policy is evaluated first"
            );
        }

        Ok(RedirectEngine::from_parts(
            self.force_host,
            self.force_tls,
            self.lower_case.compile("force_lower_case_ignore")?,
            trailing_slash,
            no_trailing_slash,
            self.regex_redirects,
            self.exact_redirects,
        ))
    }
}
