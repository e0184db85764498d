pub mod builder;
pub mod engine;
pub mod rules;

pub use builder::RedirectEngineBuilder;
pub use engine::{Decision, Policy, RedirectEngine, RewriteError};
pub use rules::{ExactRedirects, PathPolicy, RegexRedirect, RegexRedirects, RuleError};
