pub mod request_view;
pub mod rule_source;

pub use request_view::RequestView;
pub use rule_source::{RuleRecord, RuleSource, RuleSourceError, RuleSourceResult};
