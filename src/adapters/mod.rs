pub mod csv_source;
pub mod middleware;
pub mod request_view;

/// Re-export commonly used types from adapters
pub use csv_source::CsvRuleSource;
pub use middleware::*;
pub use request_view::{
    HttpRequestView, SecureTransport, UrlRequestView, X_FORWARDED_HOST, decode_path,
};
