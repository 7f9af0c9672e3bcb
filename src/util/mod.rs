//! Utility functions for common operations.
//!
//! - **Endpoint validation**: scheme and host checks for the summary endpoint
//! - **Text processing**: character-based truncation and terminal sanitizing
//!
//! # Examples
//!
//! ```
//! use daybrief::util::{truncate_chars, validate_endpoint};
//!
//! let url = validate_endpoint("https://example.com/api/newsFetcher").unwrap();
//! assert_eq!(url.host_str(), Some("example.com"));
//!
//! assert_eq!(truncate_chars("Long summary text", 4), "Long");
//! ```

mod text;
mod url_validator;

pub use text::{strip_control_chars, truncate_chars};
pub use url_validator::{validate_endpoint, UrlValidationError};
