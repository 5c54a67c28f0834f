//! Detail source implementations.
//!
//! - `HttpDetailSource` - reqwest client with the fixed header set
//! - `MockDetailSource` - canned responses, for testing

mod http;
mod mock;

pub use http::HttpDetailSource;
pub use mock::{MockDetailSource, MockResponse};

pub use crate::traits::source::DetailSource;
