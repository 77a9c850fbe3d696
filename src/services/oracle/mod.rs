pub mod http;

pub use http::HttpOracle;
