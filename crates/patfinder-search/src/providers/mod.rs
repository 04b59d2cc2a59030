//! Provider implementations.

pub mod serpapi;

pub use serpapi::SerpApiProvider;
