//! HTTP request handlers, one module per resource.

pub mod editions;
pub mod guests;
pub mod health;
pub mod preselections;

pub use health::health_check;
