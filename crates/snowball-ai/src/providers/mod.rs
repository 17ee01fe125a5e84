//! Gateway provider implementations

pub mod responses;

pub use responses::ResponsesProvider;
