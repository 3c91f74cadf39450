//! Operations exposed to the command-line front end.

pub mod indexing;

pub use indexing::IndexingService;
