// src/lib.rs

//! Site search library: crawls configured sites into a lemma index and
//! answers ranked keyword queries.

pub mod concurrency;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
