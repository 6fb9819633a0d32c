//! Text-to-speech client backend with a bounded, least-recently-used audio cache.

pub mod controllers;
pub mod domain;
pub mod error;
pub mod infrastructure;
