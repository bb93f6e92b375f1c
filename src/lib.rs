//! ClimaPYG
//!
//! Weather for Paraguayan departments served from a TTL cache, plus
//! currency and Bitcoin conversion to guaraníes (PYG).

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod service;
