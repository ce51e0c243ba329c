//! Use-case services on top of the store.
//!
//! # Responsibility
//! - Orchestrate the remote horoscope source, its fallbacks and the
//!   freshness gate.
//! - Keep HTTP details out of store and model code.

pub mod horoscope_client;
pub mod horoscope_fallback;
pub mod horoscope_service;
