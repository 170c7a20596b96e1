//! Gateway services
//!
//! The pieces with actual policy in them: upstream selection, cached
//! authentication, rate limiting, redirect construction, catalog sync and
//! the playlist fallback. Routes stay thin and call into these.

pub mod auth;
pub mod m3u_fallback;
pub mod panel;
pub mod rate_limit;
pub mod redirect;
pub mod sanitizer;
pub mod sync;
pub mod upstream;
