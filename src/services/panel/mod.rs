//! Upstream panel integration
//!
//! The gateway fronts an Xtream-Codes-style panel reachable through a pool
//! of interchangeable mirror base URLs. This module holds the HTTP client
//! for the panel's player API (`player_api.php?action=...`) and its
//! playlist download (`get.php`), plus lenient types for the payloads the
//! panel returns.
//!
//! Panels are not trustworthy JSON producers: numeric fields arrive as
//! numbers or strings, documented fields go missing, and extra fields
//! appear without notice. Every upstream-controlled field is therefore
//! optional until validated.

pub mod client;
pub mod types;

pub use client::{PanelClient, PanelError};
pub use types::{PanelAuthResponse, PanelCategory, PanelCredentials, PanelStream, PanelUserInfo};
