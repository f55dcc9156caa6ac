//! Short-link map URL resolution and coordinate extraction.
//!
//! [`Resolver`] runs the expansion cascade; the free functions re-exported
//! here are pure and never touch the network.

pub mod bridge;
pub mod browser;
pub mod classify;
pub mod client;
pub mod config;
pub mod coords;
pub mod error;
pub mod html;
pub mod opaque;
pub mod pipeline;
pub mod redirect;
pub mod sanitize;
pub mod specialties;

pub use browser::{BrowserError, ChromiumRenderer, PageRenderer, RenderedPage};
pub use classify::{is_short_link, is_short_link_with};
pub use config::{BrowserSettings, ResolverConfig};
pub use coords::{extract_poi_from_text, parse_lat_lng};
pub use error::ResolveError;
pub use pipeline::{Expansion, Resolver, Strategy};
pub use sanitize::{ensure_at_center, sanitize_url, DEFAULT_ZOOM};
pub use specialties::maps_url_from_specialties;

pub use maplink_core::{LatLng, ResolvedLocation};
