//! # Strategy Module
//!
//! Enum-based dataset access strategies.
//!
//! ## Available Strategies
//!
//! - `Reload` - Read the export on every request (default)
//! - `CacheFirst` - Serve the dataset loaded first, as long as the file on
//!   disk is unchanged
//!
//! ## Example
//!
//! ```rust,ignore
//! use lifeflight_data::strategy::{LoadStrategy, MissionRepository};
//!
//! let repo = MissionRepository::new(loader, LoadStrategy::CacheFirst);
//! let records = repo.load()?;
//! ```

pub mod load_strategy;
pub mod repository;

pub use load_strategy::LoadStrategy;
pub use repository::{FileIdentity, MissionRepository};
