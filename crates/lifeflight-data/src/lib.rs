//! # LifeFlight Data
//!
//! Loading collaborators for the analytics pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              API / batch callers             │
//! └──────────────────────────────────────────────┘
//!          │                 │              │
//!          ▼                 ▼              ▼
//! ┌──────────────────┐ ┌────────────┐ ┌─────────────┐
//! │ MissionRepository│ │ Population │ │ FileModel   │
//! │ (LoadStrategy)   │ │ loader     │ │ Store       │
//! └──────────────────┘ └────────────┘ └─────────────┘
//!          │                 │              │
//!          ▼                 ▼              ▼
//! ┌──────────────────────────────────┐ ┌─────────────┐
//! │   DuckDB read_csv (all VARCHAR)  │ │ JSON models │
//! └──────────────────────────────────┘ └─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod duck;
pub mod error;
pub mod missions;
pub mod models;
pub mod population;
pub mod strategy;

pub use duck::DEFAULT_ENCODING;
pub use error::{DataError, Result};
pub use missions::{ColumnMapping, InMemorySource, MissionCsvLoader, MissionField, MissionSource};
pub use models::FileModelStore;
pub use population::load_population_table;
pub use strategy::{LoadStrategy, MissionRepository};
