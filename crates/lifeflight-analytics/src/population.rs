//! Population lookup used to normalize mission counts.
//!
//! Lookups walk an ordered chain of strategies and stop at the first one that
//! produces a positive population. Only the exact-year strategies are ground
//! truth; nearest-year values, state shares and fixed figures are estimates
//! and are reported as such.

use lifeflight_domain::LocationLevel;
use serde::Serialize;
use std::collections::BTreeMap;

/// State population (Maine, 2012) used when no table row is usable.
pub const DEFAULT_STATE_POPULATION: u64 = 1_329_192;
/// Rough population of a county when nothing better is known.
pub const DEFAULT_COUNTY_POPULATION: u64 = 80_000;
/// Rough population of a city when nothing better is known.
pub const DEFAULT_CITY_POPULATION: u64 = 4_000;
/// Counties in the state.
pub const STATE_COUNTY_COUNT: u64 = 16;
/// Cities in the service area mapping.
pub const STATE_CITY_COUNT: u64 = 348;

/// Yearly population reference tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationTable {
    state: BTreeMap<i32, u64>,
    county: BTreeMap<String, BTreeMap<i32, u64>>,
}

impl PopulationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_state(&mut self, year: i32, population: u64) {
        self.state.insert(year, population);
    }

    /// County names are matched case-insensitively.
    pub fn insert_county(&mut self, county: &str, year: i32, population: u64) {
        self.county
            .entry(county.trim().to_uppercase())
            .or_default()
            .insert(year, population);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty() && self.county.is_empty()
    }

    fn state_exact(&self, year: i32) -> Option<u64> {
        self.state.get(&year).copied()
    }

    fn county_years(&self, county: &str) -> Option<&BTreeMap<i32, u64>> {
        self.county.get(&county.trim().to_uppercase())
    }

    /// Resolve a population through the strategy chain of `level`.
    #[must_use]
    pub fn resolve(
        &self,
        year: i32,
        level: LocationLevel,
        location: Option<&str>,
    ) -> PopulationEstimate {
        for &strategy in PopulationStrategy::chain(level) {
            if let Some(population) = strategy.apply(self, year, location).filter(|p| *p > 0) {
                if strategy.is_estimate() {
                    tracing::debug!(
                        year,
                        level = level.as_str(),
                        location,
                        strategy = ?strategy,
                        population,
                        "Population resolved from an estimate"
                    );
                }
                return PopulationEstimate {
                    population,
                    strategy,
                    estimated: strategy.is_estimate(),
                };
            }
        }

        // Every chain ends in a positive fixed figure.
        PopulationEstimate {
            population: DEFAULT_STATE_POPULATION,
            strategy: PopulationStrategy::Fixed {
                figure: DEFAULT_STATE_POPULATION,
            },
            estimated: true,
        }
    }
}

/// One way of obtaining a population figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PopulationStrategy {
    /// State table row for the requested year
    StateExact,
    /// State table row for the closest available year
    StateNearestYear,
    /// County table row for the requested year
    CountyExact,
    /// County table row for the closest year on record for that county
    CountyNearestYear,
    /// Exact-year state population split evenly
    StateShare { divisor: u64 },
    /// Hard-coded figure
    Fixed { figure: u64 },
}

impl PopulationStrategy {
    /// Ordered fallback chain for a location level.
    #[must_use]
    pub fn chain(level: LocationLevel) -> &'static [Self] {
        const STATE: &[PopulationStrategy] = &[
            PopulationStrategy::StateExact,
            PopulationStrategy::StateNearestYear,
            PopulationStrategy::Fixed {
                figure: DEFAULT_STATE_POPULATION,
            },
        ];
        const COUNTY: &[PopulationStrategy] = &[
            PopulationStrategy::CountyExact,
            PopulationStrategy::CountyNearestYear,
            PopulationStrategy::StateShare {
                divisor: STATE_COUNTY_COUNT,
            },
            PopulationStrategy::Fixed {
                figure: DEFAULT_COUNTY_POPULATION,
            },
        ];
        const CITY: &[PopulationStrategy] = &[
            PopulationStrategy::StateShare {
                divisor: STATE_CITY_COUNT,
            },
            PopulationStrategy::Fixed {
                figure: DEFAULT_CITY_POPULATION,
            },
        ];

        match level {
            LocationLevel::System | LocationLevel::State => STATE,
            LocationLevel::County => COUNTY,
            LocationLevel::City => CITY,
        }
    }

    #[must_use]
    pub const fn is_estimate(&self) -> bool {
        !matches!(self, Self::StateExact | Self::CountyExact)
    }

    fn apply(&self, table: &PopulationTable, year: i32, location: Option<&str>) -> Option<u64> {
        match *self {
            Self::StateExact => table.state_exact(year),
            Self::StateNearestYear => nearest_year(&table.state, year),
            Self::CountyExact => table.county_years(location?)?.get(&year).copied(),
            Self::CountyNearestYear => nearest_year(table.county_years(location?)?, year),
            Self::StateShare { divisor } => table.state_exact(year).map(|p| p / divisor),
            Self::Fixed { figure } => Some(figure),
        }
    }
}

/// Value at the year closest to `year`; ties go to the earlier year.
fn nearest_year(by_year: &BTreeMap<i32, u64>, year: i32) -> Option<u64> {
    by_year
        .iter()
        .min_by_key(|(y, _)| (**y - year).unsigned_abs())
        .map(|(_, p)| *p)
}

/// A resolved population and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulationEstimate {
    pub population: u64,
    #[serde(flatten)]
    pub strategy: PopulationStrategy,
    pub estimated: bool,
}
