//! Population reference table loading.
//!
//! State table: `year,population`. County table: `county,year,population`.
//! Rows whose numbers do not parse are skipped.

use lifeflight_analytics::PopulationTable;
use std::path::Path;

use crate::duck;
use crate::error::Result;

/// Add the yearly state populations in `path` to `table`.
pub fn load_state_population(path: &Path, table: &mut PopulationTable) -> Result<usize> {
    duck::require_file(path, "State population table")?;
    let conn = duck::open()?;
    let relation = duck::read_csv_all_varchar(path, "utf-8");
    let mut stmt = conn.prepare(&format!(
        r#"SELECT TRY_CAST("year" AS INTEGER), TRY_CAST("population" AS DOUBLE) FROM {relation}"#
    ))?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, Option<i32>>(0)?, row.get::<_, Option<f64>>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut loaded = 0;
    for (year, population) in rows {
        if let (Some(year), Some(population)) = (year, population.and_then(whole_people)) {
            table.insert_state(year, population);
            loaded += 1;
        }
    }
    tracing::debug!(path = %path.display(), rows = loaded, "State population loaded");
    Ok(loaded)
}

/// Add the yearly county populations in `path` to `table`.
pub fn load_county_population(path: &Path, table: &mut PopulationTable) -> Result<usize> {
    duck::require_file(path, "County population table")?;
    let conn = duck::open()?;
    let relation = duck::read_csv_all_varchar(path, "utf-8");
    let mut stmt = conn.prepare(&format!(
        r#"SELECT "county", TRY_CAST("year" AS INTEGER), TRY_CAST("population" AS DOUBLE) FROM {relation}"#
    ))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Option<String>>(0)?,
                row.get::<_, Option<i32>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut loaded = 0;
    for (county, year, population) in rows {
        if let (Some(county), Some(year), Some(population)) =
            (county, year, population.and_then(whole_people))
        {
            table.insert_county(&county, year, population);
            loaded += 1;
        }
    }
    tracing::debug!(path = %path.display(), rows = loaded, "County population loaded");
    Ok(loaded)
}

/// Load both tables. A missing file leaves its part of the table empty and
/// lookups fall back to estimates; any other failure is returned.
pub fn load_population_table(state_path: &Path, county_path: &Path) -> Result<PopulationTable> {
    let mut table = PopulationTable::new();
    for (path, load) in [
        (state_path, load_state_population as fn(&Path, &mut PopulationTable) -> Result<usize>),
        (county_path, load_county_population),
    ] {
        match load(path, &mut table) {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                tracing::warn!(error = %err, "Population table missing, using estimates");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(table)
}

fn whole_people(value: f64) -> Option<u64> {
    // Truncates like an integer cast of the raw figure.
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}
