//! CSV output for generated missions.

use std::io;

use crate::generator::SimulatedMission;

/// Write missions as a CSV export with a header row.
pub fn write_csv<W: io::Write>(writer: W, missions: &[SimulatedMission]) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for mission in missions {
        csv.serialize(mission)?;
    }
    csv.flush()?;
    Ok(())
}
