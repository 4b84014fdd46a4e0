//! Mission dataset loading.
//!
//! The export is read through DuckDB with every column as text. Header names
//! vary between exports, so each logical field has a list of candidate
//! headers; the county column in particular is often a second `PU City`.

use duckdb::Row;
use lifeflight_domain::{FieldValue, MissionRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::duck::{self, DEFAULT_ENCODING};
use crate::error::{DataError, Result};

/// Logical mission fields read from an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MissionField {
    IncidentNumber,
    PickupCity,
    PickupCounty,
    PickupState,
    TripDate,
    DispatchTime,
    EnrouteTime,
    Status,
    CancelReason,
}

impl MissionField {
    pub const ALL: [Self; 9] = [
        Self::IncidentNumber,
        Self::PickupCity,
        Self::PickupCounty,
        Self::PickupState,
        Self::TripDate,
        Self::DispatchTime,
        Self::EnrouteTime,
        Self::Status,
        Self::CancelReason,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IncidentNumber => "incident_number",
            Self::PickupCity => "pickup_city",
            Self::PickupCounty => "pickup_county",
            Self::PickupState => "pickup_state",
            Self::TripDate => "trip_date",
            Self::DispatchTime => "dispatch_time",
            Self::EnrouteTime => "enroute_time",
            Self::Status => "status",
            Self::CancelReason => "cancel_reason",
        }
    }

    /// Without a trip date no analysis can place a mission in time.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self, Self::TripDate)
    }
}

/// Candidate header names per logical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    candidates: BTreeMap<MissionField, Vec<String>>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        let defaults: [(MissionField, &[&str]); 9] = [
            (MissionField::IncidentNumber, &["Incident Number"]),
            (MissionField::PickupCity, &["PU City"]),
            (MissionField::PickupCounty, &["PU County", "PU City_1", "PU City.1"]),
            (MissionField::PickupState, &["PU State"]),
            (MissionField::TripDate, &["tdate"]),
            (MissionField::DispatchTime, &["disptime"]),
            (MissionField::EnrouteTime, &["enrtime"]),
            (MissionField::Status, &["Status"]),
            (MissionField::CancelReason, &["Cancel Reason"]),
        ];
        Self {
            candidates: defaults
                .into_iter()
                .map(|(field, names)| (field, names.iter().map(|n| (*n).to_string()).collect()))
                .collect(),
        }
    }
}

impl ColumnMapping {
    /// Replace the candidate headers of one field.
    #[must_use]
    pub fn with_candidates<I, S>(mut self, field: MissionField, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates
            .insert(field, names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn candidates(&self, field: MissionField) -> &[String] {
        self.candidates.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Match candidates against the actual headers: exact first, then
    /// case-insensitive.
    pub fn resolve(&self, headers: &[String]) -> Result<ResolvedColumns> {
        let mut columns = BTreeMap::new();
        for field in MissionField::ALL {
            let candidates = self.candidates(field);
            let exact = candidates
                .iter()
                .find_map(|c| headers.iter().find(|h| *h == c));
            let found = exact.or_else(|| {
                candidates
                    .iter()
                    .find_map(|c| headers.iter().find(|h| h.eq_ignore_ascii_case(c)))
            });

            match found {
                Some(header) => {
                    columns.insert(field, header.clone());
                }
                None if field.is_required() => {
                    return Err(DataError::MissingColumn {
                        field: field.as_str(),
                        candidates: candidates.to_vec(),
                    });
                }
                None => {
                    tracing::debug!(field = field.as_str(), "Column not present in export");
                }
            }
        }
        Ok(ResolvedColumns { columns })
    }
}

/// Header chosen for each field present in an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    columns: BTreeMap<MissionField, String>,
}

impl ResolvedColumns {
    #[must_use]
    pub fn header(&self, field: MissionField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// SELECT list in `MissionField::ALL` order; absent fields read as NULL.
    fn select_list(&self) -> String {
        MissionField::ALL
            .iter()
            .map(|field| {
                self.header(*field)
                    .map_or_else(|| "NULL::VARCHAR".to_string(), duck::quote_ident)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn to_record(&self, row: &Row<'_>) -> duckdb::Result<MissionRecord> {
        let text = |field: MissionField| -> duckdb::Result<Option<String>> {
            // Columns are selected in declaration order.
            let cell: Option<String> = row.get(field as usize)?;
            Ok(cell.filter(|s| !s.trim().is_empty()))
        };
        let optional = |field: MissionField| -> duckdb::Result<FieldValue> {
            if self.header(field).is_some() {
                Ok(FieldValue::from_cell(text(field)?))
            } else {
                Ok(FieldValue::NotInSchema)
            }
        };

        Ok(MissionRecord {
            incident_number: text(MissionField::IncidentNumber)?,
            pickup_city: text(MissionField::PickupCity)?,
            pickup_county: text(MissionField::PickupCounty)?,
            pickup_state: text(MissionField::PickupState)?,
            trip_date: text(MissionField::TripDate)?,
            dispatch_time: text(MissionField::DispatchTime)?,
            enroute_time: text(MissionField::EnrouteTime)?,
            status: optional(MissionField::Status)?,
            cancel_reason: optional(MissionField::CancelReason)?,
        })
    }
}

/// Reads mission rows from a CSV export.
#[derive(Debug, Clone)]
pub struct MissionCsvLoader {
    path: PathBuf,
    encoding: String,
    mapping: ColumnMapping,
}

impl MissionCsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: DEFAULT_ENCODING.to_string(),
            mapping: ColumnMapping::default(),
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row of the export.
    pub fn read_records(&self) -> Result<Vec<MissionRecord>> {
        duck::require_file(&self.path, "Data file")?;

        let conn = duck::open()?;
        let relation = duck::read_csv_all_varchar(&self.path, &self.encoding);
        let headers = duck::column_names(&conn, &relation)?;
        let columns = self.mapping.resolve(&headers)?;

        let mut stmt = conn.prepare(&format!("SELECT {} FROM {relation}", columns.select_list()))?;
        let records = stmt
            .query_map([], |row| columns.to_record(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::info!(
            path = %self.path.display(),
            rows = records.len(),
            has_status = columns.header(MissionField::Status).is_some(),
            has_cancel_reason = columns.header(MissionField::CancelReason).is_some(),
            "Mission dataset loaded"
        );
        Ok(records)
    }
}

/// Anything that can hand out the full mission dataset.
pub trait MissionSource: Send + Sync {
    fn load(&self) -> Result<Arc<[MissionRecord]>>;
}

impl MissionSource for MissionCsvLoader {
    fn load(&self) -> Result<Arc<[MissionRecord]>> {
        self.read_records().map(Arc::from)
    }
}

/// A fixed dataset held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Arc<[MissionRecord]>,
}

impl InMemorySource {
    pub fn new(records: impl Into<Arc<[MissionRecord]>>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

impl MissionSource for InMemorySource {
    fn load(&self) -> Result<Arc<[MissionRecord]>> {
        Ok(Arc::clone(&self.records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_resolve_prefers_exact_then_case_insensitive() {
        let mapping = ColumnMapping::default();
        let resolved = mapping
            .resolve(&headers(&["TDATE", "PU City", "PU City_1", "status"]))
            .unwrap();
        assert_eq!(resolved.header(MissionField::TripDate), Some("TDATE"));
        assert_eq!(resolved.header(MissionField::PickupCounty), Some("PU City_1"));
        assert_eq!(resolved.header(MissionField::Status), Some("status"));
        assert_eq!(resolved.header(MissionField::CancelReason), None);
    }

    #[test]
    fn test_resolve_requires_trip_date() {
        let err = ColumnMapping::default()
            .resolve(&headers(&["Incident Number", "PU City"]))
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { field: "trip_date", .. }));
    }

    #[test]
    fn test_custom_candidates() {
        let mapping = ColumnMapping::default().with_candidates(MissionField::TripDate, ["Trip Date"]);
        let resolved = mapping.resolve(&headers(&["Trip Date"])).unwrap();
        assert_eq!(resolved.header(MissionField::TripDate), Some("Trip Date"));
    }

    #[test]
    fn test_load_csv_export() {
        let file = csv_file(
            b"Incident Number,PU City,PU City,PU State,tdate,disptime,enrtime,Status,Cancel Reason\n\
              I-1,BANGOR,PENOBSCOT,ME,2023-06-15,08:00:00,08:15:30,Closed,<NONE>\n\
              I-2,MACHIAS,WASHINGTON,ME,2023-06-15,23:50,00:10,,Weather\n",
        );
        let records = MissionCsvLoader::new(file.path()).read_records().unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.incident_number.as_deref(), Some("I-1"));
        assert_eq!(first.pickup_county.as_deref(), Some("PENOBSCOT"));
        assert_eq!(first.dispatch_time.as_deref(), Some("08:00:00"));
        assert_eq!(first.status, FieldValue::Value("Closed".into()));

        let second = &records[1];
        assert_eq!(second.status, FieldValue::Null);
        assert_eq!(second.cancel_reason, FieldValue::Value("Weather".into()));
    }

    #[test]
    fn test_absent_outcome_columns_are_not_in_schema() {
        let file = csv_file(b"tdate,disptime,enrtime\n2023-01-02,10:00,10:12\n");
        let records = MissionCsvLoader::new(file.path()).read_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, FieldValue::NotInSchema);
        assert_eq!(records[0].cancel_reason, FieldValue::NotInSchema);
        assert_eq!(records[0].pickup_city, None);
    }

    #[test]
    fn test_latin1_export() {
        let file = csv_file(b"tdate,PU City\n2023-01-02,Fr\xe9d\xe9ric\n");
        let records = MissionCsvLoader::new(file.path()).read_records().unwrap();
        assert_eq!(records[0].pickup_city.as_deref(), Some("Fr\u{e9}d\u{e9}ric"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = MissionCsvLoader::new(dir.path().join("absent.csv"))
            .read_records()
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_in_memory_source_shares_records() {
        let source = InMemorySource::new(vec![MissionRecord::default()]);
        let a = source.load().unwrap();
        let b = source.load().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
