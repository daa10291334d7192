//! CSV import of ATM records.
//!
//! # Responsibility
//! - Validate the upload boundary (content type, encoding, header).
//! - Validate each row against the `atm` schema and create a record per
//!   valid row, owned by the uploading account.
//!
//! # Invariants
//! - The header names schema fields; managed fields (`status`, `uid`,
//!   `created`, `changed`) and unknown names are rejected.
//! - Every required domain field must appear in the header.
//! - Invalid rows are reported and never abort the batch.
//! - Nothing is stored when a file-level check fails.

use crate::access::policy::{AccessContext, AccountPermissions, AtmAccessPolicy};
use crate::import::csv::{parse_csv, CsvError, CsvRow};
use crate::model::atm::{is_decimal_within, Atm, AtmId};
use crate::model::field::FieldKind;
use crate::model::open_hours::is_well_formed_time;
use crate::model::schema::{
    is_managed_field, RecordTypeSchema, FIELD_ADDRESS, FIELD_BRAND, FIELD_CITY, FIELD_DEVICE_TYPE,
    FIELD_DISTRICT, FIELD_FEE, FIELD_GPS_LAT, FIELD_GPS_LON,
};
use crate::model::weekday::{open_hours_field_name, HoursBound, WeekDay};
use crate::repo::atm_repo::{AtmRepository, RepoError};
use crate::repo::atm_type_repo::AtmTypeRepository;
use crate::service::atm_service::AtmService;
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const CSV_CONTENT_TYPE: &str = "text/csv";
const GENERIC_CONTENT_TYPES: [&str; 2] = ["application/octet-stream", "text/plain"];
const LATITUDE_LIMIT: f64 = 90.0;
const LONGITUDE_LIMIT: f64 = 180.0;

/// Uploaded file as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportUpload {
    pub file_name: String,
    /// MIME type reported by the client, if any.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImportUpload {
    /// Upload with content type inferred from the file name only.
    pub fn from_file_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Accepts `text/csv`, or a `.csv` name with a missing or generic type.
    pub fn is_csv(&self) -> bool {
        let content_type = self.content_type.as_deref().map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        });
        match content_type.as_deref() {
            Some(CSV_CONTENT_TYPE) => true,
            Some(other) if !other.is_empty() && !GENERIC_CONTENT_TYPES.contains(&other) => false,
            _ => self.file_name.to_ascii_lowercase().ends_with(".csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// ATM type every imported record belongs to.
    pub bundle: String,
}

/// File-level import failure; nothing was stored.
#[derive(Debug)]
pub enum ImportError {
    AccessDenied,
    UnknownBundle(String),
    UnsupportedFileType {
        file_name: String,
        content_type: Option<String>,
    },
    InvalidEncoding(String),
    Malformed(CsvError),
    UnknownColumn(String),
    DuplicateColumn(String),
    MissingColumn(String),
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied => write!(f, "not allowed to create atms"),
            Self::UnknownBundle(bundle) => write!(f, "unknown atm type: {bundle}"),
            Self::UnsupportedFileType {
                file_name,
                content_type,
            } => write!(
                f,
                "{file_name} is not a csv file (content type {})",
                content_type.as_deref().unwrap_or("unknown")
            ),
            Self::InvalidEncoding(details) => write!(f, "file is not valid UTF-8: {details}"),
            Self::Malformed(err) => write!(f, "{err}"),
            Self::UnknownColumn(name) => write!(f, "unknown column `{name}`"),
            Self::DuplicateColumn(name) => write!(f, "column `{name}` appears more than once"),
            Self::MissingColumn(name) => write!(f, "required column `{name}` is missing"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CsvError> for ImportError {
    fn from(value: CsvError) -> Self {
        Self::Malformed(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Why one row was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportValidationError {
    ColumnCount { expected: usize, actual: usize },
    Required { field: String },
    TooLong { field: String, max_length: u32 },
    InvalidCoordinate { field: String, value: String },
    InvalidTime { field: String, value: String },
    InvalidBoolean { field: String, value: String },
    /// Storage rejected a row that passed validation.
    Save(String),
}

impl Display for ImportValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnCount { expected, actual } => {
                write!(f, "expected {expected} values, got {actual}")
            }
            Self::Required { field } => write!(f, "{field} is required"),
            Self::TooLong { field, max_length } => {
                write!(f, "{field} exceeds max length {max_length}")
            }
            Self::InvalidCoordinate { field, value } => {
                write!(f, "{field} is not a valid coordinate: {value}")
            }
            Self::InvalidTime { field, value } => {
                write!(f, "{field} is not a HH:MM time: {value}")
            }
            Self::InvalidBoolean { field, value } => {
                write!(f, "{field} is not a yes/no value: {value}")
            }
            Self::Save(details) => write!(f, "could not save row: {details}"),
        }
    }
}

impl Error for ImportValidationError {}

/// Result of one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    /// Source line of the row.
    pub line: usize,
    pub result: Result<AtmId, Vec<ImportValidationError>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub outcomes: Vec<RowOutcome>,
}

impl ImportReport {
    pub fn created(&self) -> usize {
        self.outcomes.iter().filter(|row| row.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.created()
    }

    pub fn created_ids(&self) -> Vec<AtmId> {
        self.outcomes
            .iter()
            .filter_map(|row| row.result.as_ref().ok().copied())
            .collect()
    }
}

/// Imports CSV uploads into one ATM type.
pub struct AtmImporter<'a, R: AtmRepository, T: AtmTypeRepository> {
    service: AtmService<R>,
    types: T,
    schema: &'a RecordTypeSchema,
    policy: AtmAccessPolicy,
}

impl<'a, R: AtmRepository, T: AtmTypeRepository> AtmImporter<'a, R, T> {
    pub fn new(atms: R, types: T, schema: &'a RecordTypeSchema) -> Self {
        Self {
            service: AtmService::new(atms),
            types,
            schema,
            policy: AtmAccessPolicy::new(),
        }
    }

    /// Imports `upload` on behalf of `account`.
    ///
    /// # Errors
    /// - File-level problems return `ImportError` before any row is stored.
    /// - Row problems are reported inside `ImportReport`.
    pub fn import(
        &self,
        account: &impl AccountPermissions,
        upload: &ImportUpload,
        options: &ImportOptions,
    ) -> Result<ImportReport, ImportError> {
        let started_at = Instant::now();
        info!(
            "event=atm_import module=import status=start file={:?} bundle={} bytes={}",
            upload.file_name,
            options.bundle,
            upload.bytes.len()
        );

        let result = self.import_inner(account, upload, options);
        match &result {
            Ok(report) => info!(
                "event=atm_import module=import status=ok bundle={} rows={} created={} failed={} duration_ms={}",
                options.bundle,
                report.outcomes.len(),
                report.created(),
                report.failed(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=atm_import module=import status=error bundle={} duration_ms={} error={err}",
                options.bundle,
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn import_inner(
        &self,
        account: &impl AccountPermissions,
        upload: &ImportUpload,
        options: &ImportOptions,
    ) -> Result<ImportReport, ImportError> {
        let context = AccessContext {
            bundle: Some(options.bundle.clone()),
        };
        if !self
            .policy
            .check_create_access(account, &context)
            .is_allowed()
        {
            return Err(ImportError::AccessDenied);
        }
        if self.types.get_atm_type(&options.bundle)?.is_none() {
            return Err(ImportError::UnknownBundle(options.bundle.clone()));
        }
        if !upload.is_csv() {
            return Err(ImportError::UnsupportedFileType {
                file_name: upload.file_name.clone(),
                content_type: upload.content_type.clone(),
            });
        }

        let text = std::str::from_utf8(&upload.bytes)
            .map_err(|err| ImportError::InvalidEncoding(err.to_string()))?;
        let table = parse_csv(text.strip_prefix('\u{feff}').unwrap_or(text))?;
        let columns = self.check_header(&table.header)?;

        let mut report = ImportReport::default();
        for row in &table.rows {
            let result = self.import_row(account, &options.bundle, &columns, row);
            report.outcomes.push(RowOutcome {
                line: row.line,
                result,
            });
        }
        Ok(report)
    }

    fn check_header(&self, header: &[String]) -> Result<Vec<String>, ImportError> {
        let mut seen = BTreeSet::new();
        let mut columns = Vec::with_capacity(header.len());
        for raw in header {
            let name = raw.trim().to_string();
            if is_managed_field(&name) || !self.schema.contains(&name) {
                return Err(ImportError::UnknownColumn(name));
            }
            if !seen.insert(name.clone()) {
                return Err(ImportError::DuplicateColumn(name));
            }
            columns.push(name);
        }

        for (name, spec) in self.schema.iter() {
            if spec.required && !is_managed_field(name) && !seen.contains(name) {
                return Err(ImportError::MissingColumn(name.to_string()));
            }
        }
        Ok(columns)
    }

    fn import_row(
        &self,
        account: &impl AccountPermissions,
        bundle: &str,
        columns: &[String],
        row: &CsvRow,
    ) -> Result<AtmId, Vec<ImportValidationError>> {
        if row.values.len() != columns.len() {
            return Err(vec![ImportValidationError::ColumnCount {
                expected: columns.len(),
                actual: row.values.len(),
            }]);
        }

        let mut atm = Atm::new(bundle);
        let mut errors = Vec::new();
        for (name, raw) in columns.iter().zip(&row.values) {
            match self.validate_value(name, raw.trim()) {
                Ok(value) => apply_value(&mut atm, name, value),
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        self.service
            .create_atm(account, &mut atm)
            .map_err(|err| vec![ImportValidationError::Save(err.to_string())])?;
        atm.id()
            .ok_or_else(|| vec![ImportValidationError::Save("no id assigned".to_string())])
    }

    fn validate_value(
        &self,
        name: &str,
        value: &str,
    ) -> Result<ImportedValue, ImportValidationError> {
        let Some(spec) = self.schema.get(name) else {
            return Ok(ImportedValue::Text(None));
        };

        if value.is_empty() {
            if spec.required {
                return Err(ImportValidationError::Required {
                    field: name.to_string(),
                });
            }
            return Ok(match spec.kind {
                FieldKind::Boolean => ImportedValue::Flag(Some(false)),
                _ => ImportedValue::Text(None),
            });
        }

        match spec.kind {
            FieldKind::Boolean => parse_flag(value)
                .map(|flag| ImportedValue::Flag(Some(flag)))
                .ok_or_else(|| ImportValidationError::InvalidBoolean {
                    field: name.to_string(),
                    value: value.to_string(),
                }),
            FieldKind::Decimal => {
                let (precision, scale) = spec.decimal_precision().unwrap_or_default();
                if is_decimal_within(value, precision, scale)
                    && is_coordinate_in_range(name, value)
                {
                    Ok(ImportedValue::Text(Some(value.to_string())))
                } else {
                    Err(ImportValidationError::InvalidCoordinate {
                        field: name.to_string(),
                        value: value.to_string(),
                    })
                }
            }
            _ => {
                if let Some(max_length) = spec.max_length() {
                    if value.chars().count() > max_length as usize {
                        return Err(ImportValidationError::TooLong {
                            field: name.to_string(),
                            max_length,
                        });
                    }
                }
                if name.starts_with("open_hours_") && !is_well_formed_time(value) {
                    return Err(ImportValidationError::InvalidTime {
                        field: name.to_string(),
                        value: value.to_string(),
                    });
                }
                Ok(ImportedValue::Text(Some(value.to_string())))
            }
        }
    }
}

enum ImportedValue {
    Text(Option<String>),
    Flag(Option<bool>),
}

fn apply_value(atm: &mut Atm, name: &str, value: ImportedValue) {
    let text = match value {
        ImportedValue::Flag(flag) => {
            if name == FIELD_FEE {
                atm.set_fee(flag);
            }
            return;
        }
        ImportedValue::Text(text) => text,
    };

    match name {
        FIELD_DEVICE_TYPE => atm.set_device_type(text),
        FIELD_CITY => atm.set_city(text),
        FIELD_ADDRESS => atm.set_address(text),
        FIELD_DISTRICT => atm.set_district(text),
        FIELD_GPS_LAT => atm.set_latitude(text),
        FIELD_GPS_LON => atm.set_longitude(text),
        FIELD_BRAND => atm.set_brand(text),
        other => {
            for day in WeekDay::ALL {
                for bound in HoursBound::BOTH {
                    if open_hours_field_name(day, bound) == other {
                        atm.set_open_hours_bound(day, bound, text);
                        return;
                    }
                }
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn is_coordinate_in_range(name: &str, value: &str) -> bool {
    let limit = match name {
        FIELD_GPS_LAT => LATITUDE_LIMIT,
        FIELD_GPS_LON => LONGITUDE_LIMIT,
        _ => return true,
    };
    value
        .parse::<f64>()
        .map(|number| number.abs() <= limit)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{parse_flag, ImportUpload};

    fn upload(file_name: &str, content_type: Option<&str>) -> ImportUpload {
        ImportUpload {
            file_name: file_name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Vec::new(),
        }
    }

    #[test]
    fn csv_content_type_is_accepted_regardless_of_name() {
        assert!(upload("atms.txt", Some("text/csv")).is_csv());
        assert!(upload("atms", Some("Text/CSV; charset=utf-8")).is_csv());
    }

    #[test]
    fn generic_content_type_falls_back_to_extension() {
        assert!(upload("atms.CSV", None).is_csv());
        assert!(upload("atms.csv", Some("application/octet-stream")).is_csv());
        assert!(!upload("atms.xlsx", Some("application/octet-stream")).is_csv());
    }

    #[test]
    fn specific_non_csv_content_type_is_rejected() {
        assert!(!upload("atms.csv", Some("application/pdf")).is_csv());
    }

    #[test]
    fn flag_values() {
        for value in ["1", "true", "YES"] {
            assert_eq!(parse_flag(value), Some(true));
        }
        for value in ["0", "False", "no"] {
            assert_eq!(parse_flag(value), Some(false));
        }
        assert_eq!(parse_flag("maybe"), None);
    }
}
