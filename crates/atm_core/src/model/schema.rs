//! Record type schema assembly for the `atm` record type.
//!
//! # Responsibility
//! - Hold an ordered, name-unique mapping of field name → `FieldSpec`.
//! - Assemble the `atm` schema from framework-managed fields (produced by a
//!   `FieldTypeRegistry`) and domain fields (produced by field builders).
//!
//! # Invariants
//! - Field names are unique; `insert` rejects duplicates.
//! - Order is framework-managed fields, then domain fields, then one
//!   `from`/`to` pair per week day, monday → sunday.
//! - Only framework-managed fields are revisionable.
//! - The shared schema is assembled once and read-only afterwards.

use crate::model::field::{
    build_boolean_field, build_decimal_field, build_string_field, parse_field_kind,
    BooleanFieldParams, DecimalFieldParams, DisplayHint, FieldSettings, FieldSpec,
    FieldSpecError, FieldValue, LabelPosition, StringFieldParams,
};
use crate::model::weekday::{open_hours_field_name, HoursBound, WeekDay};
use log::info;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Entity type id of ATM records.
pub const ATM_ENTITY_TYPE: &str = "atm";

pub const FIELD_STATUS: &str = "status";
pub const FIELD_OWNER: &str = "uid";
pub const FIELD_CREATED: &str = "created";
pub const FIELD_CHANGED: &str = "changed";
pub const FIELD_DEVICE_TYPE: &str = "device_type";
pub const FIELD_CITY: &str = "city";
pub const FIELD_ADDRESS: &str = "address";
pub const FIELD_DISTRICT: &str = "district";
pub const FIELD_GPS_LAT: &str = "gps_lat";
pub const FIELD_GPS_LON: &str = "gps_lon";
pub const FIELD_BRAND: &str = "brand";
pub const FIELD_FEE: &str = "fee";

/// Max length of one `HH:MM` open-hours value.
pub const OPEN_HOURS_MAX_LENGTH: u32 = 5;
/// Digits after the decimal point for GPS coordinates.
pub const GPS_SCALE: u32 = 7;

const MANAGED_FIELDS: &[&str] = &[FIELD_STATUS, FIELD_OWNER, FIELD_CREATED, FIELD_CHANGED];

/// Default owner callback name recorded on the `uid` field.
pub const DEFAULT_OWNER_CALLBACK: &str = "Atm::default_owner";

static ATM_SCHEMA: OnceCell<RecordTypeSchema> = OnceCell::new();

/// Returns whether `name` is maintained by the hosting framework.
pub fn is_managed_field(name: &str) -> bool {
    MANAGED_FIELDS.contains(&name)
}

/// Host collaborator producing blank specs for field type names.
pub trait FieldTypeRegistry {
    fn create(&self, type_name: &str) -> Result<FieldSpec, SchemaError>;
}

/// In-process registry covering every `FieldKind`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFieldTypeRegistry;

impl FieldTypeRegistry for StandardFieldTypeRegistry {
    fn create(&self, type_name: &str) -> Result<FieldSpec, SchemaError> {
        Ok(FieldSpec::blank(parse_field_kind(type_name)?))
    }
}

/// Ordered field mapping of one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordTypeSchema {
    entity_type: String,
    fields: Vec<(String, FieldSpec)>,
}

impl RecordTypeSchema {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: Vec::new(),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Appends one field; names must be unique.
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) -> Result<(), SchemaError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(SchemaError::DuplicateField(name));
        }
        self.fields.push((name, spec));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, spec)| spec)
    }

    /// Like `get`, but a missing field is a `SchemaError::MissingField`.
    pub fn require(&self, name: &str) -> Result<&FieldSpec, SchemaError> {
        self.get(name)
            .ok_or_else(|| SchemaError::MissingField(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field specs holding the `from`/`to` bounds of `day`.
    pub fn open_hours_fields(&self, day: WeekDay) -> Result<(&FieldSpec, &FieldSpec), SchemaError> {
        let from = self.require(&open_hours_field_name(day, HoursBound::From))?;
        let to = self.require(&open_hours_field_name(day, HoursBound::To))?;
        Ok((from, to))
    }
}

/// Builds the complete `atm` schema.
pub fn atm_schema(registry: &impl FieldTypeRegistry) -> Result<RecordTypeSchema, SchemaError> {
    let mut schema = RecordTypeSchema::new(ATM_ENTITY_TYPE);

    for (name, spec) in managed_fields(registry)? {
        schema.insert(name, spec)?;
    }

    schema.insert(
        FIELD_DEVICE_TYPE,
        domain_string_field("ATM device type - deposit/withdraw", true)?,
    )?;
    schema.insert(FIELD_CITY, domain_string_field("City", true)?)?;
    schema.insert(FIELD_ADDRESS, domain_string_field("Address", true)?)?;
    schema.insert(FIELD_DISTRICT, domain_string_field("District", false)?)?;
    schema.insert(FIELD_GPS_LAT, gps_field("GPS latitude")?)?;
    schema.insert(FIELD_GPS_LON, gps_field("GPS longitude")?)?;
    schema.insert(FIELD_BRAND, domain_string_field("Brand", true)?)?;
    schema.insert(
        FIELD_FEE,
        build_boolean_field(BooleanFieldParams {
            revisionable: false,
            ..BooleanFieldParams::new("If fee will be applied")
        })?,
    )?;

    for day in WeekDay::ALL {
        for bound in HoursBound::BOTH {
            let label = format!("Open hours {} for {}", bound.as_str(), day.as_str());
            let spec = build_string_field(StringFieldParams {
                label: Some(label),
                max_length: OPEN_HOURS_MAX_LENGTH,
                revisionable: false,
                translatable: false,
                required: false,
                ..StringFieldParams::default()
            })?;
            schema.insert(open_hours_field_name(day, bound), spec)?;
        }
    }

    Ok(schema)
}

/// Process-wide `atm` schema built with `StandardFieldTypeRegistry`.
pub fn atm_schema_shared() -> Result<&'static RecordTypeSchema, SchemaError> {
    ATM_SCHEMA.get_or_try_init(|| {
        let schema = atm_schema(&StandardFieldTypeRegistry)?;
        info!(
            "event=schema_built module=model status=ok entity_type={} fields={}",
            schema.entity_type(),
            schema.len()
        );
        Ok(schema)
    })
}

fn managed_fields(
    registry: &impl FieldTypeRegistry,
) -> Result<Vec<(&'static str, FieldSpec)>, SchemaError> {
    let status = registry
        .create("boolean")?
        .with_revisionable(true)
        .with_label("Status")
        .with_default_value(Some(FieldValue::Boolean(true)))
        .with_settings(FieldSettings::Boolean {
            on_label: Some("Enabled".to_string()),
        })
        .with_form_display(
            DisplayHint::new("boolean_checkbox", 0).with_setting("display_label", "false"),
        )
        .with_view_display(
            DisplayHint::new("boolean", 0)
                .with_label(LabelPosition::Above)
                .with_setting("format", "enabled-disabled"),
        );

    let owner = registry
        .create("entity_reference")?
        .with_revisionable(true)
        .with_label("Author")
        .with_settings(FieldSettings::EntityReference {
            target_type: "user".to_string(),
        })
        .with_default_value_callback(DEFAULT_OWNER_CALLBACK)
        .with_form_display(
            DisplayHint::new("entity_reference_autocomplete", 15)
                .with_setting("match_operator", "CONTAINS")
                .with_setting("size", "60")
                .with_setting("placeholder", ""),
        )
        .with_view_display(DisplayHint::new("author", 15).with_label(LabelPosition::Above));

    let created = registry
        .create("created")?
        .with_label("Authored on")
        .with_description(Some("The time that the atm was created.".to_string()))
        .with_view_display(DisplayHint::new("timestamp", 20).with_label(LabelPosition::Above))
        .with_form_display(DisplayHint::new("datetime_timestamp", 20));

    let changed = registry
        .create("changed")?
        .with_label("Changed")
        .with_description(Some("The time that the atm was last edited.".to_string()));

    Ok(vec![
        (FIELD_STATUS, status),
        (FIELD_OWNER, owner),
        (FIELD_CREATED, created),
        (FIELD_CHANGED, changed),
    ])
}

fn domain_string_field(label: &str, required: bool) -> Result<FieldSpec, SchemaError> {
    Ok(build_string_field(StringFieldParams {
        label: Some(label.to_string()),
        revisionable: false,
        translatable: false,
        required,
        ..StringFieldParams::default()
    })?)
}

fn gps_field(label: &str) -> Result<FieldSpec, SchemaError> {
    Ok(build_decimal_field(DecimalFieldParams {
        scale: GPS_SCALE,
        revisionable: false,
        required: false,
        ..DecimalFieldParams::new(label)
    })?)
}

/// Schema assembly and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    Field(FieldSpecError),
    DuplicateField(String),
    /// An expected field is absent from the schema.
    MissingField(String),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(err) => write!(f, "{err}"),
            Self::DuplicateField(name) => write!(f, "field already defined: {name}"),
            Self::MissingField(name) => write!(f, "schema has no field named `{name}`"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Field(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FieldSpecError> for SchemaError {
    fn from(value: FieldSpecError) -> Self {
        Self::Field(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldKind;

    #[test]
    fn rejects_duplicate_field_names() {
        let mut schema = RecordTypeSchema::new("test");
        let spec = FieldSpec::blank(FieldKind::ShortText);
        schema.insert("name", spec.clone()).unwrap();
        let err = schema.insert("name", spec).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("name".to_string()));
    }

    #[test]
    fn missing_open_hours_fields_are_lookup_errors() {
        let schema = RecordTypeSchema::new("bare");
        let err = schema.open_hours_fields(WeekDay::Friday).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingField("open_hours_friday_from".to_string())
        );
    }

    #[test]
    fn standard_registry_rejects_unknown_type_names() {
        let err = StandardFieldTypeRegistry.create("geofield").unwrap_err();
        assert!(matches!(err, SchemaError::Field(FieldSpecError::UnknownKind(_))));
    }

    #[test]
    fn shared_schema_is_memoized() {
        let first = atm_schema_shared().unwrap();
        let second = atm_schema_shared().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn managed_field_names() {
        assert!(is_managed_field("uid"));
        assert!(!is_managed_field("city"));
    }
}
