//! ATM record model.
//!
//! # Responsibility
//! - Hold one ATM record: identity, bundle, ownership, change tracking and
//!   typed domain values.
//! - Expose never-null typed accessors and per-day open hours.
//! - Run the pre-save hook (owner default, timestamps).
//!
//! # Invariants
//! - String accessors return `""` for unset values.
//! - Open hours are stored in a table indexed by `WeekDay`, one
//!   `from`/`to` pair per day.
//! - A record without an owner is owned by the anonymous user (id 0) after
//!   `pre_save`; an owned record keeps its owner.

use crate::model::field::{DEFAULT_DECIMAL_PRECISION, DEFAULT_MAX_LENGTH};
use crate::model::open_hours::OpenHours;
use crate::model::schema::{
    FIELD_ADDRESS, FIELD_BRAND, FIELD_CHANGED, FIELD_CITY, FIELD_CREATED, FIELD_DEVICE_TYPE,
    FIELD_DISTRICT, FIELD_FEE, FIELD_GPS_LAT, FIELD_GPS_LON, FIELD_OWNER, FIELD_STATUS,
    GPS_SCALE, OPEN_HOURS_MAX_LENGTH,
};
use crate::model::weekday::{open_hours_field_name, parse_weekday, HoursBound, WeekDay};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Storage id of a persisted ATM record.
pub type AtmId = i64;

/// User account id.
pub type UserId = u64;

/// Id of the anonymous user.
pub const ANONYMOUS_USER_ID: UserId = 0;

/// Record owner bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnershipInfo {
    pub owner_id: Option<UserId>,
}

/// Creation/last-change timestamps in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeTracking {
    pub created: Option<i64>,
    pub changed: Option<i64>,
}

/// Records that have an owning user.
pub trait Ownable {
    fn owner_id(&self) -> Option<UserId>;
    fn set_owner_id(&mut self, owner_id: UserId);
}

/// Records that track creation and last-change time.
pub trait TimestampTracked {
    fn created_time(&self) -> Option<i64>;
    fn changed_time(&self) -> Option<i64>;
    fn set_changed_time(&mut self, epoch_ms: i64);
}

/// Stored `from`/`to` values of one day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayHours {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DayHours {
    pub fn get(&self, bound: HoursBound) -> Option<&str> {
        match bound {
            HoursBound::From => self.from.as_deref(),
            HoursBound::To => self.to.as_deref(),
        }
    }

    fn slot_mut(&mut self, bound: HoursBound) -> &mut Option<String> {
        match bound {
            HoursBound::From => &mut self.from,
            HoursBound::To => &mut self.to,
        }
    }
}

/// Open hours of a whole week, indexed by `WeekDay`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeeklyOpenHours {
    days: [DayHours; 7],
}

impl WeeklyOpenHours {
    pub fn day(&self, day: WeekDay) -> &DayHours {
        &self.days[day.index()]
    }

    pub fn set(&mut self, day: WeekDay, bound: HoursBound, value: Option<String>) {
        *self.days[day.index()].slot_mut(bound) = value;
    }
}

/// One ATM record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atm {
    id: Option<AtmId>,
    uuid: Uuid,
    bundle: String,
    status: bool,
    ownership: OwnershipInfo,
    timestamps: ChangeTracking,
    device_type: Option<String>,
    city: Option<String>,
    address: Option<String>,
    district: Option<String>,
    gps_lat: Option<String>,
    gps_lon: Option<String>,
    brand: Option<String>,
    fee: Option<bool>,
    open_hours: WeeklyOpenHours,
}

impl Atm {
    /// Creates an unsaved, enabled record of `bundle` with a fresh uuid.
    pub fn new(bundle: impl Into<String>) -> Self {
        Self::with_uuid(Uuid::new_v4(), bundle)
    }

    /// Creates an unsaved record with a caller-provided uuid.
    pub fn with_uuid(uuid: Uuid, bundle: impl Into<String>) -> Self {
        Self {
            id: None,
            uuid,
            bundle: bundle.into(),
            status: true,
            ownership: OwnershipInfo::default(),
            timestamps: ChangeTracking::default(),
            device_type: None,
            city: None,
            address: None,
            district: None,
            gps_lat: None,
            gps_lon: None,
            brand: None,
            fee: None,
            open_hours: WeeklyOpenHours::default(),
        }
    }

    /// Default owner for new records: the anonymous user.
    pub fn default_owner() -> UserId {
        ANONYMOUS_USER_ID
    }

    pub fn id(&self) -> Option<AtmId> {
        self.id
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    pub fn is_enabled(&self) -> bool {
        self.status
    }

    /// Human-readable label used by listings.
    pub fn label(&self) -> &str {
        self.address()
    }

    pub fn device_type(&self) -> &str {
        self.device_type.as_deref().unwrap_or_default()
    }

    pub fn city(&self) -> &str {
        self.city.as_deref().unwrap_or_default()
    }

    pub fn address(&self) -> &str {
        self.address.as_deref().unwrap_or_default()
    }

    pub fn district(&self) -> &str {
        self.district.as_deref().unwrap_or_default()
    }

    /// GPS latitude as decimal text.
    pub fn latitude(&self) -> &str {
        self.gps_lat.as_deref().unwrap_or_default()
    }

    /// GPS longitude as decimal text.
    pub fn longitude(&self) -> &str {
        self.gps_lon.as_deref().unwrap_or_default()
    }

    pub fn brand(&self) -> &str {
        self.brand.as_deref().unwrap_or_default()
    }

    /// True if a fee is applied for using the ATM.
    pub fn is_fee(&self) -> bool {
        self.fee.unwrap_or(false)
    }

    /// Raw fee value; `None` when never set.
    pub fn fee_setting(&self) -> Option<bool> {
        self.fee
    }

    pub fn open_hours_for(&self, day: WeekDay) -> OpenHours {
        let hours = self.open_hours.day(day);
        OpenHours::new(
            hours.get(HoursBound::From).unwrap_or_default(),
            hours.get(HoursBound::To).unwrap_or_default(),
        )
    }

    pub fn open_hours(&self) -> &WeeklyOpenHours {
        &self.open_hours
    }

    pub fn set_bundle(&mut self, bundle: impl Into<String>) {
        self.bundle = bundle.into();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.status = enabled;
    }

    pub fn set_device_type(&mut self, value: Option<String>) {
        self.device_type = value;
    }

    pub fn set_city(&mut self, value: Option<String>) {
        self.city = value;
    }

    pub fn set_address(&mut self, value: Option<String>) {
        self.address = value;
    }

    pub fn set_district(&mut self, value: Option<String>) {
        self.district = value;
    }

    pub fn set_latitude(&mut self, value: Option<String>) {
        self.gps_lat = value;
    }

    pub fn set_longitude(&mut self, value: Option<String>) {
        self.gps_lon = value;
    }

    pub fn set_brand(&mut self, value: Option<String>) {
        self.brand = value;
    }

    pub fn set_fee(&mut self, value: Option<bool>) {
        self.fee = value;
    }

    pub fn set_open_hours(&mut self, day: WeekDay, from: Option<String>, to: Option<String>) {
        self.open_hours.set(day, HoursBound::From, from);
        self.open_hours.set(day, HoursBound::To, to);
    }

    pub fn set_open_hours_bound(&mut self, day: WeekDay, bound: HoursBound, value: Option<String>) {
        self.open_hours.set(day, bound, value);
    }

    /// Assigns the storage id after insert. Used by repositories only.
    pub(crate) fn assign_id(&mut self, id: AtmId) {
        self.id = Some(id);
    }

    pub(crate) fn set_created_time(&mut self, epoch_ms: Option<i64>) {
        self.timestamps.created = epoch_ms;
    }

    /// Pre-persist hook.
    ///
    /// # Side effects
    /// - Owner defaults to the anonymous user when unset or zero.
    /// - `created` is stamped on first save; `changed` on every save.
    pub fn pre_save(&mut self, now_epoch_ms: i64) {
        if self.ownership.owner_id.unwrap_or(ANONYMOUS_USER_ID) == ANONYMOUS_USER_ID {
            self.ownership.owner_id = Some(Self::default_owner());
        }
        if self.timestamps.created.is_none() {
            self.timestamps.created = Some(now_epoch_ms);
        }
        self.timestamps.changed = Some(now_epoch_ms);
    }

    /// Generic read access keyed by schema field name.
    ///
    /// Returns `None` for names the record type does not define. Unset
    /// values read as empty text, `fee` as `"0"`/`"1"`.
    pub fn field_value(&self, name: &str) -> Option<String> {
        let value = match name {
            FIELD_STATUS => bool_text(self.status),
            FIELD_OWNER => self
                .ownership
                .owner_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            FIELD_CREATED => optional_number_text(self.timestamps.created),
            FIELD_CHANGED => optional_number_text(self.timestamps.changed),
            FIELD_DEVICE_TYPE => self.device_type().to_string(),
            FIELD_CITY => self.city().to_string(),
            FIELD_ADDRESS => self.address().to_string(),
            FIELD_DISTRICT => self.district().to_string(),
            FIELD_GPS_LAT => self.latitude().to_string(),
            FIELD_GPS_LON => self.longitude().to_string(),
            FIELD_BRAND => self.brand().to_string(),
            FIELD_FEE => bool_text(self.is_fee()),
            other => {
                let (day, bound) = parse_open_hours_field(other)?;
                self.open_hours
                    .day(day)
                    .get(bound)
                    .unwrap_or_default()
                    .to_string()
            }
        };
        Some(value)
    }

    /// Validates storage constraints before persistence.
    pub fn validate(&self) -> Result<(), AtmValidationError> {
        if self.bundle.trim().is_empty() {
            return Err(AtmValidationError::EmptyBundle);
        }

        for (field, value) in [
            (FIELD_DEVICE_TYPE, &self.device_type),
            (FIELD_CITY, &self.city),
            (FIELD_ADDRESS, &self.address),
            (FIELD_DISTRICT, &self.district),
            (FIELD_BRAND, &self.brand),
        ] {
            check_length(field, value.as_deref(), DEFAULT_MAX_LENGTH)?;
        }

        for day in WeekDay::ALL {
            for bound in HoursBound::BOTH {
                let value = self.open_hours.day(day).get(bound);
                if let Some(text) = value {
                    if text.chars().count() > OPEN_HOURS_MAX_LENGTH as usize {
                        return Err(AtmValidationError::TooLong {
                            field: open_hours_field_name(day, bound),
                            max_length: OPEN_HOURS_MAX_LENGTH,
                        });
                    }
                }
            }
        }

        for (field, value) in [(FIELD_GPS_LAT, &self.gps_lat), (FIELD_GPS_LON, &self.gps_lon)] {
            if let Some(text) = value.as_deref() {
                if !is_decimal_within(text, DEFAULT_DECIMAL_PRECISION, GPS_SCALE) {
                    return Err(AtmValidationError::InvalidDecimal {
                        field: field.to_string(),
                        value: text.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Ownable for Atm {
    fn owner_id(&self) -> Option<UserId> {
        self.ownership.owner_id
    }

    fn set_owner_id(&mut self, owner_id: UserId) {
        self.ownership.owner_id = Some(owner_id);
    }
}

impl TimestampTracked for Atm {
    fn created_time(&self) -> Option<i64> {
        self.timestamps.created
    }

    fn changed_time(&self) -> Option<i64> {
        self.timestamps.changed
    }

    fn set_changed_time(&mut self, epoch_ms: i64) {
        self.timestamps.changed = Some(epoch_ms);
    }
}

/// Returns whether `value` is a plain decimal with at most `precision`
/// digits overall and `scale` digits after the point.
pub fn is_decimal_within(value: &str, precision: u32, scale: u32) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (unsigned, ""),
    };

    if integer.is_empty() || !integer.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if unsigned.ends_with('.') {
        return false;
    }

    let integer_digits = integer.trim_start_matches('0').len().max(1);
    fraction.len() <= scale as usize && integer_digits + fraction.len() <= precision as usize
}

fn parse_open_hours_field(name: &str) -> Option<(WeekDay, HoursBound)> {
    let rest = name.strip_prefix("open_hours_")?;
    let (day, bound) = rest.rsplit_once('_')?;
    let bound = match bound {
        "from" => HoursBound::From,
        "to" => HoursBound::To,
        _ => return None,
    };
    Some((parse_weekday(day)?, bound))
}

fn check_length(
    field: &str,
    value: Option<&str>,
    max_length: u32,
) -> Result<(), AtmValidationError> {
    match value {
        Some(text) if text.chars().count() > max_length as usize => {
            Err(AtmValidationError::TooLong {
                field: field.to_string(),
                max_length,
            })
        }
        _ => Ok(()),
    }
}

fn bool_text(value: bool) -> String {
    let text = if value { "1" } else { "0" };
    text.to_string()
}

fn optional_number_text(value: Option<i64>) -> String {
    value.map(|number| number.to_string()).unwrap_or_default()
}

/// Storage constraint violations of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtmValidationError {
    EmptyBundle,
    TooLong { field: String, max_length: u32 },
    InvalidDecimal { field: String, value: String },
}

impl Display for AtmValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBundle => write!(f, "atm bundle must not be empty"),
            Self::TooLong { field, max_length } => {
                write!(f, "{field} exceeds max length {max_length}")
            }
            Self::InvalidDecimal { field, value } => {
                write!(f, "{field} is not a valid coordinate decimal: {value}")
            }
        }
    }
}

impl Error for AtmValidationError {}
