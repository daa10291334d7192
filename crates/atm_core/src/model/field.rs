//! Field specifications and reusable field builders.
//!
//! # Responsibility
//! - Describe one record attribute: kind, constraints, default value and
//!   presentation hints for form/view renderers.
//! - Provide pure builder functions that reproduce the canonical defaults of
//!   each field kind.
//!
//! # Invariants
//! - Builders are deterministic: equal params produce equal specs.
//! - Every builder sets both a form and a view hint. Only computed kinds
//!   (`changed`) may lack them.
//! - Builders reject nonsensical params (zero lengths, `scale > precision`,
//!   empty allowed-values) with `FieldSpecError::InvalidParameter`.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::BitOr;

pub const DEFAULT_MAX_LENGTH: u32 = 255;
pub const DEFAULT_DECIMAL_PRECISION: u32 = 10;
pub const DEFAULT_DECIMAL_SCALE: u32 = 2;
pub const DEFAULT_BOOLEAN_FORMAT: &str = "yes-no";

/// Storage/behavior kind of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    ShortText,
    LongText,
    Timestamp,
    Boolean,
    Decimal,
    EnumeratedList,
    Color,
    Image,
    Link,
    EntityReference,
    Created,
    Changed,
}

impl FieldKind {
    pub const ALL: [FieldKind; 12] = [
        FieldKind::ShortText,
        FieldKind::LongText,
        FieldKind::Timestamp,
        FieldKind::Boolean,
        FieldKind::Decimal,
        FieldKind::EnumeratedList,
        FieldKind::Color,
        FieldKind::Image,
        FieldKind::Link,
        FieldKind::EntityReference,
        FieldKind::Created,
        FieldKind::Changed,
    ];

    /// Stable type name used by field type registries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShortText => "string",
            Self::LongText => "text_long",
            Self::Timestamp => "timestamp",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::EnumeratedList => "list_string",
            Self::Color => "color_field_type",
            Self::Image => "image",
            Self::Link => "link",
            Self::EntityReference => "entity_reference",
            Self::Created => "created",
            Self::Changed => "changed",
        }
    }

    /// Computed kinds are maintained by storage and never edited in forms.
    pub fn is_computed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

/// Parses a field type name.
pub fn parse_field_kind(value: &str) -> Result<FieldKind, FieldSpecError> {
    FieldKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == value)
        .ok_or_else(|| FieldSpecError::UnknownKind(value.to_string()))
}

/// Number of values a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    Limited(u32),
    Unlimited,
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::Limited(1)
    }
}

/// Accepted link targets, as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LinkType(u8);

impl LinkType {
    pub const INTERNAL: LinkType = LinkType(0x01);
    pub const EXTERNAL: LinkType = LinkType(0x10);
    pub const GENERIC: LinkType = LinkType(0x11);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: LinkType) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 & Self::GENERIC.0 == 0
    }
}

impl BitOr for LinkType {
    type Output = LinkType;

    fn bitor(self, rhs: Self) -> Self::Output {
        LinkType(self.0 | rhs.0)
    }
}

/// Whether a link field collects a link title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTitle {
    Disabled,
    Optional,
    Required,
}

/// Kind-specific settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSettings {
    None,
    Text {
        max_length: u32,
    },
    Boolean {
        on_label: Option<String>,
    },
    Decimal {
        precision: u32,
        scale: u32,
    },
    List {
        /// Ordered `(key, label)` pairs.
        allowed_values: Vec<(String, String)>,
    },
    Color {
        opacity: bool,
    },
    Link {
        link_type: LinkType,
        title: LinkTitle,
    },
    EntityReference {
        target_type: String,
    },
}

impl FieldSettings {
    fn defaults_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::ShortText | FieldKind::LongText => Self::Text {
                max_length: DEFAULT_MAX_LENGTH,
            },
            FieldKind::Boolean => Self::Boolean { on_label: None },
            FieldKind::Decimal => Self::Decimal {
                precision: DEFAULT_DECIMAL_PRECISION,
                scale: DEFAULT_DECIMAL_SCALE,
            },
            FieldKind::EnumeratedList => Self::List {
                allowed_values: Vec::new(),
            },
            FieldKind::Color => Self::Color { opacity: false },
            FieldKind::Link => Self::Link {
                link_type: LinkType::GENERIC,
                title: LinkTitle::Optional,
            },
            FieldKind::EntityReference => Self::EntityReference {
                target_type: String::new(),
            },
            FieldKind::Timestamp | FieldKind::Image | FieldKind::Created | FieldKind::Changed => {
                Self::None
            }
        }
    }
}

/// Typed default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Boolean(bool),
    /// Decimal kept in its canonical text form.
    Decimal(String),
}

/// Where a renderer places the field label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPosition {
    Above,
    Inline,
    Hidden,
}

/// Widget (form) or formatter (view) hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayHint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelPosition>,
    pub weight: i32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, String>,
}

impl DisplayHint {
    pub fn new(kind: impl Into<String>, weight: i32) -> Self {
        Self {
            kind: kind.into(),
            label: None,
            weight,
            settings: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, position: LabelPosition) -> Self {
        self.label = Some(position);
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

/// Schema description of one record attribute.
///
/// Built once per record-type definition and treated as immutable after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub revisionable: bool,
    pub translatable: bool,
    pub cardinality: Cardinality,
    pub settings: FieldSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    /// Name of a host callback computing the default at creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value_callback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_display: Option<DisplayHint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_display: Option<DisplayHint>,
    pub form_configurable: bool,
    pub view_configurable: bool,
}

impl FieldSpec {
    /// Unconfigured spec of `kind`, as a field type registry hands it out.
    pub fn blank(kind: FieldKind) -> Self {
        Self {
            kind,
            label: String::new(),
            description: None,
            required: false,
            revisionable: false,
            translatable: false,
            cardinality: Cardinality::default(),
            settings: FieldSettings::defaults_for(kind),
            default_value: None,
            default_value_callback: None,
            form_display: None,
            view_display: None,
            form_configurable: false,
            view_configurable: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_revisionable(mut self, revisionable: bool) -> Self {
        self.revisionable = revisionable;
        self
    }

    pub fn with_translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn with_settings(mut self, settings: FieldSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_default_value(mut self, value: Option<FieldValue>) -> Self {
        self.default_value = value;
        self
    }

    pub fn with_default_value_callback(mut self, callback: impl Into<String>) -> Self {
        self.default_value_callback = Some(callback.into());
        self
    }

    /// Sets the form widget and marks the form display configurable.
    pub fn with_form_display(mut self, hint: DisplayHint) -> Self {
        self.form_display = Some(hint);
        self.form_configurable = true;
        self
    }

    /// Sets the view formatter and marks the view display configurable.
    pub fn with_view_display(mut self, hint: DisplayHint) -> Self {
        self.view_display = Some(hint);
        self.view_configurable = true;
        self
    }

    pub fn with_form_configurable(mut self, configurable: bool) -> Self {
        self.form_configurable = configurable;
        self
    }

    pub fn with_view_configurable(mut self, configurable: bool) -> Self {
        self.view_configurable = configurable;
        self
    }

    /// Maximum text length for text kinds.
    pub fn max_length(&self) -> Option<u32> {
        match self.settings {
            FieldSettings::Text { max_length } => Some(max_length),
            _ => None,
        }
    }

    /// `(precision, scale)` for decimal kinds.
    pub fn decimal_precision(&self) -> Option<(u32, u32)> {
        match self.settings {
            FieldSettings::Decimal { precision, scale } => Some((precision, scale)),
            _ => None,
        }
    }

    /// True when the spec carries the presentation hints its kind needs.
    pub fn has_presentation_hints(&self) -> bool {
        self.kind.is_computed() || (self.form_display.is_some() && self.view_display.is_some())
    }
}

/// Params for [`build_string_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringFieldParams {
    /// Defaults to `"Label"`.
    pub label: Option<String>,
    pub max_length: u32,
    pub revisionable: bool,
    pub translatable: bool,
    pub required: bool,
    pub description: Option<String>,
}

impl Default for StringFieldParams {
    fn default() -> Self {
        Self {
            label: None,
            max_length: DEFAULT_MAX_LENGTH,
            revisionable: true,
            translatable: true,
            required: true,
            description: None,
        }
    }
}

/// Builds a short single-line text field.
pub fn build_string_field(params: StringFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(params.label, "Label")?;
    ensure_positive("max_length", params.max_length)?;

    Ok(FieldSpec::blank(FieldKind::ShortText)
        .with_revisionable(params.revisionable)
        .with_translatable(params.translatable)
        .with_label(label)
        .with_description(params.description)
        .with_settings(FieldSettings::Text {
            max_length: params.max_length,
        })
        .with_required(params.required)
        .with_form_display(DisplayHint::new("string_textfield", -5))
        .with_view_display(DisplayHint::new("string", -5).with_label(LabelPosition::Hidden)))
}

/// Params for [`build_text_long_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLongFieldParams {
    /// Defaults to `"Description"`.
    pub label: Option<String>,
    pub max_length: u32,
    pub revisionable: bool,
    pub translatable: bool,
    pub required: bool,
    pub description: Option<String>,
}

impl Default for TextLongFieldParams {
    fn default() -> Self {
        Self {
            label: None,
            max_length: DEFAULT_MAX_LENGTH,
            revisionable: true,
            translatable: true,
            required: false,
            description: None,
        }
    }
}

/// Builds a multi-line formatted text field.
pub fn build_text_long_field(params: TextLongFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(params.label, "Description")?;
    ensure_positive("max_length", params.max_length)?;

    Ok(FieldSpec::blank(FieldKind::LongText)
        .with_revisionable(params.revisionable)
        .with_translatable(params.translatable)
        .with_settings(FieldSettings::Text {
            max_length: params.max_length,
        })
        .with_label(label)
        .with_form_display(DisplayHint::new("text_textarea", 10))
        .with_view_display(DisplayHint::new("text_default", 10).with_label(LabelPosition::Above))
        .with_required(params.required)
        .with_description(params.description))
}

/// Params for [`build_timestamp_field`]. Label and description are mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFieldParams {
    pub label: String,
    pub description: String,
    pub required: bool,
    pub revisionable: bool,
    pub translatable: bool,
}

impl TimestampFieldParams {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            required: true,
            revisionable: true,
            translatable: false,
        }
    }
}

pub fn build_timestamp_field(params: TimestampFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(Some(params.label), "")?;

    Ok(FieldSpec::blank(FieldKind::Timestamp)
        .with_label(label)
        .with_translatable(params.translatable)
        .with_required(params.required)
        .with_revisionable(params.revisionable)
        .with_description(Some(params.description))
        .with_view_display(DisplayHint::new("timestamp", 20).with_label(LabelPosition::Above))
        .with_form_display(DisplayHint::new("datetime_timestamp", 20)))
}

/// Params for [`build_boolean_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanFieldParams {
    pub label: String,
    pub default_value: bool,
    pub revisionable: bool,
    /// Show the label next to the checkbox.
    pub display_label: bool,
    /// View formatter format, e.g. `yes-no` or `enabled-disabled`.
    pub format: String,
    pub description: Option<String>,
    pub on_label: Option<String>,
}

impl BooleanFieldParams {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            default_value: false,
            revisionable: true,
            display_label: true,
            format: DEFAULT_BOOLEAN_FORMAT.to_string(),
            description: None,
            on_label: None,
        }
    }
}

pub fn build_boolean_field(params: BooleanFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(Some(params.label), "")?;
    if params.format.trim().is_empty() {
        return Err(FieldSpecError::invalid("format", "must not be empty"));
    }

    Ok(FieldSpec::blank(FieldKind::Boolean)
        .with_revisionable(params.revisionable)
        .with_label(label)
        .with_description(params.description)
        .with_default_value(Some(FieldValue::Boolean(params.default_value)))
        .with_settings(FieldSettings::Boolean {
            on_label: params.on_label.filter(|value| !value.is_empty()),
        })
        .with_form_display(
            DisplayHint::new("boolean_checkbox", 0)
                .with_setting("display_label", params.display_label.to_string()),
        )
        .with_view_display(
            DisplayHint::new("boolean", 0)
                .with_label(LabelPosition::Above)
                .with_setting("format", params.format),
        ))
}

/// Params for [`build_decimal_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalFieldParams {
    pub label: String,
    /// Digits after the decimal point.
    pub scale: u32,
    /// Digits stored overall.
    pub precision: u32,
    pub revisionable: bool,
    pub required: bool,
}

impl DecimalFieldParams {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            scale: DEFAULT_DECIMAL_SCALE,
            precision: DEFAULT_DECIMAL_PRECISION,
            revisionable: true,
            required: true,
        }
    }
}

pub fn build_decimal_field(params: DecimalFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(Some(params.label), "")?;
    ensure_positive("precision", params.precision)?;
    if params.scale > params.precision {
        return Err(FieldSpecError::invalid(
            "scale",
            format!(
                "scale {} exceeds precision {}",
                params.scale, params.precision
            ),
        ));
    }

    Ok(FieldSpec::blank(FieldKind::Decimal)
        .with_label(label)
        .with_required(params.required)
        .with_settings(FieldSettings::Decimal {
            precision: params.precision,
            scale: params.scale,
        })
        .with_revisionable(params.revisionable)
        .with_form_display(DisplayHint::new("number", 0))
        .with_view_display(DisplayHint::new("number_decimal", 0).with_label(LabelPosition::Above)))
}

/// Params for [`build_list_string_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListStringFieldParams {
    pub label: String,
    /// Ordered `(key, label)` pairs.
    pub allowed_values: Vec<(String, String)>,
    pub default_value: Option<String>,
    pub description: Option<String>,
    pub cardinality: Cardinality,
    pub revisionable: bool,
    pub required: bool,
}

impl ListStringFieldParams {
    pub fn new(label: impl Into<String>, allowed_values: Vec<(String, String)>) -> Self {
        Self {
            label: label.into(),
            allowed_values,
            default_value: None,
            description: None,
            cardinality: Cardinality::Limited(1),
            revisionable: true,
            required: true,
        }
    }
}

pub fn build_list_string_field(params: ListStringFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(Some(params.label), "")?;
    if params.allowed_values.is_empty() {
        return Err(FieldSpecError::invalid(
            "allowed_values",
            "must contain at least one value",
        ));
    }

    let mut keys = BTreeSet::new();
    for (key, _) in &params.allowed_values {
        if key.trim().is_empty() {
            return Err(FieldSpecError::invalid(
                "allowed_values",
                "keys must not be empty",
            ));
        }
        if !keys.insert(key.as_str()) {
            return Err(FieldSpecError::invalid(
                "allowed_values",
                format!("duplicate key `{key}`"),
            ));
        }
    }

    if let Some(default) = params.default_value.as_deref() {
        if !keys.contains(default) {
            return Err(FieldSpecError::invalid(
                "default_value",
                format!("`{default}` is not an allowed value"),
            ));
        }
    }

    if params.cardinality == Cardinality::Limited(0) {
        return Err(FieldSpecError::invalid("cardinality", "must be at least 1"));
    }

    Ok(FieldSpec::blank(FieldKind::EnumeratedList)
        .with_label(label)
        .with_description(params.description)
        .with_revisionable(params.revisionable)
        .with_settings(FieldSettings::List {
            allowed_values: params.allowed_values,
        })
        .with_cardinality(params.cardinality)
        .with_default_value(params.default_value.map(FieldValue::Text))
        .with_view_display(DisplayHint::new("list_default", -4).with_label(LabelPosition::Above))
        .with_form_display(DisplayHint::new("options_buttons", -4))
        .with_required(params.required))
}

/// Params for [`build_color_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorFieldParams {
    pub label: String,
    pub description: Option<String>,
    pub revisionable: bool,
    pub required: bool,
    pub translatable: bool,
    /// Collect an opacity value next to the color.
    pub opacity: bool,
}

impl ColorFieldParams {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            revisionable: true,
            required: true,
            translatable: false,
            opacity: false,
        }
    }
}

pub fn build_color_field(params: ColorFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(Some(params.label), "")?;

    Ok(FieldSpec::blank(FieldKind::Color)
        .with_revisionable(params.revisionable)
        .with_translatable(params.translatable)
        .with_label(label)
        .with_description(params.description)
        .with_required(params.required)
        .with_settings(FieldSettings::Color {
            opacity: params.opacity,
        })
        .with_form_display(DisplayHint::new("color_field_widget_html5", -5))
        .with_view_display(
            DisplayHint::new("color_field_formatter_swatch", -5).with_label(LabelPosition::Hidden),
        ))
}

/// Params for [`build_image_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFieldParams {
    pub label: String,
    pub revisionable: bool,
    pub translatable: bool,
    pub required: bool,
    pub description: Option<String>,
}

impl ImageFieldParams {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            revisionable: true,
            translatable: true,
            required: true,
            description: None,
        }
    }
}

pub fn build_image_field(params: ImageFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(Some(params.label), "")?;

    Ok(FieldSpec::blank(FieldKind::Image)
        .with_revisionable(params.revisionable)
        .with_translatable(params.translatable)
        .with_label(label)
        .with_description(params.description)
        .with_required(params.required)
        .with_form_display(DisplayHint::new("image_image", -5))
        .with_view_display(DisplayHint::new("image", -5).with_label(LabelPosition::Hidden)))
}

/// Params for [`build_link_field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFieldParams {
    pub label: String,
    pub description: Option<String>,
    pub revisionable: bool,
    pub translatable: bool,
    pub required: bool,
    pub link_type: LinkType,
}

impl LinkFieldParams {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            revisionable: true,
            translatable: true,
            required: true,
            link_type: LinkType::GENERIC,
        }
    }
}

/// Builds a link field with the link title disabled.
pub fn build_link_field(params: LinkFieldParams) -> Result<FieldSpec, FieldSpecError> {
    let label = resolve_label(Some(params.label), "")?;
    if params.link_type.is_empty() {
        return Err(FieldSpecError::invalid(
            "link_type",
            "must allow internal or external links",
        ));
    }

    Ok(FieldSpec::blank(FieldKind::Link)
        .with_label(label)
        .with_description(params.description)
        .with_required(params.required)
        .with_settings(FieldSettings::Link {
            link_type: params.link_type,
            title: LinkTitle::Disabled,
        })
        .with_form_display(DisplayHint::new("link_default", 0))
        .with_view_display(DisplayHint::new("link", 0).with_label(LabelPosition::Above))
        .with_revisionable(params.revisionable)
        .with_translatable(params.translatable))
}

fn resolve_label(label: Option<String>, fallback: &str) -> Result<String, FieldSpecError> {
    let label = label.unwrap_or_else(|| fallback.to_string());
    if label.trim().is_empty() {
        return Err(FieldSpecError::invalid("label", "must not be empty"));
    }
    Ok(label)
}

fn ensure_positive(parameter: &'static str, value: u32) -> Result<(), FieldSpecError> {
    if value == 0 {
        return Err(FieldSpecError::invalid(parameter, "must be greater than zero"));
    }
    Ok(())
}

/// Field construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpecError {
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
    UnknownKind(String),
}

impl FieldSpecError {
    fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

impl Display for FieldSpecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidParameter { parameter, reason } => {
                write!(f, "invalid field parameter `{parameter}`: {reason}")
            }
            Self::UnknownKind(value) => write!(f, "unknown field type: {value}"),
        }
    }
}

impl Error for FieldSpecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_field_defaults() {
        let spec = build_string_field(StringFieldParams::default()).unwrap();
        assert_eq!(spec.kind, FieldKind::ShortText);
        assert_eq!(spec.label, "Label");
        assert_eq!(spec.max_length(), Some(255));
        assert!(spec.required);
        assert!(spec.revisionable);
        assert!(spec.translatable);
        assert_eq!(spec.description, None);

        let form = spec.form_display.as_ref().unwrap();
        assert_eq!(form.kind, "string_textfield");
        assert_eq!(form.weight, -5);
        let view = spec.view_display.as_ref().unwrap();
        assert_eq!(view.kind, "string");
        assert_eq!(view.label, Some(LabelPosition::Hidden));
        assert!(spec.form_configurable && spec.view_configurable);
    }

    #[test]
    fn text_long_field_defaults_to_optional() {
        let spec = build_text_long_field(TextLongFieldParams::default()).unwrap();
        assert_eq!(spec.label, "Description");
        assert_eq!(spec.max_length(), Some(255));
        assert!(!spec.required);
        assert_eq!(spec.form_display.unwrap().weight, 10);
    }

    #[test]
    fn timestamp_field_defaults() {
        let spec =
            build_timestamp_field(TimestampFieldParams::new("Installed", "Install date")).unwrap();
        assert_eq!(spec.kind, FieldKind::Timestamp);
        assert!(spec.required);
        assert!(spec.revisionable);
        assert!(!spec.translatable);
        assert_eq!(spec.description.as_deref(), Some("Install date"));
        assert_eq!(spec.form_display.unwrap().kind, "datetime_timestamp");
    }

    #[test]
    fn boolean_field_defaults() {
        let spec = build_boolean_field(BooleanFieldParams::new("Fee")).unwrap();
        assert_eq!(spec.default_value, Some(FieldValue::Boolean(false)));
        assert_eq!(
            spec.view_display.as_ref().unwrap().settings.get("format"),
            Some(&"yes-no".to_string())
        );
        assert_eq!(
            spec.form_display.as_ref().unwrap().settings.get("display_label"),
            Some(&"true".to_string())
        );
        assert_eq!(spec.settings, FieldSettings::Boolean { on_label: None });
    }

    #[test]
    fn boolean_field_keeps_on_label() {
        let spec = build_boolean_field(BooleanFieldParams {
            on_label: Some("Enabled".to_string()),
            ..BooleanFieldParams::new("Status")
        })
        .unwrap();
        assert_eq!(
            spec.settings,
            FieldSettings::Boolean {
                on_label: Some("Enabled".to_string())
            }
        );
    }

    #[test]
    fn decimal_field_defaults_and_scale_override() {
        let spec = build_decimal_field(DecimalFieldParams::new("Amount")).unwrap();
        assert_eq!(spec.decimal_precision(), Some((10, 2)));
        assert!(spec.required);

        let spec = build_decimal_field(DecimalFieldParams {
            scale: 7,
            ..DecimalFieldParams::new("GPS latitude")
        })
        .unwrap();
        assert_eq!(spec.decimal_precision(), Some((10, 7)));
    }

    #[test]
    fn decimal_field_rejects_scale_above_precision() {
        let err = build_decimal_field(DecimalFieldParams {
            scale: 11,
            ..DecimalFieldParams::new("Broken")
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FieldSpecError::InvalidParameter {
                parameter: "scale",
                ..
            }
        ));
    }

    #[test]
    fn string_field_rejects_zero_length_and_blank_label() {
        let err = build_string_field(StringFieldParams {
            max_length: 0,
            ..StringFieldParams::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FieldSpecError::InvalidParameter {
                parameter: "max_length",
                ..
            }
        ));

        let err = build_string_field(StringFieldParams {
            label: Some("  ".to_string()),
            ..StringFieldParams::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FieldSpecError::InvalidParameter {
                parameter: "label",
                ..
            }
        ));
    }

    fn device_types() -> Vec<(String, String)> {
        vec![
            ("deposit".to_string(), "Deposit".to_string()),
            ("withdraw".to_string(), "Withdraw".to_string()),
        ]
    }

    #[test]
    fn list_field_carries_values_and_default() {
        let spec = build_list_string_field(ListStringFieldParams {
            default_value: Some("withdraw".to_string()),
            ..ListStringFieldParams::new("Device", device_types())
        })
        .unwrap();
        assert_eq!(spec.cardinality, Cardinality::Limited(1));
        assert_eq!(
            spec.default_value,
            Some(FieldValue::Text("withdraw".to_string()))
        );
        assert_eq!(spec.form_display.unwrap().kind, "options_buttons");
    }

    #[test]
    fn list_field_rejects_bad_inputs() {
        assert!(build_list_string_field(ListStringFieldParams::new("Device", vec![])).is_err());
        assert!(build_list_string_field(ListStringFieldParams {
            default_value: Some("teller".to_string()),
            ..ListStringFieldParams::new("Device", device_types())
        })
        .is_err());
        assert!(build_list_string_field(ListStringFieldParams {
            cardinality: Cardinality::Limited(0),
            ..ListStringFieldParams::new("Device", device_types())
        })
        .is_err());

        let mut duplicated = device_types();
        duplicated.push(("deposit".to_string(), "Again".to_string()));
        assert!(build_list_string_field(ListStringFieldParams::new("Device", duplicated)).is_err());
    }

    #[test]
    fn color_image_and_link_fields() {
        let color = build_color_field(ColorFieldParams::new("Brand color")).unwrap();
        assert_eq!(color.settings, FieldSettings::Color { opacity: false });
        assert!(!color.translatable);

        let image = build_image_field(ImageFieldParams::new("Photo")).unwrap();
        assert!(image.translatable && image.required);

        let link = build_link_field(LinkFieldParams::new("Website")).unwrap();
        assert_eq!(
            link.settings,
            FieldSettings::Link {
                link_type: LinkType::GENERIC,
                title: LinkTitle::Disabled,
            }
        );
        assert!(LinkType::GENERIC.contains(LinkType::INTERNAL | LinkType::EXTERNAL));

        let err = build_link_field(LinkFieldParams {
            link_type: LinkType::from_bits(0),
            ..LinkFieldParams::new("Website")
        })
        .unwrap_err();
        assert!(matches!(
            err,
            FieldSpecError::InvalidParameter {
                parameter: "link_type",
                ..
            }
        ));
    }

    #[test]
    fn every_builder_sets_form_and_view_hints() {
        let specs = vec![
            build_string_field(StringFieldParams::default()).unwrap(),
            build_text_long_field(TextLongFieldParams::default()).unwrap(),
            build_timestamp_field(TimestampFieldParams::new("T", "D")).unwrap(),
            build_boolean_field(BooleanFieldParams::new("B")).unwrap(),
            build_decimal_field(DecimalFieldParams::new("N")).unwrap(),
            build_list_string_field(ListStringFieldParams::new("L", device_types())).unwrap(),
            build_color_field(ColorFieldParams::new("C")).unwrap(),
            build_image_field(ImageFieldParams::new("I")).unwrap(),
            build_link_field(LinkFieldParams::new("U")).unwrap(),
        ];
        for spec in specs {
            assert!(spec.form_display.is_some(), "{:?} lacks form hint", spec.kind);
            assert!(spec.view_display.is_some(), "{:?} lacks view hint", spec.kind);
        }
    }

    #[test]
    fn builders_are_deterministic() {
        let params = StringFieldParams {
            label: Some("City".to_string()),
            revisionable: false,
            translatable: false,
            ..StringFieldParams::default()
        };
        assert_eq!(
            build_string_field(params.clone()).unwrap(),
            build_string_field(params).unwrap()
        );
        assert_eq!(
            build_decimal_field(DecimalFieldParams::new("X")).unwrap(),
            build_decimal_field(DecimalFieldParams::new("X")).unwrap()
        );
    }

    #[test]
    fn field_kind_names_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(parse_field_kind(kind.as_str()).unwrap(), kind);
        }
        assert_eq!(
            parse_field_kind("geofield").unwrap_err(),
            FieldSpecError::UnknownKind("geofield".to_string())
        );
    }
}
