//! Tabular listings of ATM types and ATM records.
//!
//! Listings are render-agnostic: a header, one row per item keyed by its
//! id, and the text shown when there are no rows.

use crate::model::atm::Atm;
use crate::model::atm_type::AtmType;
use serde::Serialize;

pub const ATM_TYPE_EMPTY_TEXT: &str = "No atm types available.";
pub const ATM_EMPTY_TEXT: &str = "No atms available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub id: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub header: Vec<String>,
    pub rows: Vec<ListingRow>,
    pub empty_text: String,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One `Label` column per ATM type.
pub fn build_atm_type_listing(types: &[AtmType]) -> Listing {
    Listing {
        header: vec!["Label".to_string()],
        rows: types
            .iter()
            .map(|atm_type| ListingRow {
                id: atm_type.id.clone(),
                cells: vec![atm_type.label.clone()],
            })
            .collect(),
        empty_text: ATM_TYPE_EMPTY_TEXT.to_string(),
    }
}

/// Label, city, brand and status columns per record. Unsaved records are
/// skipped.
pub fn build_atm_listing(atms: &[Atm]) -> Listing {
    Listing {
        header: ["Label", "City", "Brand", "Status"]
            .into_iter()
            .map(str::to_string)
            .collect(),
        rows: atms
            .iter()
            .filter_map(|atm| {
                let id = atm.id()?;
                let status = if atm.is_enabled() { "Enabled" } else { "Disabled" };
                Some(ListingRow {
                    id: id.to_string(),
                    cells: vec![
                        atm.label().to_string(),
                        atm.city().to_string(),
                        atm.brand().to_string(),
                        status.to_string(),
                    ],
                })
            })
            .collect(),
        empty_text: ATM_EMPTY_TEXT.to_string(),
    }
}
