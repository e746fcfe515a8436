//! Software validation report tallies

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Count fields a chart can plot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TallyField {
    Total,
    Valid,
    Invalid,
    NoSoftware,
}

/// Raw validation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Counts {
    pub total: i64,
    pub valid: i64,
    pub invalid: i64,
    pub no_software: i64,
}

impl Counts {
    pub fn new(total: i64, valid: i64, invalid: i64, no_software: i64) -> Self {
        Self {
            total,
            valid,
            invalid,
            no_software,
        }
    }

    pub fn get(&self, field: TallyField) -> i64 {
        match field {
            TallyField::Total => self.total,
            TallyField::Valid => self.valid,
            TallyField::Invalid => self.invalid,
            TallyField::NoSoftware => self.no_software,
        }
    }

    /// Every result is exactly one of valid, invalid or without software
    pub fn is_consistent(&self) -> bool {
        self.valid + self.invalid + self.no_software == self.total
    }

    pub fn valid_percent(&self) -> f64 {
        valid_percent(self.valid, self.total)
    }
}

/// Percentage of valid results rounded half to even at two decimals; 0 for
/// an empty set.
pub fn valid_percent(valid: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (valid as f64 / total as f64 * 100.0 * 100.0).round_ties_even() / 100.0
}

/// Global tally for one report
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Tally {
    pub name: String,
    #[serde(flatten)]
    pub counts: Counts,
    pub valid_percent: f64,
}

impl Tally {
    pub fn new(name: impl Into<String>, counts: Counts) -> Self {
        Self {
            name: name.into(),
            counts,
            valid_percent: counts.valid_percent(),
        }
    }
}

/// Tally for one group (platform, manufacturer, device type, ...)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GroupTally {
    /// Group name; `null` for results whose group is unset
    pub label: Option<String>,
    #[serde(flatten)]
    pub counts: Counts,
    pub valid_percent: f64,
}

impl GroupTally {
    pub fn new(label: Option<String>, counts: Counts) -> Self {
        Self {
            label,
            counts,
            valid_percent: counts.valid_percent(),
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("Unassigned")
    }
}

/// Which validation result cache a report is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Device,
    InventoryItem,
}

impl ReportKind {
    /// Title of the global tally and pie chart
    pub fn tally_name(self) -> &'static str {
        match self {
            Self::Device => "Devices",
            Self::InventoryItem => "Inventory Items",
        }
    }

    /// Grouping dimension of the bar chart
    pub fn group_label(self) -> &'static str {
        match self {
            Self::Device => "platform",
            Self::InventoryItem => "manufacturer",
        }
    }

    /// Grouping dimension of the paginated table
    pub fn row_label(self) -> &'static str {
        match self {
            Self::Device => "device_type",
            Self::InventoryItem => "inventory_item",
        }
    }

    pub fn ylabel(self) -> &'static str {
        match self {
            Self::Device => "Device",
            Self::InventoryItem => "Inventory Item",
        }
    }

    pub fn bar_title(self) -> &'static str {
        match self {
            Self::Device => "Valid per Platform",
            Self::InventoryItem => "Valid per Manufacturer",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeviceReportFilter {
    /// Platform name
    pub platform: Option<String>,
    /// Device type model
    pub device_type: Option<String>,
    /// Device name
    pub device: Option<String>,
    /// Results last run on or after this date
    pub last_run_after: Option<NaiveDate>,
    /// Results last run on or before this date
    pub last_run_before: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryItemReportFilter {
    /// Manufacturer name
    pub manufacturer: Option<String>,
    pub part_id: Option<String>,
    /// Parent device name
    pub device: Option<String>,
    /// Inventory item name
    pub inventory_item: Option<String>,
    pub last_run_after: Option<NaiveDate>,
    pub last_run_before: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_example() {
        let counts = Counts::new(10, 7, 2, 1);
        assert!(counts.is_consistent());
        assert_eq!(counts.valid_percent(), 70.0);
    }

    #[test]
    fn test_percent_zero_total() {
        let counts = Counts::default();
        let tally = Tally::new("Devices", counts);
        assert_eq!(tally.valid_percent, 0.0);
        assert!(!tally.valid_percent.is_nan());
    }

    #[test]
    fn test_percent_rounds_to_two_decimals() {
        assert_eq!(valid_percent(1, 3), 33.33);
        assert_eq!(valid_percent(2, 3), 66.67);
        assert_eq!(valid_percent(3, 3), 100.0);
    }

    #[test]
    fn test_percent_ties_round_to_even() {
        assert_eq!(valid_percent(1, 32), 3.12);
        assert_eq!(valid_percent(5, 32), 15.62);
        assert_eq!(valid_percent(3, 32), 9.38);
        assert_eq!(valid_percent(1, 8), 12.5);
    }

    #[test]
    fn test_tally_serializes_flat() {
        let tally = Tally::new("Devices", Counts::new(4, 1, 2, 1));
        let value = serde_json::to_value(&tally).unwrap();
        assert_eq!(value["name"], "Devices");
        assert_eq!(value["total"], 4);
        assert_eq!(value["no_software"], 1);
        assert_eq!(value["valid_percent"], 25.0);
    }

    #[test]
    fn test_field_lookup() {
        let counts = Counts::new(6, 3, 2, 1);
        assert_eq!(counts.get(TallyField::Valid), 3);
        assert_eq!(counts.get(TallyField::Invalid), 2);
        assert_eq!(counts.get(TallyField::NoSoftware), 1);
        assert_eq!(counts.get(TallyField::Total), 6);
    }

    #[test]
    fn test_unset_group_label() {
        let group = GroupTally::new(None, Counts::new(1, 1, 0, 0));
        assert_eq!(group.display_label(), "Unassigned");
    }
}
