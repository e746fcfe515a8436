//! Support contracts, their providers and points of contact

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{require_non_empty, validate_date_order, Validate, ValidationError};

// ============================================================================
// Provider
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderLcm {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub physical_address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProviderLcmInput {
    pub name: String,
    pub description: Option<String>,
    pub physical_address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub comments: Option<String>,
}

impl Validate for ProviderLcmInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_email("contact_email", self.contact_email.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProviderLcmFilter {
    /// Case-insensitive substring match on the name
    pub name: Option<String>,
}

// ============================================================================
// Contract
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedProvider {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContractLcm {
    pub id: Uuid,
    pub provider: NestedProvider,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub cost: Option<f64>,
    pub support_level: Option<String>,
    pub contract_type: Option<String>,
    pub expired: bool,
}

/// A contract without an end date never expires.
pub fn contract_expired(end: Option<NaiveDate>, today: NaiveDate) -> bool {
    end.is_some_and(|end| end <= today)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContractLcmInput {
    pub provider: Uuid,
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub cost: Option<f64>,
    pub support_level: Option<String>,
    pub contract_type: Option<String>,
}

impl Validate for ContractLcmInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_date_order("start", self.start, "end", self.end)?;
        match self.cost {
            Some(cost) if !cost.is_finite() || cost < 0.0 => Err(ValidationError::new(
                "cost",
                "Cost must be a non-negative number",
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContractLcmFilter {
    /// Provider ID
    pub provider: Option<Uuid>,
    pub name: Option<String>,
    pub expired: Option<bool>,
}

// ============================================================================
// Contact
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum ContactType {
    Unassigned,
    Owner,
    Primary,
    #[serde(rename = "Tier 1")]
    Tier1,
    #[serde(rename = "Tier 2")]
    Tier2,
    #[serde(rename = "Tier 3")]
    Tier3,
    #[serde(rename = "Tier 4")]
    Tier4,
}

impl ContactType {
    pub const ALL: [ContactType; 7] = [
        Self::Unassigned,
        Self::Owner,
        Self::Primary,
        Self::Tier1,
        Self::Tier2,
        Self::Tier3,
        Self::Tier4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "Unassigned",
            Self::Owner => "Owner",
            Self::Primary => "Primary",
            Self::Tier1 => "Tier 1",
            Self::Tier2 => "Tier 2",
            Self::Tier3 => "Tier 3",
            Self::Tier4 => "Tier 4",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::new("type", format!("Unknown contact type: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NestedContract {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactLcm {
    pub id: Uuid,
    pub contract: NestedContract,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub comments: Option<String>,
    pub priority: i32,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
}

pub const DEFAULT_CONTACT_PRIORITY: i32 = 100;

fn default_priority() -> i32 {
    DEFAULT_CONTACT_PRIORITY
}

fn default_contact_type() -> ContactType {
    ContactType::Unassigned
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContactLcmInput {
    pub contract: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub comments: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(rename = "type", default = "default_contact_type")]
    pub contact_type: ContactType,
}

impl Validate for ContactLcmInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        if self.priority < 0 {
            return Err(ValidationError::new("priority", "Priority must be >= 0"));
        }
        validate_email("email", self.email.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactLcmFilter {
    /// Contract ID
    pub contract: Option<Uuid>,
    #[serde(rename = "type")]
    pub contact_type: Option<ContactType>,
}

/// Contract points of contact, owners listed apart from everyone else
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContractContacts {
    pub owners: Vec<ContactLcm>,
    pub contacts: Vec<ContactLcm>,
}

impl ContractContacts {
    /// Split contacts on the Owner type, each side ordered by (type, priority)
    pub fn split(mut all: Vec<ContactLcm>) -> Self {
        all.sort_by(|a, b| {
            a.contact_type
                .as_str()
                .cmp(b.contact_type.as_str())
                .then(a.priority.cmp(&b.priority))
        });
        let (owners, contacts) = all
            .into_iter()
            .partition(|c| c.contact_type == ContactType::Owner);
        Self { owners, contacts }
    }
}

fn validate_email(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_empty() => {
            let valid = v
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if valid {
                Ok(())
            } else {
                Err(ValidationError::new(field, "Enter a valid email address"))
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn contact(name: &str, contact_type: ContactType, priority: i32) -> ContactLcm {
        ContactLcm {
            id: Uuid::new_v4(),
            contract: NestedContract {
                id: Uuid::nil(),
                name: "Gold".to_string(),
            },
            name: name.to_string(),
            address: None,
            phone: None,
            email: None,
            comments: None,
            priority,
            contact_type,
        }
    }

    #[test]
    fn test_contract_expiry() {
        let today = date("2024-03-01");
        assert!(contract_expired(Some(date("2024-03-01")), today));
        assert!(!contract_expired(Some(date("2024-03-02")), today));
        assert!(!contract_expired(None, today));
    }

    #[test]
    fn test_contact_split_and_order() {
        let split = ContractContacts::split(vec![
            contact("tier2", ContactType::Tier2, 10),
            contact("owner-b", ContactType::Owner, 20),
            contact("primary", ContactType::Primary, 5),
            contact("owner-a", ContactType::Owner, 1),
            contact("tier1", ContactType::Tier1, 50),
        ]);

        let owners: Vec<_> = split.owners.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(owners, vec!["owner-a", "owner-b"]);

        let others: Vec<_> = split.contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(others, vec!["primary", "tier1", "tier2"]);
    }

    #[test]
    fn test_contact_type_names() {
        assert_eq!("Tier 3".parse::<ContactType>().unwrap(), ContactType::Tier3);
        assert!("Tier3".parse::<ContactType>().is_err());
        let json = serde_json::to_string(&ContactType::Tier1).unwrap();
        assert_eq!(json, "\"Tier 1\"");
    }

    #[test]
    fn test_contact_input_defaults() {
        let input: ContactLcmInput = serde_json::from_value(serde_json::json!({
            "contract": Uuid::new_v4(),
            "name": "NOC"
        }))
        .unwrap();
        assert_eq!(input.priority, DEFAULT_CONTACT_PRIORITY);
        assert_eq!(input.contact_type, ContactType::Unassigned);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("email", Some("noc@example.net")).is_ok());
        assert!(validate_email("email", Some("noc.example.net")).is_err());
        assert!(validate_email("email", Some("@example.net")).is_err());
        assert!(validate_email("email", None).is_ok());
    }

    #[test]
    fn test_negative_cost_rejected() {
        let input = ContractLcmInput {
            provider: Uuid::new_v4(),
            name: "Gold".to_string(),
            start: None,
            end: None,
            cost: Some(-1.0),
            support_level: None,
            contract_type: None,
        };
        assert_eq!(input.validate().unwrap_err().field, "cost");
    }
}
