use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============ Database Models ============

/// A person record in the system of record.
///
/// `external_id` is the secondary key correlating the record with exactly
/// one profile in the external user system. Once populated it is treated as
/// an immutable foreign key: pulls for the same external id update this row
/// in place, they never create a second one.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Person {
    /// Unique identifier, assigned by the store.
    pub id: Uuid,
    /// External profile identifier (stored as its decimal string form).
    pub external_id: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Date of birth.
    pub birth_date: Option<NaiveDate>,
    /// Mailing address: street line.
    pub mailing_street: Option<String>,
    /// Mailing address: city.
    pub mailing_city: Option<String>,
    /// Mailing address: postal code.
    pub mailing_postal_code: Option<String>,
    /// Mailing address: state.
    pub mailing_state: Option<String>,
    /// Mailing address: country.
    pub mailing_country: Option<String>,
    /// When the record was last pushed to the external system.
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Person {
    /// Blank record with a fresh id and every other field unset.
    pub fn blank() -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            birth_date: None,
            mailing_street: None,
            mailing_city: None,
            mailing_postal_code: None,
            mailing_state: None,
            mailing_country: None,
            last_synced_at: None,
        }
    }
}

// ============ Outbound Wire Models ============

/// Payload pushed to the external user system.
///
/// This is not a mirror of the inbound profile shape: the external "add
/// user" endpoint takes our record id plus contact fields only. Absent
/// fields serialize as explicit `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundUser {
    /// Local record identifier, as the external system expects it.
    #[serde(rename = "salesforceId")]
    pub salesforce_id: String,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
