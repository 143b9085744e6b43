//! Translation between the external profile wire shape and local records.
//!
//! Pure functions only: nothing in here touches the store or the network.

use crate::errors::AppError;
use crate::models::{OutboundUser, Person};
use chrono::NaiveDate;
use serde_json::{Map, Value};

/// Parses an external user profile into a `Person`.
///
/// The profile must be a JSON object with `id`, `firstName`, `lastName`,
/// `email`, `phone`, `birthDate` and a nested `address` object carrying
/// `address`, `city`, `postalCode`, `state`, `country`. Scalars may arrive
/// as strings or numbers and are coerced to strings; `birthDate` must parse
/// as `YYYY-MM-DD`. The numeric profile id becomes the record's
/// `external_id` in decimal string form.
///
/// The returned record carries a freshly minted local id; the store keeps
/// the existing row id when the external id is already known.
pub fn person_from_profile(profile: &Value) -> Result<Person, AppError> {
    let obj = profile
        .as_object()
        .ok_or_else(|| AppError::MalformedPayload("profile is not a JSON object".to_string()))?;

    let address = obj
        .get("address")
        .and_then(|a| a.as_object())
        .ok_or_else(|| {
            AppError::MalformedPayload("profile is missing the 'address' object".to_string())
        })?;

    let birth_date_raw = required_scalar(obj, "birthDate")?;
    let birth_date = NaiveDate::parse_from_str(&birth_date_raw, "%Y-%m-%d").map_err(|e| {
        AppError::MalformedPayload(format!(
            "birthDate '{}' is not a YYYY-MM-DD date: {}",
            birth_date_raw, e
        ))
    })?;

    let mut person = Person::blank();
    person.external_id = Some(required_scalar(obj, "id")?);
    person.first_name = Some(required_scalar(obj, "firstName")?);
    person.last_name = Some(required_scalar(obj, "lastName")?);
    person.email = Some(required_scalar(obj, "email")?);
    person.phone = Some(required_scalar(obj, "phone")?);
    person.birth_date = Some(birth_date);
    person.mailing_street = Some(required_scalar(address, "address")?);
    person.mailing_city = Some(required_scalar(address, "city")?);
    person.mailing_postal_code = Some(required_scalar(address, "postalCode")?);
    person.mailing_state = Some(required_scalar(address, "state")?);
    person.mailing_country = Some(required_scalar(address, "country")?);

    Ok(person)
}

/// Projects a `Person` into the outbound "add user" payload.
///
/// Does not validate field presence; absent fields serialize as `null`.
pub fn outbound_user(person: &Person) -> OutboundUser {
    OutboundUser {
        salesforce_id: person.id.to_string(),
        first_name: person.first_name.clone(),
        last_name: person.last_name.clone(),
        email: person.email.clone(),
        phone: person.phone.clone(),
    }
}

/// Extracts a required scalar field, coercing numbers and booleans to their
/// string form. Missing keys, nulls and nested values are schema errors.
fn required_scalar(obj: &Map<String, Value>, key: &str) -> Result<String, AppError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(_) | None => Err(AppError::MalformedPayload(format!(
            "missing or non-scalar field '{}'",
            key
        ))),
    }
}
