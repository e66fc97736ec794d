use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::model::{
    Gender, NewPerson, PersonFields, PersonPatch, PersonUpdate, Point, RootPerson, Timestamp,
};

pub const ROOT_FIRST_NAME: &str = "Personne";
pub const ROOT_LAST_NAME: &str = "Racine";
pub const ROOT_BIOGRAPHY: &str =
    "Personne racine de l'arbre généalogique. Modifiez ces informations.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trimmed text, with blank strings treated as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub fn required_text(field: &str, value: Option<&str>) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ValidationError::new(field, "must not be empty")),
    }
}

/// ISO-8601 calendar date (`1990-05-01`) or date-time; blank means unknown.
pub fn parse_date(field: &str, value: Option<&str>) -> ValidationResult<Option<Timestamp>> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(naive.and_utc()));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(midnight.and_utc()));
    }

    Err(ValidationError::new(
        field,
        format!("'{}' is not an ISO-8601 date", raw),
    ))
}

pub fn parse_gender(value: Option<&str>) -> ValidationResult<Option<Gender>> {
    match value.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .to_lowercase()
            .parse::<Gender>()
            .map(Some)
            .map_err(|_| ValidationError::new("gender", "must be one of male, female, other")),
    }
}

pub fn check_lifespan(birth: Option<Timestamp>, death: Option<Timestamp>) -> ValidationResult<()> {
    match (birth, death) {
        (Some(birth), Some(death)) if death < birth => Err(ValidationError::new(
            "deathDate",
            "must not be before the birth date",
        )),
        _ => Ok(()),
    }
}

pub fn check_coordinates(x: f64, y: f64) -> ValidationResult<Point> {
    let point = Point::new(x, y);
    if point.is_finite() {
        Ok(point)
    } else {
        Err(ValidationError::new("position", "coordinates must be finite numbers"))
    }
}

pub fn person_fields(input: NewPerson) -> ValidationResult<PersonFields> {
    let fields = PersonFields {
        first_name: required_text("firstName", input.first_name.as_deref())?,
        last_name: required_text("lastName", input.last_name.as_deref())?,
        birth_date: parse_date("birthDate", input.birth_date.as_deref())?,
        birth_place: optional_text(input.birth_place),
        death_date: parse_date("deathDate", input.death_date.as_deref())?,
        occupation: optional_text(input.occupation),
        biography: optional_text(input.biography),
        gender: parse_gender(input.gender.as_deref())?,
        photo_url: optional_text(input.photo_url),
    };
    check_lifespan(fields.birth_date, fields.death_date)?;
    Ok(fields)
}

/// Fields of the person created together with a tree, with placeholder defaults.
pub fn root_person_fields(input: Option<RootPerson>) -> ValidationResult<PersonFields> {
    let input = input.unwrap_or_default();
    Ok(PersonFields {
        first_name: optional_text(input.first_name).unwrap_or_else(|| ROOT_FIRST_NAME.to_string()),
        last_name: optional_text(input.last_name).unwrap_or_else(|| ROOT_LAST_NAME.to_string()),
        birth_date: parse_date("rootPerson.birthDate", input.birth_date.as_deref())?,
        birth_place: optional_text(input.birth_place),
        death_date: None,
        occupation: optional_text(input.occupation),
        biography: optional_text(input.biography).or_else(|| Some(ROOT_BIOGRAPHY.to_string())),
        gender: parse_gender(input.gender.as_deref())?.or(Some(Gender::Other)),
        photo_url: None,
    })
}

fn nullable_text(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(optional_text)
}

fn nullable_date(field: &str, value: Option<Option<String>>) -> ValidationResult<Option<Option<Timestamp>>> {
    value
        .map(|date| parse_date(field, date.as_deref()))
        .transpose()
}

/// Validate a partial update. Names, when present, must not be blank;
/// `null` or an empty string clears a nullable field.
pub fn person_patch(input: PersonUpdate) -> ValidationResult<PersonPatch> {
    let first_name = input
        .first_name
        .map(|name| required_text("firstName", Some(&name)))
        .transpose()?;
    let last_name = input
        .last_name
        .map(|name| required_text("lastName", Some(&name)))
        .transpose()?;
    let gender = input
        .gender
        .map(|gender| parse_gender(gender.as_deref()))
        .transpose()?;

    Ok(PersonPatch {
        first_name,
        last_name,
        birth_date: nullable_date("birthDate", input.birth_date)?,
        birth_place: nullable_text(input.birth_place),
        death_date: nullable_date("deathDate", input.death_date)?,
        occupation: nullable_text(input.occupation),
        biography: nullable_text(input.biography),
        gender,
        photo_url: nullable_text(input.photo_url),
    })
}
