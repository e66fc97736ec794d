use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::{common::nullable, generate_id, now, Id, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("Unknown gender '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<Timestamp>,
    pub birth_place: Option<String>,
    pub death_date: Option<Timestamp>,
    pub occupation: Option<String>,
    pub biography: Option<String>,
    pub gender: Option<Gender>,
    pub photo_url: Option<String>,
    pub tree_id: Id,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Validated person attributes, ready to be stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonFields {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<Timestamp>,
    pub birth_place: Option<String>,
    pub death_date: Option<Timestamp>,
    pub occupation: Option<String>,
    pub biography: Option<String>,
    pub gender: Option<Gender>,
    pub photo_url: Option<String>,
}

/// Validated partial update. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<Option<Timestamp>>,
    pub birth_place: Option<Option<String>>,
    pub death_date: Option<Option<Timestamp>>,
    pub occupation: Option<Option<String>>,
    pub biography: Option<Option<String>>,
    pub gender: Option<Option<Gender>>,
    pub photo_url: Option<Option<String>>,
}

impl Person {
    pub fn new(tree_id: Id, fields: PersonFields) -> Self {
        let created_at = now();
        Self {
            id: generate_id(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            birth_date: fields.birth_date,
            birth_place: fields.birth_place,
            death_date: fields.death_date,
            occupation: fields.occupation,
            biography: fields.biography,
            gender: fields.gender,
            photo_url: fields.photo_url,
            tree_id,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn apply(&mut self, patch: PersonPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(birth_date) = patch.birth_date {
            self.birth_date = birth_date;
        }
        if let Some(birth_place) = patch.birth_place {
            self.birth_place = birth_place;
        }
        if let Some(death_date) = patch.death_date {
            self.death_date = death_date;
        }
        if let Some(occupation) = patch.occupation {
            self.occupation = occupation;
        }
        if let Some(biography) = patch.biography {
            self.biography = biography;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(photo_url) = patch.photo_url {
            self.photo_url = photo_url;
        }
        self.updated_at = now();
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Request body for creating a person. Dates are ISO-8601 strings; empty means unknown.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub death_date: Option<String>,
    pub occupation: Option<String>,
    pub biography: Option<String>,
    pub gender: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub birth_place: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub death_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub occupation: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub biography: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub photo_url: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_round_trips_through_str() {
        for gender in [Gender::Male, Gender::Female, Gender::Other] {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut person = Person::new(
            "tree-1".to_string(),
            PersonFields {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                birth_place: Some("London".to_string()),
                occupation: Some("Mathematician".to_string()),
                ..Default::default()
            },
        );

        person.apply(PersonPatch {
            last_name: Some("King".to_string()),
            birth_place: Some(None),
            ..Default::default()
        });

        assert_eq!(person.first_name, "Ada");
        assert_eq!(person.last_name, "King");
        assert_eq!(person.birth_place, None);
        assert_eq!(person.occupation.as_deref(), Some("Mathematician"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let person = Person::new(
            "tree-1".to_string(),
            PersonFields {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                gender: Some(Gender::Female),
                ..Default::default()
            },
        );
        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["treeId"], "tree-1");
        assert_eq!(json["gender"], "female");
        assert!(json["birthDate"].is_null());
    }
}
