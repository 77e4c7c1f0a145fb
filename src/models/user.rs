use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::lodge::Lodge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Km,
    Mi,
}

impl DistanceUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }
}

/// `users` row joined with the lodge name.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub distance_unit: String,
    pub lodge_id: Option<Uuid>,
    pub lodge_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub distance_unit: String,
    pub lodge: Option<Lodge>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        let lodge = match (row.lodge_id, row.lodge_name) {
            (Some(id), Some(name)) => Some(Lodge { id, name }),
            _ => None,
        };
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            distance_unit: row.distance_unit,
            lodge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_unit_wire_names() {
        let unit: DistanceUnit = serde_json::from_str(r#""mi""#).unwrap();
        assert_eq!(unit, DistanceUnit::Mi);
        assert_eq!(unit.as_str(), "mi");
        assert!(serde_json::from_str::<DistanceUnit>(r#""miles""#).is_err());
        assert!(serde_json::from_str::<DistanceUnit>(r#""KM""#).is_err());
    }

    #[test]
    fn test_profile_lodge_from_join() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Thabo".into(),
            email: None,
            role: "GUIDE".into(),
            distance_unit: "km".into(),
            lodge_id: None,
            lodge_name: None,
        };
        let profile = UserProfile::from(row);
        assert!(profile.lodge.is_none());

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["distanceUnit"], "km");
        assert!(json["lodge"].is_null());
    }
}
