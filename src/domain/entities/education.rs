use serde::{Deserialize, Serialize};
use validator::Validate;

// ───── Stored Model ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: i64,
    pub user_id: i64,
    pub institution: String,
    pub degree: String,
    pub graduation_date: String,
    pub description: String,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEducation {
    #[validate(length(min = 1, message = "Institution cannot be empty"))]
    pub institution: String,

    #[validate(length(min = 1, message = "Degree cannot be empty"))]
    pub degree: String,

    #[serde(default)]
    pub graduation_date: String,

    #[serde(default)]
    pub description: String,
}

impl NewEducation {
    pub fn prepare_for_insert(&self, id: i64, user_id: i64) -> Education {
        Education {
            id,
            user_id,
            institution: self.institution.clone(),
            degree: self.degree.clone(),
            graduation_date: self.graduation_date.clone(),
            description: self.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_institution_fails_validation() {
        let new = NewEducation {
            institution: String::new(),
            degree: "BSc".to_string(),
            graduation_date: "2019".to_string(),
            description: String::new(),
        };
        assert!(new.validate().is_err());
    }
}
