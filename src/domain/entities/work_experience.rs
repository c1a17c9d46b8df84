use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::PRESENT;

// ───── Stored Model ─────────────────────────────────────────────────

/// One work-experience document. Lenient decode: documents written by
/// older clients may miss fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub is_current_job: bool,
}

impl WorkExperience {
    pub fn is_ongoing(&self) -> bool {
        self.is_current_job
    }
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkExperience {
    #[validate(length(min = 1, message = "Company name cannot be empty"))]
    pub company_name: String,

    #[validate(length(min = 1, message = "Position cannot be empty"))]
    pub position: String,

    #[serde(default)]
    pub start_date: String,

    #[serde(default)]
    pub end_date: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_current_job: bool,
}

impl NewWorkExperience {
    /// Builds the stored form, normalizing the end date: an ongoing
    /// position always reads "Present", and toggling the flag off clears
    /// a leftover "Present" to empty.
    pub fn prepare_for_insert(&self, id: i64, user_id: i64) -> WorkExperience {
        let end_date = if self.is_current_job {
            PRESENT.to_string()
        } else if self.end_date == PRESENT {
            String::new()
        } else {
            self.end_date.clone()
        };

        WorkExperience {
            id,
            user_id,
            company_name: self.company_name.clone(),
            position: self.position.clone(),
            start_date: self.start_date.clone(),
            end_date,
            description: self.description.clone(),
            is_current_job: self.is_current_job,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewWorkExperience {
        NewWorkExperience {
            company_name: "Acme".to_string(),
            position: "Engineer".to_string(),
            start_date: "Jan 2020".to_string(),
            end_date: "Dec 2022".to_string(),
            description: String::new(),
            is_current_job: false,
        }
    }

    #[test]
    fn current_job_forces_present_end_date() {
        let mut new = input();
        new.is_current_job = true;
        let stored = new.prepare_for_insert(1, 2);
        assert_eq!(stored.end_date, PRESENT);
    }

    #[test]
    fn toggling_off_clears_present_sentinel() {
        let mut new = input();
        new.end_date = PRESENT.to_string();
        new.is_current_job = false;
        let stored = new.prepare_for_insert(1, 2);
        assert_eq!(stored.end_date, "");
    }

    #[test]
    fn plain_end_date_is_kept() {
        let stored = input().prepare_for_insert(1, 2);
        assert_eq!(stored.end_date, "Dec 2022");
    }

    #[test]
    fn empty_company_fails_validation() {
        let mut new = input();
        new.company_name = String::new();
        assert!(new.validate().is_err());
    }
}
