use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::SUGGESTED_SKILLS;

// ───── Stored Model ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub id: i64,
    pub user_id: i64,
    pub skill_name: String,
}

impl Skill {
    /// Whether the name matches the suggested vocabulary. Display-only;
    /// free-text skills are first-class.
    pub fn is_suggested(&self) -> bool {
        SUGGESTED_SKILLS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&self.skill_name))
    }
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSkill {
    #[validate(length(min = 1, message = "Skill name cannot be empty"))]
    pub skill_name: String,
}

impl NewSkill {
    pub fn prepare_for_insert(&self, id: i64, user_id: i64) -> Skill {
        Skill {
            id,
            user_id,
            skill_name: self.skill_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_lookup_is_case_insensitive() {
        let skill = Skill {
            id: 1,
            user_id: 2,
            skill_name: "leadership".to_string(),
        };
        assert!(skill.is_suggested());
    }

    #[test]
    fn free_text_skill_is_not_suggested() {
        let skill = Skill {
            id: 1,
            user_id: 2,
            skill_name: "Underwater Basket Weaving".to_string(),
        };
        assert!(!skill.is_suggested());
    }
}
