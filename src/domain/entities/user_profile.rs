use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::constants::DEFAULT_JOB_TITLE;
use crate::entities::{
    Appreciation, Education, FieldMap, Language, Skill, WorkExperience,
};

// ───── Snapshot Model ───────────────────────────────────────────────

/// The authoritative in-memory profile snapshot.
///
/// Owned exclusively by the synchronization core; the UI observes it
/// through a watch channel and never mutates it directly. Sub-resource
/// sequences are unique by their own `id` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub profile_image_url: Option<String>,
    pub job_title: String,
    pub location: String,
    pub about_me: String,
    pub resume_filename: String,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub skills: Vec<Skill>,
    pub languages: Vec<Language>,
    pub appreciations: Vec<String>,
}

impl UserProfile {
    /// Builds the default profile for a user that has no remote document
    /// yet, from whatever the identity provider knows about them.
    pub fn seeded(
        uid: &str,
        display_name: Option<&str>,
        email: Option<&str>,
        photo_url: Option<&str>,
    ) -> Self {
        let name = display_name.unwrap_or_default().to_string();
        let (first_name, last_name) = split_name(&name);

        UserProfile {
            id: stable_id(uid),
            name,
            first_name,
            last_name,
            email: email.unwrap_or_default().to_string(),
            phone: String::new(),
            profile_image_url: photo_url.map(str::to_string),
            job_title: DEFAULT_JOB_TITLE.to_string(),
            location: String::new(),
            about_me: String::new(),
            resume_filename: String::new(),
            work_experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            languages: Vec::new(),
            appreciations: Vec::new(),
        }
    }

    /// Scalar fields of the remote profile document. Sub-resource
    /// sequences live in their own collections and are never part of it.
    pub fn profile_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), json!(self.name));
        fields.insert("email".into(), json!(self.email));
        fields.insert("phone".into(), json!(self.phone));
        fields.insert("aboutMe".into(), json!(self.about_me));
        fields.insert("location".into(), json!(self.location));
        fields.insert("resumeFilename".into(), json!(self.resume_filename));
        fields.insert("jobTitle".into(), json!(self.job_title));
        fields.insert(
            "profileImageUrl".into(),
            json!(self.profile_image_url.clone().unwrap_or_default()),
        );
        fields
    }

    /// Structured display projections of the stored appreciation texts.
    /// Projection only; the stored shape stays plain text.
    pub fn appreciation_views(&self) -> Vec<Appreciation> {
        self.appreciations
            .iter()
            .enumerate()
            .map(|(index, text)| Appreciation::from_text(index as i64, text))
            .collect()
    }

    /// Replaces `name` and recomputes the first/last split.
    pub fn set_name(&mut self, name: String) {
        let (first_name, last_name) = split_name(&name);
        self.name = name;
        self.first_name = first_name;
        self.last_name = last_name;
    }

    /// Merges a field-level patch into the snapshot. Present fields
    /// override, absent fields are preserved.
    pub fn apply_patch(&mut self, patch: ProfileFieldPatch) {
        if let Some(name) = patch.name {
            self.set_name(name);
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(phone) = patch.phone {
            self.phone = phone;
        }
        if let Some(about_me) = patch.about_me {
            self.about_me = about_me;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(resume_filename) = patch.resume_filename {
            self.resume_filename = resume_filename;
        }
        if let Some(profile_image_url) = patch.profile_image_url {
            self.profile_image_url = Some(profile_image_url);
        }
        if let Some(job_title) = patch.job_title {
            self.job_title = job_title;
        }
    }
}

// ───── Field-Level Patch ────────────────────────────────────────────

/// A partial update of the scalar profile fields, as decoded from a
/// profile document. Present fields override, absent fields preserve
/// whatever the snapshot already holds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileFieldPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub about_me: Option<String>,
    pub location: Option<String>,
    pub resume_filename: Option<String>,
    pub profile_image_url: Option<String>,
    pub job_title: Option<String>,
}

impl ProfileFieldPatch {
    pub fn from_fields(fields: &FieldMap) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(fields.clone()))
    }
}

// ───── Helper Functions ─────────────────────────────────────────────

/// Splits a display name into (first, last) on the first space.
pub fn split_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((first, last)) => (first.to_string(), last.to_string()),
        None => (full_name.to_string(), String::new()),
    }
}

/// Derives the numeric profile id from the opaque auth uid. FNV-1a,
/// masked to stay positive so its decimal rendering is a valid doc key.
pub fn stable_id(uid: &str) -> i64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in uid.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash & (i64::MAX as u64)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_handles_single_word() {
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn split_name_keeps_remainder_as_last_name() {
        let (first, last) = split_name("Ada Lovelace King");
        assert_eq!(first, "Ada");
        assert_eq!(last, "Lovelace King");
    }

    #[test]
    fn stable_id_is_deterministic_and_positive() {
        let a = stable_id("user-abc-123");
        let b = stable_id("user-abc-123");
        assert_eq!(a, b);
        assert!(a >= 0);
        assert_ne!(stable_id("user-abc-123"), stable_id("user-abc-124"));
    }

    #[test]
    fn seeded_profile_uses_default_job_title() {
        let profile = UserProfile::seeded("uid-1", Some("Jane Doe"), Some("jane@example.com"), None);
        assert_eq!(profile.job_title, "Professional");
        assert_eq!(profile.first_name, "Jane");
        assert_eq!(profile.last_name, "Doe");
        assert!(profile.work_experience.is_empty());
        assert!(profile.appreciations.is_empty());
    }

    #[test]
    fn patch_overrides_present_fields_only() {
        let mut profile = UserProfile::seeded("uid-1", Some("Jane Doe"), Some("jane@example.com"), None);
        profile.phone = "555-0100".to_string();

        profile.apply_patch(ProfileFieldPatch {
            about_me: Some("Hello".to_string()),
            ..Default::default()
        });

        assert_eq!(profile.about_me, "Hello");
        assert_eq!(profile.phone, "555-0100");
        assert_eq!(profile.name, "Jane Doe");
    }
}
