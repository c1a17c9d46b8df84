use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::constants::{
    APPRECIATIONS_COLLECTION, APPRECIATION_TEXT_FIELD, EDUCATION_COLLECTION,
    LANGUAGES_COLLECTION, SKILLS_COLLECTION, WORK_EXPERIENCES_COLLECTION,
};
use crate::entities::{
    Education, Language, ProfileFieldPatch, Skill, UserProfile, WorkExperience,
};
use crate::repositories::store::{Document, StoreEvent};

/// One remote change, typed. Either a field-level patch of the profile
/// document or a wholesale replacement of one sub-resource slice.
#[derive(Debug, Clone)]
pub enum ProfileEvent {
    Fields(ProfileFieldPatch),
    WorkExperiences(Vec<WorkExperience>),
    Education(Vec<Education>),
    Skills(Vec<Skill>),
    Languages(Vec<Language>),
    Appreciations(Vec<String>),
}

impl ProfileEvent {
    /// Translates a wire event into its typed form. Unknown collections
    /// and watch errors yield `None`; the caller handles errors on its
    /// own channel.
    pub fn from_store_event(event: StoreEvent) -> Option<ProfileEvent> {
        match event {
            StoreEvent::Profile { fields } => match ProfileFieldPatch::from_fields(&fields) {
                Ok(patch) => Some(ProfileEvent::Fields(patch)),
                Err(e) => {
                    tracing::warn!("Ignoring unparseable profile document: {e}");
                    None
                }
            },
            StoreEvent::Collection { name, documents } => match name.as_str() {
                WORK_EXPERIENCES_COLLECTION => Some(ProfileEvent::WorkExperiences(
                    documents_to_work_experiences(&documents),
                )),
                EDUCATION_COLLECTION => {
                    Some(ProfileEvent::Education(documents_to_education(&documents)))
                }
                SKILLS_COLLECTION => Some(ProfileEvent::Skills(documents_to_skills(&documents))),
                LANGUAGES_COLLECTION => {
                    Some(ProfileEvent::Languages(documents_to_languages(&documents)))
                }
                APPRECIATIONS_COLLECTION => Some(ProfileEvent::Appreciations(
                    documents_to_appreciations(&documents),
                )),
                other => {
                    tracing::warn!("Ignoring event for unknown collection {other:?}");
                    None
                }
            },
            StoreEvent::Error { .. } => None,
        }
    }
}

/// Folds one event into the snapshot.
///
/// Precedence: the latest event wins within its own slice and never
/// touches any other slice. With no base snapshot, collection events are
/// dropped; a profile-document event seeds a pending snapshot so field
/// data arriving before `load()` completes is not lost.
pub fn apply_event(
    current: Option<UserProfile>,
    event: ProfileEvent,
    uid: &str,
) -> Option<UserProfile> {
    match (current, event) {
        (Some(mut profile), ProfileEvent::Fields(patch)) => {
            profile.apply_patch(patch);
            Some(profile)
        }
        (None, ProfileEvent::Fields(patch)) => {
            let mut profile = UserProfile::seeded(uid, None, None, None);
            profile.apply_patch(patch);
            Some(profile)
        }
        (Some(mut profile), ProfileEvent::WorkExperiences(items)) => {
            profile.work_experience = items;
            Some(profile)
        }
        (Some(mut profile), ProfileEvent::Education(items)) => {
            profile.education = items;
            Some(profile)
        }
        (Some(mut profile), ProfileEvent::Skills(items)) => {
            profile.skills = items;
            Some(profile)
        }
        (Some(mut profile), ProfileEvent::Languages(items)) => {
            profile.languages = items;
            Some(profile)
        }
        (Some(mut profile), ProfileEvent::Appreciations(items)) => {
            profile.appreciations = items;
            Some(profile)
        }
        // No base snapshot to merge a collection slice into.
        (None, _) => None,
    }
}

// ───── Wire → Domain Translation ────────────────────────────────────

/// Decodes one collection's documents, overriding each entity id with
/// the document key and skipping documents that fail to parse.
fn parse_documents<T>(documents: &[Document], set_id: fn(&mut T, i64)) -> Vec<T>
where
    T: DeserializeOwned,
{
    documents
        .iter()
        .filter_map(|doc| {
            match serde_json::from_value::<T>(Value::Object(doc.fields.clone())) {
                Ok(mut item) => {
                    set_id(&mut item, doc.id.parse().unwrap_or(0));
                    Some(item)
                }
                Err(e) => {
                    tracing::warn!("Skipping unparseable document {}: {e}", doc.id);
                    None
                }
            }
        })
        .collect()
}

pub fn documents_to_work_experiences(documents: &[Document]) -> Vec<WorkExperience> {
    parse_documents(documents, |item: &mut WorkExperience, id| item.id = id)
}

pub fn documents_to_education(documents: &[Document]) -> Vec<Education> {
    parse_documents(documents, |item: &mut Education, id| item.id = id)
}

pub fn documents_to_skills(documents: &[Document]) -> Vec<Skill> {
    parse_documents(documents, |item: &mut Skill, id| item.id = id)
}

pub fn documents_to_languages(documents: &[Document]) -> Vec<Language> {
    parse_documents(documents, |item: &mut Language, id| item.id = id)
}

pub fn documents_to_appreciations(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .filter_map(|doc| {
            doc.fields
                .get(APPRECIATION_TEXT_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::FieldMap;
    use serde_json::json;

    fn base_profile() -> UserProfile {
        let mut profile =
            UserProfile::seeded("uid-1", Some("Jane Doe"), Some("jane@example.com"), None);
        profile.skills = vec![Skill {
            id: 1,
            user_id: 2,
            skill_name: "Sales".to_string(),
        }];
        profile
    }

    #[test]
    fn collection_event_on_null_base_is_dropped() {
        let event = ProfileEvent::Languages(vec![Language {
            id: 1,
            user_id: 2,
            language_name: "French".to_string(),
            language_level: "3,2".to_string(),
        }]);
        assert!(apply_event(None, event, "uid-1").is_none());
    }

    #[test]
    fn first_profile_event_seeds_pending_snapshot() {
        let patch = ProfileFieldPatch {
            name: Some("Jane Doe".to_string()),
            about_me: Some("Hello".to_string()),
            ..Default::default()
        };
        let seeded = apply_event(None, ProfileEvent::Fields(patch), "uid-1").unwrap();
        assert_eq!(seeded.name, "Jane Doe");
        assert_eq!(seeded.first_name, "Jane");
        assert_eq!(seeded.about_me, "Hello");
        assert!(seeded.skills.is_empty());
    }

    #[test]
    fn collection_event_replaces_only_its_slice() {
        let profile = base_profile();
        let languages = vec![Language {
            id: 9,
            user_id: 2,
            language_name: "Spanish".to_string(),
            language_level: "4,4".to_string(),
        }];

        let updated = apply_event(
            Some(profile.clone()),
            ProfileEvent::Languages(languages.clone()),
            "uid-1",
        )
        .unwrap();

        assert_eq!(updated.languages, languages);
        assert_eq!(updated.skills, profile.skills);
        assert_eq!(updated.name, profile.name);
    }

    #[test]
    fn field_patch_preserves_sequences() {
        let profile = base_profile();
        let patch = ProfileFieldPatch {
            location: Some("Lagos".to_string()),
            ..Default::default()
        };

        let updated = apply_event(Some(profile.clone()), ProfileEvent::Fields(patch), "uid-1")
            .unwrap();

        assert_eq!(updated.location, "Lagos");
        assert_eq!(updated.skills, profile.skills);
    }

    #[test]
    fn unparseable_documents_are_skipped() {
        let mut good = FieldMap::new();
        good.insert("skillName".into(), json!("Sales"));
        good.insert("userId".into(), json!(2));
        let mut bad = FieldMap::new();
        bad.insert("skillName".into(), json!({"nested": "object"}));

        let documents = vec![
            Document {
                id: "11".to_string(),
                fields: good,
            },
            Document {
                id: "12".to_string(),
                fields: bad,
            },
        ];

        let skills = documents_to_skills(&documents);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].id, 11);
        assert_eq!(skills[0].skill_name, "Sales");
    }

    #[test]
    fn appreciation_documents_read_the_text_field() {
        let mut fields = FieldMap::new();
        fields.insert("text".into(), json!("Great teammate"));
        let documents = vec![
            Document {
                id: "1".to_string(),
                fields,
            },
            Document {
                id: "2".to_string(),
                fields: FieldMap::new(),
            },
        ];

        assert_eq!(
            documents_to_appreciations(&documents),
            vec!["Great teammate".to_string()]
        );
    }
}
