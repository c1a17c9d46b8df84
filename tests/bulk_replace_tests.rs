mod test_utils;

use std::sync::Arc;

use serde_json::json;

use profile_sync::constants::{
    APPRECIATIONS_COLLECTION, EDUCATION_COLLECTION, LANGUAGES_COLLECTION, SKILLS_COLLECTION,
    WORK_EXPERIENCES_COLLECTION,
};
use profile_sync::db::memory::MemoryProfileStore;
use profile_sync::entities::{
    Education, FieldMap, Language, Skill, UserProfile, WorkExperience,
};
use profile_sync::errors::StoreError;
use profile_sync::repositories::store::ProfileStore;
use profile_sync::repositories::ProfileRepository;

use test_utils::{MockStore, TEST_UID};

fn full_profile() -> UserProfile {
    let mut profile =
        UserProfile::seeded(TEST_UID, Some("Jane Doe"), Some("jane@example.com"), None);
    profile.work_experience = vec![WorkExperience {
        id: 11,
        user_id: 2,
        company_name: "Acme".to_string(),
        position: "Engineer".to_string(),
        start_date: "Jan 2020".to_string(),
        end_date: "Present".to_string(),
        description: String::new(),
        is_current_job: true,
    }];
    profile.education = vec![Education {
        id: 21,
        user_id: 2,
        institution: "MIT".to_string(),
        degree: "BSc".to_string(),
        graduation_date: "2015".to_string(),
        description: String::new(),
    }];
    profile.skills = vec![
        Skill {
            id: 31,
            user_id: 2,
            skill_name: "Sales".to_string(),
        },
        Skill {
            id: 32,
            user_id: 2,
            skill_name: "Marketing".to_string(),
        },
    ];
    profile.languages = vec![Language {
        id: 41,
        user_id: 2,
        language_name: "French".to_string(),
        language_level: "3,2".to_string(),
    }];
    profile.appreciations = vec!["Great teammate".to_string()];
    profile
}

#[tokio::test]
async fn bulk_replace_writes_every_collection() {
    let store = Arc::new(MemoryProfileStore::new());

    // A stale document that the replace must remove.
    let mut stale = FieldMap::new();
    stale.insert("skillName".into(), json!("Obsolete"));
    store
        .set_document(TEST_UID, SKILLS_COLLECTION, "999", &stale)
        .await
        .unwrap();

    let repo = ProfileRepository::new(store.clone());
    let report = repo.save_profile(TEST_UID, &full_profile()).await.unwrap();

    assert!(report.is_complete());
    assert!(report.failed_collections().is_empty());
    assert!(report.finished_at >= report.started_at);

    let skills = store
        .list_documents(TEST_UID, SKILLS_COLLECTION)
        .await
        .unwrap();
    assert_eq!(skills.len(), 2);
    assert!(skills.iter().all(|doc| doc.id != "999"));
    assert!(skills.iter().any(|doc| doc.id == "31"));

    for (collection, expected) in [
        (WORK_EXPERIENCES_COLLECTION, 1),
        (EDUCATION_COLLECTION, 1),
        (LANGUAGES_COLLECTION, 1),
        (APPRECIATIONS_COLLECTION, 1),
    ] {
        let documents = store.list_documents(TEST_UID, collection).await.unwrap();
        assert_eq!(documents.len(), expected, "collection {collection}");
    }

    // Appreciation documents hold the single text field.
    let appreciations = store
        .list_documents(TEST_UID, APPRECIATIONS_COLLECTION)
        .await
        .unwrap();
    assert_eq!(
        appreciations[0].fields.get("text").unwrap(),
        "Great teammate"
    );

    let fields = store.get_profile(TEST_UID).await.unwrap().unwrap();
    assert_eq!(fields.get("name").unwrap(), "Jane Doe");
}

#[tokio::test]
async fn partial_failure_is_reported_per_collection() {
    let mut store = MockStore::new();
    store.expect_set_profile().returning(|_, _| Ok(()));
    store.expect_list_documents().returning(|_, _| Ok(vec![]));
    store
        .expect_set_document()
        .returning(|_, collection, _, _| {
            if collection == LANGUAGES_COLLECTION {
                Err(StoreError::Request("connection reset".to_string()))
            } else {
                Ok(())
            }
        });

    let repo = ProfileRepository::new(Arc::new(store));
    let report = repo.save_profile(TEST_UID, &full_profile()).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.failed_collections(), vec![LANGUAGES_COLLECTION]);

    let languages = report
        .collections
        .iter()
        .find(|c| c.collection == LANGUAGES_COLLECTION)
        .unwrap();
    assert_eq!(languages.replaced, 0);
    assert!(languages.error.as_deref().unwrap().contains("connection reset"));

    // The other collections still ran and landed.
    let skills = report
        .collections
        .iter()
        .find(|c| c.collection == SKILLS_COLLECTION)
        .unwrap();
    assert_eq!(skills.replaced, 2);
    assert!(skills.error.is_none());
}

#[tokio::test]
async fn profile_document_failure_aborts_the_save() {
    let mut store = MockStore::new();
    store
        .expect_set_profile()
        .returning(|_, _| Err(StoreError::Status(503)));

    let repo = ProfileRepository::new(Arc::new(store));
    let result = repo.save_profile(TEST_UID, &full_profile()).await;

    assert!(result.is_err());
}
