use std::sync::Arc;

use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use validator::Validate;

use crate::constants::{
    profile_image_key, APPRECIATIONS_COLLECTION, APPRECIATION_TEXT_FIELD,
    EDUCATION_COLLECTION, LANGUAGES_COLLECTION, SKILLS_COLLECTION, SUB_COLLECTIONS,
    WORK_EXPERIENCES_COLLECTION,
};
use crate::entities::{
    new_entity_id, to_field_map, Education, FieldMap, Language, NewEducation, NewLanguage,
    NewSkill, NewWorkExperience, ProfileFieldPatch, Skill, UserProfile, WorkExperience,
};
use crate::entities::user_profile::stable_id;
use crate::errors::SyncError;
use crate::repositories::store::StoreEvent;
use crate::repositories::{AuthUser, BlobStore, IdentityProvider, ProfileStore};
use crate::use_cases::live_sync::{
    apply_event, documents_to_appreciations, documents_to_education,
    documents_to_languages, documents_to_skills, documents_to_work_experiences,
    ProfileEvent,
};

/// The profile synchronization core.
///
/// Owns the authoritative snapshot, serializes every mutation against it
/// and bridges the asynchronous store to a synchronous read model: the
/// UI observes `profile`, `is_loading` and `error` through watch
/// channels, each with last-value-wins semantics.
///
/// Every operation catches its own store failure, mirrors it into
/// `error` as a readable message and returns it to the caller. Nothing
/// is retried automatically and no failure aborts other in-flight work.
pub struct ProfileSync<S, I, B>
where
    S: ProfileStore,
    I: IdentityProvider,
    B: BlobStore,
{
    store: Arc<S>,
    identity: Arc<I>,
    blobs: Arc<B>,
    profile_tx: watch::Sender<Option<UserProfile>>,
    is_loading_tx: watch::Sender<bool>,
    error_tx: watch::Sender<Option<String>>,
}

/// Owns the live-sync listener tasks. Subscriptions run until the
/// handle is shut down or dropped at session end.
pub struct LiveSyncHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl LiveSyncHandle {
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for LiveSyncHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<S, I, B> ProfileSync<S, I, B>
where
    S: ProfileStore + 'static,
    I: IdentityProvider + 'static,
    B: BlobStore + 'static,
{
    pub fn new(store: Arc<S>, identity: Arc<I>, blobs: Arc<B>) -> Self {
        ProfileSync {
            store,
            identity,
            blobs,
            profile_tx: watch::Sender::new(None),
            is_loading_tx: watch::Sender::new(false),
            error_tx: watch::Sender::new(None),
        }
    }

    // ───── Observable State ─────────────────────────────────────────

    pub fn profile(&self) -> watch::Receiver<Option<UserProfile>> {
        self.profile_tx.subscribe()
    }

    pub fn is_loading(&self) -> watch::Receiver<bool> {
        self.is_loading_tx.subscribe()
    }

    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    pub fn clear_error(&self) {
        self.error_tx.send_replace(None);
    }

    // ───── Loading & Seeding ────────────────────────────────────────

    /// Fetches the profile document and all five sub-collections. A
    /// missing document seeds and persists a default profile from the
    /// identity provider. On failure the snapshot stays unset, `error`
    /// is set and `is_loading` is cleared.
    pub async fn load(&self) -> Result<(), SyncError> {
        self.is_loading_tx.send_replace(true);
        self.error_tx.send_replace(None);

        let result = self.load_inner().await;

        self.is_loading_tx.send_replace(false);
        match &result {
            Err(SyncError::NotAuthenticated) => self.report_error("User not authenticated"),
            Err(e) => self.report_error(format!("Error loading profile: {e}")),
            Ok(()) => {}
        }
        result
    }

    async fn load_inner(&self) -> Result<(), SyncError> {
        let user = self
            .identity
            .current_user()
            .ok_or(SyncError::NotAuthenticated)?;

        let Some(fields) = self.store.get_profile(&user.uid).await? else {
            return self.create_new_profile(&user).await;
        };

        let (work, education, skills, languages, appreciations) = futures::join!(
            self.store.list_documents(&user.uid, WORK_EXPERIENCES_COLLECTION),
            self.store.list_documents(&user.uid, EDUCATION_COLLECTION),
            self.store.list_documents(&user.uid, SKILLS_COLLECTION),
            self.store.list_documents(&user.uid, LANGUAGES_COLLECTION),
            self.store.list_documents(&user.uid, APPRECIATIONS_COLLECTION),
        );

        let mut profile = UserProfile::seeded(
            &user.uid,
            user.display_name.as_deref(),
            user.email.as_deref(),
            None,
        );
        match ProfileFieldPatch::from_fields(&fields) {
            Ok(patch) => profile.apply_patch(patch),
            Err(e) => tracing::warn!("Ignoring unparseable profile fields: {e}"),
        }
        profile.work_experience = documents_to_work_experiences(&work?);
        profile.education = documents_to_education(&education?);
        profile.skills = documents_to_skills(&skills?);
        profile.languages = documents_to_languages(&languages?);
        profile.appreciations = documents_to_appreciations(&appreciations?);

        self.profile_tx.send_replace(Some(profile));
        Ok(())
    }

    async fn create_new_profile(&self, user: &AuthUser) -> Result<(), SyncError> {
        let profile = UserProfile::seeded(
            &user.uid,
            user.display_name.as_deref(),
            user.email.as_deref(),
            user.photo_url.as_deref(),
        );

        self.store
            .set_profile(&user.uid, &profile.profile_fields())
            .await?;

        tracing::info!("Seeded new profile for user {}", user.uid);
        self.profile_tx.send_replace(Some(profile));
        Ok(())
    }

    // ───── Scalar Field Updates ─────────────────────────────────────

    /// Patches only `aboutMe`, remotely and locally. No read-back; all
    /// other fields and sequences are untouched.
    pub async fn update_about_me(&self, text: &str) -> Result<(), SyncError> {
        let user = self.require_user()?;

        let mut fields = FieldMap::new();
        fields.insert("aboutMe".into(), json!(text));
        if let Err(e) = self.store.update_profile_fields(&user.uid, &fields).await {
            self.report_error(format!("Error updating about me: {e}"));
            return Err(e.into());
        }

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.about_me = text.to_string();
            }
        });
        Ok(())
    }

    pub async fn update_basic_info(
        &self,
        name: &str,
        phone: &str,
        location: &str,
    ) -> Result<(), SyncError> {
        let user = self.require_user()?;

        let mut fields = FieldMap::new();
        fields.insert("name".into(), json!(name));
        fields.insert("phone".into(), json!(phone));
        fields.insert("location".into(), json!(location));
        if let Err(e) = self.store.update_profile_fields(&user.uid, &fields).await {
            self.report_error(format!("Error updating profile info: {e}"));
            return Err(e.into());
        }

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.set_name(name.to_string());
                profile.phone = phone.to_string();
                profile.location = location.to_string();
            }
        });
        Ok(())
    }

    pub async fn update_resume_filename(&self, filename: &str) -> Result<(), SyncError> {
        let user = self.require_user()?;

        let mut fields = FieldMap::new();
        fields.insert("resumeFilename".into(), json!(filename));
        if let Err(e) = self.store.update_profile_fields(&user.uid, &fields).await {
            self.report_error(format!("Error updating resume filename: {e}"));
            return Err(e.into());
        }

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.resume_filename = filename.to_string();
            }
        });
        Ok(())
    }

    // ───── Work Experience ──────────────────────────────────────────

    pub async fn add_work_experience(
        &self,
        new: NewWorkExperience,
    ) -> Result<WorkExperience, SyncError> {
        let user = self.require_user()?;
        self.validated(&new, "adding work experience")?;

        let entity = new.prepare_for_insert(new_entity_id(), stable_id(&user.uid));
        self.write_subdoc(
            &user.uid,
            WORK_EXPERIENCES_COLLECTION,
            entity.id,
            &entity,
            "adding work experience",
        )
        .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.work_experience.push(entity.clone());
            }
        });
        Ok(entity)
    }

    pub async fn update_work_experience(
        &self,
        id: i64,
        new: NewWorkExperience,
    ) -> Result<WorkExperience, SyncError> {
        let user = self.require_user()?;
        self.validated(&new, "updating work experience")?;
        self.ensure_local(
            "work experience",
            id,
            |profile| profile.work_experience.iter().any(|w| w.id == id),
        )?;

        let entity = new.prepare_for_insert(id, stable_id(&user.uid));
        self.write_subdoc(
            &user.uid,
            WORK_EXPERIENCES_COLLECTION,
            id,
            &entity,
            "updating work experience",
        )
        .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                for item in profile.work_experience.iter_mut() {
                    if item.id == id {
                        *item = entity.clone();
                    }
                }
            }
        });
        Ok(entity)
    }

    pub async fn delete_work_experience(&self, id: i64) -> Result<(), SyncError> {
        let user = self.require_user()?;
        self.delete_subdoc(
            &user.uid,
            WORK_EXPERIENCES_COLLECTION,
            id,
            "deleting work experience",
        )
        .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.work_experience.retain(|item| item.id != id);
            }
        });
        Ok(())
    }

    // ───── Education ────────────────────────────────────────────────

    pub async fn add_education(&self, new: NewEducation) -> Result<Education, SyncError> {
        let user = self.require_user()?;
        self.validated(&new, "adding education")?;

        let entity = new.prepare_for_insert(new_entity_id(), stable_id(&user.uid));
        self.write_subdoc(
            &user.uid,
            EDUCATION_COLLECTION,
            entity.id,
            &entity,
            "adding education",
        )
        .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.education.push(entity.clone());
            }
        });
        Ok(entity)
    }

    pub async fn update_education(
        &self,
        id: i64,
        new: NewEducation,
    ) -> Result<Education, SyncError> {
        let user = self.require_user()?;
        self.validated(&new, "updating education")?;
        self.ensure_local("education", id, |profile| {
            profile.education.iter().any(|e| e.id == id)
        })?;

        let entity = new.prepare_for_insert(id, stable_id(&user.uid));
        self.write_subdoc(&user.uid, EDUCATION_COLLECTION, id, &entity, "updating education")
            .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                for item in profile.education.iter_mut() {
                    if item.id == id {
                        *item = entity.clone();
                    }
                }
            }
        });
        Ok(entity)
    }

    pub async fn delete_education(&self, id: i64) -> Result<(), SyncError> {
        let user = self.require_user()?;
        self.delete_subdoc(&user.uid, EDUCATION_COLLECTION, id, "deleting education")
            .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.education.retain(|item| item.id != id);
            }
        });
        Ok(())
    }

    // ───── Skills ───────────────────────────────────────────────────

    pub async fn add_skill(&self, new: NewSkill) -> Result<Skill, SyncError> {
        let user = self.require_user()?;
        self.validated(&new, "adding skill")?;

        let entity = new.prepare_for_insert(new_entity_id(), stable_id(&user.uid));
        self.write_subdoc(&user.uid, SKILLS_COLLECTION, entity.id, &entity, "adding skill")
            .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.skills.push(entity.clone());
            }
        });
        Ok(entity)
    }

    pub async fn delete_skill(&self, id: i64) -> Result<(), SyncError> {
        let user = self.require_user()?;
        self.delete_subdoc(&user.uid, SKILLS_COLLECTION, id, "deleting skill")
            .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.skills.retain(|item| item.id != id);
            }
        });
        Ok(())
    }

    // ───── Languages ────────────────────────────────────────────────

    pub async fn add_language(&self, new: NewLanguage) -> Result<Language, SyncError> {
        let user = self.require_user()?;
        self.validated(&new, "adding language")?;

        let entity = new.prepare_for_insert(new_entity_id(), stable_id(&user.uid));
        self.write_subdoc(
            &user.uid,
            LANGUAGES_COLLECTION,
            entity.id,
            &entity,
            "adding language",
        )
        .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.languages.push(entity.clone());
            }
        });
        Ok(entity)
    }

    pub async fn update_language(
        &self,
        id: i64,
        new: NewLanguage,
    ) -> Result<Language, SyncError> {
        let user = self.require_user()?;
        self.validated(&new, "updating language")?;
        self.ensure_local("language", id, |profile| {
            profile.languages.iter().any(|l| l.id == id)
        })?;

        let entity = new.prepare_for_insert(id, stable_id(&user.uid));
        self.write_subdoc(&user.uid, LANGUAGES_COLLECTION, id, &entity, "updating language")
            .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                for item in profile.languages.iter_mut() {
                    if item.id == id {
                        *item = entity.clone();
                    }
                }
            }
        });
        Ok(entity)
    }

    pub async fn delete_language(&self, id: i64) -> Result<(), SyncError> {
        let user = self.require_user()?;
        self.delete_subdoc(&user.uid, LANGUAGES_COLLECTION, id, "deleting language")
            .await?;

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.languages.retain(|item| item.id != id);
            }
        });
        Ok(())
    }

    // ───── Appreciations ────────────────────────────────────────────

    pub async fn add_appreciation(&self, text: &str) -> Result<(), SyncError> {
        let user = self.require_user()?;

        let mut fields = FieldMap::new();
        fields.insert(APPRECIATION_TEXT_FIELD.into(), json!(text));
        let doc_id = new_entity_id().to_string();
        if let Err(e) = self
            .store
            .set_document(&user.uid, APPRECIATIONS_COLLECTION, &doc_id, &fields)
            .await
        {
            self.report_error(format!("Error adding appreciation: {e}"));
            return Err(e.into());
        }

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.appreciations.push(text.to_string());
            }
        });
        Ok(())
    }

    /// Deletes the first stored appreciation whose text matches, then
    /// filters the local sequence.
    pub async fn delete_appreciation(&self, text: &str) -> Result<(), SyncError> {
        let user = self.require_user()?;

        let documents = match self
            .store
            .list_documents(&user.uid, APPRECIATIONS_COLLECTION)
            .await
        {
            Ok(documents) => documents,
            Err(e) => {
                self.report_error(format!("Error deleting appreciation: {e}"));
                return Err(e.into());
            }
        };

        let matching = documents.iter().find(|doc| {
            doc.fields
                .get(APPRECIATION_TEXT_FIELD)
                .and_then(serde_json::Value::as_str)
                == Some(text)
        });
        if let Some(doc) = matching {
            if let Err(e) = self
                .store
                .delete_document(&user.uid, APPRECIATIONS_COLLECTION, &doc.id)
                .await
            {
                self.report_error(format!("Error deleting appreciation: {e}"));
                return Err(e.into());
            }
        }

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.appreciations.retain(|item| item != text);
            }
        });
        Ok(())
    }

    // ───── Profile Image ────────────────────────────────────────────

    /// Uploads the image under the fixed per-user key, writes the
    /// address into the profile document and the snapshot, then hands
    /// it to the continuation. `is_loading` toggles around the round
    /// trip.
    pub async fn upload_profile_image<F>(
        &self,
        image: &[u8],
        on_success: F,
    ) -> Result<String, SyncError>
    where
        F: FnOnce(String),
    {
        self.is_loading_tx.send_replace(true);
        let result = self.upload_profile_image_inner(image).await;
        self.is_loading_tx.send_replace(false);

        match result {
            Ok(url) => {
                on_success(url.clone());
                Ok(url)
            }
            Err(e) => Err(e),
        }
    }

    async fn upload_profile_image_inner(&self, image: &[u8]) -> Result<String, SyncError> {
        let user = self.require_user()?;

        let kind = match infer::get(image) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => kind,
            _ => {
                let err = SyncError::InvalidImage("payload is not an image".to_string());
                self.report_error(format!("Error uploading image: {err}"));
                return Err(err);
            }
        };

        let key = profile_image_key(&user.uid);
        let url = match self.blobs.put(&key, image.to_vec(), kind.mime_type()).await {
            Ok(url) => url,
            Err(e) => {
                self.report_error(format!("Failed to upload image: {e}"));
                return Err(e.into());
            }
        };

        let mut fields = FieldMap::new();
        fields.insert("profileImageUrl".into(), json!(url));
        if let Err(e) = self.store.update_profile_fields(&user.uid, &fields).await {
            self.report_error(format!("Failed to update profile image: {e}"));
            return Err(e.into());
        }

        self.profile_tx.send_modify(|profile| {
            if let Some(profile) = profile {
                profile.profile_image_url = Some(url.clone());
            }
        });
        Ok(url)
    }

    // ───── Live Sync ────────────────────────────────────────────────

    /// Opens standing watches on the profile document and each
    /// sub-collection. Every event is folded into the snapshot through
    /// [`apply_event`]: slice-level merges only, tolerant of events
    /// arriving before the initial load completes.
    pub async fn establish_live_sync(&self) -> Result<LiveSyncHandle, SyncError> {
        let user = self.require_user()?;
        let mut tasks = Vec::with_capacity(1 + SUB_COLLECTIONS.len());

        let rx = match self.store.watch_profile(&user.uid).await {
            Ok(rx) => rx,
            Err(e) => {
                self.report_error(format!("Error listening to profile changes: {e}"));
                return Err(e.into());
            }
        };
        tasks.push(self.spawn_listener("profile", rx, user.uid.clone()));

        for collection in SUB_COLLECTIONS {
            let rx = match self.store.watch_collection(&user.uid, collection).await {
                Ok(rx) => rx,
                Err(e) => {
                    self.report_error(format!("Error listening to {collection} changes: {e}"));
                    return Err(e.into());
                }
            };
            tasks.push(self.spawn_listener(collection, rx, user.uid.clone()));
        }

        Ok(LiveSyncHandle { tasks })
    }

    fn spawn_listener(
        &self,
        label: &'static str,
        mut rx: mpsc::Receiver<StoreEvent>,
        uid: String,
    ) -> JoinHandle<()> {
        let profile_tx = self.profile_tx.clone();
        let error_tx = self.error_tx.clone();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let StoreEvent::Error { message } = &event {
                    tracing::warn!("Watch on {label} reported: {message}");
                    error_tx.send_replace(Some(format!(
                        "Error listening to {label} changes: {message}"
                    )));
                    continue;
                }

                if let Some(event) = ProfileEvent::from_store_event(event) {
                    profile_tx.send_modify(|slot| {
                        let current = slot.take();
                        *slot = apply_event(current, event, &uid);
                    });
                }
            }
            tracing::debug!("Watch on {label} closed");
        })
    }

    // ───── Helpers ──────────────────────────────────────────────────

    fn require_user(&self) -> Result<AuthUser, SyncError> {
        match self.identity.current_user() {
            Some(user) => Ok(user),
            None => {
                self.report_error("User not authenticated");
                Err(SyncError::NotAuthenticated)
            }
        }
    }

    fn validated<T: Validate>(&self, input: &T, context: &str) -> Result<(), SyncError> {
        if let Err(e) = input.validate() {
            let err = SyncError::from(e);
            self.report_error(format!("Error {context}: {err}"));
            return Err(err);
        }
        Ok(())
    }

    /// The id must already be present in the snapshot before an update
    /// writes remotely; a miss is surfaced instead of silently drifting.
    fn ensure_local<F>(&self, entity: &str, id: i64, exists: F) -> Result<(), SyncError>
    where
        F: Fn(&UserProfile) -> bool,
    {
        let found = self
            .profile_tx
            .borrow()
            .as_ref()
            .is_some_and(exists);
        if found {
            Ok(())
        } else {
            let err = SyncError::NotFound(format!("{entity} with id {id}"));
            self.report_error(format!("Error updating {entity}: {err}"));
            Err(err)
        }
    }

    async fn write_subdoc<T: serde::Serialize>(
        &self,
        uid: &str,
        collection: &'static str,
        id: i64,
        entity: &T,
        context: &str,
    ) -> Result<(), SyncError> {
        let fields = match to_field_map(entity) {
            Ok(fields) => fields,
            Err(e) => {
                let err = SyncError::InternalError(e.to_string());
                self.report_error(format!("Error {context}: {err}"));
                return Err(err);
            }
        };

        if let Err(e) = self
            .store
            .set_document(uid, collection, &id.to_string(), &fields)
            .await
        {
            self.report_error(format!("Error {context}: {e}"));
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete_subdoc(
        &self,
        uid: &str,
        collection: &'static str,
        id: i64,
        context: &str,
    ) -> Result<(), SyncError> {
        if let Err(e) = self
            .store
            .delete_document(uid, collection, &id.to_string())
            .await
        {
            self.report_error(format!("Error {context}: {e}"));
            return Err(e.into());
        }
        Ok(())
    }

    fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.error_tx.send_replace(Some(message));
    }
}
