pub mod appreciation;
pub mod education;
pub mod language;
pub mod skill;
pub mod user_profile;
pub mod work_experience;

pub use appreciation::Appreciation;
pub use education::{Education, NewEducation};
pub use language::{Language, LanguageLevel, NewLanguage};
pub use skill::{NewSkill, Skill};
pub use user_profile::{ProfileFieldPatch, UserProfile};
pub use work_experience::{NewWorkExperience, WorkExperience};

/// Scalar field map of a store document, exactly as it travels on the wire.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Fresh id for a new sub-resource entity. Random 63-bit value, positive
/// so the decimal rendering is a valid document key.
pub fn new_entity_id() -> i64 {
    use rand::Rng;
    rand::thread_rng().gen_range(1..i64::MAX)
}

/// Serializes an entity into its document field map.
pub fn to_field_map<T: serde::Serialize>(entity: &T) -> Result<FieldMap, serde_json::Error> {
    use serde::ser::Error;

    match serde_json::to_value(entity)? {
        serde_json::Value::Object(fields) => Ok(fields),
        other => Err(serde_json::Error::custom(format!(
            "entity serialized to {other:?}, expected an object"
        ))),
    }
}
