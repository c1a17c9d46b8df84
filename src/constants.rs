use once_cell::sync::Lazy;

/// Top-level collection holding one document per user.
pub const PROFILES_COLLECTION: &str = "profiles";

/// Sub-collections nested under each profile document.
pub const WORK_EXPERIENCES_COLLECTION: &str = "workExperiences";
pub const EDUCATION_COLLECTION: &str = "education";
pub const SKILLS_COLLECTION: &str = "skills";
pub const LANGUAGES_COLLECTION: &str = "languages";
pub const APPRECIATIONS_COLLECTION: &str = "appreciations";

pub const SUB_COLLECTIONS: [&str; 5] = [
    WORK_EXPERIENCES_COLLECTION,
    EDUCATION_COLLECTION,
    SKILLS_COLLECTION,
    LANGUAGES_COLLECTION,
    APPRECIATIONS_COLLECTION,
];

/// Job title given to freshly seeded profiles.
pub const DEFAULT_JOB_TITLE: &str = "Professional";

/// End-date sentinel for an ongoing position.
pub const PRESENT: &str = "Present";

/// The single field an appreciation document carries.
pub const APPRECIATION_TEXT_FIELD: &str = "text";

/// Skills offered as completions in the skill picker. Free text outside
/// this list is still accepted.
pub static SUGGESTED_SKILLS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Leadership",
        "Teamwork",
        "Communication",
        "Project Management",
        "Problem Solving",
        "Time Management",
        "Customer Service",
        "Data Analysis",
        "Graphic Design",
        "Copywriting",
        "Sales",
        "Marketing",
        "Accounting",
        "Negotiation",
        "Public Speaking",
    ]
});

/// Storage key for a user's profile image. One key per user; uploads
/// overwrite in place.
pub fn profile_image_key(user_id: &str) -> String {
    format!("profile_images/{}.jpg", user_id)
}
