/// What the identity provider knows about the signed-in user. Consumed
/// at profile-creation time; only `uid` is guaranteed.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Contract of the external authentication service.
pub trait IdentityProvider: Send + Sync {
    /// The currently signed-in user, `None` when signed out.
    fn current_user(&self) -> Option<AuthUser>;
}
