use crate::users::{dto::PublicUser, repo_types::Role};

/// Who is signed in. Passed explicitly to every authenticated call.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: PublicUser,
}

impl Session {
    pub fn new(token: impl Into<String>, refresh_token: Option<String>, user: PublicUser) -> Self {
        Self {
            token: token.into(),
            refresh_token,
            user,
        }
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }

    /// Admins and nutritionists may build and share meal plans.
    pub fn can_plan(&self) -> bool {
        matches!(self.user.role, Role::Admin | Role::Nutritionist)
    }
}
