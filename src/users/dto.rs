use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    users::repo_types::{Role, User},
    validation::Violations,
};

/// User as exposed over the API; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub is_nutritionist: bool,
    pub is_client: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            is_admin: u.role == Role::Admin,
            is_nutritionist: u.role == Role::Nutritionist,
            is_client: u.role == Role::Client,
            role: u.role,
        }
    }
}

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl NewUserRequest {
    /// `role` falls back to `default_role`; callers decide whether a given role is honoured.
    pub fn validate(self, default_role: Role) -> AppResult<RegisterUser> {
        let mut v = Violations::new();
        let username = v.required("username", self.username.as_deref());
        let password = v.required("password", self.password.as_deref());
        let first_name = v.required("firstName", self.first_name.as_deref());
        let last_name = v.required("lastName", self.last_name.as_deref());
        let email = v.required("email", self.email.as_deref());

        if let Some(u) = &username {
            v.length("username", u, 1, 25);
        }
        if let Some(p) = &password {
            v.length("password", p, 5, 20);
        }
        if let Some(f) = &first_name {
            v.length("firstName", f, 1, 30);
        }
        if let Some(l) = &last_name {
            v.length("lastName", l, 1, 30);
        }
        if let Some(e) = &email {
            v.length("email", e, 6, 60);
            v.email("email", e);
        }
        let role = match self.role.as_deref().map(str::parse::<Role>) {
            None => Some(default_role),
            Some(Ok(role)) => Some(role),
            Some(Err(e)) => {
                v.push("role", e.to_string());
                None
            }
        };
        v.finish("user")?;

        match (username, password, first_name, last_name, email, role) {
            (Some(username), Some(password), Some(first_name), Some(last_name), Some(email), Some(role)) => {
                Ok(RegisterUser {
                    username,
                    password,
                    first_name,
                    last_name,
                    email: email.to_lowercase(),
                    role,
                })
            }
            _ => Err(crate::error::AppError::bad_request("invalid user")),
        }
    }
}

/// Validated partial update; the password is still plain text here.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> AppResult<UserUpdate> {
        let mut v = Violations::new();
        let first_name = self.first_name.map(|s| s.trim().to_string());
        let last_name = self.last_name.map(|s| s.trim().to_string());
        let email = self.email.map(|s| s.trim().to_lowercase());

        if let Some(f) = &first_name {
            v.length("firstName", f, 1, 30);
        }
        if let Some(l) = &last_name {
            v.length("lastName", l, 1, 30);
        }
        if let Some(e) = &email {
            v.length("email", e, 6, 60);
            v.email("email", e);
        }
        if let Some(p) = &self.password {
            v.length("password", p, 5, 20);
        }
        let role = match self.role.as_deref().map(str::parse::<Role>) {
            None => None,
            Some(Ok(role)) => Some(role),
            Some(Err(e)) => {
                v.push("role", e.to_string());
                None
            }
        };
        v.finish("user")?;

        Ok(UserUpdate {
            first_name,
            last_name,
            email,
            password: self.password,
            role,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<PublicUser>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedUserResponse {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedUserResponse {
    #[serde(rename = "deleted user")]
    pub deleted_user: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn full_request() -> NewUserRequest {
        NewUserRequest {
            username: Some("alice".into()),
            password: Some("password1".into()),
            first_name: Some("Alice".into()),
            last_name: Some("Liddell".into()),
            email: Some("Alice@Example.com".into()),
            role: None,
        }
    }

    #[test]
    fn registration_defaults_the_role_and_lowercases_email() {
        let user = full_request().validate(Role::Nutritionist).unwrap();
        assert_eq!(user.role, Role::Nutritionist);
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn registration_reports_every_violation() {
        let req = NewUserRequest {
            password: Some("abc".into()),
            email: Some("not-an-email".into()),
            role: Some("chef".into()),
            ..NewUserRequest::default()
        };
        let err = req.validate(Role::Client).unwrap_err();
        let fields: Vec<_> = err.details().iter().map(|d| d.field.clone()).collect();
        assert_eq!(
            fields,
            vec!["username", "firstName", "lastName", "password", "email", "role"]
        );
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[test]
    fn public_user_derives_flags_from_role() {
        let user = User {
            id: 1,
            username: "bob".into(),
            password_hash: "x".into(),
            first_name: "Bob".into(),
            last_name: "B".into(),
            email: "bob@example.com".into(),
            role: Role::Client,
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert_eq!(json["isClient"], true);
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["role"], "client");
    }

    #[test]
    fn update_rejects_bad_email() {
        let req = UpdateUserRequest {
            email: Some("nope".into()),
            ..UpdateUserRequest::default()
        };
        assert!(req.validate().is_err());
    }
}
