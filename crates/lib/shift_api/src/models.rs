//! Request and response bodies.
//!
//! Field rules are declared with `validator`; handlers call `validate()`
//! (via [`crate::extract::ValidJson`]) before touching the domain layer.

use serde::{Deserialize, Serialize};
use shift_core::journal::EntryFilter;
use shift_core::models::entry::{EntryPatch, Mood, MoodLabel, NewEntry};
use shift_core::models::page::Pagination;
use shift_core::models::tag::{NewTag, TagPatch};
use shift_core::models::user::{Role, UserPatch, UserStatus};
use shift_core::users::{NewAccount, Registration};
use validator::{Validate, ValidationError};

const MSG_PASSWORD_RULES: &str =
    "Password must have atleast one uppercase letter, one number, and one special character!";
const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// At least one uppercase letter, one digit and one of `!@#$%^&*`.
fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if upper && digit && special {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(MSG_PASSWORD_RULES.into()))
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Field must not be blank!".into()));
    }
    Ok(())
}

/// Generic `{ message }` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        custom(function = "not_blank", message = "Fullname is required!"),
        length(max = 60, message = "Fullname must not exceed 60 characters long!")
    )]
    pub fullname: String,
    #[validate(length(
        min = 6,
        max = 15,
        message = "Username must be between 6 and 15 characters long!"
    ))]
    pub username: String,
    #[validate(email(message = "Invalid email!"))]
    pub email: String,
    #[validate(
        length(min = 6, max = 64, message = "Password must be 6 to 64 characters long!"),
        custom(function = "validate_password_strength")
    )]
    pub password: String,
}

impl From<RegisterRequest> for Registration {
    fn from(r: RegisterRequest) -> Self {
        Registration {
            fullname: r.fullname.trim().to_string(),
            email: r.email.trim().to_lowercase(),
            username: r.username.trim().to_string(),
            password: r.password,
        }
    }
}

/// Admin account creation. `role` defaults to `user`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(nested)]
    #[serde(flatten)]
    pub account: RegisterRequest,
    pub role: Option<Role>,
}

impl From<CreateUserRequest> for NewAccount {
    fn from(r: CreateUserRequest) -> Self {
        let role = r.role.unwrap_or(Role::User);
        let reg = Registration::from(r.account);
        NewAccount {
            fullname: reg.fullname,
            email: reg.email,
            username: reg.username,
            password: reg.password,
            role,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email or username.
    #[validate(custom(function = "not_blank", message = "Email or Username is required!"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password is required!"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email!"))]
    pub email: String,
}

impl EmailRequest {
    pub fn normalized(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

fn passwords_match(body: &NewPasswordRequest) -> Result<(), ValidationError> {
    if body.new_password == body.confirm_password {
        Ok(())
    } else {
        Err(ValidationError::new("password_mismatch")
            .with_message("Password doesn't match".into()))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "passwords_match"))]
pub struct NewPasswordRequest {
    #[validate(
        length(min = 6, max = 64, message = "Password must be 6 to 64 characters long!"),
        custom(function = "validate_password_strength")
    )]
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 60, message = "Fullname must not exceed 60 characters long!"))]
    pub fullname: Option<String>,
    #[validate(length(
        min = 6,
        max = 15,
        message = "Username must be between 6 and 15 characters long!"
    ))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email!"))]
    pub email: Option<String>,
    /// Honoured only on the admin update route.
    pub role: Option<Role>,
}

impl From<UpdateProfileRequest> for UserPatch {
    fn from(r: UpdateProfileRequest) -> Self {
        UserPatch {
            fullname: r.fullname.map(|s| s.trim().to_string()),
            email: r.email.map(|s| s.trim().to_lowercase()),
            username: r.username.map(|s| s.trim().to_string()),
            role: r.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvatarRequest {
    #[validate(url(message = "Avatar must be a valid URL!"))]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StatusRequest {
    pub status: UserStatus,
    #[validate(length(max = 500, message = "Reason must not exceed 500 characters!"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SoftDeleteRequest {
    #[validate(length(max = 500, message = "Reason must not exceed 500 characters!"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MoodInput {
    pub label: MoodLabel,
    #[validate(range(min = 1, max = 5, message = "Mood intensity must be between 1 and 5!"))]
    pub intensity: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddEntryRequest {
    #[validate(
        custom(function = "not_blank", message = "Entry is required!"),
        length(max = 5000, message = "Entry must not exceed 5000 characters!")
    )]
    pub entry: String,
    #[validate(nested)]
    pub mood: MoodInput,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AddEntryRequest {
    /// The validated entry. Intensity was range-checked by `validate()`.
    pub fn into_new_entry(self) -> Option<NewEntry> {
        let mood = Mood::new(self.mood.label, self.mood.intensity).ok()?;
        Some(NewEntry {
            content: self.entry,
            mood,
            tags: self.tags,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MoodPatchInput {
    pub label: Option<MoodLabel>,
    #[validate(range(min = 1, max = 5, message = "Mood intensity must be between 1 and 5!"))]
    pub intensity: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEntryRequest {
    #[validate(length(max = 5000, message = "Entry must not exceed 5000 characters!"))]
    pub entry: Option<String>,
    #[validate(nested)]
    pub mood: Option<MoodPatchInput>,
    pub tags: Option<Vec<String>>,
}

impl From<UpdateEntryRequest> for EntryPatch {
    fn from(r: UpdateEntryRequest) -> Self {
        let mood = r.mood.unwrap_or_default();
        EntryPatch {
            content: r.entry,
            mood_label: mood.label,
            mood_intensity: mood.intensity.and_then(|i| u8::try_from(i).ok()),
            tags: r.tags,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddTagRequest {
    #[validate(length(min = 4, message = "Tag name must be at least 4 characters long!"))]
    pub name: String,
    #[validate(custom(function = "not_blank", message = "Tag color is required!"))]
    pub color: String,
    #[validate(length(min = 4, message = "Description must be at least 4 characters long!"))]
    pub description: Option<String>,
}

impl From<AddTagRequest> for NewTag {
    fn from(r: AddTagRequest) -> Self {
        NewTag {
            name: r.name,
            color: r.color,
            description: r.description,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 4, message = "Tag name must be at least 4 characters long!"))]
    pub name: Option<String>,
    #[validate(custom(function = "not_blank", message = "Tag color is required!"))]
    pub color: Option<String>,
    #[validate(length(min = 4, message = "Description must be at least 4 characters long!"))]
    pub description: Option<String>,
}

impl From<UpdateTagRequest> for TagPatch {
    fn from(r: UpdateTagRequest) -> Self {
        TagPatch {
            name: r.name,
            color: r.color,
            description: r.description,
        }
    }
}

/// `GET /api/entries` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub tag: Option<String>,
    pub mood: Option<MoodLabel>,
    #[serde(default)]
    pub deleted: bool,
}

impl EntryListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }

    pub fn filter(&self) -> EntryFilter {
        EntryFilter {
            tag: self
                .tag
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            mood: self.mood,
            deleted: self.deleted,
        }
    }
}

/// `GET /api/users/get-users` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub q: Option<String>,
}

impl UserListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}
