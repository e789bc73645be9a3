//! Request, profile and response models for staff onboarding.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::OnboardingError;

/// Role assigned when the request does not name one.
pub const DEFAULT_ROLE: &str = "staff";

/// Profile attribute that must be unique across the staff collection.
pub const EMPLOYEE_ID_ATTRIBUTE: &str = "employeeId";

/// Raw onboarding request body. Every field is optional here; see
/// [`OnboardRequest::validate`] for which ones are required.
///
/// `username` and `role` keep an absent key (`None`) apart from an explicit
/// `null` (`Some(None)`), since only an absent key gets a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<Option<String>>,
    pub employee_id: Option<String>,
    pub department_id: Option<String>,
    pub default_schedule_id: Option<String>,
    pub default_shift_id: Option<String>,
    pub schedule_anchor_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<Option<String>>,
}

/// A request that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub employee_id: String,
    pub department_id: Option<String>,
    pub default_schedule_id: Option<String>,
    pub default_shift_id: Option<String>,
    pub schedule_anchor_date: Option<String>,
    /// `None` only when the request sent an explicit `null`.
    pub role: Option<String>,
}

/// Marks a key as present, whatever its value.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl OnboardRequest {
    /// Parse a request body. An empty body is treated as `{}`.
    pub fn parse(body: &[u8]) -> Result<Self, OnboardingError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| OnboardingError::InvalidBody(e.to_string()))
    }

    /// Apply defaults and check required fields.
    ///
    /// `username` falls back to `firstName` and `role` to `"staff"` only when
    /// the key is absent. An explicit value, including `null` or `""`, is
    /// kept and validated as given. Whitespace counts as content.
    pub fn validate(self) -> Result<ValidatedRequest, OnboardingError> {
        let username = match self.username {
            Some(username) => username,
            None => self.first_name.clone(),
        };

        let (Some(email), Some(first_name), Some(last_name), Some(username), Some(employee_id)) = (
            non_empty(self.email),
            non_empty(self.first_name),
            non_empty(self.last_name),
            non_empty(username),
            non_empty(self.employee_id),
        ) else {
            return Err(OnboardingError::missing_fields());
        };

        Ok(ValidatedRequest {
            email,
            first_name,
            last_name,
            username,
            employee_id,
            department_id: non_empty(self.department_id),
            default_schedule_id: non_empty(self.default_schedule_id),
            default_shift_id: non_empty(self.default_shift_id),
            schedule_anchor_date: non_empty(self.schedule_anchor_date),
            role: self.role.unwrap_or_else(|| Some(DEFAULT_ROLE.to_string())),
        })
    }
}

/// Lifecycle of a staff profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    /// Account created, password not yet set by the staff member.
    Onboarding,
}

/// Staff profile document stored in the staff collection.
///
/// Optional references serialize as `null` rather than being omitted so the
/// stored document always carries every attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub employee_id: String,
    pub department_id: Option<String>,
    pub role: Option<String>,
    pub status: StaffStatus,
    pub default_schedule_id: Option<String>,
    pub default_shift_id: Option<String>,
    pub schedule_anchor_date: Option<String>,
}

impl StaffProfile {
    /// New profile in the `onboarding` state, linked to `user_id`.
    pub fn new(user_id: &str, request: &ValidatedRequest) -> Self {
        Self {
            user_id: user_id.to_string(),
            email: request.email.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            username: request.username.clone(),
            employee_id: request.employee_id.clone(),
            department_id: request.department_id.clone(),
            role: request.role.clone(),
            status: StaffStatus::Onboarding,
            default_schedule_id: request.default_schedule_id.clone(),
            default_shift_id: request.default_shift_id.clone(),
            schedule_anchor_date: request.schedule_anchor_date.clone(),
        }
    }
}

/// Success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardResponse {
    pub ok: bool,
    pub auth_user_id: String,
    pub staff_doc_id: String,
}

impl OnboardResponse {
    pub fn new(auth_user_id: String, staff_doc_id: String) -> Self {
        Self {
            ok: true,
            auth_user_id,
            staff_doc_id,
        }
    }
}
