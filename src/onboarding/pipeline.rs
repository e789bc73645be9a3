//! Onboarder: runs the onboarding steps against the platform and undoes
//! completed steps when a later one fails.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{error, info, warn};

use super::model::{
    EMPLOYEE_ID_ATTRIBUTE, OnboardRequest, OnboardResponse, StaffProfile, ValidatedRequest,
};
use super::password::generate_temp_password;
use super::state::OnboardingProgress;
use crate::config::OnboardConfig;
use crate::error::{OnboardingError, PlatformError, StageError};
use crate::platform::{Permission, Platform, Query, Role, unique_id};

/// Runs the onboarding flow for one request at a time.
pub struct Onboarder {
    platform: Arc<dyn Platform>,
    config: Arc<OnboardConfig>,
}

impl Onboarder {
    pub fn new(platform: Arc<dyn Platform>, config: Arc<OnboardConfig>) -> Self {
        Self { platform, config }
    }

    /// Onboard a new staff member.
    ///
    /// 1. Validate the request (no platform calls on failure).
    /// 2. Reject an `employeeId` that already has a profile.
    /// 3. Create the account with a temporary password.
    /// 4. Create the staff profile with its permissions.
    /// 5. Send the password-recovery email.
    pub async fn onboard(
        &self,
        request: OnboardRequest,
    ) -> Result<OnboardResponse, OnboardingError> {
        let request = request.validate()?;
        let mut progress = OnboardingProgress::new();
        info!(employee_id = %request.employee_id, "Onboarding request validated");

        self.ensure_unique_employee(&request, &progress).await?;

        let password = generate_temp_password();
        let account = self
            .platform
            .create_account(
                &unique_id(),
                &request.email,
                password.expose_secret(),
                &request.first_name,
            )
            .await
            .map_err(|source| OnboardingError::Platform {
                stage: progress.stage,
                source,
            })?;
        self.record(progress.identity_created(&account.id));
        info!(
            employee_id = %request.employee_id,
            auth_user_id = %account.id,
            "Auth identity created"
        );

        let profile = StaffProfile::new(&account.id, &request);
        let data = match serde_json::to_value(&profile) {
            Ok(data) => data,
            Err(e) => {
                self.compensate(&progress).await;
                return Err(OnboardingError::Internal(format!(
                    "Failed to serialize staff profile: {e}"
                )));
            }
        };

        let document = match self
            .platform
            .create_document(
                &self.config.database_id,
                &self.config.staff_collection_id,
                &unique_id(),
                data,
                &self.profile_permissions(&account.id),
            )
            .await
        {
            Ok(document) => document,
            Err(source) => {
                self.compensate(&progress).await;
                if source.is_conflict() {
                    warn!(
                        employee_id = %request.employee_id,
                        "Staff profile rejected as duplicate by the store"
                    );
                    return Err(OnboardingError::Conflict);
                }
                return Err(OnboardingError::Platform {
                    stage: progress.stage,
                    source,
                });
            }
        };
        self.record(progress.profile_created(&document.id));
        info!(
            employee_id = %request.employee_id,
            staff_doc_id = %document.id,
            "Staff profile created"
        );

        if let Err(source) = self
            .platform
            .create_recovery(&request.email, &self.config.reset_password_url())
            .await
        {
            self.compensate(&progress).await;
            return Err(OnboardingError::Platform {
                stage: progress.stage,
                source,
            });
        }
        self.record(progress.notification_sent());
        info!(
            employee_id = %request.employee_id,
            stage = %progress.stage,
            "Onboarding email sent"
        );

        Ok(OnboardResponse::new(account.id, document.id))
    }

    async fn ensure_unique_employee(
        &self,
        request: &ValidatedRequest,
        progress: &OnboardingProgress,
    ) -> Result<(), OnboardingError> {
        let existing = self
            .platform
            .list_documents(
                &self.config.database_id,
                &self.config.staff_collection_id,
                &[Query::equal(EMPLOYEE_ID_ATTRIBUTE, request.employee_id.as_str())],
            )
            .await
            .map_err(|source| OnboardingError::Platform {
                stage: progress.stage,
                source,
            })?;

        if existing.total > 0 {
            info!(employee_id = %request.employee_id, "Employee already exists");
            return Err(OnboardingError::Conflict);
        }
        Ok(())
    }

    /// The staff member may read their own profile; the admin team has full
    /// access.
    fn profile_permissions(&self, auth_user_id: &str) -> Vec<Permission> {
        let admin = &self.config.admin_team;
        vec![
            Permission::read(Role::user(auth_user_id)),
            Permission::read(Role::team(admin.as_str())),
            Permission::update(Role::team(admin.as_str())),
            Permission::delete(Role::team(admin.as_str())),
        ]
    }

    fn record(&self, transition: Result<(), StageError>) {
        if let Err(e) = transition {
            warn!("Failed to advance onboarding stage: {}", e);
        }
    }

    /// Undo the steps recorded in `progress`, newest first. Failures are
    /// logged and otherwise ignored so the caller sees the original error.
    async fn compensate(&self, progress: &OnboardingProgress) {
        if let Some(doc_id) = &progress.staff_doc_id {
            match self
                .platform
                .delete_document(
                    &self.config.database_id,
                    &self.config.staff_collection_id,
                    doc_id,
                )
                .await
            {
                Ok(()) => info!(staff_doc_id = %doc_id, "Rolled back staff profile"),
                Err(e) => log_rollback_failure("staff profile", doc_id, &e),
            }
        }

        if let Some(user_id) = &progress.auth_user_id {
            match self.platform.delete_user(user_id).await {
                Ok(()) => info!(auth_user_id = %user_id, "Rolled back auth identity"),
                Err(e) => log_rollback_failure("auth identity", user_id, &e),
            }
        }
    }
}

fn log_rollback_failure(resource: &str, id: &str, err: &PlatformError) {
    error!(
        resource,
        id,
        error = %err,
        "Rollback failed; resource left behind"
    );
}
