//! Onboarding state machine: tracks which mutating steps have completed.

use serde::{Deserialize, Serialize};

use crate::error::StageError;

/// Stages of a single onboarding run.
///
/// Progresses linearly: Validated → IdentityCreated → ProfileCreated →
/// NotificationSent. The stage records the last step that succeeded, which
/// decides what has to be undone when the next one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    Validated,
    IdentityCreated,
    ProfileCreated,
    NotificationSent,
}

impl OnboardingStage {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStage) -> bool {
        use OnboardingStage::*;
        matches!(
            (self, target),
            (Validated, IdentityCreated)
                | (IdentityCreated, ProfileCreated)
                | (ProfileCreated, NotificationSent)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotificationSent)
    }

    pub fn next(&self) -> Option<OnboardingStage> {
        use OnboardingStage::*;
        match self {
            Validated => Some(IdentityCreated),
            IdentityCreated => Some(ProfileCreated),
            ProfileCreated => Some(NotificationSent),
            NotificationSent => None,
        }
    }
}

impl Default for OnboardingStage {
    fn default() -> Self {
        Self::Validated
    }
}

impl std::fmt::Display for OnboardingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validated => "validated",
            Self::IdentityCreated => "identity_created",
            Self::ProfileCreated => "profile_created",
            Self::NotificationSent => "notification_sent",
        };
        write!(f, "{s}")
    }
}

/// Progress of one onboarding run, including what it has created so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingProgress {
    pub stage: OnboardingStage,
    pub auth_user_id: Option<String>,
    pub staff_doc_id: Option<String>,
}

impl OnboardingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next stage. Returns an error if already terminal.
    fn advance(&mut self) -> Result<OnboardingStage, StageError> {
        let next = self.stage.next().ok_or(StageError::Terminal(self.stage))?;
        if !self.stage.can_transition_to(next) {
            return Err(StageError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(next)
    }

    fn expect_stage(&self, expected: OnboardingStage) -> Result<(), StageError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(StageError::OutOfOrder {
                expected,
                found: self.stage,
            })
        }
    }

    pub fn identity_created(&mut self, auth_user_id: &str) -> Result<(), StageError> {
        self.expect_stage(OnboardingStage::Validated)?;
        self.advance()?;
        self.auth_user_id = Some(auth_user_id.to_string());
        Ok(())
    }

    pub fn profile_created(&mut self, staff_doc_id: &str) -> Result<(), StageError> {
        self.expect_stage(OnboardingStage::IdentityCreated)?;
        self.advance()?;
        self.staff_doc_id = Some(staff_doc_id.to_string());
        Ok(())
    }

    pub fn notification_sent(&mut self) -> Result<(), StageError> {
        self.expect_stage(OnboardingStage::ProfileCreated)?;
        self.advance()?;
        Ok(())
    }
}
