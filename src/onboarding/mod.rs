//! Staff onboarding: validate the request, create the account and staff
//! profile, and send the recovery email that lets the new staff member set
//! their own password.
//!
//! Admin team membership for `role == "admin"` is deliberately not granted
//! here; profiles only carry document-level permissions for the admin team.

pub mod model;
pub mod password;
pub mod pipeline;
pub mod routes;
pub mod state;

pub use model::{OnboardRequest, OnboardResponse, StaffProfile, StaffStatus, ValidatedRequest};
pub use pipeline::Onboarder;
pub use routes::{OnboardRouteState, onboard_routes};
pub use state::{OnboardingProgress, OnboardingStage};
