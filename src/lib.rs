//! Staff onboarding service: creates an account, a staff profile and a
//! recovery email for each new staff member.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod platform;
