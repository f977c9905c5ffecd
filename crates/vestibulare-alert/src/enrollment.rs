//! Subscription enrollment under plan limits.

use std::sync::Arc;

use tracing::info;

use vestibulare_core::error::AppError;
use vestibulare_core::result::AppResult;
use vestibulare_database::Stores;
use vestibulare_entity::subscription::{NewSubscription, Subscription};

use crate::clock::Clock;
use crate::plan::PlanTable;

/// Creates subscriptions on behalf of users, enforcing their plan.
#[derive(Debug, Clone)]
pub struct Enrollment {
    stores: Stores,
    plans: Arc<PlanTable>,
    clock: Arc<dyn Clock>,
}

impl Enrollment {
    /// Create an enrollment service.
    pub fn new(stores: Stores, plans: Arc<PlanTable>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            plans,
            clock,
        }
    }

    /// Subscribe a user to an exam program.
    ///
    /// Rejects unknown users and programs, channels outside the user's
    /// effective plan, a plan already at its program limit, and a second
    /// subscription to the same program.
    pub async fn enroll(&self, input: NewSubscription) -> AppResult<Subscription> {
        input.validate()?;

        let profile = self
            .stores
            .profiles
            .find_profile(input.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", input.user_id)))?;
        self.stores
            .programs
            .find_program(input.exam_program_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Exam program {} not found", input.exam_program_id))
            })?;

        let policy = self.plans.effective_policy(&profile, self.clock.now());
        if let Some(channel) = input.channels.iter().find(|c| !policy.allows_channel(**c)) {
            return Err(AppError::validation(format!(
                "Plan '{}' does not include the {channel} channel",
                policy.tier
            )));
        }

        let current = self.stores.subscriptions.count_by_user(profile.id).await?;
        if !self.plans.can_add_subscription(&policy.tier, current) {
            return Err(AppError::authorization(format!(
                "Plan '{}' allows at most {} exam programs",
                policy.tier, policy.max_programs
            )));
        }

        let subscription = self.stores.subscriptions.create_subscription(input).await?;
        info!(
            user_id = %subscription.user_id,
            exam_program_id = %subscription.exam_program_id,
            "Subscription created"
        );
        Ok(subscription)
    }
}
