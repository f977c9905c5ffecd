//! Plan-expiry hygiene.
//!
//! Moves profiles whose paid plan lapsed onto the restricted tier. Dispatch
//! never relies on this having run; the entitlement guard coerces lapsed
//! plans on its own.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use vestibulare_alert::{Clock, PlanTable};
use vestibulare_database::ProfileStore;

use crate::executor::{JobExecutionError, JobHandler};

/// Downgrades lapsed plans.
pub struct PlanExpirationJob {
    profiles: Arc<dyn ProfileStore>,
    plans: Arc<PlanTable>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PlanExpirationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanExpirationJob")
            .field("restricted_tier", self.plans.restricted_tier())
            .finish_non_exhaustive()
    }
}

impl PlanExpirationJob {
    /// Job name used for scheduling.
    pub const NAME: &'static str = "plan_expiration";

    /// Create the job.
    pub fn new(profiles: Arc<dyn ProfileStore>, plans: Arc<PlanTable>, clock: Arc<dyn Clock>) -> Self {
        Self {
            profiles,
            plans,
            clock,
        }
    }
}

#[async_trait]
impl JobHandler for PlanExpirationJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self) -> Result<Value, JobExecutionError> {
        let now = self.clock.now();
        let tier = self.plans.restricted_tier();
        let downgraded = self.profiles.downgrade_expired(now, tier).await?;
        if downgraded > 0 {
            tracing::info!(downgraded, tier = %tier, "Lapsed plans downgraded");
        }
        Ok(json!({ "downgraded": downgraded }))
    }
}
