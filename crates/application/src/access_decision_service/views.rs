use super::*;

/// One principal's windows bucketed by lifecycle status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessDashboard {
    /// Valid right now.
    pub active: Vec<AccessWindow>,
    /// Not started yet.
    pub pending: Vec<AccessWindow>,
    /// Over.
    pub expired: Vec<AccessWindow>,
    /// Disabled.
    pub revoked: Vec<AccessWindow>,
}

impl AccessDashboard {
    /// Buckets windows; revocation wins over expiry, expiry over pending.
    #[must_use]
    pub fn from_windows(windows: Vec<AccessWindow>, now: DateTime<Utc>) -> Self {
        let mut dashboard = Self::default();
        for window in windows {
            match window.status_at(now) {
                WindowStatus::Revoked => dashboard.revoked.push(window),
                WindowStatus::Expired => dashboard.expired.push(window),
                WindowStatus::Pending => dashboard.pending.push(window),
                WindowStatus::Active => dashboard.active.push(window),
            }
        }

        dashboard
    }

    /// Returns the total number of windows.
    #[must_use]
    pub fn total(&self) -> usize {
        self.active.len() + self.pending.len() + self.expired.len() + self.revoked.len()
    }
}

impl AccessDecisionService {
    /// Lists the actor's own windows, optionally only the currently valid ones.
    pub async fn my_windows(
        &self,
        actor: &UserIdentity,
        valid_only: bool,
    ) -> AppResult<Vec<AccessWindow>> {
        let principal = self.resolve_principal(actor).await?;
        let windows = self.windows_for(&principal).await?;
        if !valid_only {
            return Ok(windows);
        }

        let now = Utc::now();
        Ok(windows
            .into_iter()
            .filter(|window| window.is_valid_at(now))
            .collect())
    }

    /// Buckets the actor's own windows for the dashboard view.
    pub async fn access_dashboard(&self, actor: &UserIdentity) -> AppResult<AccessDashboard> {
        let principal = self.resolve_principal(actor).await?;
        let windows = self.windows_for(&principal).await?;
        Ok(AccessDashboard::from_windows(windows, Utc::now()))
    }
}
