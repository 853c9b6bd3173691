use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("event {0} not found or has no poll")]
    EventNotFound(Uuid),

    #[error("club {0} not found")]
    ScopeNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl AnalyticsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound(_) | Self::ScopeNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_are_flagged() {
        assert!(AnalyticsError::EventNotFound(Uuid::nil()).is_not_found());
        assert!(AnalyticsError::ScopeNotFound(Uuid::nil()).is_not_found());
        assert!(!AnalyticsError::Store(anyhow::anyhow!("connection reset")).is_not_found());
    }
}
