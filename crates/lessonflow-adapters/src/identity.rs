use lessonflow_core::traits::IdentityProvider;

/// Identity fixed at startup, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    /// Blank identifiers count as signed out.
    pub fn new(user_id: Option<String>) -> Self {
        Self(user_id.filter(|id| !id.trim().is_empty()))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_is_signed_out() {
        assert_eq!(StaticIdentity::new(Some("  ".into())).current_user(), None);
        assert_eq!(StaticIdentity::signed_out().current_user(), None);
        assert_eq!(
            StaticIdentity::new(Some("learner-1".into())).current_user(),
            Some("learner-1".into())
        );
    }
}
