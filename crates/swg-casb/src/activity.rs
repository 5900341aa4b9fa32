//! Forbidden-activity rules
//!
//! Plain substring checks against the raw URL. Every matching rule reports
//! its description, in rule order.

/// One forbidden-activity rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForbiddenActivity {
    /// Substring looked for in the URL
    pub pattern: String,
    /// Violation text
    pub description: String,
}

impl ForbiddenActivity {
    /// Create rule
    pub fn new(pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            description: description.into(),
        }
    }
}

/// Ordered rule set
#[derive(Debug, Clone)]
pub struct ActivityRules {
    rules: Vec<ForbiddenActivity>,
}

impl Default for ActivityRules {
    fn default() -> Self {
        Self::new(vec![
            ForbiddenActivity::new("shadow", "Shadow IT domain pattern"),
            ForbiddenActivity::new("unauthorized-saas", "Unapproved SaaS login"),
            ForbiddenActivity::new("/upload", "Generic upload endpoint"),
        ])
    }
}

impl ActivityRules {
    /// Create from rules
    pub fn new(rules: Vec<ForbiddenActivity>) -> Self {
        Self { rules }
    }

    /// Descriptions of every rule matching `url`
    pub fn evaluate(&self, url: &str) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| url.contains(rule.pattern.as_str()))
            .map(|rule| rule.description.clone())
            .collect()
    }

    /// Rules in order
    pub fn rules(&self) -> &[ForbiddenActivity] {
        &self.rules
    }
}

/// Evaluate `url` against the built-in rules
pub fn evaluate_activity(url: &str) -> Vec<String> {
    ActivityRules::default().evaluate(url)
}
