use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ContentRetryCondition {
    pub pattern: String,
    pub is_regex: bool,
}

impl ContentRetryCondition {
    fn matches(&self, content: &str) -> bool {
        if self.is_regex {
            Regex::new(&self.pattern)
                .map(|re| re.is_match(content))
                .unwrap_or(false)
        } else {
            content
                .to_lowercase()
                .contains(&self.pattern.to_lowercase())
        }
    }
}

#[derive(Debug, Clone)]
pub enum RetryCondition {
    StatusCode(u16),
    Content(ContentRetryCondition),
    /// The request never produced a response (connect, timeout, reset).
    Transport,
}

#[derive(Debug, Clone, Copy)]
pub enum BackoffPolicy {
    Constant,
    Linear,
    Exponential { factor: f32 },
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum RetryCategory {
    RateLimit,      // 429, rate limiting messages
    ServerError,    // 500-599
    Network,        // connection failures and timeouts
    BotDetection,   // captcha / challenge pages
    Custom(String), // Custom category
}

#[derive(Debug, Clone)]
pub struct CategoryConfig {
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_policy: BackoffPolicy,
    pub conditions: Vec<RetryCondition>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_policy: BackoffPolicy::Exponential { factor: 2.0 },
            conditions: Vec::new(),
        }
    }
}

impl CategoryConfig {
    pub fn with_conditions(conditions: Vec<RetryCondition>) -> Self {
        Self {
            conditions,
            ..Default::default()
        }
    }

    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let delay = match self.backoff_policy {
            BackoffPolicy::Constant => self.initial_delay,
            BackoffPolicy::Linear => self.initial_delay.mul_f32(attempt as f32),
            BackoffPolicy::Exponential { factor } => {
                self.initial_delay.mul_f32(factor.powi(attempt as i32))
            }
        };

        std::cmp::min(delay, self.max_delay)
    }
}

/// Retry bookkeeping for a single `fetch` call. It is created by the caller
/// and dropped with it, so nothing carries over between requests.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    pub counts: HashMap<RetryCategory, usize>,
    pub total_retries: usize,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub categories: HashMap<RetryCategory, CategoryConfig>,
}

impl Default for RetryConfig {
    /// Rate limiting, 5xx responses and network failures, three attempts each.
    fn default() -> Self {
        Self::none()
            .with_category(
                RetryCategory::RateLimit,
                CategoryConfig::with_conditions(vec![RetryCondition::StatusCode(429)]),
            )
            .with_category(
                RetryCategory::ServerError,
                CategoryConfig::with_conditions(
                    [500, 502, 503, 504]
                        .into_iter()
                        .map(RetryCondition::StatusCode)
                        .collect(),
                ),
            )
            .with_category(
                RetryCategory::Network,
                CategoryConfig::with_conditions(vec![RetryCondition::Transport]),
            )
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    pub fn none() -> Self {
        Self {
            categories: HashMap::new(),
        }
    }

    pub fn with_category(mut self, category: RetryCategory, config: CategoryConfig) -> Self {
        self.categories.insert(category, config);
        self
    }

    pub fn max_retries(&self, category: &RetryCategory) -> usize {
        self.categories
            .get(category)
            .map(|c| c.max_retries)
            .unwrap_or(0)
    }

    /// Checks a received response against the status and content conditions.
    pub fn should_retry(
        &self,
        state: &mut RetryState,
        status: u16,
        content: &str,
    ) -> Option<(RetryCategory, Duration)> {
        self.next_attempt(state, |condition| match condition {
            RetryCondition::StatusCode(code) => *code == status,
            RetryCondition::Content(content_condition) => content_condition.matches(content),
            RetryCondition::Transport => false,
        })
    }

    /// Checks a request that failed before any response arrived.
    pub fn should_retry_transport(
        &self,
        state: &mut RetryState,
    ) -> Option<(RetryCategory, Duration)> {
        self.next_attempt(state, |condition| {
            matches!(condition, RetryCondition::Transport)
        })
    }

    fn next_attempt(
        &self,
        state: &mut RetryState,
        is_match: impl Fn(&RetryCondition) -> bool,
    ) -> Option<(RetryCategory, Duration)> {
        for (category, config) in &self.categories {
            let current_retries = state.counts.get(category).copied().unwrap_or(0);
            if current_retries >= config.max_retries {
                continue;
            }

            if config.conditions.iter().any(&is_match) {
                state.counts.insert(category.clone(), current_retries + 1);
                state.total_retries += 1;
                return Some((category.clone(), config.calculate_delay(current_retries)));
            }
        }
        None
    }
}
