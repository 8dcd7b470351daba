//! Broadcaster configuration

/// How subscriber ids are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Start at the last assigned id and advance only past ids that are
    /// still registered. An id freed by a discard may be handed out again.
    #[default]
    ReuseOnCollision,
    /// Every subscriber gets a fresh id; ids are never reused
    Monotonic,
}

/// Broadcaster configuration options
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Buffer capacity of each subscriber endpoint (0 = un-buffered)
    pub capacity: usize,

    /// Subscriber id assignment
    pub id_policy: IdPolicy,

    /// Name used in log output
    pub label: String,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            id_policy: IdPolicy::default(),
            label: "broadcast".to_string(),
        }
    }
}

impl BroadcasterConfig {
    /// Set the per-subscriber buffer capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the id assignment policy
    pub fn id_policy(mut self, policy: IdPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    /// Set the label used in log output
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}
