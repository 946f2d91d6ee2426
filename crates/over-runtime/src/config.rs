#![forbid(unsafe_code)]

//! Publisher configuration.
//!
//! [`PublisherConfig`] is a plain value: build it with [`Default`] and the
//! `with_*` helpers, or load it with `serde` when the `serde` feature is on.

/// Seed for the registration id counter.
///
/// The first id handed out is `DEFAULT_ID_SEED + 1`. The value only keeps
/// ids clear of zero/default ids; it has no other meaning.
pub const DEFAULT_ID_SEED: u64 = 111;

/// Label used in logs when a publisher has no name.
pub const DEFAULT_NAME: &str = "publisher";

/// Behavioural knobs for a [`Publisher`](crate::reactive::Publisher).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PublisherConfig {
    /// Starting value of the id counter (ids are increment-then-use).
    pub id_seed: u64,
    /// Drop chain entries whose target has been dropped.
    pub prune_dead_links: bool,
    /// Catch panics raised by listeners and chained targets.
    ///
    /// When false a panicking listener unwinds through `notify()`.
    pub catch_panics: bool,
    /// Label for log events and [`Notify::name`](crate::reactive::Notify::name).
    pub name: Option<String>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            id_seed: DEFAULT_ID_SEED,
            prune_dead_links: true,
            catch_panics: true,
            name: None,
        }
    }
}

impl PublisherConfig {
    /// Set the id counter seed.
    #[must_use]
    pub fn with_id_seed(mut self, seed: u64) -> Self {
        self.id_seed = seed;
        self
    }

    /// Keep or prune dead chain entries.
    #[must_use]
    pub fn with_prune_dead_links(mut self, prune: bool) -> Self {
        self.prune_dead_links = prune;
        self
    }

    /// Enable or disable panic isolation for listeners and chained targets.
    #[must_use]
    pub fn with_catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }

    /// Name the publisher.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PublisherConfig::default();
        assert_eq!(config.id_seed, 111);
        assert!(config.prune_dead_links);
        assert!(config.catch_panics);
        assert_eq!(config.label(), "publisher");
    }

    #[test]
    fn builders_chain() {
        let config = PublisherConfig::default()
            .with_id_seed(0)
            .with_prune_dead_links(false)
            .with_catch_panics(false)
            .with_name("clock");
        assert_eq!(config.id_seed, 0);
        assert!(!config.prune_dead_links);
        assert!(!config.catch_panics);
        assert_eq!(config.label(), "clock");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_fills_missing_fields_with_defaults() {
        let config: PublisherConfig =
            serde_json::from_str(r#"{ "name": "settings" }"#).expect("valid config json");
        assert_eq!(config.id_seed, DEFAULT_ID_SEED);
        assert!(config.prune_dead_links);
        assert_eq!(config.label(), "settings");
    }
}
