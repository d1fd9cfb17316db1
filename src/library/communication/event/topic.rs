use std::collections::HashMap;
use std::fmt;

/// Describes a topic to which notifications are published
///
/// A topic is identified by its default routing key, a dot-namespaced string like
/// `<entity>.<action>`. The routing key that is actually used on the wire may be overridden
/// at runtime through a [`RoutingTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicDescriptor {
    key: &'static str,
}

impl TopicDescriptor {
    /// Creates a new instance from its default routing key
    pub const fn new(key: &'static str) -> Self {
        Self { key }
    }

    /// Default routing key of the topic
    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl fmt::Display for TopicDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key)
    }
}

/// Maps topics onto the routing keys used on the wire
///
/// Topics without an override are routed using their default key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    overrides: HashMap<TopicDescriptor, String>,
}

impl RoutingTable {
    /// Replaces the routing key of a topic
    ///
    /// Overrides that equal the default key are not stored.
    pub fn with_override(mut self, topic: TopicDescriptor, routing_key: impl Into<String>) -> Self {
        let routing_key = routing_key.into();

        if routing_key == topic.key() {
            self.overrides.remove(&topic);
        } else {
            self.overrides.insert(topic, routing_key);
        }

        self
    }

    /// Routing key to use for a given topic
    pub fn resolve(&self, topic: &TopicDescriptor) -> &str {
        self.overrides
            .get(topic)
            .map(String::as_str)
            .unwrap_or_else(|| topic.key())
    }

    /// Routing keys for a set of topics, in order and without duplicates
    pub fn resolve_all(&self, topics: &[TopicDescriptor]) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(topics.len());

        for topic in topics {
            let key = self.resolve(topic);
            if !keys.iter().any(|existing| existing == key) {
                keys.push(key.to_owned());
            }
        }

        keys
    }
}
