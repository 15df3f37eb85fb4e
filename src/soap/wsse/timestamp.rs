use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

use crate::soap::wsse::{format_instant, ns, prefix};
use crate::xml::Element;

pub const DEFAULT_TTL_SECONDS: u32 = 60 * 60;

/// A `wsu:Timestamp` whose expiry is exactly `ttl` after its creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub id: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Timestamp {
    /// Create a new timestamp starting at `now` (truncated to whole seconds)
    pub fn new(now: DateTime<Utc>, ttl_seconds: u32) -> Self {
        let created = now.trunc_subsecs(0);
        let expires = created + TimeDelta::seconds(i64::from(ttl_seconds));
        Self {
            id: format!("TS-{}", uuid::Uuid::new_v4()),
            created,
            expires,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.expires - self.created
    }

    /// Build the `wsu:Timestamp` element tree
    pub fn to_element(&self) -> Element {
        let created = Element::new(format!("{}:Created", prefix::WSU), Some(ns::WSU))
            .with_text(&format_instant(&self.created));
        let expires = Element::new(format!("{}:Expires", prefix::WSU), Some(ns::WSU))
            .with_text(&format_instant(&self.expires));

        Element::new(format!("{}:Timestamp", prefix::WSU), Some(ns::WSU))
            .with_attribute_ns(&format!("{}:Id", prefix::WSU), ns::WSU, &self.id)
            .with_child(created)
            .with_child(expires)
    }
}
