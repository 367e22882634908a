use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Publishing window attached 1:1 to a URL node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    /// When the URL becomes visible.
    pub publish_on: DateTime<Utc>,

    /// When the URL stops being visible; `None` = never.
    #[serde(default)]
    pub unpublish_on: Option<DateTime<Utc>>,
}

impl Visibility {
    /// A window opening at `now` with no end.
    pub fn starting(now: DateTime<Utc>) -> Self {
        Self {
            publish_on: now,
            unpublish_on: None,
        }
    }

    /// Whether the URL is visible at `now`.
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        match self.unpublish_on {
            Some(end) => self.publish_on <= now && end >= now,
            None => self.publish_on <= now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.is_published_at(Utc::now())
    }

    /// Publishing opens the window one second before `now` with no end.
    /// Unpublishing collapses both ends onto that same instant, which
    /// leaves the URL hidden for good.
    pub fn set_published_at(&mut self, published: bool, now: DateTime<Utc>) {
        let current = now - Duration::seconds(1);
        self.publish_on = current;
        self.unpublish_on = if published { None } else { Some(current) };
    }

    pub fn set_published(&mut self, published: bool) {
        self.set_published_at(published, Utc::now());
    }

    /// Close the window one second before `now`, keeping `publish_on`.
    pub fn unpublish_at(&mut self, now: DateTime<Utc>) {
        self.unpublish_on = Some(now - Duration::seconds(1));
    }
}

/// Input for setting a URL's visibility.
///
/// `published` wins over explicit timestamps when given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetVisibility {
    #[serde(default)]
    pub publish_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unpublish_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published: Option<bool>,
}
