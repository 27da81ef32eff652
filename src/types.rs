use serde::{Deserialize, Serialize};
use std::fmt;

/// Message-center category for a notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    System,
    Reminder,
    Alert,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::System => "system",
            NotificationCategory::Reminder => "reminder",
            NotificationCategory::Alert => "alert",
        }
    }

    /// Parse the stored TEXT form. Unknown strings map to `System` rather
    /// than failing a whole row read.
    pub fn parse(s: &str) -> Self {
        match s {
            "reminder" => NotificationCategory::Reminder,
            "alert" => NotificationCategory::Alert,
            _ => NotificationCategory::System,
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for cat in [
            NotificationCategory::System,
            NotificationCategory::Reminder,
            NotificationCategory::Alert,
        ] {
            assert_eq!(NotificationCategory::parse(cat.as_str()), cat);
        }
    }

    #[test]
    fn test_unknown_category_falls_back() {
        assert_eq!(
            NotificationCategory::parse("bogus"),
            NotificationCategory::System
        );
    }
}
