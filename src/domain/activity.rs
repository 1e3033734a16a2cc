use serde::{Deserialize, Serialize};

pub const FEED_MESSAGE: &str = "Here are the user's activity logs";

/// A rendered feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDescription {
    pub description: String,
    pub model: String,
    pub activity: serde_json::Map<String, serde_json::Value>,
}

impl ActivityDescription {
    /// Revision symbol carried in the flattened projection (`+`, `~`, `-`).
    pub fn history_type(&self) -> Option<&str> {
        self.activity.get("history_type").and_then(|v| v.as_str())
    }
}

/// Response envelope shared by the CLI and the HTTP surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEnvelope {
    pub message: String,
    pub success: bool,
    pub data: Vec<ActivityDescription>,
}

impl FeedEnvelope {
    pub fn new(data: Vec<ActivityDescription>) -> Self {
        Self {
            message: FEED_MESSAGE.to_string(),
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
