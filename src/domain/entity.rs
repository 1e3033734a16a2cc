use serde::{Deserialize, Serialize};

/// Kinds of tracked entities whose revision logs feed the activity stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityType {
    Post,
    Comment,
    ReportedPost,
    User,
    Tag,
    Chat,
    Message,
    GroupMessage,
}

impl EntityType {
    pub const ALL: [EntityType; 8] = [
        Self::Post,
        Self::Comment,
        Self::ReportedPost,
        Self::User,
        Self::Tag,
        Self::Chat,
        Self::Message,
        Self::GroupMessage,
    ];

    /// Lowercase model name, as it appears in the `model` field of a feed entry.
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
            Self::ReportedPost => "reportedpost",
            Self::User => "user",
            Self::Tag => "tag",
            Self::Chat => "chat",
            Self::Message => "message",
            Self::GroupMessage => "groupmessage",
        }
    }

    pub fn from_model_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace('_', "");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.model_name() == normalized)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.model_name())
    }
}

impl TryFrom<String> for EntityType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_model_name(&value).ok_or_else(|| format!("unknown model '{}'", value))
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        value.model_name().to_string()
    }
}
