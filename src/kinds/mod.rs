use std::collections::{BTreeSet, HashMap};

use crate::domain::{EntityType, HistoryRecord};

/// Who a revision is attributed to when the log recorded no actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// A foreign key field naming the authoring user.
    Field(&'static str),
    /// The entity is the user itself.
    SelfId,
    /// No owner; only recorded actors attribute revisions.
    Unowned,
}

/// Render strategy selected per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrasing {
    /// Echoes `content` on create/delete; "interacted" on empty updates.
    Post,
    /// Echoes `content` on create/delete; terse per-field updates.
    Comment,
    /// Welcome message on create; field labels only on update.
    User,
    Generic,
}

#[derive(Debug, Clone)]
pub struct KindSpec {
    pub id: EntityType,
    /// Declared fields in snapshot order; this is the diff order.
    pub fields: &'static [&'static str],
    /// Fields skipped by the diff unless the policy says otherwise.
    pub ignored: &'static [&'static str],
    pub owner: Owner,
    pub phrasing: Phrasing,
}

impl KindSpec {
    /// The user a revision is attributed to: the recorded actor, or the
    /// entity's owner when the log recorded none.
    pub fn subject_of(&self, record: &HistoryRecord) -> Option<i64> {
        if let Some(actor) = record.actor_id {
            return Some(actor);
        }
        match self.owner {
            Owner::Field(name) => record.field(name).and_then(|v| v.as_id()),
            Owner::SelfId => Some(record.entity_id),
            Owner::Unowned => None,
        }
    }
}

static POST: KindSpec = KindSpec {
    id: EntityType::Post,
    fields: &["id", "user", "content", "image_content", "created_at", "likes", "pinned"],
    ignored: &["created_at", "likes"],
    owner: Owner::Field("user"),
    phrasing: Phrasing::Post,
};

static COMMENT: KindSpec = KindSpec {
    id: EntityType::Comment,
    fields: &["id", "user", "post", "content", "created_at"],
    ignored: &["created_at"],
    owner: Owner::Field("user"),
    phrasing: Phrasing::Comment,
};

static REPORTED_POST: KindSpec = KindSpec {
    id: EntityType::ReportedPost,
    fields: &["id", "user", "post", "created_at"],
    ignored: &["created_at"],
    owner: Owner::Field("user"),
    phrasing: Phrasing::Generic,
};

static USER: KindSpec = KindSpec {
    id: EntityType::User,
    fields: &[
        "id",
        "password",
        "last_login",
        "email",
        "full_name",
        "pronouns",
        "title",
        "primary_organization",
        "other_organizations",
        "other_networks",
        "about_me",
        "skills_interests",
        "profile_picture",
        "profile_header",
        "date_joined",
        "is_active",
        "is_staff",
        "email_verified",
        "failed_login_attempts",
    ],
    ignored: &["date_joined"],
    owner: Owner::SelfId,
    phrasing: Phrasing::User,
};

static TAG: KindSpec = KindSpec {
    id: EntityType::Tag,
    fields: &["id", "name"],
    ignored: &[],
    owner: Owner::Unowned,
    phrasing: Phrasing::Generic,
};

static CHAT: KindSpec = KindSpec {
    id: EntityType::Chat,
    fields: &["id", "name", "created_at"],
    ignored: &["created_at"],
    owner: Owner::Unowned,
    phrasing: Phrasing::Generic,
};

static MESSAGE: KindSpec = KindSpec {
    id: EntityType::Message,
    fields: &["id", "user", "chat", "content", "image_content", "sent_at"],
    ignored: &[],
    owner: Owner::Field("user"),
    phrasing: Phrasing::Generic,
};

static GROUP_MESSAGE: KindSpec = KindSpec {
    id: EntityType::GroupMessage,
    fields: &["id", "user", "group_name", "content", "image", "sent_at"],
    ignored: &[],
    owner: Owner::Field("user"),
    phrasing: Phrasing::Generic,
};

pub fn kind_spec(kind: EntityType) -> &'static KindSpec {
    match kind {
        EntityType::Post => &POST,
        EntityType::Comment => &COMMENT,
        EntityType::ReportedPost => &REPORTED_POST,
        EntityType::User => &USER,
        EntityType::Tag => &TAG,
        EntityType::Chat => &CHAT,
        EntityType::Message => &MESSAGE,
        EntityType::GroupMessage => &GROUP_MESSAGE,
    }
}

pub fn registry() -> impl Iterator<Item = &'static KindSpec> {
    EntityType::ALL.into_iter().map(kind_spec)
}

/// Per-entity ignore lists applied by the update diff.
///
/// Starts from the registry defaults; deployments extend it through the
/// `ignore_fields` table of the config file.
#[derive(Debug, Clone)]
pub struct DiffPolicy {
    ignored: HashMap<EntityType, BTreeSet<String>>,
}

impl DiffPolicy {
    pub fn new() -> Self {
        let ignored = registry()
            .map(|spec| {
                let fields = spec.ignored.iter().map(|f| f.to_string()).collect();
                (spec.id, fields)
            })
            .collect();
        Self { ignored }
    }

    pub fn ignore<I, S>(mut self, kind: EntityType, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored
            .entry(kind)
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn is_ignored(&self, kind: EntityType, field: &str) -> bool {
        self.ignored
            .get(&kind)
            .is_some_and(|fields| fields.contains(field))
    }
}

impl Default for DiffPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, RevisionType};
    use chrono::Utc;

    fn record(kind: EntityType, entity_id: i64, actor_id: Option<i64>) -> HistoryRecord {
        HistoryRecord {
            entity_type: kind,
            revision_id: 1,
            revision_type: RevisionType::Created,
            revision_timestamp: Utc::now(),
            entity_id,
            actor_id,
            field_snapshot: [("user".to_string(), FieldValue::Ref(5))].into(),
        }
    }

    #[test]
    fn registry_covers_every_entity_type() {
        let kinds: Vec<_> = registry().map(|spec| spec.id).collect();
        assert_eq!(kinds, EntityType::ALL.to_vec());
    }

    #[test]
    fn subject_prefers_recorded_actor() {
        let spec = kind_spec(EntityType::Post);
        assert_eq!(spec.subject_of(&record(EntityType::Post, 1, Some(9))), Some(9));
        assert_eq!(spec.subject_of(&record(EntityType::Post, 1, None)), Some(5));
    }

    #[test]
    fn subject_of_user_revision_is_the_user() {
        let spec = kind_spec(EntityType::User);
        assert_eq!(spec.subject_of(&record(EntityType::User, 3, None)), Some(3));
        assert_eq!(kind_spec(EntityType::Tag).subject_of(&record(EntityType::Tag, 3, None)), None);
    }

    #[test]
    fn policy_extends_defaults() {
        let policy = DiffPolicy::new().ignore(EntityType::Post, ["pinned"]);
        assert!(policy.is_ignored(EntityType::Post, "likes"));
        assert!(policy.is_ignored(EntityType::Post, "pinned"));
        assert!(!policy.is_ignored(EntityType::Post, "content"));
        assert!(!policy.is_ignored(EntityType::User, "last_login"));
    }
}
