//! Turns revision records into feed descriptions.
//!
//! Created and deleted revisions use a per-entity phrase. Updated revisions
//! are diffed against the revision immediately preceding them in the same
//! entity's timeline; the first two changed fields are listed and the rest
//! are summarized as a count.

use serde_json::{Map, Value};

use crate::domain::*;
use crate::kinds::{kind_spec, DiffPolicy, KindSpec, Phrasing};

pub const WELCOME: &str = "Welcome to Atria, you've just created an account!";
pub const SESSION_STARTED: &str = "You've logged in and started a session";
pub const POST_INTERACTION: &str = "Someone interacted with your post!";

const MAX_LISTED_CHANGES: usize = 2;

/// Render one record. `timeline` is the full revision list of the record's
/// entity; it is only consulted for updates.
pub fn render(
    record: &HistoryRecord,
    timeline: Option<&[HistoryRecord]>,
    policy: &DiffPolicy,
) -> ActivityDescription {
    ActivityDescription {
        description: describe(record, timeline, policy),
        model: record.entity_type.model_name().to_string(),
        activity: project(record),
    }
}

pub fn describe(
    record: &HistoryRecord,
    timeline: Option<&[HistoryRecord]>,
    policy: &DiffPolicy,
) -> String {
    let spec = kind_spec(record.entity_type);
    match record.revision_type {
        RevisionType::Created | RevisionType::Deleted => describe_lifecycle(spec, record),
        RevisionType::Updated => {
            match timeline.and_then(|revisions| previous_revision(record, revisions)) {
                Some(previous) => describe_update(spec, previous, record, policy),
                None => format!("updated {}", spec.id),
            }
        }
        RevisionType::Other(_) => format!("{} {}", record.revision_type.verb(), spec.id),
    }
}

fn describe_lifecycle(spec: &KindSpec, record: &HistoryRecord) -> String {
    let verb = record.revision_type.verb();
    match (spec.phrasing, &record.revision_type) {
        (Phrasing::Post, _) => format!("{} a post: '{}'", verb, record.field_text("content")),
        (Phrasing::Comment, _) => {
            format!("{} a comment: '{}'", verb, record.field_text("content"))
        }
        (Phrasing::User, RevisionType::Created) => WELCOME.to_string(),
        _ => format!("{} {}", verb, spec.id),
    }
}

/// The revision right before `record` in its entity timeline, ordered by
/// timestamp with the revision id breaking ties.
pub fn previous_revision<'a>(
    record: &HistoryRecord,
    timeline: &'a [HistoryRecord],
) -> Option<&'a HistoryRecord> {
    timeline
        .iter()
        .filter(|r| r.entity_id == record.entity_id && r.revision_id != record.revision_id)
        .filter(|r| position(r) < position(record))
        .max_by_key(|r| position(r))
}

fn position(record: &HistoryRecord) -> (chrono::DateTime<chrono::Utc>, i64) {
    (record.revision_timestamp, record.revision_id)
}

fn describe_update(
    spec: &KindSpec,
    previous: &HistoryRecord,
    current: &HistoryRecord,
    policy: &DiffPolicy,
) -> String {
    let changes = changed_fields(spec, previous, current, policy);
    match changes.len() {
        0 if spec.phrasing == Phrasing::Post => POST_INTERACTION.to_string(),
        0 => format!("Updated {}", spec.id),
        n if n > MAX_LISTED_CHANGES => format!(
            "Updated {}: {} + {} more...",
            spec.id,
            changes[..MAX_LISTED_CHANGES].join(", "),
            n - MAX_LISTED_CHANGES
        ),
        _ => format!("Updated {}: {}", spec.id, changes.join(", ")),
    }
}

fn changed_fields(
    spec: &KindSpec,
    previous: &HistoryRecord,
    current: &HistoryRecord,
    policy: &DiffPolicy,
) -> Vec<String> {
    spec.fields
        .iter()
        .filter(|name| !policy.is_ignored(spec.id, name))
        .filter_map(|name| {
            let old = previous.field(name)?;
            let new = current.field(name)?;
            (old != new).then(|| phrase_change(spec, name, new))
        })
        .collect()
}

fn phrase_change(spec: &KindSpec, name: &str, new: &FieldValue) -> String {
    let label = field_label(name);
    if label == "last login" {
        return SESSION_STARTED.to_string();
    }
    match spec.phrasing {
        Phrasing::Comment => format!("{} to '{}'", label, new.display()),
        // Values are withheld so password hashes and the like never reach the feed.
        Phrasing::User => label,
        Phrasing::Post | Phrasing::Generic => {
            format!("{} for {} to '{}'", label, spec.id, new.display())
        }
    }
}

pub fn field_label(name: &str) -> String {
    name.replace('_', " ")
}

/// Flattened field map of a revision plus its log metadata.
pub fn project(record: &HistoryRecord) -> Map<String, Value> {
    let spec = kind_spec(record.entity_type);
    let mut activity = Map::new();
    activity.insert("id".to_string(), Value::from(record.entity_id));

    for name in spec.fields {
        if let Some(value) = record.field(name) {
            activity.insert(name.to_string(), value.to_json());
        }
    }
    for (name, value) in &record.field_snapshot {
        if !spec.fields.contains(&name.as_str()) {
            activity.insert(name.clone(), value.to_json());
        }
    }

    activity.insert("history_id".to_string(), Value::from(record.revision_id));
    activity.insert(
        "history_date".to_string(),
        Value::from(record.revision_timestamp.to_rfc3339()),
    );
    activity.insert(
        "history_type".to_string(),
        Value::from(record.revision_type.symbol()),
    );
    activity.insert(
        "history_user".to_string(),
        record.actor_id.map(Value::from).unwrap_or(Value::Null),
    );
    activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn rev(
        kind: EntityType,
        revision_id: i64,
        revision_type: RevisionType,
        minute: i64,
        fields: &[(&str, FieldValue)],
    ) -> HistoryRecord {
        HistoryRecord {
            entity_type: kind,
            revision_id,
            revision_type,
            revision_timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minute),
            entity_id: 1,
            actor_id: Some(1),
            field_snapshot: fields
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn describe_default(record: &HistoryRecord, timeline: &[HistoryRecord]) -> String {
        describe(record, Some(timeline), &DiffPolicy::new())
    }

    #[test]
    fn created_post_echoes_content() {
        let created = rev(
            EntityType::Post,
            1,
            RevisionType::Created,
            0,
            &[("content", text("Original post"))],
        );
        let description = describe_default(&created, &[]);
        assert_eq!(description, "Created a post: 'Original post'");
        assert!(description.to_lowercase().contains("created a post: 'original post'"));
    }

    #[test]
    fn deleted_comment_echoes_content() {
        let deleted = rev(
            EntityType::Comment,
            3,
            RevisionType::Deleted,
            0,
            &[("content", text("Nice post!"))],
        );
        assert_eq!(describe_default(&deleted, &[]), "Deleted a comment: 'Nice post!'");
    }

    #[test]
    fn deleted_post_echoes_content() {
        let deleted = rev(
            EntityType::Post,
            4,
            RevisionType::Deleted,
            0,
            &[("content", text("Original post"))],
        );
        assert_eq!(describe_default(&deleted, &[]), "Deleted a post: 'Original post'");

        let without_content = rev(EntityType::Post, 5, RevisionType::Deleted, 0, &[]);
        assert_eq!(describe_default(&without_content, &[]), "Deleted a post: ''");
    }

    #[test]
    fn created_user_gets_welcome_message() {
        let created = rev(
            EntityType::User,
            1,
            RevisionType::Created,
            0,
            &[("email", text("a@b.c"))],
        );
        assert_eq!(describe_default(&created, &[]), WELCOME);

        let deleted = rev(EntityType::User, 2, RevisionType::Deleted, 0, &[]);
        assert_eq!(describe_default(&deleted, &[]), "Deleted user");
    }

    #[test]
    fn other_entities_use_generic_lifecycle_phrase() {
        let created = rev(EntityType::ReportedPost, 1, RevisionType::Created, 0, &[]);
        assert_eq!(describe_default(&created, &[]), "Created reportedpost");
        let deleted = rev(EntityType::Chat, 1, RevisionType::Deleted, 0, &[]);
        assert_eq!(describe_default(&deleted, &[]), "Deleted chat");
    }

    #[test]
    fn updated_post_lists_changed_content() {
        let created = rev(
            EntityType::Post,
            1,
            RevisionType::Created,
            0,
            &[("content", text("Original post"))],
        );
        let updated = rev(
            EntityType::Post,
            2,
            RevisionType::Updated,
            1,
            &[("content", text("Updated and changed the post!"))],
        );
        let timeline = [created, updated.clone()];

        let description = describe_default(&updated, &timeline);

        assert!(description
            .to_lowercase()
            .contains("updated post: content for post to 'updated and changed the post!'"));
    }

    #[test]
    fn updated_comment_uses_short_phrase() {
        let created = rev(
            EntityType::Comment,
            1,
            RevisionType::Created,
            0,
            &[("content", text("Nice post!"))],
        );
        let updated = rev(
            EntityType::Comment,
            2,
            RevisionType::Updated,
            1,
            &[("content", text("Edited"))],
        );
        let timeline = [created, updated.clone()];

        assert_eq!(
            describe_default(&updated, &timeline),
            "Updated comment: content to 'Edited'"
        );
    }

    #[test]
    fn user_updates_name_fields_without_values() {
        let created = rev(EntityType::User, 1, RevisionType::Created, 0, &[
            ("email", text("old@example.com")),
            ("password", text("hash-1")),
        ]);
        let updated = rev(EntityType::User, 2, RevisionType::Updated, 1, &[
            ("email", text("new@example.com")),
            ("password", text("hash-2")),
        ]);
        let timeline = [created, updated.clone()];

        let description = describe_default(&updated, &timeline);

        assert_eq!(description, "Updated user: password, email");
        assert!(!description.contains("hash-2"));
    }

    #[test]
    fn first_login_reads_as_session_start() {
        let created = rev(
            EntityType::User,
            1,
            RevisionType::Created,
            0,
            &[("last_login", FieldValue::Null)],
        );
        let login_at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 5, 0).unwrap();
        let updated = rev(
            EntityType::User,
            2,
            RevisionType::Updated,
            5,
            &[("last_login", FieldValue::DateTime(login_at))],
        );
        let timeline = [created, updated.clone()];

        let description = describe_default(&updated, &timeline);

        assert!(description
            .to_lowercase()
            .contains("you've logged in and started a session"));
    }

    #[test]
    fn update_without_predecessor_falls_back() {
        let updated = rev(
            EntityType::Message,
            4,
            RevisionType::Updated,
            0,
            &[("content", text("hi"))],
        );
        assert_eq!(describe_default(&updated, &[updated.clone()]), "updated message");
        assert_eq!(describe(&updated, None, &DiffPolicy::new()), "updated message");
    }

    #[test]
    fn more_than_two_changes_are_truncated() {
        let created = rev(EntityType::GroupMessage, 1, RevisionType::Created, 0, &[
            ("user", FieldValue::Ref(1)),
            ("group_name", text("general")),
            ("content", text("hello")),
            ("image", FieldValue::Null),
        ]);
        let updated = rev(EntityType::GroupMessage, 2, RevisionType::Updated, 1, &[
            ("user", FieldValue::Ref(2)),
            ("group_name", text("random")),
            ("content", text("bye")),
            ("image", text("cat.png")),
        ]);
        let timeline = [created, updated.clone()];

        let description = describe_default(&updated, &timeline);

        assert_eq!(
            description,
            "Updated groupmessage: user for groupmessage to '2', \
             group name for groupmessage to 'random' + 2 more..."
        );
    }

    #[test]
    fn empty_diffs_use_no_op_phrases() {
        let before = rev(EntityType::Post, 1, RevisionType::Created, 0, &[
            ("content", text("same")),
            ("likes", FieldValue::Int(0)),
        ]);
        let after = rev(EntityType::Post, 2, RevisionType::Updated, 1, &[
            ("content", text("same")),
            ("likes", FieldValue::Int(1)),
        ]);
        assert_eq!(describe_default(&after, &[before, after.clone()]), POST_INTERACTION);

        let tag_before = rev(
            EntityType::Tag,
            1,
            RevisionType::Created,
            0,
            &[("name", text("rust"))],
        );
        let tag_after = rev(
            EntityType::Tag,
            2,
            RevisionType::Updated,
            1,
            &[("name", text("rust"))],
        );
        assert_eq!(
            describe_default(&tag_after, &[tag_before, tag_after.clone()]),
            "Updated tag"
        );
    }

    #[test]
    fn datetime_change_is_decided_on_raw_value() {
        let sent = Utc.with_ymd_and_hms(2025, 2, 1, 8, 30, 0).unwrap();
        let before = rev(
            EntityType::Message,
            1,
            RevisionType::Created,
            0,
            &[("sent_at", FieldValue::DateTime(sent))],
        );
        let same = rev(
            EntityType::Message,
            2,
            RevisionType::Updated,
            1,
            &[("sent_at", FieldValue::DateTime(sent))],
        );
        assert_eq!(
            describe_default(&same, &[before.clone(), same.clone()]),
            "Updated message"
        );

        let later = rev(
            EntityType::Message,
            3,
            RevisionType::Updated,
            2,
            &[("sent_at", FieldValue::DateTime(sent + Duration::seconds(20)))],
        );
        assert_eq!(
            describe_default(&later, &[before, same, later.clone()]),
            "Updated message: sent at for message to 'Feb 1, 2025 at 8:30AM'"
        );
    }

    #[test]
    fn older_update_diffs_against_its_own_predecessor() {
        let v1 = rev(EntityType::Comment, 1, RevisionType::Created, 0, &[("content", text("a"))]);
        let v2 = rev(EntityType::Comment, 2, RevisionType::Updated, 1, &[("content", text("b"))]);
        let v3 = rev(EntityType::Comment, 3, RevisionType::Updated, 2, &[("content", text("c"))]);
        let timeline = [v3.clone(), v1, v2.clone()];

        assert_eq!(describe_default(&v2, &timeline), "Updated comment: content to 'b'");
        assert_eq!(describe_default(&v3, &timeline), "Updated comment: content to 'c'");
    }

    #[test]
    fn absent_fields_are_skipped() {
        let before = rev(
            EntityType::Comment,
            1,
            RevisionType::Created,
            0,
            &[("content", text("a"))],
        );
        let after = rev(
            EntityType::Comment,
            2,
            RevisionType::Updated,
            1,
            &[("post", FieldValue::Ref(4))],
        );
        assert_eq!(describe_default(&after, &[before, after.clone()]), "Updated comment");
    }

    #[test]
    fn configured_ignores_are_respected() {
        let before = rev(
            EntityType::Post,
            1,
            RevisionType::Created,
            0,
            &[("pinned", FieldValue::Bool(false))],
        );
        let after = rev(
            EntityType::Post,
            2,
            RevisionType::Updated,
            1,
            &[("pinned", FieldValue::Bool(true))],
        );
        let timeline = [before, after.clone()];

        assert_eq!(
            describe(&after, Some(&timeline), &DiffPolicy::new()),
            "Updated post: pinned for post to 'true'"
        );
        let policy = DiffPolicy::new().ignore(EntityType::Post, ["pinned"]);
        assert_eq!(describe(&after, Some(&timeline), &policy), POST_INTERACTION);
    }

    #[test]
    fn unknown_revision_type_uses_catch_all() {
        let odd = rev(EntityType::Tag, 1, RevisionType::Other("?".to_string()), 0, &[]);
        assert_eq!(describe_default(&odd, &[]), "changed tag");
    }

    #[test]
    fn projection_flattens_refs_and_carries_metadata() {
        let record = rev(EntityType::Comment, 8, RevisionType::Created, 0, &[
            ("user", FieldValue::Ref(1)),
            ("post", FieldValue::Ref(12)),
            ("content", text("hi")),
        ]);

        let rendered = render(&record, None, &DiffPolicy::new());

        assert_eq!(rendered.model, "comment");
        assert_eq!(rendered.history_type(), Some("+"));
        assert_eq!(rendered.activity["post"], Value::from(12));
        assert_eq!(rendered.activity["id"], Value::from(1));
        assert_eq!(rendered.activity["history_id"], Value::from(8));
        assert_eq!(rendered.activity["history_user"], Value::from(1));
        assert!(!rendered.activity.contains_key("created_at"));
    }

    #[test]
    fn image_fields_are_labelled_by_their_model_names() {
        let before = rev(EntityType::Post, 1, RevisionType::Created, 0, &[
            ("content", text("same")),
            ("image_content", FieldValue::Null),
        ]);
        let after = rev(EntityType::Post, 2, RevisionType::Updated, 1, &[
            ("content", text("same")),
            ("image_content", text("cat.png")),
        ]);
        assert_eq!(
            describe_default(&after, &[before, after.clone()]),
            "Updated post: image content for post to 'cat.png'"
        );

        let before = rev(EntityType::User, 1, RevisionType::Created, 0, &[
            ("profile_picture", FieldValue::Null),
        ]);
        let after = rev(EntityType::User, 2, RevisionType::Updated, 1, &[
            ("profile_picture", text("me.png")),
        ]);
        assert_eq!(
            describe_default(&after, &[before, after.clone()]),
            "Updated user: profile picture"
        );
    }

    #[test]
    fn whole_float_changes_keep_the_decimal_point() {
        let before = rev(EntityType::Post, 1, RevisionType::Created, 0, &[
            ("content", FieldValue::Float(0.5)),
        ]);
        let after = rev(EntityType::Post, 2, RevisionType::Updated, 1, &[
            ("content", FieldValue::Float(1.0)),
        ]);
        assert_eq!(
            describe_default(&after, &[before, after.clone()]),
            "Updated post: content for post to '1.0'"
        );
    }

    #[test]
    fn field_labels_replace_underscores() {
        assert_eq!(field_label("primary_organization"), "primary organization");
        assert_eq!(field_label("content"), "content");
    }
}
