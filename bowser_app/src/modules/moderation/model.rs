use std::fmt;

use crate::helper::bson::UnixSecs;
use crate::modules::model_prelude::*;

/// The kinds of moderation actions on record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PunishmentType {
    Tier1,
    Tier2,
    Tier3,
    Clear,
    Mute,
    Unmute,
    Kick,
    Ban,
    Unban,
    Blacklist,
    Unblacklist,
}

impl PunishmentType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tier1 => "T1 Warn",
            Self::Tier2 => "T2 Warn",
            Self::Tier3 => "T3 Warn",
            Self::Clear => "Warn Clear",
            Self::Mute => "Mute",
            Self::Unmute => "Unmute",
            Self::Kick => "Kick",
            Self::Ban => "Ban",
            Self::Unban => "Unban",
            Self::Blacklist => "Blacklist",
            Self::Unblacklist => "Unblacklist",
        }
    }

    /// Whether this reverts an earlier punishment.
    pub const fn is_reversal(self) -> bool {
        matches!(
            self,
            Self::Clear | Self::Unmute | Self::Unban | Self::Unblacklist
        )
    }

    /// Whether the record's `context` should be shown with the name.
    pub const fn has_context(self) -> bool {
        matches!(self, Self::Blacklist | Self::Unblacklist)
    }
}

/// An audit entry of a moderation action.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunishmentRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde_as(as = "IdI64")]
    pub user: UserId,
    #[serde_as(as = "IdI64")]
    pub moderator: UserId,
    #[serde(rename = "type")]
    pub kind: PunishmentType,
    pub reason: String,
    #[serde_as(as = "UnixSecs")]
    pub timestamp: i64,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl PunishmentRecord {
    /// The display name, including the context for blacklists.
    pub fn display_kind(&self) -> DisplayKind<'_> {
        DisplayKind(self)
    }
}

pub struct DisplayKind<'a>(&'a PunishmentRecord);

impl fmt::Display for DisplayKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        f.write_str(record.kind.name())?;
        if record.kind.has_context() {
            let context = record.context.as_deref().unwrap_or("unknown");
            write!(f, " ({context})")?;
        }

        Ok(())
    }
}

/// The last known state of a member, keyed by user id.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    #[serde_as(as = "Vec<IdI64>")]
    pub roles: Vec<RoleId>,
}

/// A logged message, with `author` and `timestamp` fields.
///
/// Only the time is read, the author is used in filters.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRecord {
    #[serde_as(as = "UnixSecs")]
    pub timestamp: i64,
}

/// Messages removed by `clean`, oldest first.
#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveRecord {
    #[serde_as(as = "IdI64")]
    pub channel: ChannelId,
    #[serde_as(as = "IdI64")]
    pub moderator: UserId,
    pub timestamp: i64,
    pub messages: Vec<ArchivedMessage>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedMessage {
    #[serde_as(as = "IdI64")]
    pub id: MessageId,
    #[serde_as(as = "IdI64")]
    pub author: UserId,
    pub author_name: String,
    pub content: String,
    pub timestamp: i64,
    pub attachments: Vec<String>,
}

fn name(name: &str) -> IndexOptions {
    IndexOptions::builder().name(name.to_owned()).build()
}

impl ModelCollection for PunishmentRecord {
    const COLLECTION_NAME: &str = "puns";

    fn indices() -> Vec<IndexModel> {
        vec![
            IndexModel::builder()
                .options(name("user-timestamp"))
                .keys(doc! {
                    "user": 1,
                    "timestamp": -1,
                })
                .build(),
        ]
    }
}

impl ModelCollection for UserRecord {
    const COLLECTION_NAME: &str = "users";
}

impl ModelCollection for MessageRecord {
    const COLLECTION_NAME: &str = "messages";

    fn indices() -> Vec<IndexModel> {
        vec![
            IndexModel::builder()
                .options(name("author-timestamp"))
                .keys(doc! {
                    "author": 1,
                    "timestamp": -1,
                })
                .build(),
        ]
    }
}

impl ModelCollection for ArchiveRecord {
    const COLLECTION_NAME: &str = "archive";
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::{PunishmentRecord, PunishmentType};

    #[test]
    fn read_stored_punishment() {
        let doc = doc! {
            "_id": bson::oid::ObjectId::new(),
            "user": 186_829_544_764_866_560_i64,
            "moderator": 125_233_822_760_566_784_i64,
            "type": "unblacklist",
            "reason": "appealed",
            "timestamp": 1_559_570_531.5_f64,
            "active": false,
            "context": "suggestions",
        };

        let record: PunishmentRecord =
            bson::deserialize_from_document(doc).expect("must deserialize");
        assert_eq!(record.kind, PunishmentType::Unblacklist);
        assert_eq!(record.timestamp, 1_559_570_531);
        assert!(record.kind.is_reversal());
        assert_eq!(record.display_kind().to_string(), "Unblacklist (suggestions)");
    }

    #[test]
    fn write_new_punishment() {
        let record = PunishmentRecord {
            id: None,
            user: serenity::model::id::UserId::new(1),
            moderator: serenity::model::id::UserId::new(2),
            kind: PunishmentType::Tier2,
            reason: "spam".to_owned(),
            timestamp: 10,
            active: true,
            context: None,
        };

        let doc = bson::serialize_to_document(&record).expect("must serialize");
        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key("context"));
        assert_eq!(doc.get_str("type").expect("type is a string"), "tier2");
        assert_eq!(record.display_kind().to_string(), "T2 Warn");
        assert!(!record.kind.is_reversal());
    }
}
