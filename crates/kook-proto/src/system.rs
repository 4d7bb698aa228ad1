//! System events (`type == 255`) and their sub-type discriminator.
//!
//! The `extra` field of a system event is `{ "type": <sub-type>, "body": {...} }`.
//! The sub-type is parsed into a closed [`SystemEventKind`] catalog at the
//! decode boundary; anything outside the catalog is kept as
//! [`SystemEventKind::Unrecognized`] together with its raw body.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ProtoError;

/// Known system event sub-types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SystemEventKind {
    /// A user joined a guild.
    JoinedGuild,
    /// A user left a guild.
    ExitedGuild,
    /// A guild member's profile changed.
    UpdatedGuildMember,
    /// A guild member came online.
    GuildMemberOnline,
    /// A guild member went offline.
    GuildMemberOffline,
    /// Guild settings changed.
    UpdatedGuild,
    /// A guild was deleted.
    DeletedGuild,
    /// Users were added to the guild block list.
    AddedBlockList,
    /// Users were removed from the guild block list.
    DeletedBlockList,
    /// A guild emoji was added.
    AddedEmoji,
    /// A guild emoji was removed.
    RemovedEmoji,
    /// A guild emoji was updated.
    UpdatedEmoji,
    /// A channel was created.
    AddedChannel,
    /// A channel was updated.
    UpdatedChannel,
    /// A channel was deleted.
    DeletedChannel,
    /// A channel message was edited.
    UpdatedMessage,
    /// A channel message was deleted.
    DeletedMessage,
    /// A message was pinned.
    PinnedMessage,
    /// A message was unpinned.
    UnpinnedMessage,
    /// A reaction was added.
    AddedReaction,
    /// A reaction was removed.
    DeletedReaction,
    /// A role was created.
    AddedRole,
    /// A role was deleted.
    DeletedRole,
    /// A role was updated.
    UpdatedRole,
    /// A user's profile changed.
    UserUpdated,
    /// The bot joined a guild.
    SelfJoinedGuild,
    /// The bot left a guild.
    SelfExitedGuild,
    /// A user joined a voice channel.
    JoinedChannel,
    /// A user left a voice channel.
    ExitedChannel,
    /// A card message button was clicked.
    MessageBtnClick,
    /// A sub-type outside the catalog.
    Unrecognized(String),
}

impl SystemEventKind {
    /// Every catalogued sub-type.
    pub const KNOWN: [Self; 30] = [
        Self::JoinedGuild,
        Self::ExitedGuild,
        Self::UpdatedGuildMember,
        Self::GuildMemberOnline,
        Self::GuildMemberOffline,
        Self::UpdatedGuild,
        Self::DeletedGuild,
        Self::AddedBlockList,
        Self::DeletedBlockList,
        Self::AddedEmoji,
        Self::RemovedEmoji,
        Self::UpdatedEmoji,
        Self::AddedChannel,
        Self::UpdatedChannel,
        Self::DeletedChannel,
        Self::UpdatedMessage,
        Self::DeletedMessage,
        Self::PinnedMessage,
        Self::UnpinnedMessage,
        Self::AddedReaction,
        Self::DeletedReaction,
        Self::AddedRole,
        Self::DeletedRole,
        Self::UpdatedRole,
        Self::UserUpdated,
        Self::SelfJoinedGuild,
        Self::SelfExitedGuild,
        Self::JoinedChannel,
        Self::ExitedChannel,
        Self::MessageBtnClick,
    ];

    /// Parse a wire sub-type.
    #[must_use]
    pub fn from_wire(name: &str) -> Self {
        match name {
            "joined_guild" => Self::JoinedGuild,
            "exited_guild" => Self::ExitedGuild,
            "updated_guild_member" => Self::UpdatedGuildMember,
            "guild_member_online" => Self::GuildMemberOnline,
            "guild_member_offline" => Self::GuildMemberOffline,
            "updated_guild" => Self::UpdatedGuild,
            "deleted_guild" => Self::DeletedGuild,
            "added_block_list" => Self::AddedBlockList,
            "deleted_block_list" => Self::DeletedBlockList,
            "added_emoji" => Self::AddedEmoji,
            "removed_emoji" => Self::RemovedEmoji,
            "updated_emoji" => Self::UpdatedEmoji,
            "added_channel" => Self::AddedChannel,
            "updated_channel" => Self::UpdatedChannel,
            "deleted_channel" => Self::DeletedChannel,
            "updated_message" => Self::UpdatedMessage,
            "deleted_message" => Self::DeletedMessage,
            "pinned_message" => Self::PinnedMessage,
            "unpinned_message" => Self::UnpinnedMessage,
            "added_reaction" => Self::AddedReaction,
            "deleted_reaction" => Self::DeletedReaction,
            "added_role" => Self::AddedRole,
            "deleted_role" => Self::DeletedRole,
            "updated_role" => Self::UpdatedRole,
            "user_updated" => Self::UserUpdated,
            "self_joined_guild" => Self::SelfJoinedGuild,
            "self_exited_guild" => Self::SelfExitedGuild,
            "joined_channel" => Self::JoinedChannel,
            "exited_channel" => Self::ExitedChannel,
            "message_btn_click" => Self::MessageBtnClick,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Wire sub-type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::JoinedGuild => "joined_guild",
            Self::ExitedGuild => "exited_guild",
            Self::UpdatedGuildMember => "updated_guild_member",
            Self::GuildMemberOnline => "guild_member_online",
            Self::GuildMemberOffline => "guild_member_offline",
            Self::UpdatedGuild => "updated_guild",
            Self::DeletedGuild => "deleted_guild",
            Self::AddedBlockList => "added_block_list",
            Self::DeletedBlockList => "deleted_block_list",
            Self::AddedEmoji => "added_emoji",
            Self::RemovedEmoji => "removed_emoji",
            Self::UpdatedEmoji => "updated_emoji",
            Self::AddedChannel => "added_channel",
            Self::UpdatedChannel => "updated_channel",
            Self::DeletedChannel => "deleted_channel",
            Self::UpdatedMessage => "updated_message",
            Self::DeletedMessage => "deleted_message",
            Self::PinnedMessage => "pinned_message",
            Self::UnpinnedMessage => "unpinned_message",
            Self::AddedReaction => "added_reaction",
            Self::DeletedReaction => "deleted_reaction",
            Self::AddedRole => "added_role",
            Self::DeletedRole => "deleted_role",
            Self::UpdatedRole => "updated_role",
            Self::UserUpdated => "user_updated",
            Self::SelfJoinedGuild => "self_joined_guild",
            Self::SelfExitedGuild => "self_exited_guild",
            Self::JoinedChannel => "joined_channel",
            Self::ExitedChannel => "exited_channel",
            Self::MessageBtnClick => "message_btn_click",
            Self::Unrecognized(name) => name,
        }
    }

    /// Whether this sub-type is part of the catalog.
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for SystemEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed `extra` of a system event.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemEnvelope {
    /// Sub-type discriminator.
    pub kind: SystemEventKind,
    /// Sub-type specific body, kept raw.
    pub body: Value,
}

impl SystemEnvelope {
    /// Parse a system event `extra` value.
    ///
    /// The discriminator is read from `type`, falling back to `subType`.
    ///
    /// # Errors
    ///
    /// Fails if `extra` is not an object or carries no string discriminator.
    pub fn from_extra(extra: &Value) -> Result<Self, ProtoError> {
        let object = extra
            .as_object()
            .ok_or_else(|| ProtoError::Decoding("system event extra is not an object".into()))?;

        let sub_type = object
            .get("type")
            .or_else(|| object.get("subType"))
            .and_then(Value::as_str)
            .ok_or(ProtoError::MissingField("extra.type"))?;

        Ok(Self {
            kind: SystemEventKind::from_wire(sub_type),
            body: object.get("body").cloned().unwrap_or(Value::Null),
        })
    }

    /// Deserialize the body into a typed structure from [`crate::bodies`].
    ///
    /// # Errors
    ///
    /// Fails if the body does not match `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, ProtoError> {
        T::deserialize(&self.body).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
