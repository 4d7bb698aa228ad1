//! Typed bodies for system events.
//!
//! Bodies are lenient: fields the platform omits fall back to defaults so a
//! partially populated body still deserializes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `joined_guild` / `exited_guild`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildMemberBody {
    /// Member user id.
    pub user_id: String,
    /// Join time in milliseconds.
    pub joined_at: Option<i64>,
    /// Exit time in milliseconds.
    pub exited_at: Option<i64>,
}

/// `guild_member_online` / `guild_member_offline`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildMemberPresenceBody {
    /// Member user id.
    pub user_id: String,
    /// Event time in milliseconds.
    pub event_time: i64,
    /// Guilds shared with the bot.
    pub guilds: Vec<String>,
}

/// `updated_guild_member`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildMemberUpdateBody {
    /// Member user id.
    pub user_id: String,
    /// New nickname.
    pub nickname: String,
}

/// `added_block_list` / `deleted_block_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockListBody {
    /// Operator user id.
    pub operator_id: String,
    /// Reason given by the operator.
    pub remark: Option<String>,
    /// Affected user ids.
    pub user_id: Vec<String>,
}

/// `added_emoji` / `removed_emoji` / `updated_emoji`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmojiBody {
    /// Emoji id.
    pub id: String,
    /// Emoji name.
    pub name: String,
}

/// `deleted_channel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelDeleteBody {
    /// Channel id.
    pub id: String,
    /// Deletion time in milliseconds.
    pub deleted_at: i64,
}

/// `updated_message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageUpdateBody {
    /// Message id.
    pub msg_id: String,
    /// New content.
    pub content: String,
    /// Channel id.
    pub channel_id: String,
    /// Mentioned user ids.
    pub mention: Vec<String>,
    /// Whether `@all` was mentioned.
    pub mention_all: bool,
    /// Whether `@here` was mentioned.
    pub mention_here: bool,
    /// Mentioned role ids.
    pub mention_roles: Vec<i64>,
    /// Update time in milliseconds.
    pub updated_at: i64,
}

/// `deleted_message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageDeleteBody {
    /// Message id.
    pub msg_id: String,
    /// Channel id.
    pub channel_id: String,
}

/// Emoji reference inside a reaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emoji {
    /// Emoji id.
    pub id: String,
    /// Emoji name.
    pub name: String,
}

/// `added_reaction` / `deleted_reaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionBody {
    /// Message id.
    pub msg_id: String,
    /// Reacting user id.
    pub user_id: String,
    /// Channel id.
    pub channel_id: String,
    /// Reaction emoji.
    pub emoji: Emoji,
}

/// `pinned_message` / `unpinned_message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMessageBody {
    /// Channel id.
    pub channel_id: String,
    /// Operator user id.
    pub operator_id: String,
    /// Message id.
    pub msg_id: String,
}

/// `added_role` / `deleted_role` / `updated_role`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildRoleBody {
    /// Role id.
    pub role_id: i64,
    /// Role name.
    pub name: String,
    /// Display color.
    pub color: i64,
    /// Sort position.
    pub position: i64,
    /// Whether members are listed separately (0/1).
    pub hoist: i64,
    /// Whether the role can be mentioned (0/1).
    pub mentionable: i64,
    /// Permission bitset.
    pub permissions: i64,
}

/// `user_updated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserUpdateBody {
    /// User id.
    pub user_id: String,
    /// New username.
    pub username: String,
    /// New avatar URL.
    pub avatar: String,
}

/// `self_joined_guild` / `self_exited_guild`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfGuildBody {
    /// Guild id.
    pub guild_id: String,
    /// Join state, e.g. `"pending"`.
    pub state: Option<String>,
}

/// `joined_channel` / `exited_channel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserChannelBody {
    /// User id.
    pub user_id: String,
    /// Voice channel id.
    pub channel_id: String,
    /// Join time in milliseconds.
    pub joined_at: Option<i64>,
    /// Exit time in milliseconds.
    pub exited_at: Option<i64>,
}

/// `message_btn_click`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageBtnClickBody {
    /// Card message id.
    pub msg_id: String,
    /// Clicking user id.
    pub user_id: String,
    /// Button value.
    pub value: String,
    /// Channel or user the card was sent to.
    pub target_id: String,
    /// Raw profile of the clicking user.
    pub user_info: Value,
}
