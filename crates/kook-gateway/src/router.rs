//! Event routing: maps decoded events onto named categories.
//!
//! Dispatch order:
//! 1. `type` 8/9 on a `PERSON` channel are member presence changes; on any
//!    other channel they are ordinary messages.
//! 2. `type` 1..=10 are messages of any content kind.
//! 3. `type` 255 always yields `system-event`, preceded by the specific
//!    category when the sub-type is catalogued.
//! 4. Everything else yields no named category.

use std::fmt;

use kook_proto::{ChannelKind, Event, ProtoError, SystemEnvelope, SystemEventKind};

/// Closed set of categories listeners can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Handshake completed.
    Ready,
    /// Diagnostic line.
    Debug,
    /// Recoverable or fatal error.
    Error,
    /// Manual disconnect finished.
    Stopped,
    /// Heartbeat acknowledged.
    Pong,
    /// Every decoded event, before routing.
    Raw,
    /// Message of any content type.
    Message,
    /// Member came online.
    GuildMemberOnline,
    /// Member went offline.
    GuildMemberOffline,
    /// Every system event, catalogued or not.
    SystemEvent,
    /// `joined_guild`.
    JoinedGuild,
    /// `exited_guild`.
    ExitedGuild,
    /// `updated_guild_member`.
    GuildMemberUpdated,
    /// `updated_guild`.
    GuildUpdated,
    /// `deleted_guild`.
    GuildDeleted,
    /// `added_block_list`.
    AddedBlockList,
    /// `deleted_block_list`.
    DeletedBlockList,
    /// `added_emoji`.
    AddedEmoji,
    /// `removed_emoji`.
    RemovedEmoji,
    /// `updated_emoji`.
    UpdatedEmoji,
    /// `added_channel`.
    ChannelCreated,
    /// `updated_channel`.
    ChannelUpdated,
    /// `deleted_channel`.
    ChannelDeleted,
    /// `updated_message`.
    MessageUpdated,
    /// `deleted_message`.
    MessageDeleted,
    /// `pinned_message`.
    PinnedMessage,
    /// `unpinned_message`.
    UnpinnedMessage,
    /// `added_reaction`.
    ReactionAdded,
    /// `deleted_reaction`.
    ReactionRemoved,
    /// `added_role`.
    RoleCreated,
    /// `deleted_role`.
    RoleDeleted,
    /// `updated_role`.
    RoleUpdated,
    /// `user_updated`.
    UserUpdated,
    /// `self_joined_guild`.
    SelfJoinedGuild,
    /// `self_exited_guild`.
    SelfExitedGuild,
    /// `joined_channel`.
    JoinedChannel,
    /// `exited_channel`.
    ExitedChannel,
    /// `message_btn_click`.
    ButtonClicked,
}

impl EventCategory {
    /// Every category.
    pub const ALL: [Self; 38] = [
        Self::Ready,
        Self::Debug,
        Self::Error,
        Self::Stopped,
        Self::Pong,
        Self::Raw,
        Self::Message,
        Self::GuildMemberOnline,
        Self::GuildMemberOffline,
        Self::SystemEvent,
        Self::JoinedGuild,
        Self::ExitedGuild,
        Self::GuildMemberUpdated,
        Self::GuildUpdated,
        Self::GuildDeleted,
        Self::AddedBlockList,
        Self::DeletedBlockList,
        Self::AddedEmoji,
        Self::RemovedEmoji,
        Self::UpdatedEmoji,
        Self::ChannelCreated,
        Self::ChannelUpdated,
        Self::ChannelDeleted,
        Self::MessageUpdated,
        Self::MessageDeleted,
        Self::PinnedMessage,
        Self::UnpinnedMessage,
        Self::ReactionAdded,
        Self::ReactionRemoved,
        Self::RoleCreated,
        Self::RoleDeleted,
        Self::RoleUpdated,
        Self::UserUpdated,
        Self::SelfJoinedGuild,
        Self::SelfExitedGuild,
        Self::JoinedChannel,
        Self::ExitedChannel,
        Self::ButtonClicked,
    ];

    /// Stable category name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Debug => "debug",
            Self::Error => "error",
            Self::Stopped => "stopped",
            Self::Pong => "pong",
            Self::Raw => "event",
            Self::Message => "message",
            Self::GuildMemberOnline => "guild-member-online",
            Self::GuildMemberOffline => "guild-member-offline",
            Self::SystemEvent => "system-event",
            Self::JoinedGuild => "joined-guild",
            Self::ExitedGuild => "exited-guild",
            Self::GuildMemberUpdated => "guild-member-updated",
            Self::GuildUpdated => "guild-updated",
            Self::GuildDeleted => "guild-deleted",
            Self::AddedBlockList => "added-block-list",
            Self::DeletedBlockList => "deleted-block-list",
            Self::AddedEmoji => "added-emoji",
            Self::RemovedEmoji => "removed-emoji",
            Self::UpdatedEmoji => "updated-emoji",
            Self::ChannelCreated => "channel-created",
            Self::ChannelUpdated => "channel-updated",
            Self::ChannelDeleted => "channel-deleted",
            Self::MessageUpdated => "message-updated",
            Self::MessageDeleted => "message-deleted",
            Self::PinnedMessage => "pinned-message",
            Self::UnpinnedMessage => "unpinned-message",
            Self::ReactionAdded => "reaction-added",
            Self::ReactionRemoved => "reaction-removed",
            Self::RoleCreated => "role-created",
            Self::RoleDeleted => "role-deleted",
            Self::RoleUpdated => "role-updated",
            Self::UserUpdated => "user-updated",
            Self::SelfJoinedGuild => "self-joined-guild",
            Self::SelfExitedGuild => "self-exited-guild",
            Self::JoinedChannel => "joined-channel",
            Self::ExitedChannel => "exited-channel",
            Self::ButtonClicked => "button-clicked",
        }
    }

    /// Look a category up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.name() == name)
    }

    /// Specific category for a system event sub-type.
    #[must_use]
    pub const fn for_system_kind(kind: &SystemEventKind) -> Option<Self> {
        let category = match kind {
            SystemEventKind::JoinedGuild => Self::JoinedGuild,
            SystemEventKind::ExitedGuild => Self::ExitedGuild,
            SystemEventKind::UpdatedGuildMember => Self::GuildMemberUpdated,
            SystemEventKind::GuildMemberOnline => Self::GuildMemberOnline,
            SystemEventKind::GuildMemberOffline => Self::GuildMemberOffline,
            SystemEventKind::UpdatedGuild => Self::GuildUpdated,
            SystemEventKind::DeletedGuild => Self::GuildDeleted,
            SystemEventKind::AddedBlockList => Self::AddedBlockList,
            SystemEventKind::DeletedBlockList => Self::DeletedBlockList,
            SystemEventKind::AddedEmoji => Self::AddedEmoji,
            SystemEventKind::RemovedEmoji => Self::RemovedEmoji,
            SystemEventKind::UpdatedEmoji => Self::UpdatedEmoji,
            SystemEventKind::AddedChannel => Self::ChannelCreated,
            SystemEventKind::UpdatedChannel => Self::ChannelUpdated,
            SystemEventKind::DeletedChannel => Self::ChannelDeleted,
            SystemEventKind::UpdatedMessage => Self::MessageUpdated,
            SystemEventKind::DeletedMessage => Self::MessageDeleted,
            SystemEventKind::PinnedMessage => Self::PinnedMessage,
            SystemEventKind::UnpinnedMessage => Self::UnpinnedMessage,
            SystemEventKind::AddedReaction => Self::ReactionAdded,
            SystemEventKind::DeletedReaction => Self::ReactionRemoved,
            SystemEventKind::AddedRole => Self::RoleCreated,
            SystemEventKind::DeletedRole => Self::RoleDeleted,
            SystemEventKind::UpdatedRole => Self::RoleUpdated,
            SystemEventKind::UserUpdated => Self::UserUpdated,
            SystemEventKind::SelfJoinedGuild => Self::SelfJoinedGuild,
            SystemEventKind::SelfExitedGuild => Self::SelfExitedGuild,
            SystemEventKind::JoinedChannel => Self::JoinedChannel,
            SystemEventKind::ExitedChannel => Self::ExitedChannel,
            SystemEventKind::MessageBtnClick => Self::ButtonClicked,
            SystemEventKind::Unrecognized(_) => return None,
        };
        Some(category)
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of routing one event.
#[derive(Debug)]
pub struct RoutedEvent {
    /// Categories to notify, in emission order.
    pub categories: Vec<EventCategory>,
    /// Parsed `extra` for system events; `None` otherwise.
    pub envelope: Option<Result<SystemEnvelope, ProtoError>>,
}

/// Route an event to its named categories.
#[must_use]
pub fn route(event: &Event) -> RoutedEvent {
    match event.system_envelope() {
        Some(envelope) => {
            let mut categories = Vec::with_capacity(2);
            if let Some(specific) = envelope
                .as_ref()
                .ok()
                .and_then(|envelope| EventCategory::for_system_kind(&envelope.kind))
            {
                categories.push(specific);
            }
            categories.push(EventCategory::SystemEvent);

            RoutedEvent {
                categories,
                envelope: Some(envelope),
            }
        }
        None => RoutedEvent {
            categories: message_category(event.type_code, event.channel_type)
                .into_iter()
                .collect(),
            envelope: None,
        },
    }
}

/// Category for non-system event types.
///
/// Codes 8 and 9 are overloaded: on `PERSON` channels they announce member
/// presence, everywhere else they are audio/kmarkdown messages.
#[must_use]
pub const fn message_category(type_code: i64, channel: ChannelKind) -> Option<EventCategory> {
    match (type_code, channel) {
        (8, ChannelKind::Person) => Some(EventCategory::GuildMemberOnline),
        (9, ChannelKind::Person) => Some(EventCategory::GuildMemberOffline),
        (1..=10, _) => Some(EventCategory::Message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use test_case::test_case;

    fn event(type_code: i64, channel_type: ChannelKind, extra: Value) -> Event {
        Event {
            channel_type,
            type_code,
            target_id: "t1".to_string(),
            author_id: "a1".to_string(),
            content: String::new(),
            extra,
            msg_id: "m0".to_string(),
            msg_timestamp: 0,
            nonce: String::new(),
            verify_token: None,
        }
    }

    fn system(sub_type: &str) -> Event {
        event(
            255,
            ChannelKind::Group,
            json!({"type": sub_type, "body": {"msg_id": "m1"}}),
        )
    }

    #[test]
    fn test_category_names_are_unique() {
        let mut names: Vec<&str> = EventCategory::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EventCategory::ALL.len());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            EventCategory::from_name("pinned-message"),
            Some(EventCategory::PinnedMessage)
        );
        assert_eq!(EventCategory::from_name("event"), Some(EventCategory::Raw));
        assert_eq!(EventCategory::from_name("nope"), None);
    }

    #[test]
    fn test_every_catalogued_sub_type_has_a_category() {
        for kind in SystemEventKind::KNOWN {
            assert!(
                EventCategory::for_system_kind(&kind).is_some(),
                "no category for {kind}"
            );
        }
    }

    #[test_case(1, ChannelKind::Group, Some(EventCategory::Message) ; "text")]
    #[test_case(2, ChannelKind::Person, Some(EventCategory::Message) ; "image in dm")]
    #[test_case(10, ChannelKind::Broadcast, Some(EventCategory::Message) ; "card")]
    #[test_case(8, ChannelKind::Person, Some(EventCategory::GuildMemberOnline) ; "online")]
    #[test_case(9, ChannelKind::Person, Some(EventCategory::GuildMemberOffline) ; "offline")]
    #[test_case(8, ChannelKind::Group, Some(EventCategory::Message) ; "audio in group")]
    #[test_case(9, ChannelKind::Broadcast, Some(EventCategory::Message) ; "kmarkdown in broadcast")]
    #[test_case(0, ChannelKind::Group, None ; "zero")]
    #[test_case(11, ChannelKind::Group, None ; "eleven")]
    #[test_case(12, ChannelKind::Person, None ; "twelve")]
    fn test_message_category(type_code: i64, channel: ChannelKind, expected: Option<EventCategory>) {
        assert_eq!(message_category(type_code, channel), expected);
    }

    #[test]
    fn test_pinned_message_emits_specific_then_catch_all() {
        let routed = route(&system("pinned_message"));
        assert_eq!(
            routed.categories,
            vec![EventCategory::PinnedMessage, EventCategory::SystemEvent]
        );

        let envelope = routed
            .envelope
            .expect("system event has envelope")
            .expect("envelope parses");
        assert_eq!(envelope.kind, SystemEventKind::PinnedMessage);
        assert_eq!(envelope.body, json!({"msg_id": "m1"}));
    }

    #[test_case("added_channel", EventCategory::ChannelCreated)]
    #[test_case("added_reaction", EventCategory::ReactionAdded)]
    #[test_case("updated_role", EventCategory::RoleUpdated)]
    #[test_case("message_btn_click", EventCategory::ButtonClicked)]
    #[test_case("guild_member_online", EventCategory::GuildMemberOnline)]
    fn test_system_sub_types(sub_type: &str, expected: EventCategory) {
        let routed = route(&system(sub_type));
        assert_eq!(routed.categories, vec![expected, EventCategory::SystemEvent]);
    }

    #[test]
    fn test_unmapped_sub_type_emits_only_catch_all() {
        let routed = route(&system("guild_boosted"));
        assert_eq!(routed.categories, vec![EventCategory::SystemEvent]);

        let envelope = routed.envelope.expect("envelope").expect("parses");
        assert_eq!(
            envelope.kind,
            SystemEventKind::Unrecognized("guild_boosted".to_string())
        );
    }

    #[test]
    fn test_malformed_system_extra_still_emits_catch_all() {
        let routed = route(&event(255, ChannelKind::Group, json!("garbage")));
        assert_eq!(routed.categories, vec![EventCategory::SystemEvent]);
        assert!(matches!(routed.envelope, Some(Err(_))));
    }

    #[test]
    fn test_sub_type_alias_key() {
        let routed = route(&event(
            255,
            ChannelKind::Group,
            json!({"subType": "pinned_message", "body": {"msg_id": "m1"}}),
        ));
        assert_eq!(
            routed.categories,
            vec![EventCategory::PinnedMessage, EventCategory::SystemEvent]
        );
    }

    fn arb_channel() -> impl Strategy<Value = ChannelKind> {
        prop_oneof![
            Just(ChannelKind::Group),
            Just(ChannelKind::Person),
            Just(ChannelKind::Broadcast),
        ]
    }

    proptest! {
        #[test]
        fn prop_non_system_routes_to_at_most_one_category(
            type_code in -1_000i64..1_000,
            channel in arb_channel(),
        ) {
            prop_assume!(type_code != 255);
            let routed = route(&event(type_code, channel, Value::Null));

            prop_assert!(routed.envelope.is_none());
            if (1..=10).contains(&type_code) {
                prop_assert_eq!(routed.categories.len(), 1);
            } else {
                prop_assert!(routed.categories.is_empty());
            }
        }

        #[test]
        fn prop_system_events_always_end_with_catch_all(sub_type in "[a-z_]{1,24}") {
            let routed = route(&system(&sub_type));
            prop_assert_eq!(routed.categories.last().copied(), Some(EventCategory::SystemEvent));
            prop_assert!(routed.categories.len() <= 2);
        }
    }
}
