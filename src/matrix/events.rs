//! Conversion from Matrix SDK timeline events to bridge room events.

use matrix_sdk::ruma::events::{AnySyncMessageLikeEvent, AnySyncStateEvent, AnySyncTimelineEvent};
use matrix_sdk::ruma::RoomId;

use crate::common::messages::{Membership, RoomEvent, RoomEventKind};

/// Convert a timeline event from `room_id`.
///
/// Redacted messages and memberships carry no content and are reported by
/// their type tag only.
pub fn room_event_from_sync(room_id: &RoomId, event: &AnySyncTimelineEvent) -> RoomEvent {
    let kind = match event {
        AnySyncTimelineEvent::State(AnySyncStateEvent::RoomMember(member)) => {
            member.as_original().map(|original| {
                RoomEventKind::Membership(Membership::from_state(original.content.membership.as_str()))
            })
        }
        AnySyncTimelineEvent::MessageLike(AnySyncMessageLikeEvent::RoomMessage(message)) => {
            message.as_original().map(|original| RoomEventKind::Message {
                msgtype: original.content.msgtype.msgtype().to_string(),
                body: original.content.msgtype.body().to_string(),
            })
        }
        _ => None,
    }
    .unwrap_or_else(|| RoomEventKind::Other {
        event_type: event.event_type().to_string(),
    });

    RoomEvent {
        room_id: room_id.to_string(),
        sender: event.sender().to_string(),
        kind,
    }
}

#[cfg(test)]
mod tests {
    use matrix_sdk::ruma::OwnedRoomId;
    use serde_json::json;

    use super::*;

    fn room_id() -> OwnedRoomId {
        RoomId::parse("!abc:host").unwrap()
    }

    fn parse(value: serde_json::Value) -> AnySyncTimelineEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message() {
        let event = parse(json!({
            "type": "m.room.message",
            "event_id": "$1:host",
            "sender": "@bob:host",
            "origin_server_ts": 1,
            "content": { "msgtype": "m.text", "body": "hi" }
        }));

        let converted = room_event_from_sync(&room_id(), &event);
        assert_eq!(converted.room_id, "!abc:host");
        assert_eq!(converted.sender, "@bob:host");
        assert_eq!(
            converted.kind,
            RoomEventKind::Message {
                msgtype: "m.text".to_string(),
                body: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_emote_message() {
        let event = parse(json!({
            "type": "m.room.message",
            "event_id": "$2:host",
            "sender": "@bob:host",
            "origin_server_ts": 2,
            "content": { "msgtype": "m.emote", "body": "waves" }
        }));

        let converted = room_event_from_sync(&room_id(), &event);
        assert!(matches!(
            converted.kind,
            RoomEventKind::Message { ref msgtype, .. } if msgtype == "m.emote"
        ));
    }

    #[test]
    fn test_membership() {
        for (state, expected) in [
            ("join", Membership::Join),
            ("leave", Membership::Leave),
            ("ban", Membership::Other("ban".to_string())),
        ] {
            let event = parse(json!({
                "type": "m.room.member",
                "event_id": "$3:host",
                "sender": "@carol:host",
                "state_key": "@carol:host",
                "origin_server_ts": 3,
                "content": { "membership": state }
            }));

            let converted = room_event_from_sync(&room_id(), &event);
            assert_eq!(converted.kind, RoomEventKind::Membership(expected));
        }
    }

    #[test]
    fn test_other_state_event() {
        let event = parse(json!({
            "type": "m.room.topic",
            "event_id": "$4:host",
            "sender": "@carol:host",
            "state_key": "",
            "origin_server_ts": 4,
            "content": { "topic": "bridged with zulip" }
        }));

        let converted = room_event_from_sync(&room_id(), &event);
        assert_eq!(
            converted.kind,
            RoomEventKind::Other {
                event_type: "m.room.topic".to_string()
            }
        );
    }
}
