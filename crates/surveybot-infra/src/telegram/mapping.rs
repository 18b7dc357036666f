//! Conversion between Bot API payloads and surveybot events/messages.

use surveybot_types::event::{EventKind, InboundEvent, Keyboard, OutboundMessage, TextFormat};
use surveybot_types::identity::ParticipantId;

use super::types::{InlineKeyboardButton, InlineKeyboardMarkup, SendMessageRequest, Update};

/// Turn an update into an inbound event, or `None` for updates the survey
/// does not react to (stickers, edits, channel posts, ...).
pub fn to_event(update: Update) -> Option<InboundEvent> {
    if let Some(query) = update.callback_query {
        return Some(InboundEvent::new(
            ParticipantId(query.from.id),
            EventKind::Callback {
                callback_id: query.id,
                data: query.data.unwrap_or_default(),
            },
        ));
    }

    let message = update.message?;
    let text = message.text?;
    let participant = ParticipantId(message.from.map_or(message.chat.id, |user| user.id));
    Some(InboundEvent::new(participant, classify_text(text)))
}

/// `/start` and `/help` (optionally addressed as `/cmd@botname`) are
/// commands; everything else is free text.
fn classify_text(text: String) -> EventKind {
    let trimmed = text.trim();
    if let Some(command) = trimmed.strip_prefix('/') {
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();
        match name {
            "start" => return EventKind::Start,
            "help" => return EventKind::Help,
            _ => {}
        }
    }
    EventKind::Text(text)
}

pub fn to_send_request(to: ParticipantId, message: &OutboundMessage) -> SendMessageRequest<'_> {
    SendMessageRequest {
        chat_id: to.as_i64(),
        text: &message.text,
        parse_mode: match message.format {
            TextFormat::Plain => None,
            TextFormat::Markdown => Some("Markdown"),
        },
        reply_markup: message.keyboard.as_ref().map(to_markup),
    }
}

fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| InlineKeyboardButton {
                        text: button.label.clone(),
                        callback_data: button.data.clone(),
                    })
                    .collect()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    fn text_update(text: &str) -> Update {
        update(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": { "id": 42, "is_bot": false, "first_name": "A" },
                "chat": { "id": 42, "type": "private" },
                "date": 0,
                "text": text
            }
        }))
    }

    #[test]
    fn commands_map_to_their_events() {
        assert_eq!(to_event(text_update("/start")).unwrap().kind, EventKind::Start);
        assert_eq!(
            to_event(text_update("/start@survey_bot")).unwrap().kind,
            EventKind::Start
        );
        assert_eq!(to_event(text_update(" /help ")).unwrap().kind, EventKind::Help);
    }

    #[test]
    fn other_text_is_passed_through_untrimmed() {
        let event = to_event(text_update(" 23 ")).unwrap();
        assert_eq!(event.participant, ParticipantId(42));
        assert_eq!(event.kind, EventKind::Text(" 23 ".to_string()));

        let unknown = to_event(text_update("/stats")).unwrap();
        assert_eq!(unknown.kind, EventKind::Text("/stats".to_string()));
    }

    #[test]
    fn callback_query_maps_to_callback() {
        let event = to_event(update(json!({
            "update_id": 11,
            "callback_query": {
                "id": "cbq-1",
                "from": { "id": 7, "is_bot": false, "first_name": "B" },
                "chat_instance": "x",
                "data": "female"
            }
        })))
        .unwrap();

        assert_eq!(event.participant, ParticipantId(7));
        assert_eq!(
            event.kind,
            EventKind::Callback {
                callback_id: "cbq-1".to_string(),
                data: "female".to_string()
            }
        );
    }

    #[test]
    fn non_text_messages_are_ignored() {
        let sticker = update(json!({
            "update_id": 12,
            "message": {
                "message_id": 2,
                "from": { "id": 42, "is_bot": false, "first_name": "A" },
                "chat": { "id": 42, "type": "private" },
                "date": 0,
                "sticker": { "file_id": "abc" }
            }
        }));
        assert!(to_event(sticker).is_none());
        assert!(to_event(update(json!({ "update_id": 13 }))).is_none());
    }

    #[test]
    fn send_request_carries_keyboard_and_format() {
        let message = OutboundMessage::text("Q1: Statement").with_keyboard(Keyboard::rating());
        let body = serde_json::to_value(to_send_request(ParticipantId(5), &message)).unwrap();

        assert_eq!(body["chat_id"], 5);
        assert!(body.get("parse_mode").is_none());
        let row = &body["reply_markup"]["inline_keyboard"][0];
        assert_eq!(row.as_array().unwrap().len(), 5);
        assert_eq!(row[0]["text"], "5");
        assert_eq!(row[0]["callback_data"], "5");

        let help = OutboundMessage::text("*Help*").markdown();
        let body = serde_json::to_value(to_send_request(ParticipantId(5), &help)).unwrap();
        assert_eq!(body["parse_mode"], "Markdown");
        assert!(body.get("reply_markup").is_none());
    }
}
