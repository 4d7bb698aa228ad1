//! Rendering of gateway notifications.

use kook_gateway::kook_proto::Event;
use kook_gateway::{EventCategory, GatewayEvent};
use serde_json::{Value, json};

use crate::cli::Format;

/// Render one notification as a single line.
#[must_use]
pub fn render(format: Format, category: EventCategory, payload: &GatewayEvent) -> String {
    match format {
        Format::Text => render_text(category, payload),
        Format::Json => render_json(category, payload).to_string(),
    }
}

fn render_text(category: EventCategory, payload: &GatewayEvent) -> String {
    match payload {
        GatewayEvent::Ready { session_id } => format!("{category} session={session_id}"),
        GatewayEvent::Debug(line) => format!("{category} {line}"),
        GatewayEvent::Error(err) => format!("{category} {err}"),
        GatewayEvent::Stopped | GatewayEvent::Pong => category.to_string(),
        GatewayEvent::Event(event) => format!("{category} {}", describe(event)),
        GatewayEvent::System { event, envelope } => format!(
            "{category} {} target={} body={}",
            envelope.kind, event.target_id, envelope.body
        ),
    }
}

fn describe(event: &Event) -> String {
    format!(
        "[{:?} {}] {} <- {}: {}",
        event.channel_type, event.type_code, event.target_id, event.author_id, event.content
    )
}

fn render_json(category: EventCategory, payload: &GatewayEvent) -> Value {
    let detail = match payload {
        GatewayEvent::Ready { session_id } => json!({ "session_id": session_id }),
        GatewayEvent::Debug(line) => json!({ "message": line }),
        GatewayEvent::Error(err) => json!({ "error": err.to_string(), "fatal": err.is_fatal() }),
        GatewayEvent::Stopped | GatewayEvent::Pong => Value::Null,
        GatewayEvent::Event(event) => json!({ "event": event_json(event) }),
        GatewayEvent::System { event, envelope } => json!({
            "event": event_json(event),
            "system": { "type": envelope.kind.as_str(), "body": envelope.body },
        }),
    };
    json!({ "category": category.name(), "detail": detail })
}

fn event_json(event: &Event) -> Value {
    serde_json::to_value(event).unwrap_or(Value::Null)
}
