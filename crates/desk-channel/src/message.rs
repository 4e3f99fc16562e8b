//! Push-channel frame decoding and typed topics.
//!
//! The wire format is one JSON text frame per event:
//! `{"topic": "market_data", "data": {...}}`.

use crate::error::{ChannelError, ChannelResult};
use serde::Deserialize;
use serde_json::Value;

/// Typed event topics.
///
/// `Connected`/`Disconnected` are synthetic lifecycle topics emitted by the
/// channel itself; the rest arrive from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Connected,
    Disconnected,
    MarketData,
    ChartData,
    Update,
}

impl Topic {
    /// Wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::MarketData => "market_data",
            Self::ChartData => "chart_data",
            Self::Update => "update",
        }
    }

    /// Parse a wire topic name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "connected" => Some(Self::Connected),
            "disconnected" => Some(Self::Disconnected),
            "market_data" => Some(Self::MarketData),
            "chart_data" => Some(Self::ChartData),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded push event: typed topic plus its raw JSON payload.
///
/// Payload decoding beyond the envelope is the consumer's job; the channel
/// does not interpret `data`.
#[derive(Debug, Clone)]
pub struct PushEvent {
    pub topic: Topic,
    pub data: Value,
}

impl PushEvent {
    /// Synthetic lifecycle event with no payload.
    pub fn lifecycle(topic: Topic) -> Self {
        Self {
            topic,
            data: Value::Null,
        }
    }
}

/// Raw frame envelope as it appears on the wire.
#[derive(Debug, Deserialize)]
struct RawFrame {
    topic: String,
    #[serde(default)]
    data: Value,
}

/// Decode one text frame into a typed event.
pub fn decode_frame(text: &str) -> ChannelResult<PushEvent> {
    let frame: RawFrame = serde_json::from_str(text)
        .map_err(|e| ChannelError::MalformedFrame(format!("invalid envelope: {e}")))?;
    let topic = Topic::parse(&frame.topic).ok_or(ChannelError::UnknownTopic(frame.topic))?;
    Ok(PushEvent {
        topic,
        data: frame.data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_market_data_frame() {
        let event =
            decode_frame(r#"{"topic": "market_data", "data": {"symbol": "AAPL"}}"#).unwrap();
        assert_eq!(event.topic, Topic::MarketData);
        assert_eq!(event.data, json!({"symbol": "AAPL"}));
    }

    #[test]
    fn test_decode_frame_without_data_defaults_null() {
        let event = decode_frame(r#"{"topic": "update"}"#).unwrap();
        assert_eq!(event.topic, Topic::Update);
        assert!(event.data.is_null());
    }

    #[test]
    fn test_decode_rejects_unknown_topic() {
        let err = decode_frame(r#"{"topic": "order_book", "data": {}}"#).unwrap_err();
        assert!(matches!(err, ChannelError::UnknownTopic(t) if t == "order_book"));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(
            decode_frame("not json"),
            Err(ChannelError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_topic_round_trip() {
        for topic in [
            Topic::Connected,
            Topic::Disconnected,
            Topic::MarketData,
            Topic::ChartData,
            Topic::Update,
        ] {
            assert_eq!(Topic::parse(topic.as_str()), Some(topic));
        }
    }
}
