//! Event model and persisted queue-entry schema.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Playback action carried by audio events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioAction {
    Play,
    Pause,
    Stop,
    Refresh,
}

impl AudioAction {
    /// Wire value for the `a` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioAction::Play => "play",
            AudioAction::Pause => "pause",
            AudioAction::Stop => "stop",
            AudioAction::Refresh => "refresh",
        }
    }
}

/// A validated tracking event.
///
/// Flat record covering every taxonomy: page views carry only `page` and
/// `level`, custom/click events add `event_type`, audio events add the
/// playback fields. Field names serialize camelCase to stay byte-compatible
/// with logs persisted by earlier versions.
///
/// Events are immutable once enqueued; audio refresh ticks are emitted as
/// new events via [`Event::refresh_tick`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Page path, `::`-delimited chapter syntax.
    pub page: String,
    /// Site level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Click/custom event type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Audio playback action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AudioAction>,
    /// Audio duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Page the audio is playing on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_page: Option<String>,
    /// Level of the context page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_level: Option<String>,
    /// Playback quality identifier.
    #[serde(rename = "qualityID", default, skip_serializing_if = "Option::is_none")]
    pub quality_id: Option<String>,
}

impl Event {
    /// Page-view event.
    pub fn page_view(page: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            level: Some(level.into()),
            event_type: None,
            action: None,
            duration: None,
            context_page: None,
            context_level: None,
            quality_id: None,
        }
    }

    /// Custom/click event.
    pub fn custom(
        event_type: impl Into<String>,
        page: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            event_type: Some(event_type.into()),
            ..Self::page_view(page, level)
        }
    }

    /// Audio event.
    #[allow(clippy::too_many_arguments)]
    pub fn audio(
        page: impl Into<String>,
        level: impl Into<String>,
        action: AudioAction,
        duration: impl Into<String>,
        context_page: impl Into<String>,
        context_level: impl Into<String>,
        quality_id: Option<String>,
    ) -> Self {
        Self {
            action: Some(action),
            duration: Some(duration.into()),
            context_page: Some(context_page.into()),
            context_level: Some(context_level.into()),
            quality_id,
            ..Self::page_view(page, level)
        }
    }

    /// Whether this is an audio event.
    pub fn is_audio(&self) -> bool {
        self.action.is_some()
    }

    /// New refresh-tick event carrying the same context fields.
    pub fn refresh_tick(&self) -> Self {
        Self {
            action: Some(AudioAction::Refresh),
            ..self.clone()
        }
    }
}

/// A persisted queue entry: identifier plus event body.
///
/// Serializes as the single-key map `{identifier: event}`; a confirmed
/// (emptied) entry serializes as `{identifier: {}}` until the next write
/// compacts it away. An entry whose body fails to parse is treated as
/// empty and never redelivered.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Identifier, unique across pending entries and stable across attempts.
    pub id: String,
    /// Event body; None marks an empty placeholder.
    pub event: Option<Event>,
}

impl QueueEntry {
    /// New pending entry.
    pub fn new(id: impl Into<String>, event: Event) -> Self {
        Self {
            id: id.into(),
            event: Some(event),
        }
    }

    /// Whether the entry carries no deliverable event body.
    pub fn is_empty(&self) -> bool {
        self.event.is_none()
    }
}

impl Serialize for QueueEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match &self.event {
            Some(event) => map.serialize_entry(&self.id, event)?,
            None => map.serialize_entry(&self.id, &serde_json::Map::new())?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QueueEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: serde_json::Map<String, serde_json::Value> =
            Deserialize::deserialize(deserializer)?;
        // entries are single-key maps; tolerate extra keys by taking the
        // last one, and treat a zero-key map as an empty placeholder
        let (id, value) = match raw.into_iter().last() {
            Some(kv) => kv,
            None => {
                return Ok(Self {
                    id: String::new(),
                    event: None,
                })
            }
        };
        // an empty or malformed body is an already-confirmed/corrupt entry
        let event = serde_json::from_value::<Event>(value).ok();
        Ok(Self { id, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serializes_as_single_key_map() {
        let entry = QueueEntry::new("1650000000", Event::custom("A", "test::http://test", "0"));
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"1650000000":{"page":"test::http://test","level":"0","type":"A"}}"#
        );
    }

    #[test]
    fn test_empty_entry_serializes_as_empty_object_body() {
        let entry = QueueEntry {
            id: "id-1".to_string(),
            event: None,
        };
        assert_eq!(serde_json::to_string(&entry).unwrap(), r#"{"id-1":{}}"#);
    }

    #[test]
    fn test_entry_round_trip() {
        let entry = QueueEntry::new(
            "id-2",
            Event::audio("s::u", "0", AudioAction::Play, "123456", "c::p", "1", None),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: QueueEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_empty_body_deserializes_as_empty_entry() {
        let entry: QueueEntry = serde_json::from_str(r#"{"id-3":{}}"#).unwrap();
        assert_eq!(entry.id, "id-3");
        assert!(entry.is_empty());
    }

    #[test]
    fn test_corrupt_body_deserializes_as_empty_entry() {
        let entry: QueueEntry = serde_json::from_str(r#"{"id-4":{"level":42}}"#).unwrap();
        assert_eq!(entry.id, "id-4");
        assert!(entry.is_empty());
    }

    #[test]
    fn test_legacy_schema_is_readable() {
        // shape written by earlier versions of the library
        let json = r#"{"1342094827910":{"page":"foo::bar","level":"1","type":"A"}}"#;
        let entry: QueueEntry = serde_json::from_str(json).unwrap();
        let event = entry.event.unwrap();
        assert_eq!(event.page, "foo::bar");
        assert_eq!(event.level.as_deref(), Some("1"));
        assert_eq!(event.event_type.as_deref(), Some("A"));
    }

    #[test]
    fn test_refresh_tick_preserves_context() {
        let event = Event::audio(
            "s::u",
            "0",
            AudioAction::Play,
            "123456",
            "c::p",
            "1",
            Some("2".to_string()),
        );
        let tick = event.refresh_tick();
        assert_eq!(tick.action, Some(AudioAction::Refresh));
        assert_eq!(tick.page, event.page);
        assert_eq!(tick.duration, event.duration);
        assert_eq!(tick.context_page, event.context_page);
        assert_eq!(tick.quality_id, event.quality_id);
        // the original event is untouched
        assert_eq!(event.action, Some(AudioAction::Play));
    }
}
