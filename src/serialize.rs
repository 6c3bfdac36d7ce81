//! Payload wire-format serialization

use crate::webhook::Webhook;
use crate::{Result, WebhookError};
use std::collections::HashMap;
use std::sync::Arc;

/// Renders a webhook to its wire format
pub trait PayloadSerializer: Send + Sync {
    /// Format identifier ("json", "xml", ...)
    fn format(&self) -> &str;

    /// Content-Type header value for this format
    fn content_type(&self) -> &str;

    /// Serialize the webhook to bytes
    fn serialize(&self, webhook: &Webhook) -> Result<Vec<u8>>;
}

/// Default JSON wire format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl PayloadSerializer for JsonSerializer {
    fn format(&self) -> &str {
        "json"
    }

    fn content_type(&self) -> &str {
        "application/json"
    }

    fn serialize(&self, webhook: &Webhook) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(webhook)?)
    }
}

/// Optional XML wire format
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

impl PayloadSerializer for XmlSerializer {
    fn format(&self) -> &str {
        "xml"
    }

    fn content_type(&self) -> &str {
        "application/xml"
    }

    fn serialize(&self, webhook: &Webhook) -> Result<Vec<u8>> {
        use quick_xml::events::{BytesEnd, BytesStart, Event};
        use quick_xml::Writer;

        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Start(BytesStart::new("webhook")))
            .map_err(xml_error)?;

        write_text(&mut writer, "id", &webhook.id)?;
        write_text(&mut writer, "eventType", &webhook.event_type)?;
        write_text(&mut writer, "timestamp", &webhook.timestamp.to_rfc3339())?;
        write_text(&mut writer, "name", &webhook.name)?;
        write_value(&mut writer, "data", &webhook.data)?;

        writer
            .write_event(Event::End(BytesEnd::new("webhook")))
            .map_err(xml_error)?;
        Ok(writer.into_inner())
    }
}

fn xml_error(e: impl std::fmt::Display) -> WebhookError {
    WebhookError::Payload(e.to_string())
}

fn write_text(
    writer: &mut quick_xml::Writer<Vec<u8>>,
    tag: &str,
    text: &str,
) -> Result<()> {
    use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(xml_error)?;
    Ok(())
}

/// Render a JSON value as nested elements: objects become children keyed by
/// field name, arrays become repeated `<item>` children
fn write_value(
    writer: &mut quick_xml::Writer<Vec<u8>>,
    tag: &str,
    value: &serde_json::Value,
) -> Result<()> {
    use quick_xml::events::{BytesEnd, BytesStart, Event};
    use serde_json::Value;

    match value {
        Value::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new(tag)))
                .map_err(xml_error)?;
        }
        Value::String(s) => write_text(writer, tag, s)?,
        Value::Bool(_) | Value::Number(_) => write_text(writer, tag, &value.to_string())?,
        Value::Array(items) => {
            writer
                .write_event(Event::Start(BytesStart::new(tag)))
                .map_err(xml_error)?;
            for item in items {
                write_value(writer, "item", item)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(xml_error)?;
        }
        Value::Object(fields) => {
            writer
                .write_event(Event::Start(BytesStart::new(tag)))
                .map_err(xml_error)?;
            for (key, field) in fields {
                write_value(writer, key, field)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(xml_error)?;
        }
    }
    Ok(())
}

/// Looks up serializers by format identifier
#[derive(Clone)]
pub struct SerializerRegistry {
    serializers: HashMap<String, Arc<dyn PayloadSerializer>>,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(JsonSerializer));
        registry.register(Arc::new(XmlSerializer));
        registry
    }
}

impl SerializerRegistry {
    /// Create a registry with the built-in JSON and XML serializers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with no serializers registered
    pub fn empty() -> Self {
        Self {
            serializers: HashMap::new(),
        }
    }

    /// Register a serializer under its format
    pub fn register(&mut self, serializer: Arc<dyn PayloadSerializer>) {
        self.serializers
            .insert(serializer.format().to_string(), serializer);
    }

    /// Whether a serializer is registered for the format
    pub fn supports(&self, format: &str) -> bool {
        self.serializers.contains_key(format)
    }

    /// Look up the serializer for a format.
    ///
    /// A missing serializer is a configuration error, never retried.
    pub fn get(&self, format: &str) -> Result<Arc<dyn PayloadSerializer>> {
        self.serializers.get(format).cloned().ok_or_else(|| {
            WebhookError::Config(format!("no payload serializer registered for format '{format}'"))
        })
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("formats", &self.serializers.keys().collect::<Vec<_>>())
            .finish()
    }
}
