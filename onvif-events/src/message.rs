//! Raw notification messages as delivered by `PullMessages`

use xmltree::Element;

use crate::operation::child_text;

/// A `SimpleItem` name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleItem {
    pub name: String,
    pub value: String,
}

impl SimpleItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One notification, reduced to its topic and item lists
///
/// Items keep the order in which the device sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub topic: Option<String>,
    pub source: Vec<SimpleItem>,
    pub data: Vec<SimpleItem>,
}

impl RawMessage {
    /// First `Data` value with the given name
    pub fn data_value(&self, name: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.value.as_str())
    }

    /// Decode a `wsnt:NotificationMessage` element
    ///
    /// Yields one message per `Message/Message` payload, in document order.
    /// Missing `Source` or `Data` sections are treated as empty; a
    /// notification without any payload yields nothing.
    pub(crate) fn from_notification(notification: &Element) -> Vec<Self> {
        let topic = child_text(notification, "Topic").filter(|t| !t.is_empty());

        let messages: Vec<Self> = child_elements(notification, "Message")
            .flat_map(|wrapper| child_elements(wrapper, "Message"))
            .map(|message| Self {
                topic: topic.clone(),
                source: message.get_child("Source").map(simple_items).unwrap_or_default(),
                data: message.get_child("Data").map(simple_items).unwrap_or_default(),
            })
            .collect();

        if messages.is_empty() {
            tracing::debug!(topic = ?topic, "skipping NotificationMessage without payload");
        }
        messages
    }
}

fn child_elements<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
    parent
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(move |element| element.name == name)
}

fn simple_items(section: &Element) -> Vec<SimpleItem> {
    section
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(|element| element.name == "SimpleItem")
        .filter_map(|element| {
            let name = element.attributes.get("Name")?;
            let value = element.attributes.get("Value").cloned().unwrap_or_default();
            Some(SimpleItem::new(name.clone(), value))
        })
        .collect()
}
