//! Rich-text document tree as delivered by the CMS.
//!
//! Documents arrive as JSON: a `root` object whose `children` are typed nodes.
//! Every node carries a `type` discriminator; built-in kinds are parsed into
//! dedicated variants while anything else (extension nodes, nodes from a newer
//! editor, malformed payloads) becomes [`Node::Custom`]. Parsing a node never
//! fails the surrounding document.

use bitflags::bitflags;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::Error as _,
    ser::{Error as _, SerializeMap},
};
use serde_json::{Map, Value};

pub mod node_types {
    pub const TEXT: &str = "text";
    pub const PARAGRAPH: &str = "paragraph";
    pub const HEADING: &str = "heading";
    pub const LINEBREAK: &str = "linebreak";
    pub const LINK: &str = "link";
    pub const LIST: &str = "list";
    pub const LIST_ITEM: &str = "listitem";
    pub const QUOTE: &str = "quote";
    pub const CORAL_HIGHLIGHT: &str = "coral-highlight";
}

const DEFAULT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DEFAULT_VERSION
}

fn first_position() -> u32 {
    1
}

bitflags! {
    /// Inline style flags carried in a text node's `format` field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextFormat: u32 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
        const SUBSCRIPT = 1 << 5;
        const SUPERSCRIPT = 1 << 6;
        const HIGHLIGHT = 1 << 7;
    }
}

impl Serialize for TextFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for TextFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Unknown bits are retained so a round-trip never loses editor state.
        u32::deserialize(deserializer).map(TextFormat::from_bits_retain)
    }
}

/// A complete rich-text field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub root: RootNode,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RootNode {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "alignment")]
    pub format: String,
    #[serde(default)]
    pub indent: u32,
    #[serde(default = "default_version")]
    pub version: u32,
}

/// One node of a rich-text tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(TextNode),
    Paragraph(ElementNode),
    Heading(HeadingNode),
    Linebreak(LinebreakNode),
    Link(LinkNode),
    List(ListNode),
    ListItem(ListItemNode),
    Quote(ElementNode),
    Custom(CustomNode),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
    /// Preset visual treatment; takes precedence over `format` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl TextNode {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::empty(),
            highlight: None,
            version: DEFAULT_VERSION,
        }
    }
}

/// Block container shared by paragraphs and quotes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementNode {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, deserialize_with = "alignment")]
    pub format: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadingNode {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, deserialize_with = "alignment")]
    pub format: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinebreakNode {
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkNode {
    #[serde(default)]
    pub fields: LinkFields,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub new_tab: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<LinkDoc>,
}

impl LinkFields {
    pub fn is_custom(&self) -> bool {
        self.link_type.as_deref() == Some("custom")
    }
}

/// Reference to another CMS document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_to: Option<String>,
    #[serde(default)]
    pub value: LinkDocValue,
}

/// The referenced document: either a bare id or a populated document.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LinkDocValue {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl<'de> Deserialize<'de> for LinkDocValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Object(map) => Self {
                id: map.get("id").map(scalar_to_string).unwrap_or_default(),
                slug: map.get("slug").and_then(Value::as_str).map(str::to_string),
            },
            other => Self {
                id: scalar_to_string(&other),
                slug: None,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNode {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub list_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default = "default_version")]
    pub version: u32,
}

impl ListNode {
    pub fn is_check_list(&self) -> bool {
        self.list_type == "check"
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItemNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default = "first_position")]
    pub value: u32,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default = "default_version")]
    pub version: u32,
}

/// Any node without a dedicated variant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomNode {
    pub node_type: String,
    pub version: u32,
    pub children: Vec<Node>,
    pub fields: Map<String, Value>,
    /// Set when the payload could not be read as the kind its tag names.
    pub defect: Option<String>,
}

impl CustomNode {
    pub fn new(node_type: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            node_type: node_type.into(),
            version: DEFAULT_VERSION,
            children,
            fields: Map::new(),
            defect: None,
        }
    }

    fn defective(node_type: String, defect: impl Into<String>) -> Self {
        Self {
            node_type,
            version: DEFAULT_VERSION,
            children: Vec::new(),
            fields: Map::new(),
            defect: Some(defect.into()),
        }
    }

    fn from_object(node_type: String, mut map: Map<String, Value>) -> Self {
        map.remove("type");
        let version = map
            .remove("version")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_VERSION);
        let children = match map.remove("children") {
            Some(Value::Array(items)) => items.into_iter().map(Node::from_value).collect(),
            _ => Vec::new(),
        };
        Self {
            node_type,
            version,
            children,
            fields: map,
            defect: None,
        }
    }
}

impl Node {
    /// Parse one node, degrading to [`Node::Custom`] instead of failing.
    pub fn from_value(value: Value) -> Node {
        let Value::Object(map) = value else {
            return Node::Custom(CustomNode::defective(
                String::new(),
                "node is not a JSON object",
            ));
        };
        let Some(node_type) = map.get("type").and_then(Value::as_str).map(str::to_string) else {
            return Node::Custom(CustomNode::defective(
                String::new(),
                "node has no `type` discriminator",
            ));
        };

        let parsed = match node_type.as_str() {
            node_types::TEXT => serde_json::from_value(Value::Object(map)).map(Node::Text),
            node_types::PARAGRAPH => {
                serde_json::from_value(Value::Object(map)).map(Node::Paragraph)
            }
            node_types::HEADING => serde_json::from_value(Value::Object(map)).map(Node::Heading),
            node_types::LINEBREAK => {
                serde_json::from_value(Value::Object(map)).map(Node::Linebreak)
            }
            node_types::LINK => serde_json::from_value(Value::Object(map)).map(Node::Link),
            node_types::LIST => serde_json::from_value(Value::Object(map)).map(Node::List),
            node_types::LIST_ITEM => {
                serde_json::from_value(Value::Object(map)).map(Node::ListItem)
            }
            node_types::QUOTE => serde_json::from_value(Value::Object(map)).map(Node::Quote),
            _ => return Node::Custom(CustomNode::from_object(node_type, map)),
        };

        parsed.unwrap_or_else(|err| Node::Custom(CustomNode::defective(node_type, err.to_string())))
    }

    pub fn text(text: impl Into<String>) -> Node {
        Node::Text(TextNode::plain(text))
    }

    /// The `type` tag this node was received with.
    pub fn node_type(&self) -> &str {
        match self {
            Node::Text(_) => node_types::TEXT,
            Node::Paragraph(_) => node_types::PARAGRAPH,
            Node::Heading(_) => node_types::HEADING,
            Node::Linebreak(_) => node_types::LINEBREAK,
            Node::Link(_) => node_types::LINK,
            Node::List(_) => node_types::LIST,
            Node::ListItem(_) => node_types::LIST_ITEM,
            Node::Quote(_) => node_types::QUOTE,
            Node::Custom(custom) => custom.node_type.as_str(),
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Paragraph(node) | Node::Quote(node) => &node.children,
            Node::Heading(node) => &node.children,
            Node::Link(node) => &node.children,
            Node::List(node) => &node.children,
            Node::ListItem(node) => &node.children,
            Node::Custom(node) => &node.children,
            Node::Text(_) | Node::Linebreak(_) => &[],
        }
    }

    pub fn defect(&self) -> Option<&str> {
        match self {
            Node::Custom(custom) => custom.defect.as_deref(),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&text.text),
            Node::Linebreak(_) => out.push('\n'),
            other => {
                for child in other.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Node::Text(node) => serde_json::to_value(node),
            Node::Paragraph(node) | Node::Quote(node) => serde_json::to_value(node),
            Node::Heading(node) => serde_json::to_value(node),
            Node::Linebreak(node) => serde_json::to_value(node),
            Node::Link(node) => serde_json::to_value(node),
            Node::List(node) => serde_json::to_value(node),
            Node::ListItem(node) => serde_json::to_value(node),
            Node::Custom(node) => {
                let mut map = node.fields.clone();
                map.insert("version".into(), Value::from(node.version));
                if !node.children.is_empty() {
                    map.insert("children".into(), serde_json::to_value(&node.children)?);
                }
                Ok(Value::Object(map))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Node::from_value)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let payload = self.payload().map_err(S::Error::custom)?;
        let Value::Object(fields) = payload else {
            return Err(S::Error::custom("node payload must be an object"));
        };
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry("type", self.node_type())?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Element `format` is an alignment string; older editors store a number.
fn alignment<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Null | Value::Number(_) => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected alignment string, found {other}"
        ))),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
