//! Conversion between XML documents and `Value`s.
//!
//! Responses annotate every element with a `type` attribute, which drives
//! decoding. Requests carry no annotation at all: a `Document` is just a root
//! tag with one child element per field.

use std::io::Read;
use std::str::FromStr;

use time::macros::format_description;
use time::{PrimitiveDateTime, UtcOffset};
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xml::writer::{EmitterConfig, XmlEvent as WriterEvent};

use crate::error::{Error, Result};
use crate::protocol::value::{Decimal, Fields, Resource, Scalar, Value};

/// Declared type of a response element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Integer,
    Decimal,
    Boolean,
    String,
    DateTime,
    Array,
}

impl FromStr for ElementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<ElementType> {
        match s {
            "integer" => Ok(ElementType::Integer),
            "decimal" => Ok(ElementType::Decimal),
            "boolean" => Ok(ElementType::Boolean),
            "string" => Ok(ElementType::String),
            "datetime" => Ok(ElementType::DateTime),
            "array" => Ok(ElementType::Array),
            other => Err(Error::UnknownType(other.to_string())),
        }
    }
}

/// A parsed XML element: tag, declared type, text and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub type_: Option<String>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Element {
        Element {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    fn is_array(&self) -> bool {
        self.type_.as_ref().map_or(false, |t| t == "array")
    }

    /// Parses a whole document and returns its root element.
    pub fn parse<R: Read>(source: R) -> Result<Element> {
        let config = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(true)
            .cdata_to_characters(true)
            .ignore_comments(true);
        let reader = EventReader::new_with_config(source, config);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        for event in reader {
            match event? {
                XmlEvent::StartElement { name, attributes, .. } => {
                    let mut element = Element::new(&name.local_name);
                    element.type_ = attributes
                        .into_iter()
                        .find(|attr| attr.name.local_name == "type")
                        .map(|attr| attr.value);
                    stack.push(element);
                }
                XmlEvent::EndElement { .. } => {
                    if let Some(element) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(element),
                            None => root = Some(element),
                        }
                    }
                }
                // Only text before the first child belongs to the element
                XmlEvent::Characters(text) => match stack.last_mut() {
                    Some(element) if element.children.is_empty() => element.text.push_str(&text),
                    _ => {}
                },
                _ => {}
            }
        }

        // The reader fails on an unclosed or missing root before we get here
        root.ok_or(Error::UnexpectedDocument { expected: "a root element" })
    }
}

/// Decodes a response tree.
///
/// An `array` root yields a `Value::Array` of its decoded children, anything
/// else a `Value::Resource` keyed by child tag, hyphens turned into
/// underscores.
pub fn decode(root: &Element, offset: UtcOffset) -> Result<Value> {
    if root.is_array() {
        let values = root
            .children
            .iter()
            .map(|child| decode(child, offset))
            .collect::<Result<Vec<Value>>>()?;
        return Ok(Value::Array(values));
    }

    let mut result = Resource::new();

    for element in root.children.iter() {
        let element_type = match element.type_ {
            Some(ref name) => name.parse::<ElementType>()?,
            None => ElementType::String,
        };
        let key = element.tag.replace('-', "_");

        let value = match element_type {
            ElementType::Array => decode(element, offset)?,
            _ => Value::Scalar(decode_scalar(element_type, &element.text, offset)?),
        };

        result.insert(key, value);
    }

    Ok(Value::Resource(result))
}

/// Decodes the text of a non-array element.
///
/// Empty text is `Null` for every type but `string`, so an empty datetime can
/// be told apart from an empty string.
pub fn decode_scalar(element_type: ElementType, text: &str, offset: UtcOffset) -> Result<Scalar> {
    if element_type != ElementType::String && text.is_empty() {
        return Ok(Scalar::Null);
    }

    match element_type {
        ElementType::Integer => text
            .trim()
            .parse::<i64>()
            .map(Scalar::Integer)
            .map_err(|_| invalid("integer", text)),
        ElementType::Decimal => text.parse::<Decimal>().map(Scalar::Decimal),
        ElementType::Boolean => Ok(Scalar::Boolean(text == "true")),
        ElementType::String => Ok(Scalar::Text(text.to_string())),
        ElementType::DateTime => {
            let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
            PrimitiveDateTime::parse(text, format)
                .map(|dt| Scalar::DateTime(dt.assume_utc().to_offset(offset)))
                .map_err(|_| invalid("datetime", text))
        }
        ElementType::Array => Err(invalid("array", text)),
    }
}

fn invalid(kind: &'static str, text: &str) -> Error {
    Error::InvalidValue {
        kind: kind,
        text: text.to_string(),
    }
}

/// Request body: a root tag and its fields, serialized without type attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(root: &str) -> Document {
        Document {
            root: root.to_string(),
            fields: Fields::new(),
        }
    }

    pub fn with_fields(root: &str, fields: Fields) -> Document {
        Document {
            root: root.to_string(),
            fields: fields,
        }
    }

    pub fn field<V: Into<Scalar>>(mut self, name: &str, value: V) -> Document {
        self.fields.insert(name, value);
        self
    }

    /// Writes the document. Field names have their underscores turned into
    /// hyphens; empty values become self-closing elements.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut writer = EmitterConfig::new()
                .write_document_declaration(false)
                .perform_indent(false)
                .create_writer(&mut out);

            writer.write(WriterEvent::start_element(self.root.as_str()))?;
            for (name, value) in self.fields.iter() {
                let tag = name.replace('_', "-");
                let text = value.to_string();

                writer.write(WriterEvent::start_element(tag.as_str()))?;
                if !text.is_empty() {
                    writer.write(WriterEvent::characters(&text))?;
                }
                writer.write(WriterEvent::end_element())?;
            }
            writer.write(WriterEvent::end_element())?;
        }
        Ok(out)
    }
}
