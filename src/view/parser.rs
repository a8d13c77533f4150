//! Parser for the serialized data form.
//!
//! The data form is a small element/text markup: `<name attr="value">` tags
//! with entity-escaped text. This parses it back into a [`ViewNode`] tree
//! for the upcast pipeline.

use thiserror::Error;

use super::{ViewElement, ViewNode};

/// Failures while parsing the serialized data form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Input ended inside a tag or before a tag was closed.
    #[error("unexpected end of input (unclosed `{context}`)")]
    UnexpectedEnd {
        /// The construct left open.
        context: String,
    },
    /// A tag name was empty or started with an invalid character.
    #[error("invalid tag name at byte {position}")]
    InvalidTagName {
        /// Byte offset of the offending character.
        position: usize,
    },
    /// A closing tag did not match the innermost open element.
    #[error("mismatched closing tag: expected `</{expected}>`, found `</{found}>`")]
    MismatchedClose {
        /// The element awaiting closure.
        expected: String,
        /// The closing tag encountered.
        found: String,
    },
    /// A closing tag appeared with no element open.
    #[error("closing tag `</{name}>` with no open element")]
    UnexpectedClose {
        /// The closing tag's name.
        name: String,
    },
    /// An attribute was not of the `key="value"` shape.
    #[error("malformed attribute on `<{element}>` at byte {position}")]
    MalformedAttribute {
        /// The element being parsed.
        element: String,
        /// Byte offset where parsing failed.
        position: usize,
    },
}

/// Parse a data string into view nodes.
///
/// # Errors
///
/// Returns a [`ParseError`] for structurally invalid markup. Unknown element
/// names are not an error here; validation is the upcast pipeline's concern.
pub fn parse(input: &str) -> Result<Vec<ViewNode>, ParseError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    parser.parse_content(None)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Parse mixed content until end of input (top level) or until the
    /// closing tag of `closing` is consumed.
    fn parse_content(&mut self, closing: Option<&str>) -> Result<Vec<ViewNode>, ParseError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        loop {
            match self.peek() {
                None => {
                    if let Some(open) = closing {
                        return Err(ParseError::UnexpectedEnd {
                            context: open.to_string(),
                        });
                    }
                    flush_text(&mut text, &mut nodes);
                    return Ok(nodes);
                }
                Some(b'<') => {
                    self.pos += 1;
                    if self.eat(b'/') {
                        let name = self.parse_name()?;
                        self.skip_whitespace();
                        if !self.eat(b'>') {
                            return Err(ParseError::UnexpectedEnd { context: name });
                        }
                        return match closing {
                            Some(open) if open == name => {
                                flush_text(&mut text, &mut nodes);
                                Ok(nodes)
                            }
                            Some(open) => Err(ParseError::MismatchedClose {
                                expected: open.to_string(),
                                found: name,
                            }),
                            None => Err(ParseError::UnexpectedClose { name }),
                        };
                    }
                    flush_text(&mut text, &mut nodes);
                    let element = self.parse_element()?;
                    nodes.push(ViewNode::Element(element));
                }
                Some(_) => {
                    // Raw text up to the next tag, entities decoded in one go.
                    let start = self.pos;
                    while self.peek().is_some_and(|b| b != b'<') {
                        self.pos += 1;
                    }
                    let raw = std::str::from_utf8(&self.bytes[start..self.pos])
                        .unwrap_or_default();
                    text.push_str(&html_escape::decode_html_entities(raw));
                }
            }
        }
    }

    /// Parse an element whose `<` has already been consumed.
    fn parse_element(&mut self) -> Result<ViewElement, ParseError> {
        let name = self.parse_name()?;
        let mut element = ViewElement::new(&name);

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    return Err(ParseError::UnexpectedEnd { context: name });
                }
                Some(b'>') => {
                    self.pos += 1;
                    element.children = self.parse_content(Some(&name))?;
                    return Ok(element);
                }
                Some(b'/') => {
                    self.pos += 1;
                    if !self.eat(b'>') {
                        return Err(ParseError::MalformedAttribute {
                            element: name,
                            position: self.pos,
                        });
                    }
                    return Ok(element);
                }
                Some(_) => {
                    let (key, value) = self.parse_attribute(&name)?;
                    element.set_attribute(key, value);
                }
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        if !self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
            return Err(ParseError::InvalidTagName { position: self.pos });
        }
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            self.pos += 1;
        }
        Ok(std::str::from_utf8(&self.bytes[start..self.pos])
            .unwrap_or_default()
            .to_string())
    }

    fn parse_attribute(&mut self, element: &str) -> Result<(String, String), ParseError> {
        let key = self.parse_name().map_err(|_| ParseError::MalformedAttribute {
            element: element.to_string(),
            position: self.pos,
        })?;
        if !self.eat(b'=') || !self.eat(b'"') {
            return Err(ParseError::MalformedAttribute {
                element: element.to_string(),
                position: self.pos,
            });
        }
        let start = self.pos;
        loop {
            match self.bump() {
                None => {
                    return Err(ParseError::UnexpectedEnd {
                        context: element.to_string(),
                    });
                }
                Some(b'"') => break,
                Some(_) => {}
            }
        }
        let raw = std::str::from_utf8(&self.bytes[start..self.pos - 1]).unwrap_or_default();
        Ok((key, html_escape::decode_html_entities(raw).into_owned()))
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<ViewNode>) {
    if !text.is_empty() {
        nodes.push(ViewNode::Text(std::mem::take(text)));
    }
}
