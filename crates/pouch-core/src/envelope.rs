//! Response envelopes
//!
//! Every remote operation answers with a small XML document. The only
//! structure the protocol relies on: an `Error` element (with a sibling or
//! nested `Msg`) marks failure and always takes precedence over any success
//! field; logon responses carry `SID` and a nested `OAUTH/ACCESS_TOKEN`.
//! Everything else is opaque and only pretty-printed for the user.

use crate::error::{Error, Result};

/// One element of a parsed envelope, with ownership of its content.
#[derive(Debug, Clone)]
pub struct Node {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    fn from_xml(node: roxmltree::Node<'_, '_>) -> Self {
        let text = node
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self {
            tag: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text,
            children: node
                .children()
                .filter(|c| c.is_element())
                .map(Node::from_xml)
                .collect(),
        }
    }

    /// First descendant (or self) with the given tag, in document order.
    fn find(&self, tag: &str) -> Option<&Node> {
        if self.tag == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }
}

/// A parsed response envelope.
#[derive(Debug, Clone)]
pub struct Envelope {
    root: Node,
}

impl Envelope {
    /// Parse the response body. Content that is not well-formed XML is a
    /// fatal envelope error for the current command.
    pub fn parse(body: &str) -> Result<Self> {
        let doc =
            roxmltree::Document::parse(body).map_err(|e| Error::Envelope(e.to_string()))?;
        Ok(Self {
            root: Node::from_xml(doc.root_element()),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Server-reported error message, if the envelope carries an `Error`
    /// marker. Must be consulted before reading any success field.
    pub fn error_message(&self) -> Option<&str> {
        self.root.find("Error")?;
        Some(
            self.root
                .find("Msg")
                .and_then(|n| n.text.as_deref())
                .unwrap_or("unspecified server error"),
        )
    }

    /// Text of the first element with the given tag.
    pub fn field(&self, tag: &str) -> Option<&str> {
        self.root.find(tag).and_then(|n| n.text.as_deref())
    }

    /// Like [`field`](Self::field), but a missing element is an envelope error.
    pub fn require(&self, tag: &str) -> Result<&str> {
        self.field(tag)
            .ok_or_else(|| Error::Envelope(format!("missing {tag} element")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_envelope() {
        let env = Envelope::parse(
            "<Logon><SID>S1</SID><OAUTH><ACCESS_TOKEN>T1</ACCESS_TOKEN></OAUTH></Logon>",
        )
        .unwrap();
        assert!(env.error_message().is_none());
        assert_eq!(env.field("SID"), Some("S1"));
        assert_eq!(env.field("ACCESS_TOKEN"), Some("T1"));
    }

    #[test]
    fn test_error_takes_precedence_over_success_fields() {
        let env = Envelope::parse(
            "<Logon><Error/><Msg>bad credentials</Msg><SID>S1</SID></Logon>",
        )
        .unwrap();
        assert_eq!(env.error_message(), Some("bad credentials"));
    }

    #[test]
    fn test_error_without_msg_has_fallback_text() {
        let env = Envelope::parse("<R><Error/></R>").unwrap();
        assert_eq!(env.error_message(), Some("unspecified server error"));
    }

    #[test]
    fn test_unparsable_body_is_envelope_error() {
        let err = Envelope::parse("<<<definitely not xml").unwrap_err();
        assert!(matches!(err, Error::Envelope(_)));
    }

    #[test]
    fn test_require_missing_field() {
        let env = Envelope::parse("<Logon/>").unwrap();
        assert!(matches!(env.require("SID"), Err(Error::Envelope(_))));
    }

    #[test]
    fn test_attributes_and_nesting_preserved() {
        let env = Envelope::parse(
            "<Statement><Item id=\"7\" amount=\"2.50\">coffee</Item></Statement>",
        )
        .unwrap();
        let item = &env.root().children[0];
        assert_eq!(item.tag, "Item");
        assert_eq!(item.text.as_deref(), Some("coffee"));
        assert!(item
            .attributes
            .iter()
            .any(|(k, v)| k == "amount" && v == "2.50"));
    }
}
