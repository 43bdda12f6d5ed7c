//! Structured output extracted from a provider response.

use serde::{Deserialize, Serialize};

/// A Cypher statement and the metadata the model reported with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CypherQuery {
    /// The statement, opaque to this crate.
    pub text: String,
    /// Model's label for the query shape (`list`, `count`, `aggregate`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    /// Node labels the query touches.
    #[serde(default)]
    pub entities: Vec<String>,
    /// Relationship types the query touches.
    #[serde(default)]
    pub relationships: Vec<String>,
}

/// What the provider produced for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response_type", rename_all = "snake_case")]
pub enum StructuredQuery {
    /// A graph query to run against the data store.
    Cypher(CypherQuery),
    /// A conversational reply; nothing to execute.
    SmallTalk {
        /// Reply text.
        message: String,
    },
    /// The question cannot be answered from the schema.
    OutOfScope {
        /// Explanation for the user.
        message: String,
    },
}

impl StructuredQuery {
    /// Text to hand upward: the Cypher statement, or the reply message.
    pub fn text(&self) -> &str {
        match self {
            StructuredQuery::Cypher(query) => &query.text,
            StructuredQuery::SmallTalk { message } | StructuredQuery::OutOfScope { message } => {
                message
            }
        }
    }

    /// The Cypher statement, if this is a graph query.
    pub fn cypher(&self) -> Option<&str> {
        match self {
            StructuredQuery::Cypher(query) => Some(&query.text),
            _ => None,
        }
    }

    /// Shorthand for a bare Cypher statement with no metadata.
    pub fn cypher_text(text: impl Into<String>) -> Self {
        StructuredQuery::Cypher(CypherQuery {
            text: text.into(),
            query_type: None,
            entities: Vec::new(),
            relationships: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_cypher_accessors() {
        let query = StructuredQuery::cypher_text("MATCH (e:Employee) RETURN count(e)");
        assert_eq!(query.text(), "MATCH (e:Employee) RETURN count(e)");
        assert_eq!(query.cypher(), Some("MATCH (e:Employee) RETURN count(e)"));

        let chat = StructuredQuery::SmallTalk {
            message: "Hello!".to_string(),
        };
        assert_eq!(chat.text(), "Hello!");
        assert_eq!(chat.cypher(), None);
    }
}
