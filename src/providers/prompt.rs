//! Prompt text and extraction of the structured reply.
//!
//! Providers ask the model to answer with a small JSON envelope whose
//! `response_type` is `cypher`, `smalltalk` or `error`. Models frequently wrap
//! JSON in Markdown fences, so those are stripped before parsing.

use serde::Deserialize;

use crate::error::ProviderFailure;
use crate::types::{CypherQuery, ProviderChoice, StructuredQuery};

/// Sampling temperature for query generation.
pub const QUERY_TEMPERATURE: f32 = 0.1;

/// Instructions sent ahead of every question.
pub const SYSTEM_PROMPT: &str = r#"You translate questions about an organization's employee graph into Neo4j Cypher.

Schema
  Nodes:
    Employee(emp_id, name, gender, date_of_joining, email, phone, location, designation)
    Skill(skill_id, name, category)
    Project(project_id, name, status, start_date, end_date)
    Department(department_id, name)
    Designation(designation_id, name)
  Relationships:
    (:Employee)-[:HAS_SKILL]->(:Skill)
    (:Employee)-[:WORKS_ON]->(:Project)
    (:Employee)-[:HAS_DESIGNATION]->(:Designation)
    (:Employee)-[:WORKS_IN]->(:Department)
    (:Employee)-[:REPORTS_TO]->(:Employee)

Rules
  - Compare text properties with toLower(trim(...)) on both sides.
  - For details about one employee, gather designations, skills, projects and
    departments in a single query using OPTIONAL MATCH and collect(DISTINCT ...).
  - Never invent labels, properties or relationship types.
  - Greetings and small talk get a friendly reply, not a query.
  - Questions the schema cannot answer get a polite refusal.

Reply with JSON only, in one of these shapes:
  {"response_type": "cypher", "cypher_query": "MATCH ... RETURN ...",
   "query_type": "list | count | aggregate | search | analysis",
   "entities": ["Employee"], "relationships": ["HAS_SKILL"]}
  {"response_type": "smalltalk", "message": "..."}
  {"response_type": "error", "message": "..."}
"#;

/// Prompt for providers without a separate system role.
pub fn single_turn_prompt(question: &str) -> String {
    format!(
        "{}\nUser Question: {}\n\nReturn only valid JSON:",
        SYSTEM_PROMPT, question
    )
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response_type: Option<String>,
    #[serde(default)]
    cypher_query: Option<String>,
    #[serde(default)]
    query_type: Option<String>,
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    relationships: Vec<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Removes a leading Markdown code fence (with or without a `json` tag) and a
/// trailing one.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses the model's reply into a [`StructuredQuery`].
///
/// Parse problems become a [`ProviderFailure`] worded so that it classifies
/// as [`ErrorKind::Unknown`](crate::error::ErrorKind::Unknown).
pub fn parse_structured_query(
    provider: ProviderChoice,
    completion: &str,
) -> Result<StructuredQuery, ProviderFailure> {
    let body = strip_code_fences(completion);
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
        tracing::debug!(provider = %provider, error = %e, "Unparseable model output");
        ProviderFailure::new(
            provider,
            "model returned malformed output: expected a JSON object",
        )
    })?;

    let response_type = envelope
        .response_type
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_else(|| "cypher".to_string());

    match response_type.as_str() {
        "cypher" => {
            let text = envelope.cypher_query.unwrap_or_default();
            if text.trim().is_empty() {
                return Err(ProviderFailure::new(
                    provider,
                    "model returned an empty cypher_query",
                ));
            }
            Ok(StructuredQuery::Cypher(CypherQuery {
                text: text.trim().to_string(),
                query_type: envelope.query_type,
                entities: envelope.entities,
                relationships: envelope.relationships,
            }))
        }
        "smalltalk" => Ok(StructuredQuery::SmallTalk {
            message: envelope.message.unwrap_or_default(),
        }),
        "error" => Ok(StructuredQuery::OutOfScope {
            message: envelope.message.unwrap_or_else(|| {
                "I cannot answer that question using the current database schema.".to_string()
            }),
        }),
        other => Err(ProviderFailure::new(
            provider,
            format!("model returned unsupported response_type `{}`", other),
        )),
    }
}
