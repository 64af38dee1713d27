//! Wire shape the generation service is asked to produce, and the JSON
//! schema descriptor derived from it.

use schemars::{generate::SchemaSettings, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

pub const SCHEMA_NAME: &str = "quiz_questions";

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GeneratedQuiz {
    /// The quiz questions, in presentation order.
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratedQuestion {
    /// The question text
    pub question_text: String,
    /// Array of 4 possible answers
    #[schemars(length(min = 4, max = 4))]
    pub options: Vec<String>,
    /// Index of the correct answer (0-3)
    #[schemars(range(min = 0, max = 3))]
    pub correct_answer_index: i64,
    pub explanation: GeneratedExplanation,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GeneratedExplanation {
    /// Explanation for why the answer is correct
    pub reason: String,
    /// References from the source content
    pub references: Vec<String>,
}

/// Keywords structured-output backends reject or ignore.
const UNSUPPORTED_KEYWORDS: [&str; 3] = ["$schema", "format", "title"];

/// JSON schema for [`GeneratedQuiz`] with every subschema inlined, suitable
/// for strict constrained decoding.
pub fn quiz_response_schema() -> Value {
    let generator = SchemaSettings::draft2020_12()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator();
    let mut schema = generator.into_root_schema_for::<GeneratedQuiz>().to_value();
    strip_keywords(&mut schema);
    schema
}

fn strip_keywords(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for keyword in UNSUPPORTED_KEYWORDS {
                // "properties" may legitimately contain a field called "title"
                if map.get(keyword).is_some_and(|v| !v.is_object()) {
                    map.remove(keyword);
                }
            }
            map.values_mut().for_each(strip_keywords);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_keywords),
        _ => {}
    }
}
