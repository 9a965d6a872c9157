use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::activity::{ActivityDefinition, ActivityObject, LanguageMap, DEFAULT_LANGUAGE};
use crate::model::statement::Statement;
use crate::model::verbs;

/// Separator between values of a multi-valued response or answer pattern.
pub const MULTI_VALUE_DELIMITER: &str = "[,]";

pub const INTERACTION_ACTIVITY_TYPE: &str = "http://adlnet.gov/expapi/activities/cmi.interaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionType {
    TrueFalse,
    Choice,
    FillIn,
    LongFillIn,
    Matching,
    Performance,
    Sequencing,
    Likert,
    Numeric,
    Other,
}

/// One answered question of a quiz or test.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub test_id: String,
    pub question_id: String,
    pub question: String,
    pub interaction_type: InteractionType,
    pub responses: Vec<String>,
    pub correct_responses: Vec<String>,
    pub success: Option<bool>,
}

impl Interaction {
    #[must_use]
    pub fn object_id(&self, activity_id: &str) -> String {
        format!(
            "{activity_id}/test/{}/question/{}",
            self.test_id, self.question_id
        )
    }

    #[must_use]
    pub fn joined_response(&self) -> String {
        self.responses.join(MULTI_VALUE_DELIMITER)
    }

    /// The single correct-responses pattern, or `None` when no answer key is known.
    #[must_use]
    pub fn correct_pattern(&self) -> Option<String> {
        (!self.correct_responses.is_empty())
            .then(|| self.correct_responses.join(MULTI_VALUE_DELIMITER))
    }
}

/// Turn a prepared statement into an "answered" statement for one interaction.
///
/// # Errors
///
/// Returns `serde_json::Error` if the activity object cannot be serialized.
pub fn answered_statement(
    mut base: Statement,
    activity_id: &str,
    interaction: &Interaction,
) -> Result<Statement, serde_json::Error> {
    base.set_verb_display(verbs::ANSWERED.display_map());

    let definition = ActivityDefinition {
        name: Some(LanguageMap::from([(
            DEFAULT_LANGUAGE.to_owned(),
            interaction.question.clone(),
        )])),
        activity_type: Some(INTERACTION_ACTIVITY_TYPE.to_owned()),
        interaction_type: Some(interaction.interaction_type),
        correct_responses_pattern: interaction.correct_pattern().map(|pattern| vec![pattern]),
        ..ActivityDefinition::default()
    };
    let object = ActivityObject::new(interaction.object_id(activity_id)).with_definition(definition);
    base.set_object(&object)?;

    base.set_result_field("response", Value::String(interaction.joined_response()));
    if let Some(success) = interaction.success {
        base.set_result_field("success", Value::Bool(success));
    }
    Ok(base)
}
