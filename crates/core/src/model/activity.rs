use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::interaction::InteractionType;

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Language tag to text, as used by xAPI `display`, `name` and `description`.
pub type LanguageMap = BTreeMap<String, String>;

/// Statement object of type `Activity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityObject {
    pub object_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ActivityDefinition>,
}

impl ActivityObject {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            object_type: "Activity".to_owned(),
            id: id.into(),
            definition: None,
        }
    }

    /// Set `definition.name` in the default language.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        let definition = self.definition.get_or_insert_with(ActivityDefinition::default);
        definition.name = Some(LanguageMap::from([(
            DEFAULT_LANGUAGE.to_owned(),
            name.to_owned(),
        )]));
        self
    }

    #[must_use]
    pub fn with_definition(mut self, definition: ActivityDefinition) -> Self {
        self.definition = Some(definition);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LanguageMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LanguageMap>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_type: Option<InteractionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_responses_pattern: Option<Vec<String>>,
}
