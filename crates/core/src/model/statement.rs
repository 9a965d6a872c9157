use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::activity::{ActivityObject, LanguageMap};
use crate::model::verbs;

/// cmi5 result extension carrying overall course progress (0-100).
pub const PROGRESS_EXTENSION: &str = "https://w3id.org/xapi/cmi5/result/extensions/progress";

//
// ─── STATEMENT ─────────────────────────────────────────────────────────────────
//

/// An xAPI statement as an open JSON mapping.
///
/// The protocol client prepares the actor, context and verb id. The runtime
/// only touches `verb.display`, `object` and `result`, and passes every other
/// field through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statement(Map<String, Value>);

impl Statement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Start a statement carrying only `verb.id`.
    #[must_use]
    pub fn with_verb_id(verb_id: &str) -> Self {
        let mut statement = Self::new();
        statement.edit_object("verb", |verb| {
            verb.insert("id".to_owned(), Value::String(verb_id.to_owned()));
        });
        statement
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    #[must_use]
    pub fn verb_id(&self) -> Option<&str> {
        self.0.get("verb")?.get("id")?.as_str()
    }

    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        self.0.get("object")?.get("id")?.as_str()
    }

    pub fn set_verb_display(&mut self, display: LanguageMap) {
        let display: Map<String, Value> = display
            .into_iter()
            .map(|(lang, text)| (lang, Value::String(text)))
            .collect();
        self.edit_object("verb", |verb| {
            verb.insert("display".to_owned(), Value::Object(display));
        });
    }

    /// Replace `object` with the given activity.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the activity cannot be serialized.
    pub fn set_object(&mut self, object: &ActivityObject) -> Result<(), serde_json::Error> {
        self.0
            .insert("object".to_owned(), serde_json::to_value(object)?);
        Ok(())
    }

    /// Set a top-level field of `result`, creating `result` if needed.
    pub fn set_result_field(&mut self, key: &str, value: Value) {
        self.edit_object("result", |result| {
            result.insert(key.to_owned(), value);
        });
    }

    /// Set `result.extensions[key]`, creating the intermediate objects if needed.
    pub fn set_result_extension(&mut self, key: &str, value: Value) {
        self.edit_object("result", |result| {
            edit_nested(result, "extensions", |extensions| {
                extensions.insert(key.to_owned(), value);
            });
        });
    }

    #[must_use]
    pub fn result_extension(&self, key: &str) -> Option<&Value> {
        self.0.get("result")?.get("extensions")?.get(key)
    }

    fn edit_object<F>(&mut self, key: &str, edit: F)
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        edit_nested(&mut self.0, key, edit);
    }
}

impl From<Statement> for Value {
    fn from(statement: Statement) -> Self {
        statement.into_value()
    }
}

// Non-object values under `key` are replaced by an empty object before editing.
fn edit_nested<F>(map: &mut Map<String, Value>, key: &str, edit: F)
where
    F: FnOnce(&mut Map<String, Value>),
{
    let mut inner = match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    };
    edit(&mut inner);
    map.insert(key.to_owned(), Value::Object(inner));
}

//
// ─── EXPERIENCED ───────────────────────────────────────────────────────────────
//

/// Rounded progress value to report, if `progress` is a finite value strictly
/// between 0 and 100.
#[must_use]
pub fn progress_extension(progress: f64) -> Option<i64> {
    if progress.is_finite() && progress > 0.0 && progress < 100.0 {
        // Bounded to (0, 100) above.
        #[allow(clippy::cast_possible_truncation)]
        let rounded = progress.round() as i64;
        Some(rounded)
    } else {
        None
    }
}

/// Turn a prepared statement into an "experienced" statement for one page of
/// the course.
///
/// # Errors
///
/// Returns `serde_json::Error` if the activity object cannot be serialized.
pub fn experienced_statement(
    mut base: Statement,
    activity_id: &str,
    page_id: &str,
    name: &str,
    progress: f64,
) -> Result<Statement, serde_json::Error> {
    base.set_verb_display(verbs::EXPERIENCED.display_map());
    let object = ActivityObject::new(format!("{activity_id}/slide/{page_id}")).with_name(name);
    base.set_object(&object)?;

    if let Some(progress) = progress_extension(progress) {
        base.set_result_extension(PROGRESS_EXTENSION, Value::from(progress));
    }
    Ok(base)
}
