use async_trait::async_trait;
use serde_json::Value;

use course_core::model::{Score, Statement};

use crate::error::ProtocolError;

/// The cmi5 protocol client the runtime drives.
///
/// Implementations own launch-parameter parsing, statement signing and
/// transport. Session startup is split into its two phases so the caller can
/// react to each failure separately.
#[async_trait]
pub trait Cmi5Client: Send + Sync {
    /// Learning record store base URL, if the launch provided one.
    fn endpoint(&self) -> Option<String>;
    fn activity_id(&self) -> String;
    /// xAPI agent for the learner.
    fn actor(&self) -> Value;
    fn registration(&self) -> String;
    /// Value for the `Authorization` header.
    fn auth(&self) -> String;
    fn return_url(&self) -> Option<String>;
    /// Raw launch mode as reported by launch data. Meaningful after `load_launch_data`.
    fn launch_mode(&self) -> String;
    /// Raw mastery score, if the launch data carries one.
    fn mastery_score(&self) -> Option<String>;

    /// Fetch the launch data document (first startup phase).
    async fn load_launch_data(&self) -> Result<(), ProtocolError>;

    /// Send the `initialized` statement (second startup phase).
    async fn send_initialized(&self) -> Result<(), ProtocolError>;

    /// Statement pre-populated with actor, context and `verb.id`.
    fn prepare_statement(&self, verb_id: &str) -> Statement;

    async fn send_statement(&self, statement: Statement) -> Result<Value, ProtocolError>;

    async fn send_statements(&self, statements: Vec<Statement>) -> Result<Value, ProtocolError>;

    async fn failed(&self, score: Score) -> Result<Value, ProtocolError>;

    async fn passed(&self, score: Score) -> Result<Value, ProtocolError>;

    async fn completed(&self) -> Result<Value, ProtocolError>;

    async fn terminate(&self) -> Result<Value, ProtocolError>;
}
