mod activity;
mod interaction;
mod launch;
mod score;
mod statement;
pub mod verbs;

pub use activity::{ActivityDefinition, ActivityObject, LanguageMap, DEFAULT_LANGUAGE};
pub use interaction::{
    answered_statement, Interaction, InteractionType, INTERACTION_ACTIVITY_TYPE,
    MULTI_VALUE_DELIMITER,
};
pub use launch::{LaunchContext, LaunchMode};
pub use score::{Score, ScoreError};
pub use statement::{experienced_statement, progress_extension, Statement, PROGRESS_EXTENSION};
