//! ADL verbs emitted directly by the course runtime.
//!
//! Lifecycle verbs (initialized, passed, completed, failed, terminated) are
//! built by the protocol client and are not listed here.

use crate::model::activity::{LanguageMap, DEFAULT_LANGUAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verb {
    pub id: &'static str,
    pub display: &'static str,
}

impl Verb {
    /// Display map in the default language, as carried by `verb.display`.
    #[must_use]
    pub fn display_map(&self) -> LanguageMap {
        LanguageMap::from([(DEFAULT_LANGUAGE.to_owned(), self.display.to_owned())])
    }
}

pub const EXPERIENCED: Verb = Verb {
    id: "http://adlnet.gov/expapi/verbs/experienced",
    display: "experienced",
};

pub const ANSWERED: Verb = Verb {
    id: "http://adlnet.gov/expapi/verbs/answered",
    display: "answered",
};
