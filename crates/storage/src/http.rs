//! Activity state over the xAPI `activities/state` resource.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::StateStoreConfig;
use crate::repository::{ActivityStateRepository, StateError, StateScope};

const STATE_RESOURCE: &str = "activities/state";

#[derive(Clone)]
pub struct HttpActivityStateStore {
    client: Client,
    config: StateStoreConfig,
}

impl HttpActivityStateStore {
    /// Build a store with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Client` if the HTTP client cannot be built.
    pub fn new(config: StateStoreConfig) -> Result<Self, StateError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(StateError::Client)?;
        Ok(Self { client, config })
    }

    /// Build a store around an existing client (useful for testing).
    #[must_use]
    pub fn with_http_client(client: Client, config: StateStoreConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn config(&self) -> &StateStoreConfig {
        &self.config
    }

    /// Resolve the state resource URL for a document.
    ///
    /// # Errors
    ///
    /// Returns `StateError::InvalidEndpoint` if the scope endpoint is not a valid URL.
    pub fn state_url(&self, scope: &StateScope, state_id: &str) -> Result<Url, StateError> {
        let mut endpoint = scope.endpoint.trim().to_owned();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let mut url = Url::parse(&endpoint)?.join(STATE_RESOURCE)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("stateId", state_id)
                .append_pair("activityId", &scope.activity_id)
                .append_pair("agent", &scope.agent.to_string());
            if !scope.registration.is_empty() {
                query.append_pair(&self.config.registration_param, &scope.registration);
            }
        }
        Ok(url)
    }

    fn with_headers(&self, request: RequestBuilder, scope: &StateScope) -> RequestBuilder {
        let request = request.header("X-Experience-API-Version", &self.config.xapi_version);
        if scope.auth.is_empty() {
            request
        } else {
            request.header(reqwest::header::AUTHORIZATION, &scope.auth)
        }
    }
}

#[async_trait]
impl ActivityStateRepository for HttpActivityStateStore {
    async fn get_state(
        &self,
        scope: &StateScope,
        state_id: &str,
    ) -> Result<Option<Value>, StateError> {
        let url = self.state_url(scope, state_id)?;
        debug!(url = %url, state_id, "fetching activity state");

        let response = self
            .with_headers(self.client.get(url), scope)
            .send()
            .await
            .map_err(|source| StateError::Transport {
                method: "GET",
                source,
            })?;
        read_document(response, "GET").await
    }

    async fn put_state(
        &self,
        scope: &StateScope,
        state_id: &str,
        document: &Value,
    ) -> Result<Option<Value>, StateError> {
        let url = self.state_url(scope, state_id)?;
        debug!(url = %url, state_id, "storing activity state");

        let response = self
            .with_headers(self.client.put(url), scope)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(document)
            .send()
            .await
            .map_err(|source| StateError::Transport {
                method: "PUT",
                source,
            })?;
        read_document(response, "PUT").await
    }
}

// Anything other than 200 carries no document; an empty 200 body is treated the same.
async fn read_document(
    response: Response,
    method: &'static str,
) -> Result<Option<Value>, StateError> {
    let status = response.status();
    if status != StatusCode::OK {
        debug!(%status, method, "activity state response carried no document");
        return Ok(None);
    }

    let body = response
        .text()
        .await
        .map_err(|source| StateError::Transport { method, source })?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(endpoint: &str) -> StateScope {
        StateScope {
            endpoint: endpoint.into(),
            activity_id: "https://course.example/a".into(),
            agent: json!({ "mbox": "mailto:learner@example.com" }),
            registration: "reg-1".into(),
            auth: String::new(),
        }
    }

    #[test]
    fn state_url_normalizes_trailing_slash() {
        let store = HttpActivityStateStore::with_http_client(Client::new(), StateStoreConfig::default());
        let with_slash = store.state_url(&scope("https://lrs.example/xapi/"), "s").unwrap();
        let without = store.state_url(&scope("https://lrs.example/xapi"), "s").unwrap();

        assert_eq!(with_slash, without);
        assert_eq!(with_slash.path(), "/xapi/activities/state");
        let pairs: Vec<(String, String)> = with_slash
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("stateId".into(), "s".into())));
        assert!(pairs.contains(&("registration".into(), "reg-1".into())));
        assert!(pairs.contains(&(
            "agent".into(),
            r#"{"mbox":"mailto:learner@example.com"}"#.into()
        )));
    }

    #[test]
    fn registration_param_name_is_configurable() {
        let config = StateStoreConfig {
            registration_param: "registraction".into(),
            ..StateStoreConfig::default()
        };
        let store = HttpActivityStateStore::with_http_client(Client::new(), config);
        let url = store.state_url(&scope("https://lrs.example/"), "s").unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "registraction" && v == "reg-1"));
    }

    #[test]
    fn invalid_endpoint_is_reported() {
        let store = HttpActivityStateStore::with_http_client(Client::new(), StateStoreConfig::default());
        let err = store.state_url(&scope("not a url"), "s").unwrap_err();
        assert!(matches!(err, StateError::InvalidEndpoint(_)));
    }
}
