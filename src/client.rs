//! Blocking HTTP plumbing shared by the plan catalog and the build queue.

use crate::connection::{Auth, Connection};
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use std::time::Duration;

const ACCEPT: &str = "Accept";
const APPLICATION_JSON: &str = "application/json";
const AUTHORIZATION: &str = "Authorization";

/// Longest response excerpt attached to parse failures in logs.
const BODY_EXCERPT_LEN: usize = 512;

/// One request at a time against a single connection.
pub(crate) struct RestClient<'a> {
    connection: &'a Connection,
    agent: ureq::Agent,
}

impl<'a> RestClient<'a> {
    /// Build a client, failing early when the connection still needs credentials.
    pub(crate) fn new(connection: &'a Connection) -> Result<Self> {
        if connection.auth == Auth::Interactive {
            return Err(Error::AuthRequired {
                connection: connection.id.clone(),
            });
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(connection.timeout_secs))
            .build();

        Ok(Self { connection, agent })
    }

    pub(crate) fn connection(&self) -> &Connection {
        self.connection
    }

    /// GET `url` and deserialize the JSON body.
    ///
    /// `endpoint` is the name used in errors and logs.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        endpoint: &str,
    ) -> Result<T> {
        tracing::debug!(connection = %self.connection.id, endpoint, "GET");

        let mut request = self.authorize(self.agent.get(url)).set(ACCEPT, APPLICATION_JSON);
        for (name, value) in query {
            request = request.query(name, value);
        }

        let response = request.call().map_err(|e| self.map_error(e, endpoint))?;
        let body = response.into_string().map_err(|e| Error::Transport {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                endpoint,
                body = %excerpt(&body),
                error = %e,
                "Unexpected response shape"
            );
            Error::MalformedResponse {
                url: endpoint.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// POST `form` as `application/x-www-form-urlencoded`, ignoring the body.
    pub(crate) fn post_form(&self, url: &str, form: &[(&str, &str)], endpoint: &str) -> Result<()> {
        tracing::debug!(
            connection = %self.connection.id,
            endpoint,
            params = form.len(),
            "POST"
        );

        self.authorize(self.agent.post(url))
            .set(ACCEPT, APPLICATION_JSON)
            .send_form(form)
            .map_err(|e| self.map_error(e, endpoint))?;
        Ok(())
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.connection.auth {
            Auth::Basic { username, password } => {
                let credentials = STANDARD.encode(format!("{username}:{password}"));
                request.set(AUTHORIZATION, &format!("Basic {credentials}"))
            }
            Auth::Token { token } => request.set(AUTHORIZATION, &format!("Bearer {token}")),
            Auth::Anonymous | Auth::Interactive => request,
        }
    }

    fn map_error(&self, error: ureq::Error, endpoint: &str) -> Error {
        match error {
            ureq::Error::Status(401, _) => Error::AuthRequired {
                connection: self.connection.id.clone(),
            },
            ureq::Error::Status(status, _) => Error::RemoteCallFailed {
                endpoint: endpoint.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => Error::Transport {
                endpoint: endpoint.to_string(),
                message: transport.to_string(),
            },
        }
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
