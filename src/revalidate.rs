use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

/// Fire-and-forget hook that marks rendered route paths stale after a
/// mutation. The frontend host exposes an endpoint that accepts a path and
/// rebuilds the cached page; nothing here consumes its response.
#[derive(Clone)]
pub struct Revalidator {
    endpoint: Option<String>,
    client: Client,
}

impl Revalidator {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            client: Client::new(),
        }
    }

    /// Requests revalidation of `path`. Failures are logged and swallowed;
    /// a stale cached page is never worth failing the mutation over.
    pub fn revalidate_path(&self, path: &str) {
        let Some(endpoint) = self.endpoint.clone() else {
            debug!(path, "revalidation endpoint not configured, skipping");
            return;
        };

        let client = self.client.clone();
        let path = path.to_owned();
        tokio::spawn(async move {
            let result = client
                .post(&endpoint)
                .json(&json!({ "path": path }))
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    debug!(path, "revalidated path");
                }
                Ok(response) => {
                    warn!(path, status = %response.status(), "revalidation request rejected");
                }
                Err(err) => {
                    warn!(path, error = %err, "revalidation request failed");
                }
            }
        });
    }
}
