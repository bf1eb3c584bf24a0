use anyhow::{Context, Result};
use clientbook_storage::{Customer, CustomerPatch, NewCustomer};
use serde::Serialize;
use serde_json::Value;

/// Thin HTTP client over the clientbook endpoints.
#[derive(Clone)]
pub struct ClientbookClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// A listing page plus the server's `x-cache` verdict.
pub struct Page {
    pub customers: Vec<Customer>,
    pub cache: Option<String>,
}

impl ClientbookClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> Result<Page> {
        let mut params = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }
        let resp = self
            .request(reqwest::Method::GET, "listcustomers")
            .query(&params)
            .send()
            .await
            .context("Failed to connect to server")?;
        let cache = resp
            .headers()
            .get("x-cache")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = handle_response(resp).await?;
        let customers = serde_json::from_str(&body).context("Failed to parse response JSON")?;
        Ok(Page { customers, cache })
    }

    pub async fn get(&self, email: &str) -> Result<Customer> {
        let resp = self
            .request(reqwest::Method::GET, "customer")
            .query(&[("email", email)])
            .send()
            .await
            .context("Failed to connect to server")?;
        let body = handle_response(resp).await?;
        serde_json::from_str(&body).context("Failed to parse response JSON")
    }

    pub async fn add(&self, customer: &NewCustomer) -> Result<String> {
        self.write(reqwest::Method::POST, "addcustomer", customer)
            .await
    }

    pub async fn update(&self, patch: &CustomerPatch) -> Result<String> {
        self.write(reqwest::Method::PUT, "updatecustomer", patch)
            .await
    }

    pub async fn delete(&self, email: &str) -> Result<String> {
        self.write(
            reqwest::Method::DELETE,
            "deletecustomer",
            &serde_json::json!({ "email": email }),
        )
        .await
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<String> {
        let resp = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .context("Failed to connect to server")?;
        handle_response(resp).await
    }

    pub async fn health(&self) -> Result<(u16, Value)> {
        let resp = self
            .http
            .get(self.url("healthz"))
            .send()
            .await
            .context("Failed to connect to server")?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let value = serde_json::from_str(&body).unwrap_or(Value::String(body));
        Ok((status, value))
    }
}

/// Returns the body of a successful response; errors carry the server's
/// plain-text message.
async fn handle_response(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        let msg = body.trim();
        if msg.is_empty() {
            anyhow::bail!("HTTP {status}");
        }
        anyhow::bail!("HTTP {status}: {msg}");
    }

    Ok(body)
}
