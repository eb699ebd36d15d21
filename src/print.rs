use std::time::Duration;

use anyhow::{ensure, Context, Result};
use reqwest::Client;
use serde_json::Value;

/// Жёсткий потолок ожидания чековой программы. Она живёт за ngrok и
/// иногда молчит — дольше ждать нельзя, заказ уже обрабатывается.
const PRINT_TIMEOUT_SECS: u64 = 7;

pub struct PrintClient {
    url: String,
    client: Client,
}

impl PrintClient {
    pub fn new(url: String) -> Self {
        Self::with_timeout(url, Duration::from_secs(PRINT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: String, timeout: Duration) -> Self {
        Self {
            url,
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build print HTTP client"),
        }
    }

    /// POST чека. Успех — только 2xx; всё прочее наверх как ошибка,
    /// решение "мягко проглотить" принимает вызывающий конвейер.
    pub async fn send_receipt(&self, payload: &Value) -> Result<()> {
        let res = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach print service at {}", self.url))?;

        ensure!(
            res.status().is_success(),
            "Print service error HTTP {}",
            res.status()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn receipt() -> Value {
        json!({ "name": "@tester", "total": 200, "items": [] })
    }

    #[tokio::test]
    async fn posts_payload_and_accepts_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/order"))
            .and(body_json(receipt()))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = PrintClient::new(format!("{}/order", server.uri()));
        assert!(client.send_receipt(&receipt()).await.is_ok());
    }

    #[tokio::test]
    async fn non_2xx_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = PrintClient::new(format!("{}/order", server.uri()));
        let err = client.send_receipt(&receipt()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn unresponsive_service_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            PrintClient::with_timeout(format!("{}/order", server.uri()), Duration::from_millis(50));
        assert!(client.send_receipt(&receipt()).await.is_err());
    }
}
