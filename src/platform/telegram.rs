use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn, Instrument};

use crate::config::Config;

/// A rendered message ready to be posted to `sendMessage`.
///
/// Everything the send needs is copied in at creation time, so a config
/// reload while the request is in flight cannot affect it.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub endpoint: String,
    pub chat_id: String,
    pub text: String,
}

/// JSON body of `sendMessage`. Every value is a string, including the
/// link-preview flag.
#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: &'static str,
}

impl OutboundRequest {
    pub fn new(config: &Config, text: String) -> Self {
        Self {
            endpoint: config.send_message_url(),
            chat_id: config.chat_id.clone(),
            text,
        }
    }

    fn body(&self) -> SendMessageBody<'_> {
        SendMessageBody {
            chat_id: &self.chat_id,
            text: &self.text,
            parse_mode: "HTML",
            disable_web_page_preview: "true",
        }
    }
}

/// Fire-and-forget delivery of rendered messages.
pub trait Dispatch: Send + Sync {
    /// Start sending `request` and return without waiting for it.
    fn dispatch(&self, request: OutboundRequest);
}

/// Clones share the HTTP connection pool and the set of in-flight sends.
#[derive(Clone, Default)]
pub struct TelegramClient {
    client: reqwest::Client,
    in_flight: TaskTracker,
}

impl TelegramClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            in_flight: TaskTracker::new(),
        }
    }

    /// Stop accepting new sends and wait up to `grace` for in-flight ones.
    ///
    /// Returns `true` if every send finished in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        self.in_flight.close();
        let pending = self.in_flight.len();
        if pending > 0 {
            info!("Waiting for {} in-flight message(s)", pending);
        }
        match tokio::time::timeout(grace, self.in_flight.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    "Dropping {} undelivered message(s) on shutdown",
                    self.in_flight.len()
                );
                false
            }
        }
    }

    /// POST the request and return the status code and response body.
    pub async fn send(&self, request: &OutboundRequest) -> Result<(u16, String)> {
        let response = self
            .client
            .post(&request.endpoint)
            .header("Content-Type", "application/json")
            .json(&request.body())
            .send()
            .await
            // the URL carries the bot token
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to Telegram")?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read Telegram response")?;

        Ok((status, body))
    }
}

impl Dispatch for TelegramClient {
    /// Spawns the send on the current tokio runtime, tracked for `drain`.
    fn dispatch(&self, request: OutboundRequest) {
        debug!(
            "Dispatching message to chat {} ({} chars)",
            request.chat_id,
            request.text.chars().count()
        );

        let client = self.clone();
        self.in_flight.spawn(
            async move {
                match client.send(&request).await {
                    Ok((status, body)) => log_delivery(status, Some(&body)),
                    Err(e) => {
                        debug!("Telegram request failed: {:#}", e);
                        log_delivery(0, None);
                    }
                }
            }
            .in_current_span(),
        );
    }
}

/// Completion handler for a dispatch. Only logs; 200 and 204 are silent.
///
/// `body` is `None` when no response was received at all, in which case
/// `status` is 0.
pub fn log_delivery(status: u16, body: Option<&str>) {
    if status == 200 || status == 204 {
        return;
    }

    match body {
        None => warn!("Telegram didn't respond (down?). Code: {}", status),
        Some(body) => warn!(
            "Telegram didn't send the message. Code: {} Response: {}",
            status, body
        ),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use tracing_test::traced_test;

    fn request(endpoint: String) -> OutboundRequest {
        OutboundRequest {
            endpoint,
            chat_id: "123".to_string(),
            text: "hello".to_string(),
        }
    }

    #[test]
    fn test_body_shape() {
        let req = request("http://localhost/bot/sendMessage".to_string());
        let value = serde_json::to_value(req.body()).unwrap();
        assert_eq!(
            value,
            json!({
                "chat_id": "123",
                "text": "hello",
                "parse_mode": "HTML",
                "disable_web_page_preview": "true"
            })
        );
    }

    #[test]
    fn test_new_copies_config_values() {
        let config = Config {
            telegram_bot_token: "42:token".to_string(),
            chat_id: "-100777".to_string(),
            ..Config::default()
        };
        let req = OutboundRequest::new(&config, "text".to_string());
        assert_eq!(
            req.endpoint,
            "https://api.telegram.org/bot42:token/sendMessage"
        );
        assert_eq!(req.chat_id, "-100777");
        assert_eq!(req.text, "text");
    }

    #[tokio::test]
    async fn test_send_posts_json_to_bot_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot42:token/sendMessage")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "chat_id": "123",
                "text": "hello",
                "parse_mode": "HTML",
                "disable_web_page_preview": "true"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let client = TelegramClient::new();
        let (status, body) = client
            .send(&request(format!("{}/bot42:token/sendMessage", server.url())))
            .await
            .unwrap();

        assert_eq!(status, 200);
        assert_eq!(body, r#"{"ok":true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_returns_error_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/botbad/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let client = TelegramClient::new();
        let (status, body) = client
            .send(&request(format!("{}/botbad/sendMessage", server.url())))
            .await
            .unwrap();

        assert_eq!(status, 400);
        assert!(body.contains("chat not found"));
    }

    #[tokio::test]
    async fn test_send_unreachable_endpoint_is_error() {
        let client = TelegramClient::new();
        let result = client
            .send(&request("http://127.0.0.1:1/botx/sendMessage".to_string()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_returns_before_request_completes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botasync/sendMessage")
            .with_status(200)
            .create_async()
            .await;

        let client = TelegramClient::new();
        client.dispatch(request(format!("{}/botasync/sendMessage", server.url())));

        for _ in 0..50 {
            if mock.matched_async().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    #[traced_test]
    async fn test_transport_failure_keeps_token_out_of_logs() {
        let client = TelegramClient::new();
        let request =
            request("http://127.0.0.1:1/bot123456:SECRET_TOKEN/sendMessage".to_string());

        let err = client.send(&request).await.unwrap_err();
        let rendered = format!("{:#}", err);
        assert!(!rendered.contains("SECRET_TOKEN"), "{}", rendered);

        client.dispatch(request);
        assert!(client.drain(Duration::from_secs(5)).await);

        assert!(logs_contain("Telegram didn't respond (down?). Code: 0"));
        assert!(!logs_contain("SECRET_TOKEN"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispatch_logs_length_in_characters() {
        let client = TelegramClient::new();
        let mut req = request("http://127.0.0.1:1/botx/sendMessage".to_string());
        req.text = "héllo wörld".to_string();

        client.dispatch(req);
        client.drain(Duration::from_secs(5)).await;

        assert!(logs_contain("(11 chars)"));
    }

    #[tokio::test]
    async fn test_drain_waits_for_in_flight_sends() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botdrain/sendMessage")
            .with_status(200)
            .expect(3)
            .create_async()
            .await;

        let client = TelegramClient::new();
        for _ in 0..3 {
            client.dispatch(request(format!("{}/botdrain/sendMessage", server.url())));
        }

        assert!(client.drain(Duration::from_secs(5)).await);
        mock.assert_async().await;
    }

    #[test]
    #[traced_test]
    fn test_failure_status_logs_one_warning() {
        log_delivery(400, Some("Bad Request"));

        assert!(logs_contain("Code: 400"));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("WARN")).count() {
                1 => Ok(()),
                n => Err(format!("expected one warning, got {}", n)),
            }
        });
    }

    #[test]
    #[traced_test]
    fn test_missing_body_logs_unreachable_warning() {
        log_delivery(0, None);

        assert!(logs_contain("Telegram didn't respond (down?). Code: 0"));
        assert!(!logs_contain("didn't send the message"));
    }

    #[test]
    #[traced_test]
    fn test_success_statuses_log_nothing() {
        log_delivery(200, Some(r#"{"ok":true}"#));
        log_delivery(204, None);

        assert!(!logs_contain("Telegram didn't"));
    }
}
