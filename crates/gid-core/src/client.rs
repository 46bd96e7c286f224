use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::Message;

/// Body of `POST /api/ask`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub question: String,
    pub city: Option<String>,
    pub chat_history: Vec<Message>,
}

/// Reply from `POST /api/ask`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub detected_city: Option<String>,
}

/// The remote question-answering service
#[async_trait]
pub trait AnswerClient {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse>;
    async fn clear_cache(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct HttpAnswerClient {
    client: Client,
    base_url: String,
}

impl HttpAnswerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AnswerClient for HttpAnswerClient {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
        let url = format!("{}/api/ask", self.base_url);
        debug!(%url, history = request.chat_history.len(), "sending question");

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(Error::Remote {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    async fn clear_cache(&self) -> Result<()> {
        let url = format!("{}/api/clear-cache", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Remote {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn kyiv_request() -> AskRequest {
        AskRequest {
            question: "What to see tonight?".to_string(),
            city: Some("Kyiv".to_string()),
            chat_history: vec![Message::user("Kyiv"), Message::assistant("Hi!")],
        }
    }

    #[test]
    fn test_request_shape() {
        let request = AskRequest {
            question: "Where to eat?".to_string(),
            city: Some("Kyiv".to_string()),
            chat_history: vec![Message::user("Kyiv"), Message::assistant("Hi!")],
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "question": "Where to eat?",
                "city": "Kyiv",
                "chat_history": [
                    {"role": "user", "content": "Kyiv"},
                    {"role": "assistant", "content": "Hi!"}
                ]
            })
        );
    }

    #[test]
    fn test_request_without_city_sends_null() {
        let request = AskRequest {
            question: "hi".to_string(),
            city: None,
            chat_history: Vec::new(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value["city"].is_null());
    }

    #[test]
    fn test_response_detected_city_optional() {
        let with_city: AskResponse =
            serde_json::from_str(r#"{"answer":"ok","detected_city":"Lviv"}"#).unwrap();
        assert_eq!(with_city.detected_city.as_deref(), Some("Lviv"));

        let null_city: AskResponse =
            serde_json::from_str(r#"{"answer":"ok","detected_city":null}"#).unwrap();
        assert_eq!(null_city.detected_city, None);

        let missing: AskResponse = serde_json::from_str(r#"{"answer":"ok"}"#).unwrap();
        assert_eq!(missing.detected_city, None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpAnswerClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_ask_posts_json_to_ask_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ask"))
            .and(body_json(json!({
                "question": "What to see tonight?",
                "city": "Kyiv",
                "chat_history": [
                    {"role": "user", "content": "Kyiv"},
                    {"role": "assistant", "content": "Hi!"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer": "The **Opera**",
                "detected_city": "Kyiv"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAnswerClient::new(&server.uri());
        let response = client.ask(&kyiv_request()).await.unwrap();

        assert_eq!(
            response,
            AskResponse {
                answer: "The **Opera**".to_string(),
                detected_city: Some("Kyiv".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_ask_server_error_is_remote_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ask"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAnswerClient::new(&server.uri());
        let result = client.ask(&kyiv_request()).await;

        assert!(
            matches!(result, Err(Error::Remote { status: 500 })),
            "expected remote failure, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn test_ask_undecodable_body_is_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HttpAnswerClient::new(&server.uri());
        let result = client.ask(&kyiv_request()).await;

        assert!(matches!(result, Err(Error::Http(_))), "got: {result:?}");
    }

    #[tokio::test]
    async fn test_clear_cache_posts_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/clear-cache"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAnswerClient::new(&server.uri());
        client.clear_cache().await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache_server_error_is_remote_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/clear-cache"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpAnswerClient::new(&format!("{}/", server.uri()));
        let result = client.clear_cache().await;

        assert!(matches!(result, Err(Error::Remote { status: 503 })), "got: {result:?}");
    }
}
