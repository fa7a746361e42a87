//! Edge function invocation client
//!
//! The hosted platform exposes server-side functions behind
//! `{base_url}/functions/v1/{name}`. Every integration is the same shape:
//! POST a JSON body, read a JSON response. No retries; timeouts are the
//! platform's problem.

use crate::config::DEFAULT_BOOK_SEARCH_LIMIT;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One turn of assistant chat history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

/// Response from the "assistant-chat" function
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

/// One result row from the "search-books" function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub title: String,
    pub author: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BookSearchResponse {
    books: Vec<BookSummary>,
}

/// Client for the platform's function-invocation endpoint
#[derive(Clone)]
pub struct FunctionsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FunctionsClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url.trim_end_matches('/'), name)
    }

    /// Invoke a named function with a JSON body and return the JSON response
    pub async fn invoke(&self, name: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        tracing::debug!("Invoking function: {}", name);

        let mut request = self.http.post(self.function_url(name)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let value = response.json().await?;

        Ok(value)
    }

    /// Ask the assistant for a reply to one chat message
    pub async fn assistant_chat(
        &self,
        message: &str,
        user_id: &str,
        chat_history: &[ChatMessage],
    ) -> Result<ChatResponse> {
        let body = json!({
            "message": message,
            "userId": user_id,
            "chatHistory": chat_history,
        });

        let value = self.invoke("assistant-chat", &body).await?;
        let response: ChatResponse = serde_json::from_value(value)?;

        Ok(response)
    }

    /// Search the external book catalog
    pub async fn search_books(
        &self,
        query: &str,
        language: &str,
        limit: Option<u32>,
    ) -> Result<Vec<BookSummary>> {
        let body = json!({
            "query": query,
            "language": language,
            "limit": limit.unwrap_or(DEFAULT_BOOK_SEARCH_LIMIT),
        });

        let value = self.invoke("search-books", &body).await?;
        let response: BookSearchResponse = serde_json::from_value(value)?;

        Ok(response.books)
    }
}
