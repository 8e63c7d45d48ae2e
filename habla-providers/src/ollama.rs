use crate::request::HttpRequest;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// `POST {base}/api/chat`, non-streaming. `api_key` is only sent to hosted endpoints.
pub fn build_chat_request(
    base_url: &str,
    api_key: Option<&str>,
    model: &str,
    messages: &[ChatMessage],
) -> HttpRequest {
    let messages: Vec<_> = messages
        .iter()
        .map(|m| json!({ "role": m.role, "content": m.content }))
        .collect();
    let payload = json!({
        "model": model,
        "messages": messages,
        "stream": false,
    });

    HttpRequest::post_json(join_url(base_url, "/api/chat"), &payload).bearer(api_key)
}

/// `GET {base}/api/tags`: the installed-model catalog.
pub fn build_list_models_request(base_url: &str) -> HttpRequest {
    HttpRequest::get(join_url(base_url, "/api/tags"))
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Body, Method};

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("https://ollama.com/", "/api/chat"),
            "https://ollama.com/api/chat"
        );
        assert_eq!(
            join_url("http://localhost:11434", "api/tags"),
            "http://localhost:11434/api/tags"
        );
    }

    #[test]
    fn cloud_chat_request_is_authorized_and_non_streaming() {
        let req = build_chat_request(
            "https://ollama.com",
            Some("k"),
            "gpt-oss:20b-cloud",
            &[ChatMessage::system("tutor"), ChatMessage::user("hola")],
        );

        assert_eq!(req.method, Method::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.url, "https://ollama.com/api/chat");
        assert_eq!(req.header("authorization"), Some("Bearer k"));
        let Body::Json(s) = &req.body else {
            panic!("expected json");
        };
        let v: serde_json::Value = serde_json::from_str(s).unwrap();
        assert_eq!(v["model"], "gpt-oss:20b-cloud");
        assert_eq!(v["stream"], false);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "hola");
    }

    #[test]
    fn local_chat_request_has_no_credentials() {
        let req = build_chat_request("http://localhost:11434", None, "llama3", &[]);
        assert_eq!(req.header("authorization"), None);
    }

    #[test]
    fn list_models_is_a_get() {
        let req = build_list_models_request("http://localhost:11434/");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.url, "http://localhost:11434/api/tags");
        assert_eq!(req.body, Body::Empty);
        assert_eq!(req.header("accept"), Some("application/json"));
    }
}
