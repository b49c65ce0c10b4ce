use lead_chat_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// How the fake model answers one user turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetResponse {
    /// Reply with the given assistant text.
    #[serde(rename = "reply")]
    Reply(String),
    /// Fail the request with the given error kind.
    #[serde(rename = "failure")]
    Failure(ErrorKind),
}

impl PresetResponse {
    /// Creates a successful reply.
    #[inline]
    pub fn reply<S: Into<String>>(text: S) -> Self {
        Self::Reply(text.into())
    }

    /// Creates a failed response.
    #[inline]
    pub fn failure(kind: ErrorKind) -> Self {
        Self::Failure(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_from_json() {
        let script: Vec<PresetResponse> = serde_json::from_str(
            r#"[
                { "type": "reply", "data": "Tell me about your team." },
                { "type": "failure", "data": "rate_limit_exceeded" }
            ]"#,
        )
        .unwrap();

        assert_eq!(
            script,
            vec![
                PresetResponse::reply("Tell me about your team."),
                PresetResponse::failure(ErrorKind::RateLimitExceeded),
            ]
        );
    }
}
