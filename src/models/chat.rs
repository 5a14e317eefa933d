use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub role: Role,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub user_id: String,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: String,
}

/// The `{success, data}` wrapper every chat endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewConversation {
    pub user_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub conversation_id: String,
    pub content: String,
    pub images_url: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeReply {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_and_wire_names() {
        let json = r#"{"success":true,"data":[{"_id":"c1","title":"AI assistant","user_id":"guest","updatedAt":"2025-06-01T00:00:00Z"}]}"#;
        let env: Envelope<Vec<Conversation>> = serde_json::from_str(json).unwrap();
        let conversations = env.into_data().unwrap();
        assert_eq!(conversations[0].id, "c1");

        let failed: Envelope<Vec<Conversation>> =
            serde_json::from_str(r#"{"success":false,"data":[]}"#).unwrap();
        assert!(failed.into_data().is_none());

        let outgoing = OutgoingMessage {
            conversation_id: "c1".into(),
            content: "hi".into(),
            images_url: vec![],
        };
        let value = serde_json::to_value(&outgoing).unwrap();
        assert_eq!(value["conversationId"], "c1");
        assert!(value["imagesUrl"].as_array().unwrap().is_empty());
    }
}
