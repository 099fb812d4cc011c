//! Conversational front of the retrieval pipeline.
//!
//! Conversations are kept in memory for the lifetime of the process only.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::rag::{Answer, RetrievalPipeline};
use crate::semantic::ScoredDocument;

/// Reply used when the query could not be run at all.
pub const CHAT_ERROR_RESPONSE: &str =
    "I apologize, but I encountered an error processing your message. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Retrieval details attached to an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnMetadata {
    pub context_documents: Vec<ScoredDocument>,
    pub sql_query: Option<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

impl ChatTurn {
    fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    fn assistant(content: String, metadata: Option<TurnMetadata>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<ChatTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// What a caller gets back for one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub conversation_id: String,
    pub message: ChatTurn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_data: Option<Vec<ScoredDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Answers messages and keeps the conversation log.
#[derive(Debug)]
pub struct ChatService {
    pipeline: Arc<RetrievalPipeline>,
    conversations: DashMap<String, Conversation>,
    context_limit: usize,
    timeout: Duration,
}

impl ChatService {
    pub fn new(pipeline: Arc<RetrievalPipeline>, context_limit: usize, timeout: Duration) -> Self {
        Self {
            pipeline,
            conversations: DashMap::new(),
            context_limit,
            timeout,
        }
    }

    /// Answers `message` within a conversation.
    ///
    /// Without an id a new conversation is started. An unknown id starts a
    /// conversation under that id.
    pub async fn process_message(&self, message: &str, conversation_id: Option<&str>) -> ChatReply {
        let conversation_id = conversation_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.record(&conversation_id, ChatTurn::user(message));

        let result = Arc::clone(&self.pipeline)
            .try_answer_with_timeout(message.to_string(), self.context_limit, self.timeout)
            .await;

        match result {
            Ok(answer) => {
                let reply = Self::reply_from_answer(conversation_id, answer);
                self.record(&reply.conversation_id, reply.message.clone());
                reply
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    code = %e.status_code(),
                    "chat message failed"
                );
                ChatReply {
                    conversation_id,
                    message: ChatTurn::assistant(CHAT_ERROR_RESPONSE.to_string(), None),
                    suggestions: None,
                    context_data: None,
                    sql_query: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn reply_from_answer(conversation_id: String, answer: Answer) -> ChatReply {
        let context_documents = answer.context_documents.unwrap_or_default();
        let suggestions = answer.suggestions.unwrap_or_default();
        let metadata = TurnMetadata {
            context_documents: context_documents.clone(),
            sql_query: answer.structured_query.clone(),
            suggestions: suggestions.clone(),
        };

        ChatReply {
            conversation_id,
            message: ChatTurn::assistant(answer.response, Some(metadata)),
            suggestions: Some(suggestions),
            context_data: Some(context_documents),
            sql_query: answer.structured_query,
            error: answer.error,
        }
    }

    fn record(&self, conversation_id: &str, turn: ChatTurn) {
        let mut conversation = self
            .conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| Conversation::new(conversation_id.to_string()));
        conversation.updated_at = turn.timestamp;
        conversation.messages.push(turn);
    }

    pub fn get_conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations
            .get(conversation_id)
            .map(|entry| entry.value().clone())
    }

    /// Every conversation, oldest first.
    pub fn list_conversations(&self) -> Vec<Conversation> {
        let mut conversations: Vec<Conversation> = self
            .conversations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        conversations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        conversations
    }

    /// Removes a conversation; `false` if it did not exist.
    pub fn delete_conversation(&self, conversation_id: &str) -> bool {
        self.conversations.remove(conversation_id).is_some()
    }
}
