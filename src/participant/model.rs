//! Participant backed by an LLM service

use super::{Participant, PromptError};
use crate::conversation::Message;
use crate::llm::{LlmRequest, LlmService, Sampling};
use async_trait::async_trait;
use std::sync::Arc;

pub struct ModelParticipant {
    service: Arc<dyn LlmService>,
    sampling: Sampling,
    label: String,
}

impl ModelParticipant {
    pub fn new(service: Arc<dyn LlmService>, sampling: Sampling) -> Self {
        let label = format!("model:{}", service.model_id());
        Self {
            service,
            sampling,
            label,
        }
    }
}

#[async_trait]
impl Participant for ModelParticipant {
    fn label(&self) -> &str {
        &self.label
    }

    async fn prompt(&self, history: &[Message]) -> Result<String, PromptError> {
        let request = LlmRequest {
            messages: history.to_vec(),
            sampling: self.sampling,
        };
        let response = self.service.complete(&request).await?;
        Ok(response.text.trim().to_string())
    }
}
