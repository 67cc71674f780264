use crate::llm::client::{
    format_context, CompletionClient, CompletionStream, EmbeddingClient, EMBED_BATCH_SIZE,
};
use crate::types::{AppError, ChunkReference, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        chat::{
            ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
            ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
        },
        embeddings::CreateEmbeddingRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on the provided context.\n\
If the answer cannot be found in the context, say so clearly.\n\
Always cite which part of the context you used for your answer.";

const COMPLETION_TEMPERATURE: f32 = 0.7;
const COMPLETION_MAX_TOKENS: u32 = 1000;

pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    embedding_model: String,
    completion_model: String,
}

impl OpenAIClient {
    pub fn new(
        api_key: String,
        api_base: String,
        embedding_model: String,
        completion_model: String,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
            embedding_model,
            completion_model,
        }
    }
}

#[async_trait]
impl EmbeddingClient for OpenAIClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(text)
            .build()
            .map_err(|e| AppError::Provider(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| AppError::Provider(format!("OpenAI API error: {}", e)))?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| AppError::Provider("No embedding returned from OpenAI".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        // Sequential batches; a failed batch aborts the rest.
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.embedding_model)
                .input(batch.to_vec())
                .build()
                .map_err(|e| AppError::Provider(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| AppError::Provider(format!("OpenAI API error: {}", e)))?;

            debug!(batch_size = batch.len(), "Embedded batch");
            all_embeddings.extend(response.data.into_iter().map(|d| d.embedding));
        }

        Ok(all_embeddings)
    }

    async fn validate(&self) -> bool {
        self.client.models().list().await.is_ok()
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn stream_completion(
        &self,
        question: &str,
        context: &[ChunkReference],
    ) -> Result<CompletionStream> {
        let user_prompt = format!(
            "Context:\n{}\n\nQuestion: {}\n\nAnswer the question based on the context above, citing the sources you used.",
            format_context(context),
            question
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.completion_model)
            .messages(vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                    SYSTEM_PROMPT.to_string(),
                )),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(
                    user_prompt,
                )),
            ])
            .temperature(COMPLETION_TEMPERATURE)
            .max_tokens(COMPLETION_MAX_TOKENS)
            .build()
            .map_err(|e| AppError::Provider(format!("Failed to build request: {}", e)))?;

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| AppError::Provider(format!("OpenAI API error: {}", e)))?;

        let result_stream = async_stream::stream! {
            while let Some(result) = stream.next().await {
                match result {
                    Ok(response) => {
                        for choice in response.choices {
                            if let Some(content) = choice.delta.content {
                                yield Ok(content);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(AppError::Provider(format!("Stream error: {}", e)));
                    }
                }
            }
        };

        Ok(Box::new(Box::pin(result_stream)))
    }

    fn model_name(&self) -> &str {
        &self.completion_model
    }
}
