use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::clients::GenerationClient;
use crate::error::ServiceError;

/// A scripted response for the mock client.
#[derive(Debug)]
pub enum MockResponse {
    Success(String),
    Error(ServiceError),
}

/// Shared handle used by tests to script responses and inspect recorded
/// prompts.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    prompts: Mutex<Vec<String>>,
    structured_flags: Mutex<Vec<bool>>,
}

impl MockHandle {
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// The `structured` flag of each call, in call order.
    pub fn structured_flags(&self) -> Vec<bool> {
        self.structured_flags.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

/// Mock generation client. Pops scripted responses in FIFO order; an empty
/// script queue is an API error.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.add_response(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl GenerationClient for MockClient {
    async fn generate(&self, prompt: String, structured: bool) -> Result<String, ServiceError> {
        self.handle.prompts.lock().unwrap().push(prompt);
        self.handle.structured_flags.lock().unwrap().push(structured);
        match self.handle.responses.lock().unwrap().pop_front() {
            Some(MockResponse::Success(text)) => Ok(text),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(ServiceError::Api("mock: no scripted response".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn GenerationClient> {
        Box::new(self.clone())
    }
}
