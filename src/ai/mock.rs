use super::DescriptionService;
use crate::image::ImagePayload;
use crate::models::DescriptionOptions;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned [`DescriptionService`] for callers' tests and offline harnesses.
pub struct MockDescriptionClient {
    responses: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
    connected: bool,
}

impl MockDescriptionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
            connected: true,
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn with_connection(mut self, connected: bool) -> Self {
        self.connected = connected;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockDescriptionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DescriptionService for MockDescriptionClient {
    async fn describe_image(
        &self,
        image: &ImagePayload,
        options: &DescriptionOptions,
    ) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if *self.should_fail.lock().unwrap() {
            return Err(Error::Connection("Mock failure".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!(
                "A {} image described at {} detail in {}",
                image.mime_type(),
                options.detail.as_str(),
                options.language.as_str()
            ))
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }

    async fn test_connection(&self) -> bool {
        self.connected
    }
}
