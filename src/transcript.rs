//! Optional prompt/response transcript files, for inspecting what the
//! generation service was asked and what came back.

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait TranscriptSink: Send + Sync + Debug {
    async fn save(&self, prompt: &str, response: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Writes one timestamped markdown file per generation call.
#[derive(Debug)]
pub struct FileTranscript {
    base_path: PathBuf,
}

impl FileTranscript {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

#[async_trait]
impl TranscriptSink for FileTranscript {
    async fn save(&self, prompt: &str, response: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let timestamp = Utc::now();
        let filename = format!("generation_{}.md", timestamp.format("%Y%m%d_%H%M%S_%3f"));
        let file_path = self.base_path.join(filename);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = format!("# Prompt\n\n{prompt}\n\n# Response\n\n{response}\n");
        let mut file = fs::File::create(&file_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
