use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// What the submission collaborator reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub message: String,
}

/// Receives the user's answer to a coding question.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, question: &str, answer: &str) -> Result<SubmissionReceipt>;
}

/// Placeholder backend: logs the submission and acknowledges it.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcknowledgingSubmitter;

#[async_trait]
impl Submitter for AcknowledgingSubmitter {
    async fn submit(&self, question: &str, answer: &str) -> Result<SubmissionReceipt> {
        tracing::info!(
            question_chars = question.len(),
            answer_chars = answer.len(),
            "answer submitted"
        );
        Ok(SubmissionReceipt {
            message: "Code submitted!".to_string(),
        })
    }
}
