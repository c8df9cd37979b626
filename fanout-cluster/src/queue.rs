//! In-memory rendezvous with the external queue daemon
//!
//! The daemon and the dispatcher share a long-lived connection, so no
//! filesystem protocol is involved: submissions go out over one channel and
//! per-job responses come back over another.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, Mutex};

use fanout_protocol::JobOutcome;

use crate::error::ClusterError;

/// One job inside a queue submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJob {
    pub index: u64,
    pub args: JsonValue,
}

/// A group of jobs handed to the daemon as one sub-dispatch
///
/// The daemon runs the group as a nested sequential batch, amortizing its
/// per-task overhead when individual jobs are cheap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSubmission {
    pub function: String,
    pub jobs: Vec<QueueJob>,
    pub store: bool,
}

/// Per-job reply from the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    pub index: u64,
    pub outcome: JobOutcome,
}

/// The engine's seam onto the queue daemon
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Hand one group of jobs to the daemon
    async fn submit(&self, submission: QueueSubmission) -> Result<(), ClusterError>;

    /// Wait for the next per-job response, in daemon completion order
    async fn next_response(&self) -> Result<QueueResponse, ClusterError>;
}

/// Channel-backed [`QueueClient`] over an in-process daemon connection
pub struct ChannelQueueClient {
    submissions: mpsc::Sender<QueueSubmission>,
    responses: Mutex<mpsc::Receiver<QueueResponse>>,
}

/// Daemon half of the rendezvous
pub struct QueueEndpoint {
    pub submissions: mpsc::Receiver<QueueSubmission>,
    pub responses: mpsc::Sender<QueueResponse>,
}

impl ChannelQueueClient {
    /// Create a connected client/endpoint pair
    pub fn pair(capacity: usize) -> (Self, QueueEndpoint) {
        let (submission_tx, submission_rx) = mpsc::channel(capacity);
        let (response_tx, response_rx) = mpsc::channel(capacity);
        (
            Self {
                submissions: submission_tx,
                responses: Mutex::new(response_rx),
            },
            QueueEndpoint {
                submissions: submission_rx,
                responses: response_tx,
            },
        )
    }
}

#[async_trait]
impl QueueClient for ChannelQueueClient {
    async fn submit(&self, submission: QueueSubmission) -> Result<(), ClusterError> {
        self.submissions
            .send(submission)
            .await
            .map_err(|_| ClusterError::ChannelClosed)
    }

    async fn next_response(&self) -> Result<QueueResponse, ClusterError> {
        self.responses
            .lock()
            .await
            .recv()
            .await
            .ok_or(ClusterError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_rendezvous_roundtrip() {
        let (client, mut endpoint) = ChannelQueueClient::pair(8);

        client
            .submit(QueueSubmission {
                function: "square".to_string(),
                jobs: vec![QueueJob {
                    index: 1,
                    args: json!(3),
                }],
                store: true,
            })
            .await
            .unwrap();

        let submission = endpoint.submissions.recv().await.unwrap();
        assert_eq!(submission.jobs.len(), 1);

        endpoint
            .responses
            .send(QueueResponse {
                index: 1,
                outcome: JobOutcome::success(Some(json!(9))),
            })
            .await
            .unwrap();

        let response = client.next_response().await.unwrap();
        assert_eq!(response.index, 1);
    }

    #[tokio::test]
    async fn test_closed_endpoint_is_an_error() {
        let (client, endpoint) = ChannelQueueClient::pair(1);
        drop(endpoint);

        assert!(matches!(
            client.next_response().await,
            Err(ClusterError::ChannelClosed)
        ));
    }
}
