//! Runs a session's fetch requests on the tokio runtime.
//!
//! Each request becomes a spawned task; its outcome is sent back over an
//! `mpsc` channel so the owner of the [`LessonSession`](crate::LessonSession)
//! applies it on its own task. Tasks are never aborted: a result the session
//! no longer wants is simply discarded by ticket comparison.

use tokio::sync::mpsc;
use tracing::debug;

use crate::content::ContentClient;
use crate::session::{FetchOutcome, FetchRequest};

/// Executes [`FetchRequest`]s and collects their [`FetchOutcome`]s.
#[derive(Debug)]
pub struct FetchDriver {
    client: ContentClient,
    sender: mpsc::UnboundedSender<FetchOutcome>,
    receiver: mpsc::UnboundedReceiver<FetchOutcome>,
    in_flight: usize,
}

impl FetchDriver {
    /// Creates a driver that fetches through `client`.
    #[must_use]
    pub fn new(client: ContentClient) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            client,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Spawns one task per request.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&mut self, requests: impl IntoIterator<Item = FetchRequest>) {
        for request in requests {
            let client = self.client.clone();
            let sender = self.sender.clone();
            self.in_flight += 1;
            tokio::spawn(async move {
                let outcome = execute(&client, request).await;
                // The receiver only goes away with the driver.
                let _ = sender.send(outcome);
            });
        }
    }

    /// Number of dispatched requests whose outcome has not been received.
    #[must_use]
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Waits for the next outcome.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next(&mut self) -> Option<FetchOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.receiver.recv().await;
        if outcome.is_some() {
            self.in_flight -= 1;
        }
        outcome
    }
}

async fn execute(client: &ContentClient, request: FetchRequest) -> FetchOutcome {
    match request {
        FetchRequest::Content {
            ticket,
            topic,
            platform,
            reinforcement,
        } => {
            debug!(lesson = topic.id, "Fetching lesson content");
            let content = client
                .fetch_lesson_content(topic, reinforcement, platform)
                .await;
            FetchOutcome::Content { ticket, content }
        }
        FetchRequest::Illustration { ticket, concept } => {
            debug!(concept, "Fetching illustration");
            let illustration = client.fetch_concept_illustration(concept).await;
            FetchOutcome::Illustration {
                ticket,
                illustration,
            }
        }
    }
}
