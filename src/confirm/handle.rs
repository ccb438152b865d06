use super::actor::{ConfirmationActor, ConfirmationCommand};
use super::models::ConfirmationEntry;
use crate::error::{other_error, AppResult};
use std::time::Duration;
use tokio::sync::mpsc;

/// Handle for communicating with the confirmation store actor
#[derive(Clone)]
pub struct ConfirmationHandle {
    command_tx: mpsc::Sender<ConfirmationCommand>,
}

impl ConfirmationHandle {
    /// Spawn the store actor and return a handle to it
    pub fn spawn(ttl: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let mut actor = ConfirmationActor::new(ttl, command_rx);
        tokio::spawn(async move { actor.run().await });
        Self { command_tx }
    }

    /// Create a new empty handle for initialization purposes
    pub fn empty() -> Self {
        let (command_tx, _) = mpsc::channel(32);
        Self { command_tx }
    }

    /// Store a pending entry and get its confirmation token
    pub async fn store(&self, entry: ConfirmationEntry) -> AppResult<String> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(ConfirmationCommand::Store(entry, response_tx))
            .await
            .map_err(|e| other_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))?
    }

    /// Atomically remove and return the entry for a token
    pub async fn take(&self, token: &str) -> AppResult<ConfirmationEntry> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(ConfirmationCommand::Take(token.to_string(), response_tx))
            .await
            .map_err(|e| other_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| other_error("Response channel closed"))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(ConfirmationCommand::Shutdown).await;
        Ok(())
    }
}
