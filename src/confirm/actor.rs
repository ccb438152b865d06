use super::models::ConfirmationEntry;
use crate::error::{AppResult, Error};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// The confirmation store actor that processes messages.
///
/// Serializing all access through one task gives atomic
/// store/take semantics per token without any locking.
pub struct ConfirmationActor {
    entries: HashMap<String, StoredEntry>,
    ttl: Duration,
    command_rx: mpsc::Receiver<ConfirmationCommand>,
}

struct StoredEntry {
    entry: ConfirmationEntry,
    created_at: Instant,
}

/// Commands that can be sent to the confirmation store actor
pub enum ConfirmationCommand {
    Store(ConfirmationEntry, mpsc::Sender<AppResult<String>>),
    Take(String, mpsc::Sender<AppResult<ConfirmationEntry>>),
    Shutdown,
}

impl ConfirmationActor {
    /// Create a new actor processing commands from the given channel
    pub fn new(ttl: Duration, command_rx: mpsc::Receiver<ConfirmationCommand>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            command_rx,
        }
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Confirmation store actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                ConfirmationCommand::Store(entry, response_tx) => {
                    let token = self.store(entry);
                    let _ = response_tx.send(Ok(token)).await;
                }
                ConfirmationCommand::Take(token, response_tx) => {
                    let result = self.take(&token);
                    let _ = response_tx.send(result).await;
                }
                ConfirmationCommand::Shutdown => {
                    info!("Confirmation store actor shutting down");
                    break;
                }
            }
        }

        info!("Confirmation store actor shut down");
    }

    /// Store a pending entry under a freshly generated token.
    ///
    /// The token is a UUIDv4: 122 random bits, unguessable by a third
    /// party. Whoever holds it may trigger delivery.
    fn store(&mut self, entry: ConfirmationEntry) -> String {
        self.sweep_expired();

        let token = Uuid::new_v4().to_string();
        self.entries.insert(
            token.clone(),
            StoredEntry {
                entry,
                created_at: Instant::now(),
            },
        );
        info!("Stored pending confirmation, {} entries held", self.entries.len());
        token
    }

    /// Atomically remove and return the entry for a token.
    ///
    /// Unknown and expired tokens are indistinguishable to the caller.
    fn take(&mut self, token: &str) -> AppResult<ConfirmationEntry> {
        match self.entries.remove(token) {
            Some(stored) if stored.created_at.elapsed() < self.ttl => Ok(stored.entry),
            Some(_) => Err(Error::InvalidToken),
            None => Err(Error::InvalidToken),
        }
    }

    /// Drop entries past their lifetime; called lazily on store
    fn sweep_expired(&mut self) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, stored| stored.created_at.elapsed() < ttl);
    }
}
