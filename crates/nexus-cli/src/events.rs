//! Application-wide signals.
//!
//! Session changes and profile edits are published here instead of being
//! handled at the call site; the event loop drains the stream once per tick
//! and refreshes whatever depends on them.

use tokio::sync::broadcast::{self, error::TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
  LoggedIn,
  LoggedOut,
  /// The viewer's own profile was edited.
  ProfileUpdated,
}

#[derive(Debug, Clone)]
pub struct EventBus {
  tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  /// Publishing with no subscriber is not an error.
  pub fn publish(&self, event: AppEvent) {
    tracing::debug!(?event, "publish");
    let _ = self.tx.send(event);
  }

  pub fn subscribe(&self) -> EventStream { EventStream { rx: self.tx.subscribe() } }
}

impl Default for EventBus {
  fn default() -> Self { Self::new(16) }
}

pub struct EventStream {
  rx: broadcast::Receiver<AppEvent>,
}

impl EventStream {
  /// Everything published since the last drain, without blocking. If the
  /// subscriber lagged, the oldest events are lost but the rest still arrive.
  pub fn drain(&mut self) -> Vec<AppEvent> {
    let mut events = Vec::new();
    loop {
      match self.rx.try_recv() {
        Ok(event) => events.push(event),
        Err(TryRecvError::Lagged(skipped)) => {
          tracing::warn!(skipped, "event stream lagged");
        }
        Err(TryRecvError::Empty | TryRecvError::Closed) => break,
      }
    }
    events
  }
}
