use crate::domain::ports::{PortalViewRef, StatusKind};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Default)]
struct ActiveMessage {
    generation: u64,
    hide_timer: Option<JoinHandle<()>>,
}

/// The status region: shows one message at a time and hides it after a
/// fixed period.
///
/// Only one hide timer is alive at any moment. Every new message cancels the
/// previous timer, so a message is never hidden early by an older one.
/// Outside a tokio runtime messages are still shown but never auto-hidden.
pub struct StatusBoard {
    view: PortalViewRef,
    display_for: Duration,
    active: Arc<Mutex<ActiveMessage>>,
}

impl StatusBoard {
    pub fn new(view: PortalViewRef, display_for: Duration) -> Self {
        Self {
            view,
            display_for,
            active: Arc::new(Mutex::new(ActiveMessage::default())),
        }
    }

    pub fn display(&self, message: &str, kind: StatusKind) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = active.hide_timer.take() {
            timer.abort();
        }
        active.generation += 1;
        let generation = active.generation;

        self.view.show_status(message, kind);

        let Ok(runtime) = Handle::try_current() else {
            warn!("no tokio runtime, status message will not auto-hide");
            return;
        };
        let view = Arc::clone(&self.view);
        let slot = Arc::clone(&self.active);
        let display_for = self.display_for;
        active.hide_timer = Some(runtime.spawn(async move {
            tokio::time::sleep(display_for).await;
            let mut active = slot.lock().unwrap_or_else(PoisonError::into_inner);
            // A newer message may have been shown while this timer was firing.
            if active.generation == generation {
                active.hide_timer = None;
                view.hide_status();
            }
        }));
    }
}

impl Drop for StatusBoard {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = active.hide_timer.take() {
            timer.abort();
        }
    }
}
