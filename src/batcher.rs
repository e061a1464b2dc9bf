use crate::debounce::Debouncer;
use crate::event::{Event, ObjectId, Properties, ScreenSource};
use crate::transport::Transport;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Duration;
use tracing::{debug, trace};

pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(1000);

type Pending = Arc<Mutex<Vec<Event>>>;

pub struct EventBatcher {
    pending: Pending,
    transport: Arc<dyn Transport>,
    screen: Arc<dyn ScreenSource>,
    debouncer: Debouncer,
}

impl EventBatcher {
    pub fn spawn(
        transport: Arc<dyn Transport>,
        screen: Arc<dyn ScreenSource>,
        quiescence: Duration,
    ) -> Self {
        let pending: Pending = Arc::new(Mutex::new(Vec::new()));

        let flush_pending = Arc::clone(&pending);
        let flush_transport = Arc::clone(&transport);
        let debouncer = Debouncer::spawn(quiescence, move || {
            let batch = take_pending(&flush_pending);
            if batch.is_empty() {
                return;
            }
            let transport = Arc::clone(&flush_transport);
            tokio::spawn(async move {
                transmit(transport.as_ref(), batch).await;
            });
        });

        Self {
            pending,
            transport,
            screen,
            debouncer,
        }
    }

    pub fn record(
        &self,
        action: &str,
        object_type: &str,
        object_id: impl Into<ObjectId>,
        properties: Option<Properties>,
    ) {
        let event = Event::new(
            action,
            object_type,
            object_id.into(),
            self.screen.screen(),
            properties,
        );
        trace!(action, object_type, object_id = %event.object_id, "event recorded");

        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        self.debouncer.touch();
    }

    pub fn pending_len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn quiescence(&self) -> Duration {
        self.debouncer.window()
    }

    /// Takes whatever is queued right now and waits for it to be transmitted.
    /// Meant for process shutdown; a failed send is still dropped.
    pub async fn drain(&self) {
        let batch = take_pending(&self.pending);
        if batch.is_empty() {
            return;
        }
        transmit(self.transport.as_ref(), batch).await;
    }
}

fn take_pending(pending: &Mutex<Vec<Event>>) -> Vec<Event> {
    std::mem::take(&mut *pending.lock().unwrap_or_else(PoisonError::into_inner))
}

async fn transmit(transport: &dyn Transport, batch: Vec<Event>) {
    let size = batch.len();
    match transport.send(&batch).await {
        Ok(()) => debug!(events = size, "event batch sent"),
        Err(error) => debug!(events = size, %error, "event batch dropped"),
    }
}
