use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

pub struct Debouncer {
    touches: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
    window: Duration,
}

impl Debouncer {
    /// Starts the timer task. Must be called from within a tokio runtime.
    pub fn spawn<F>(window: Duration, mut on_fire: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (touches, mut receiver) = mpsc::unbounded_channel::<()>();

        let task = tokio::spawn(async move {
            while receiver.recv().await.is_some() {
                loop {
                    tokio::select! {
                        touched = receiver.recv() => {
                            if touched.is_none() {
                                return;
                            }
                        }
                        _ = sleep(window) => break,
                    }
                }
                on_fire();
            }
        });

        Self {
            touches,
            task,
            window,
        }
    }

    pub fn touch(&self) {
        let _ = self.touches.send(());
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
