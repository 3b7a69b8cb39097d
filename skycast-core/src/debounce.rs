use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};

/// Quiet period before typed search text is sent to geocoding.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// A value that settles only after it has stopped changing for `quiet`.
///
/// Every `set` restarts the timer, so a burst of updates publishes just the
/// last one. The settling task is aborted when this is dropped.
#[derive(Debug)]
pub struct Debounced<T> {
    raw: watch::Sender<T>,
    settled: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> Debounced<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(initial: T, quiet: Duration) -> Self {
        let (raw, mut raw_rx) = watch::channel(initial.clone());
        let (settled_tx, settled) = watch::channel(initial);

        let task = tokio::spawn(async move {
            while raw_rx.changed().await.is_ok() {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(quiet) => {
                            let value = raw_rx.borrow_and_update().clone();
                            settled_tx.send_if_modified(|current| {
                                if *current == value {
                                    return false;
                                }
                                *current = value;
                                true
                            });
                            break;
                        }
                        changed = raw_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Self { raw, settled, task }
    }

    pub fn set(&self, value: T) {
        self.raw.send_replace(value);
    }

    /// The latest value handed to `set`.
    pub fn raw(&self) -> T {
        self.raw.borrow().clone()
    }

    /// The last value that survived the quiet period.
    pub fn current(&self) -> T {
        self.settled.borrow().clone()
    }

    pub fn is_settled(&self) -> bool {
        *self.raw.borrow() == *self.settled.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.clone()
    }
}

impl<T> Drop for Debounced<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        // let the background task observe the channel before time moves
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_publishes_only_last_value() {
        let text = Debounced::new(String::new(), SEARCH_DEBOUNCE);
        let mut rx = text.subscribe();
        rx.borrow_and_update();

        for prefix in ["L", "Lo", "Lon", "Lond", "London"] {
            text.set(prefix.to_string());
            settle().await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        assert_eq!(text.current(), "");
        assert!(!text.is_settled());

        tokio::time::advance(SEARCH_DEBOUNCE).await;
        settle().await;

        assert_eq!(text.current(), "London");
        assert!(text.is_settled());
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "London");
    }

    #[tokio::test(start_paused = true)]
    async fn pause_between_edits_publishes_each() {
        let text = Debounced::new(String::new(), SEARCH_DEBOUNCE);

        text.set("Par".into());
        settle().await;
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(text.current(), "Par");

        text.set("Paris".into());
        settle().await;
        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(text.current(), "Paris");
    }

    #[tokio::test(start_paused = true)]
    async fn raw_is_visible_immediately() {
        let text = Debounced::new(0u32, SEARCH_DEBOUNCE);
        text.set(3);
        assert_eq!(text.raw(), 3);
        assert_eq!(text.current(), 0);
    }
}
