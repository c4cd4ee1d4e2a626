//! Ending a session after a period of silence.

use std::{
    fmt::{self, Debug, Formatter},
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};

/// The user interactions which count as "still here".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Activity {
    PointerMove,
    PointerDown,
    KeyPress,
    Touch,
}

impl Activity {
    pub const ALL: [Activity; 4] = [
        Activity::PointerMove,
        Activity::PointerDown,
        Activity::KeyPress,
        Activity::Touch,
    ];
}

/// Calls a function once `timeout` passes without a [`touch()`].
///
/// There is at most one countdown at a time. Calling [`start()`] again
/// replaces the previous countdown rather than adding a second one.
///
/// [`touch()`]: InactivityTimer::touch
/// [`start()`]: InactivityTimer::start
pub struct InactivityTimer {
    timeout: Duration,
    on_expire: Arc<dyn Fn() + Send + Sync>,
    running: Mutex<Option<Countdown>>,
}

struct Countdown {
    activity: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl InactivityTimer {
    pub fn new<F>(timeout: Duration, on_expire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        InactivityTimer {
            timeout,
            on_expire: Arc::new(on_expire),
            running: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration { self.timeout }

    /// Begin (or restart) the countdown.
    ///
    /// This needs to be called from inside a tokio runtime. Outside of one
    /// the timer stays disarmed.
    pub fn start(&self) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!("No async runtime, inactivity timer disabled");
                return;
            },
        };

        let (activity, mut signals) = mpsc::unbounded_channel();
        let timeout = self.timeout;
        let on_expire = Arc::clone(&self.on_expire);

        let task = handle.spawn(async move {
            loop {
                match tokio::time::timeout(timeout, signals.recv()).await {
                    Ok(Some(())) => continue,
                    Ok(None) => return,
                    Err(_) => {
                        log::info!(
                            "No activity for {:?}, ending the session",
                            timeout
                        );
                        on_expire();
                        return;
                    },
                }
            }
        });

        if let Some(previous) =
            self.countdown().replace(Countdown { activity, task })
        {
            previous.task.abort();
        }
    }

    /// Push the deadline back by a full timeout. Returns `false` when the
    /// timer isn't running.
    pub fn touch(&self) -> bool {
        match &*self.countdown() {
            Some(countdown) => countdown.activity.send(()).is_ok(),
            None => false,
        }
    }

    /// Cancel the countdown without calling the expiry function.
    pub fn stop(&self) {
        if let Some(countdown) = self.countdown().take() {
            countdown.task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.countdown()
            .as_ref()
            .map_or(false, |countdown| !countdown.task.is_finished())
    }

    fn countdown(&self) -> MutexGuard<'_, Option<Countdown>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for InactivityTimer {
    fn drop(&mut self) { self.stop(); }
}

impl Debug for InactivityTimer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InactivityTimer")
            .field("timeout", &self.timeout)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(60 * 60);

    fn counting_timer() -> (InactivityTimer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = InactivityTimer::new(TIMEOUT, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        (timer, fired)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_the_timeout() {
        let (timer, fired) = counting_timer();
        timer.start();
        settle().await;

        tokio::time::advance(TIMEOUT + Duration::from_secs(1)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_pushes_the_deadline_back() {
        let (timer, fired) = counting_timer();
        timer.start();
        settle().await;

        tokio::time::advance(TIMEOUT - Duration::from_secs(1)).await;
        assert!(timer.touch());
        settle().await;
        tokio::time::advance(TIMEOUT - Duration::from_secs(1)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_never_fires() {
        let (timer, fired) = counting_timer();
        timer.start();
        settle().await;

        timer.stop();
        tokio::time::advance(TIMEOUT * 2).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timer.touch());
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_the_countdown() {
        let (timer, fired) = counting_timer();
        timer.start();
        timer.start();
        settle().await;

        tokio::time::advance(TIMEOUT * 2).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn start_without_a_runtime_is_a_no_op() {
        let (timer, _) = counting_timer();

        timer.start();

        assert!(!timer.is_running());
    }
}
