/// Session controller: one client surface's connection to the timer
///
/// The controller binds to the `ServiceHost` in the background, then mirrors
/// the service's elapsed/running channels into channels it owns, so
/// observers keep a stable receiver across reconnects. Commands sent before
/// the binding exists are dropped, not queued.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::timer::format_elapsed;
use crate::timer::service::{Binding, ServiceHost, TimerHandle};

struct Shared {
    binding: Mutex<Option<Binding>>,
    mirrors: Mutex<Vec<JoinHandle<()>>>,
    elapsed: watch::Sender<u64>,
    running: watch::Sender<bool>,
    connected: watch::Sender<bool>,
}

pub struct SessionController {
    shared: Arc<Shared>,
    connecting: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Start connecting to the host's timer service
    ///
    /// Returns immediately; the binding is made on a spawned task. Use
    /// `wait_connected` to wait for it.
    pub fn attach(host: Arc<ServiceHost>) -> Self {
        let shared = Arc::new(Shared {
            binding: Mutex::new(None),
            mirrors: Mutex::new(Vec::new()),
            elapsed: watch::channel(0).0,
            running: watch::channel(false).0,
            connected: watch::channel(false).0,
        });

        let task_shared = shared.clone();
        let connecting = tokio::spawn(async move {
            tokio::task::yield_now().await;
            match host.bind(true) {
                Some(binding) => Self::on_connected(task_shared, binding),
                None => debug!("Timer service unavailable"),
            }
        });

        Self {
            shared,
            connecting: Mutex::new(Some(connecting)),
        }
    }

    fn on_connected(shared: Arc<Shared>, binding: Binding) {
        let handle = binding.handle().clone();

        let mut mirrors = Vec::with_capacity(2);
        mirrors.push(Self::mirror(handle.subscribe_elapsed(), shared.clone(), |s, v| {
            s.elapsed.send_replace(v);
        }));
        mirrors.push(Self::mirror(handle.subscribe_running(), shared.clone(), |s, v| {
            s.running.send_replace(v);
        }));

        if let Ok(mut slot) = shared.mirrors.lock() {
            slot.extend(mirrors);
        }
        if let Ok(mut slot) = shared.binding.lock() {
            *slot = Some(binding);
        }
        shared.connected.send_replace(true);
        debug!("Session controller connected");
    }

    /// Copy every value from `source` into the controller's own channel
    fn mirror<T, F>(mut source: watch::Receiver<T>, shared: Arc<Shared>, publish: F) -> JoinHandle<()>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&Shared, T) + Send + 'static,
    {
        tokio::spawn(async move {
            loop {
                let value = source.borrow_and_update().clone();
                publish(shared.as_ref(), value);
                if source.changed().await.is_err() {
                    // Service gone; the last value stays published
                    break;
                }
            }
        })
    }

    fn with_handle(&self, action: &str, f: impl FnOnce(&TimerHandle) -> bool) -> bool {
        let binding = match self.shared.binding.lock() {
            Ok(binding) => binding,
            Err(_) => return false,
        };
        match binding.as_ref() {
            Some(binding) => f(binding.handle()),
            None => {
                debug!("Timer {} dropped, not connected yet", action);
                false
            }
        }
    }

    /// Start or resume the session. Returns `false` if the command was dropped.
    pub fn start(&self, label: &str) -> bool {
        self.with_handle("start", |h| h.start(label))
    }

    pub fn pause(&self) -> bool {
        self.with_handle("pause", TimerHandle::pause)
    }

    pub fn stop(&self) -> bool {
        self.with_handle("stop", TimerHandle::stop)
    }

    pub fn reset(&self) -> bool {
        self.with_handle("reset", TimerHandle::reset)
    }

    /// Stop the session and wait for the service to handle it
    ///
    /// Returns the elapsed time the session froze at, read from the service
    /// rather than the mirror so a tick still in flight is included. `None`
    /// if the command was dropped or the service went away.
    pub async fn stop_and_read(&self) -> Option<u64> {
        let (mut running, elapsed) = {
            let binding = self.shared.binding.lock().ok()?;
            let handle = binding.as_ref()?.handle();
            if !handle.stop() {
                return None;
            }
            (handle.subscribe_running(), handle.subscribe_elapsed())
        };
        running.wait_for(|r| !*r).await.ok()?;
        let millis = *elapsed.borrow();
        Some(millis)
    }

    pub fn is_connected(&self) -> bool {
        *self.shared.connected.borrow()
    }

    /// Wait until the binding is established
    pub async fn wait_connected(&self) {
        let mut connected = self.shared.connected.subscribe();
        let _ = connected.wait_for(|c| *c).await;
    }

    pub fn elapsed_ms(&self) -> u64 {
        *self.shared.elapsed.borrow()
    }

    pub fn is_running(&self) -> bool {
        *self.shared.running.borrow()
    }

    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.shared.elapsed.subscribe()
    }

    pub fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.shared.running.subscribe()
    }

    /// Render elapsed time for display
    pub fn format_time(&self, millis: u64) -> String {
        format_elapsed(millis)
    }

    /// Stop mirroring and release the binding. The session keeps running.
    pub fn detach(&self) {
        if let Ok(mut connecting) = self.connecting.lock() {
            if let Some(task) = connecting.take() {
                task.abort();
            }
        }
        if let Ok(mut mirrors) = self.shared.mirrors.lock() {
            for task in mirrors.drain(..) {
                task.abort();
            }
        }
        let binding = self.shared.binding.lock().ok().and_then(|mut b| b.take());
        if let Some(binding) = binding {
            binding.unbind();
            debug!("Session controller detached");
        }
        self.shared.connected.send_replace(false);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.detach();
    }
}
