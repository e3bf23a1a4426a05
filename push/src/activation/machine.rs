//! Activation state machine runner.
//!
//! A single task owns the current state and processes events one at a time.
//! Handles talk to it over a command channel; registration calls run on
//! their own tasks and report back through the same channel, so only one
//! (de)registration is ever outstanding. Events sent while a call is
//! outstanding wait in the pending queue, which is persisted until drained.
//!
//! The state entry is written before the queue is rewritten. A crash between
//! the two writes replays the last event on restart.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::activation::delegate::RegistererDelegate;
use crate::activation::dispatch;
use crate::activation::event::ActivationEvent;
use crate::activation::state::ActivationState;
use crate::activation::transition::{transition, DeviceView, SideEffect};
use crate::activation::transport::{DeregistrationAuth, RegistrationTransport};
use crate::device::LocalDevice;
use crate::errors::{ErrorInfo, PushError};
use crate::storage::layout::StorageKeys;
use crate::storage::store::StateStore;

/// Instrumentation hook notified of every processed `(event, from, to)`
pub type TransitionObserver =
    Arc<dyn Fn(&ActivationEvent, ActivationState, ActivationState) + Send + Sync>;

enum Command {
    Send {
        event: ActivationEvent,
        reply: oneshot::Sender<Result<(), PushError>>,
    },
    Complete(ActivationEvent),
    SetDelegate(Option<Arc<dyn RegistererDelegate>>),
    SetObserver(Option<TransitionObserver>),
}

/// Handle to a running activation state machine. Cheap to clone.
#[derive(Clone)]
pub struct ActivationStateMachine {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ActivationState>,
}

impl std::fmt::Debug for ActivationStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationStateMachine")
            .field("current", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl ActivationStateMachine {
    /// Restore the persisted state and pending events, then start the
    /// runner. Restoration only reads from the store; pending events are
    /// replayed by the runner before any new command.
    pub async fn start(
        store: Arc<dyn StateStore>,
        keys: StorageKeys,
        device: Arc<RwLock<LocalDevice>>,
        transport: Arc<dyn RegistrationTransport>,
        delegate: Option<Arc<dyn RegistererDelegate>>,
    ) -> Result<Self, PushError> {
        let current = match store.read(&keys.current_state()).await? {
            Some(bytes) => {
                let tag = String::from_utf8_lossy(&bytes);
                ActivationState::from_tag(&tag).ok_or_else(|| {
                    PushError::StorageError(format!("Unknown persisted activation state: {}", tag))
                })?
            }
            None => ActivationState::NotActivated,
        };

        let queue: VecDeque<ActivationEvent> = match store.read(&keys.pending_events()).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PushError::StorageError(format!("Corrupt pending events entry: {}", e))
            })?,
            None => VecDeque::new(),
        };

        info!(
            "Restored activation state {} with {} pending event(s)",
            current,
            queue.len()
        );

        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(current);

        let runner = Runner {
            current,
            pending_persisted: !queue.is_empty(),
            queue,
            outstanding: false,
            fault: None,
            store,
            keys,
            device,
            transport,
            delegate,
            observer: None,
            state_tx,
            commands: commands.downgrade(),
        };
        tokio::spawn(runner.run(receiver));

        Ok(Self { commands, state })
    }

    /// Submit an event and wait until it is processed or queued.
    ///
    /// Returns an error only for storage and configuration failures;
    /// registration failures surface through the delegate.
    pub async fn send(&self, event: ActivationEvent) -> Result<(), PushError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Send { event, reply })
            .map_err(|_| stopped())?;
        response.await.map_err(|_| stopped())?
    }

    /// Current state
    pub fn current(&self) -> ActivationState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<ActivationState> {
        self.state.clone()
    }

    /// Replace the delegate; applies to events processed after this call
    pub fn set_delegate(&self, delegate: Option<Arc<dyn RegistererDelegate>>) {
        if self.commands.send(Command::SetDelegate(delegate)).is_err() {
            warn!("Activation state machine stopped, delegate not set");
        }
    }

    pub fn set_observer(&self, observer: Option<TransitionObserver>) {
        if self.commands.send(Command::SetObserver(observer)).is_err() {
            warn!("Activation state machine stopped, observer not set");
        }
    }
}

fn stopped() -> PushError {
    PushError::ConfigurationError("Activation state machine is not running".to_string())
}

struct Runner {
    current: ActivationState,
    queue: VecDeque<ActivationEvent>,
    /// Whether the pending-events key currently exists in the store
    pending_persisted: bool,
    /// A (de)registration call is in flight
    outstanding: bool,
    /// Set after a storage failure; every later event is rejected
    fault: Option<String>,
    store: Arc<dyn StateStore>,
    keys: StorageKeys,
    device: Arc<RwLock<LocalDevice>>,
    transport: Arc<dyn RegistrationTransport>,
    delegate: Option<Arc<dyn RegistererDelegate>>,
    observer: Option<TransitionObserver>,
    state_tx: watch::Sender<ActivationState>,
    commands: mpsc::WeakUnboundedSender<Command>,
}

impl Runner {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        if !self.queue.is_empty() {
            info!("Replaying {} pending activation event(s)", self.queue.len());
            if let Err(e) = self.drain().await {
                error!("Failed to replay pending activation events: {}", e);
            }
        }

        while let Some(command) = commands.recv().await {
            match command {
                Command::Send { event, reply } => {
                    let result = self.accept(event).await;
                    if reply.send(result).is_err() {
                        debug!("Sender stopped waiting for the activation result");
                    }
                }
                Command::Complete(event) => self.complete(event).await,
                Command::SetDelegate(delegate) => self.delegate = delegate,
                Command::SetObserver(observer) => self.observer = observer,
            }
        }

        debug!("Activation state machine stopped in {}", self.current);
    }

    async fn accept(&mut self, event: ActivationEvent) -> Result<(), PushError> {
        if let Some(fault) = &self.fault {
            return Err(PushError::StorageError(fault.clone()));
        }

        self.queue.push_back(event);
        if self.outstanding {
            debug!(
                "Queued {} behind the outstanding registration call ({} pending)",
                self.queue.back().map(ActivationEvent::name).unwrap_or_default(),
                self.queue.len()
            );
            return match self.persist_queue().await {
                Ok(()) => Ok(()),
                Err(e) => Err(self.fail(e)),
            };
        }

        self.drain().await
    }

    /// Outcome of the outstanding call; handled before anything queued
    async fn complete(&mut self, event: ActivationEvent) {
        self.outstanding = false;

        if let Some(fault) = &self.fault {
            error!("Dropping {} after storage failure: {}", event, fault);
            return;
        }

        let result = match self.process(event).await {
            Ok(()) => self.drain().await,
            Err(e) => Err(self.fail(e)),
        };
        if let Err(e) = result {
            error!("Failed to handle registration outcome: {}", e);
        }
    }

    /// Process queued events until the queue empties or a call is in
    /// flight. A rejected event does not stop the drain; the first rejection
    /// is returned once the queue is persisted.
    async fn drain(&mut self) -> Result<(), PushError> {
        let mut rejected = None;
        while !self.outstanding {
            let Some(event) = self.queue.pop_front() else {
                break;
            };

            let pending = event.clone();
            if let Err(e) = self.process(event).await {
                let err = self.fail(e);
                if self.fault.is_some() {
                    return Err(err);
                }
                warn!("Rejected {} in state {}: {}", pending, self.current, err);
                self.notify(&pending, self.current, self.current);
                rejected.get_or_insert(err);
            }
        }

        if let Err(e) = self.persist_queue().await {
            return Err(self.fail(e));
        }
        match rejected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn process(&mut self, event: ActivationEvent) -> Result<(), PushError> {
        let from = self.current;
        let view = DeviceView::from(&*self.device.read().await);
        let step = transition(from, &event, view);

        if !step.handled {
            warn!("Ignoring {} in state {}", event, from);
            self.notify(&event, from, from);
            return Ok(());
        }

        let delegate = match &self.delegate {
            Some(delegate) => Some(delegate.clone()),
            None if step.effects.iter().any(SideEffect::is_async) => {
                return Err(PushError::ConfigurationError(format!(
                    "A registerer delegate is required to handle {} in {}",
                    event, from
                )));
            }
            None => None,
        };

        for effect in &step.effects {
            match effect {
                SideEffect::PersistIdentityToken(details) => {
                    let mut device = self.device.write().await;
                    device.set_identity_token_details(details.clone()).await?;
                }
                SideEffect::ClearIdentityToken => {
                    let mut device = self.device.write().await;
                    device.clear_identity_token_details().await?;
                }
                _ => {}
            }
        }

        if step.next != from {
            self.store
                .write(&self.keys.current_state(), step.next.tag().as_bytes())
                .await?;
            info!("Activation state {} -> {} on {}", from, step.next, event);
        } else {
            debug!("Activation state {} unchanged on {}", from, event);
        }
        self.current = step.next;
        self.state_tx.send_replace(step.next);

        for effect in step.effects.iter().rev() {
            if let SideEffect::Enqueue(next) = effect {
                self.queue.push_front(next.clone());
            }
        }
        self.persist_queue().await?;

        for effect in step.effects {
            match effect {
                SideEffect::CallActivated(err) => match &delegate {
                    Some(d) => d.did_activate(err.as_ref()),
                    None => debug!("No registerer delegate, skipping did_activate"),
                },
                SideEffect::CallDeactivated(err) => match &delegate {
                    Some(d) => d.did_deactivate(err.as_ref()),
                    None => debug!("No registerer delegate, skipping did_deactivate"),
                },
                SideEffect::CallRegistrationFailed(err) => match &delegate {
                    Some(d) => d.did_fail_to_register(err.as_ref()),
                    None => debug!("No registerer delegate, skipping did_fail_to_register"),
                },
                SideEffect::Register => {
                    if let Some(d) = &delegate {
                        let device = self.device.read().await.details();
                        let call = dispatch::register(device, d.clone(), self.transport.clone());
                        self.spawn_call(call, ActivationEvent::GettingDeviceRegistrationFailed);
                    }
                }
                SideEffect::Deregister => {
                    if let Some(d) = &delegate {
                        let (device_id, auth) = {
                            let device = self.device.read().await;
                            let auth = DeregistrationAuth::for_device(
                                device.secret(),
                                device.identity_token_details(),
                            );
                            (device.id().to_string(), auth)
                        };
                        let call =
                            dispatch::deregister(device_id, auth, d.clone(), self.transport.clone());
                        self.spawn_call(call, ActivationEvent::GettingDeregistrationFailed);
                    }
                }
                SideEffect::PersistIdentityToken(_)
                | SideEffect::ClearIdentityToken
                | SideEffect::Enqueue(_) => {}
            }
        }

        self.notify(&event, from, self.current);
        Ok(())
    }

    /// Run `call` on its own task. A call that panics still completes, with
    /// the failure event built by `aborted`.
    fn spawn_call<F>(&mut self, call: F, aborted: fn(ErrorInfo) -> ActivationEvent)
    where
        F: std::future::Future<Output = ActivationEvent> + Send + 'static,
    {
        let Some(commands) = self.commands.upgrade() else {
            warn!("Activation state machine has no handles left, registration call skipped");
            return;
        };

        self.outstanding = true;
        let handle = tokio::spawn(call);
        tokio::spawn(async move {
            let event = match handle.await {
                Ok(event) => event,
                Err(e) => {
                    error!("Registration call aborted: {}", e);
                    aborted(ErrorInfo::from(PushError::DelegateCallbackError(ErrorInfo::new(
                        50000,
                        format!("registration call aborted: {}", e),
                    ))))
                }
            };
            if commands.send(Command::Complete(event)).is_err() {
                warn!("Activation state machine stopped before the registration call finished");
            }
        });
    }

    /// Mirror the queue into the pending-events key, deleting it once empty
    async fn persist_queue(&mut self) -> Result<(), PushError> {
        let key = self.keys.pending_events();
        if self.queue.is_empty() {
            if self.pending_persisted {
                self.store.delete(&key).await?;
                self.pending_persisted = false;
            }
        } else {
            let bytes = serde_json::to_vec(&self.queue)?;
            self.store.write(&key, &bytes).await?;
            self.pending_persisted = true;
        }
        Ok(())
    }

    fn notify(&self, event: &ActivationEvent, from: ActivationState, to: ActivationState) {
        if let Some(observer) = &self.observer {
            observer(event, from, to);
        }
    }

    fn fail(&mut self, err: PushError) -> PushError {
        if err.poisons_state() {
            error!("Activation state machine halted: {}", err);
            self.fault = Some(match &err {
                PushError::StorageError(message) => message.clone(),
                other => other.to_string(),
            });
        }
        err
    }
}
