//! Push SDK facade

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::activation::delegate::RegistererDelegate;
use crate::activation::event::ActivationEvent;
use crate::activation::machine::{ActivationStateMachine, TransitionObserver};
use crate::activation::state::ActivationState;
use crate::activation::transport::RegistrationTransport;
use crate::app::options::PushOptions;
use crate::device::{DeviceDetails, IdentityTokenDetails, LocalDevice};
use crate::errors::{ErrorInfo, PushError};
use crate::http::client::HttpClient;
use crate::storage::store::{FileStore, StateStore};

/// Push notification entry point of the SDK.
///
/// Owns the local device, the registration transport and the activation
/// state machine.
pub struct Push {
    device: Arc<RwLock<LocalDevice>>,
    machine: ActivationStateMachine,
    delegate: RwLock<Option<Arc<dyn RegistererDelegate>>>,
}

impl Push {
    /// Open an instance persisted under the options' storage layout
    pub async fn open(
        options: &PushOptions,
        delegate: Option<Arc<dyn RegistererDelegate>>,
    ) -> Result<Self, PushError> {
        let store = Arc::new(FileStore::new(options.layout.state_dir()));
        Self::init(options, store, delegate).await
    }

    /// Create an instance registering over HTTP
    pub async fn init(
        options: &PushOptions,
        store: Arc<dyn StateStore>,
        delegate: Option<Arc<dyn RegistererDelegate>>,
    ) -> Result<Self, PushError> {
        let client = HttpClient::new(
            &options.rest.base_url,
            options.rest.api_key.clone(),
            options.http_timeout(),
        )?;
        Self::with_transport(options, store, Arc::new(client), delegate).await
    }

    /// Create an instance with an explicit registration transport
    pub async fn with_transport(
        options: &PushOptions,
        store: Arc<dyn StateStore>,
        transport: Arc<dyn RegistrationTransport>,
        delegate: Option<Arc<dyn RegistererDelegate>>,
    ) -> Result<Self, PushError> {
        let keys = options.keys();
        let device = LocalDevice::load(store.clone(), keys.clone(), options.device.clone()).await?;
        info!("Push initialized for device {}", device.id());

        let device = Arc::new(RwLock::new(device));
        let machine = ActivationStateMachine::start(
            store,
            keys,
            device.clone(),
            transport,
            delegate.clone(),
        )
        .await?;

        Ok(Self {
            device,
            machine,
            delegate: RwLock::new(delegate),
        })
    }

    /// Register the device for push notifications
    pub async fn activate(&self) -> Result<(), PushError> {
        self.machine.send(ActivationEvent::CalledActivate).await
    }

    /// Deregister the device
    pub async fn deactivate(&self) -> Result<(), PushError> {
        self.machine.send(ActivationEvent::CalledDeactivate).await
    }

    /// The platform issued a push token
    pub async fn did_register_for_remote_notifications(
        &self,
        token: impl Into<String>,
    ) -> Result<(), PushError> {
        self.device
            .write()
            .await
            .set_push_token(Some(token.into()))
            .await?;
        self.machine.send(ActivationEvent::GotPushDeviceDetails).await
    }

    /// The platform refused to issue a push token
    pub async fn did_fail_to_register_for_remote_notifications(&self, error: &ErrorInfo) {
        warn!("Platform push registration failed: {}", error);
        match self.delegate.read().await.as_ref() {
            Some(delegate) => delegate.did_fail_to_register(Some(&ErrorInfo::from_host(error))),
            None => warn!("No registerer delegate to report the platform failure to"),
        }
    }

    pub async fn set_delegate(&self, delegate: Option<Arc<dyn RegistererDelegate>>) {
        *self.delegate.write().await = delegate.clone();
        self.machine.set_delegate(delegate);
    }

    pub fn set_observer(&self, observer: Option<TransitionObserver>) {
        self.machine.set_observer(observer);
    }

    /// Snapshot of the local device
    pub async fn device(&self) -> DeviceDetails {
        self.device.read().await.details()
    }

    pub async fn identity_token_details(&self) -> Option<IdentityTokenDetails> {
        self.device.read().await.identity_token_details().cloned()
    }

    pub fn current_state(&self) -> ActivationState {
        self.machine.current()
    }

    pub fn machine(&self) -> &ActivationStateMachine {
        &self.machine
    }
}
