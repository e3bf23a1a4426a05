//! Activation and deactivation flows through the `Push` facade

use push_activation::activation::transport::DeregistrationAuth;
use push_activation::{ActivationEvent, ActivationState, ErrorInfo, PushError, PUSH_ERROR_DOMAIN};

use crate::common::*;

#[tokio::test]
async fn test_activate_then_push_token_registers() {
    let store = RecordingStore::new();
    let transport = MockTransport::new();
    let delegate = TestDelegate::new();
    let push = push_with(store.clone(), transport.clone(), Some(delegate.clone())).await;
    let mut transitions = observe(&push);

    push.activate().await.unwrap();
    assert_eq!(push.current_state(), ActivationState::WaitingForPushDeviceDetails);

    // activating twice changes nothing
    push.activate().await.unwrap();
    assert_eq!(push.current_state(), ActivationState::WaitingForPushDeviceDetails);
    assert_eq!(transport.registers(), 0);
    assert!(delegate.callbacks().is_empty());

    push.did_register_for_remote_notifications("apns-token")
        .await
        .unwrap();
    let registered = wait_for(&mut transitions, "GotDeviceRegistration").await;
    assert_eq!(registered.from, ActivationState::WaitingForDeviceRegistration);
    assert_eq!(registered.to, ActivationState::WaitingForNewPushDeviceDetails);

    assert_eq!(transport.registers(), 1);
    assert_eq!(delegate.callbacks(), vec![Callback::Activated(None)]);
    assert!(push.identity_token_details().await.is_some());
    assert!(store.contains(&keys().identity_token()));
    assert_eq!(
        store.get(&keys().current_state()).as_deref(),
        Some(&b"WaitingForNewPushDeviceDetails"[..])
    );

    // activating a registered device only reports success again
    push.activate().await.unwrap();
    assert_eq!(transport.registers(), 1);
    assert_eq!(
        delegate.callbacks(),
        vec![Callback::Activated(None), Callback::Activated(None)]
    );
}

#[tokio::test]
async fn test_activate_with_known_push_token_registers_immediately() {
    let store = RecordingStore::new();
    let transport = MockTransport::new();
    let delegate = TestDelegate::new();
    let push = push_with(store.clone(), transport.clone(), Some(delegate.clone())).await;
    let mut transitions = observe(&push);

    // a token without an activation intent registers nothing
    push.did_register_for_remote_notifications("apns-token")
        .await
        .unwrap();
    assert_eq!(push.current_state(), ActivationState::NotActivated);
    assert_eq!(transport.registers(), 0);

    push.activate().await.unwrap();
    wait_for(&mut transitions, "GotDeviceRegistration").await;

    assert_eq!(transport.registers(), 1);
    assert_eq!(push.current_state(), ActivationState::WaitingForNewPushDeviceDetails);
    assert_eq!(delegate.callbacks(), vec![Callback::Activated(None)]);
    assert!(!store.contains(&keys().pending_events()));
}

#[tokio::test]
async fn test_registration_failure_reports_error() {
    let store = RecordingStore::new();
    let transport = MockTransport::new();
    let error = ErrorInfo::new(40100, "unauthorized").with_status(401);
    transport.fail_register(error.clone());
    let delegate = TestDelegate::new();
    let push = push_with(store.clone(), transport.clone(), Some(delegate.clone())).await;
    let mut transitions = observe(&push);

    push.activate().await.unwrap();
    push.did_register_for_remote_notifications("apns-token")
        .await
        .unwrap();
    let failed = wait_for(&mut transitions, "GettingDeviceRegistrationFailed").await;

    assert_eq!(failed.to, ActivationState::NotActivated);
    assert_eq!(push.current_state(), ActivationState::NotActivated);
    assert_eq!(delegate.callbacks(), vec![Callback::Activated(Some(error))]);
    assert!(push.identity_token_details().await.is_none());
    assert!(!store.contains(&keys().identity_token()));
}

#[tokio::test]
async fn test_deactivate_when_not_activated() {
    let transport = MockTransport::new();
    let delegate = TestDelegate::new();
    let push = push_with(RecordingStore::new(), transport.clone(), Some(delegate.clone())).await;

    push.deactivate().await.unwrap();

    assert_eq!(push.current_state(), ActivationState::NotActivated);
    assert_eq!(delegate.callbacks(), vec![Callback::Deactivated(None)]);
    assert_eq!(transport.deregisters(), 0);
}

#[tokio::test]
async fn test_deactivate_while_waiting_for_push_token() {
    let transport = MockTransport::new();
    let delegate = TestDelegate::new();
    let push = push_with(RecordingStore::new(), transport.clone(), Some(delegate.clone())).await;

    push.activate().await.unwrap();
    push.deactivate().await.unwrap();

    assert_eq!(push.current_state(), ActivationState::NotActivated);
    assert_eq!(delegate.callbacks(), vec![Callback::Deactivated(None)]);
    assert_eq!(transport.deregisters(), 0);
}

async fn registered(
    store: std::sync::Arc<RecordingStore>,
    transport: std::sync::Arc<MockTransport>,
    delegate: std::sync::Arc<TestDelegate>,
) -> (
    push_activation::Push,
    tokio::sync::mpsc::UnboundedReceiver<Transition>,
) {
    let push = push_with(store, transport.clone(), Some(delegate)).await;
    let mut transitions = observe(&push);
    push.activate().await.unwrap();
    push.did_register_for_remote_notifications("apns-token")
        .await
        .unwrap();
    transport.release();
    wait_for(&mut transitions, "GotDeviceRegistration").await;
    (push, transitions)
}

#[tokio::test]
async fn test_deregistration_clears_identity_token() {
    let store = RecordingStore::new();
    let transport = MockTransport::new();
    let delegate = TestDelegate::new();
    let (push, mut transitions) = registered(store.clone(), transport.clone(), delegate.clone()).await;

    push.deactivate().await.unwrap();
    let deregistered = wait_for(&mut transitions, "GotDeregistered").await;

    assert_eq!(deregistered.to, ActivationState::NotActivated);
    assert_eq!(transport.deregisters(), 1);
    assert_eq!(
        transport.auths(),
        vec![DeregistrationAuth::DeviceIdentityToken("MTIzNDU2".to_string())]
    );
    assert!(push.identity_token_details().await.is_none());
    assert!(!store.contains(&keys().identity_token()));
    assert_eq!(
        delegate.callbacks(),
        vec![Callback::Activated(None), Callback::Deactivated(None)]
    );
}

#[tokio::test]
async fn test_deregistration_failure_then_retry() {
    let store = RecordingStore::new();
    let transport = MockTransport::new();
    let delegate = TestDelegate::new();
    let (push, mut transitions) = registered(store.clone(), transport.clone(), delegate.clone()).await;

    let error = ErrorInfo::new(50000, "service unavailable").with_status(503);
    transport.fail_deregister(error.clone());
    push.deactivate().await.unwrap();
    let failed = wait_for(&mut transitions, "GettingDeregistrationFailed").await;

    assert_eq!(failed.to, ActivationState::WaitingForDeregistration);
    assert_eq!(push.current_state(), ActivationState::WaitingForDeregistration);
    assert_eq!(delegate.callbacks().last(), Some(&Callback::Deactivated(Some(error))));
    assert!(push.identity_token_details().await.is_some());

    // a new deactivation retries the call
    transport.succeed_deregister();
    push.deactivate().await.unwrap();
    wait_for(&mut transitions, "GotDeregistered").await;

    assert_eq!(transport.deregisters(), 2);
    assert_eq!(push.current_state(), ActivationState::NotActivated);
    assert_eq!(delegate.callbacks().last(), Some(&Callback::Deactivated(None)));
}

#[tokio::test]
async fn test_deactivate_while_deregistering_issues_no_second_call() {
    let store = RecordingStore::new();
    let transport = MockTransport::gated();
    let delegate = TestDelegate::new();
    let (push, mut transitions) = registered(store.clone(), transport.clone(), delegate.clone()).await;

    push.deactivate().await.unwrap();
    push.deactivate().await.unwrap();
    assert_eq!(push.current_state(), ActivationState::WaitingForDeregistration);
    assert!(store.contains(&keys().pending_events()));

    transport.release();
    wait_for(&mut transitions, "GotDeregistered").await;
    let queued = wait_for(&mut transitions, "CalledDeactivate").await;

    assert_eq!(queued.from, ActivationState::NotActivated);
    assert_eq!(transport.deregisters(), 1);
    assert_eq!(push.current_state(), ActivationState::NotActivated);
    assert!(!store.contains(&keys().pending_events()));
}

#[tokio::test]
async fn test_events_queue_behind_outstanding_registration() {
    let store = RecordingStore::new();
    let transport = MockTransport::gated();
    let delegate = TestDelegate::new();
    let push = push_with(store.clone(), transport.clone(), Some(delegate.clone())).await;
    let mut transitions = observe(&push);

    push.activate().await.unwrap();
    push.did_register_for_remote_notifications("apns-token")
        .await
        .unwrap();
    assert_eq!(push.current_state(), ActivationState::WaitingForDeviceRegistration);

    push.activate().await.unwrap();
    assert_eq!(push.current_state(), ActivationState::WaitingForDeviceRegistration);
    let pending: Vec<ActivationEvent> =
        serde_json::from_slice(&store.get(&keys().pending_events()).unwrap()).unwrap();
    assert_eq!(pending, vec![ActivationEvent::CalledActivate]);

    transport.release();
    wait_for(&mut transitions, "GotDeviceRegistration").await;
    let queued = wait_for(&mut transitions, "CalledActivate").await;

    assert_eq!(queued.from, ActivationState::WaitingForNewPushDeviceDetails);
    assert_eq!(transport.registers(), 1);
    assert_eq!(
        delegate.callbacks(),
        vec![Callback::Activated(None), Callback::Activated(None)]
    );
    assert!(!store.contains(&keys().pending_events()));
}

#[tokio::test]
async fn test_rejected_queued_event_does_not_stall_the_queue() {
    let store = RecordingStore::new();
    let transport = MockTransport::gated();
    let delegate = TestDelegate::new();
    let push = push_with(store.clone(), transport.clone(), Some(delegate.clone())).await;
    let mut transitions = observe(&push);

    push.activate().await.unwrap();
    push.did_register_for_remote_notifications("apns-token")
        .await
        .unwrap();
    push.deactivate().await.unwrap();
    push.activate().await.unwrap();
    push.set_delegate(None).await;

    transport.release();
    wait_for(&mut transitions, "GotDeviceRegistration").await;
    let rejected = wait_for(&mut transitions, "CalledDeactivate").await;
    assert_eq!(rejected.from, ActivationState::WaitingForNewPushDeviceDetails);
    assert_eq!(rejected.to, ActivationState::WaitingForNewPushDeviceDetails);
    let drained = wait_for(&mut transitions, "CalledActivate").await;
    assert_eq!(drained.from, ActivationState::WaitingForNewPushDeviceDetails);

    assert_eq!(push.current_state(), ActivationState::WaitingForNewPushDeviceDetails);
    assert!(!store.contains(&keys().pending_events()));
    assert_eq!(transport.deregisters(), 0);
    assert!(delegate.callbacks().is_empty());

    push.set_delegate(Some(delegate.clone())).await;
    push.deactivate().await.unwrap();
    transport.release();
    wait_for(&mut transitions, "GotDeregistered").await;
    assert_eq!(push.current_state(), ActivationState::NotActivated);
    assert_eq!(delegate.callbacks(), vec![Callback::Deactivated(None)]);
}

#[tokio::test]
async fn test_registration_without_delegate_is_a_configuration_error() {
    let transport = MockTransport::new();
    let push = push_with(RecordingStore::new(), transport.clone(), None).await;
    let mut transitions = observe(&push);

    push.activate().await.unwrap();
    let result = push.did_register_for_remote_notifications("apns-token").await;

    assert!(matches!(result, Err(PushError::ConfigurationError(_))));
    assert_eq!(push.current_state(), ActivationState::WaitingForPushDeviceDetails);
    assert_eq!(transport.registers(), 0);

    let delegate = TestDelegate::new();
    push.set_delegate(Some(delegate.clone())).await;
    push.machine()
        .send(ActivationEvent::GotPushDeviceDetails)
        .await
        .unwrap();
    wait_for(&mut transitions, "GotDeviceRegistration").await;

    assert_eq!(transport.registers(), 1);
    assert_eq!(delegate.callbacks(), vec![Callback::Activated(None)]);
}

#[tokio::test]
async fn test_unexpected_event_is_ignored() {
    let store = RecordingStore::new();
    let delegate = TestDelegate::new();
    let push = push_with(store.clone(), MockTransport::new(), Some(delegate.clone())).await;
    let mut transitions = observe(&push);

    push.machine()
        .send(ActivationEvent::GotDeregistered)
        .await
        .unwrap();
    let ignored = wait_for(&mut transitions, "GotDeregistered").await;

    assert_eq!(ignored.from, ActivationState::NotActivated);
    assert_eq!(ignored.to, ActivationState::NotActivated);
    assert!(delegate.callbacks().is_empty());
    assert!(!store.keys_written().contains(&keys().current_state()));
}

#[tokio::test]
async fn test_platform_failure_is_forwarded() {
    let delegate = TestDelegate::new();
    let push = push_with(RecordingStore::new(), MockTransport::new(), Some(delegate.clone())).await;

    let platform = ErrorInfo {
        domain: "platform".to_string(),
        code: 3010,
        status_code: None,
        message: "remote notifications unavailable".to_string(),
    };
    push.did_fail_to_register_for_remote_notifications(&platform)
        .await;

    let callbacks = delegate.callbacks();
    assert_eq!(callbacks.len(), 1);
    match &callbacks[0] {
        Callback::FailedToRegister(Some(err)) => {
            assert_eq!(err.domain, PUSH_ERROR_DOMAIN);
            assert_eq!(err.code, 3010);
        }
        other => panic!("unexpected callback {:?}", other),
    }
    assert_eq!(push.current_state(), ActivationState::NotActivated);
}
