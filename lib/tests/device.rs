// Copyright (c) 2022-2023 The TurtleCoin Developers

//! Device handle protocol tests against scripted and mock transports

use std::sync::{Arc, Mutex};

use ledger_cn::{DeviceEvent, DeviceHandle, Error};
use ledger_cn_apdu::{
    frame_request,
    ring::GenerateRingSignaturesReq,
    DeviceError, Key, Signature,
};

mod helpers;
use helpers::{init_logger, MockDevice, ScriptedTransport};

#[tokio::test]
async fn version_round_trip() -> anyhow::Result<()> {
    init_logger();

    // Exact on-the-wire script: framed VERSION request, 1.2.3 response
    let (t, requests) = ScriptedTransport::new(&[(
        &[0xe0, 0x01, 0x01, 0x00, 0x00, 0x00],
        &[0x01, 0x02, 0x03, 0x90, 0x00],
    )]);

    let device = DeviceHandle::new(t);
    let version = device.version().await?;

    assert_eq!((version.major, version.minor, version.patch), (1, 2, 3));
    assert_eq!(requests.lock().unwrap().len(), 1);

    Ok(())
}

#[tokio::test]
async fn malformed_hex_fails_without_transport_io() {
    init_logger();

    // Hex validation happens at key construction, before any client call
    let err = Error::from(Key::from_hex(&"zz".repeat(32)).unwrap_err());
    assert!(matches!(err, Error::InvalidArgument(_)));

    // Local argument validation also never reaches the transport
    let (t, requests) = ScriptedTransport::new(&[]);
    let device = DeviceHandle::new(t);

    let result = device
        .tx_load_input(
            &Key::from_bytes([0x01; 32]),
            0,
            100,
            &[Key::from_bytes([0x02; 32]); 3],
            &[1, 2, 3],
            0,
        )
        .await;

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(requests.lock().unwrap().is_empty(), "transport was touched");
}

#[tokio::test]
async fn out_of_range_indexes_fail_locally() {
    init_logger();

    let (t, requests) = ScriptedTransport::new(&[]);
    let device = DeviceHandle::new(t);

    // Input output index above the u8 device bound
    let result = device
        .tx_load_input(
            &Key::from_bytes([0x01; 32]),
            256,
            100,
            &[Key::from_bytes([0x02; 32]); 4],
            &[1, 2, 3, 4],
            0,
        )
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));

    // Participant counts above the device maximum
    let result = device
        .tx_start(0, 91, 1, &Key::from_bytes([0x03; 32]), None)
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));

    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn oversized_payload_fails_locally() {
    init_logger();

    let (t, requests) = ScriptedTransport::new(&[]);
    let device = DeviceHandle::new(t);

    // 8 keys + 8 signatures = 32 + 32 + 256 + 512 bytes, over the APDU limit
    let keys = vec![Key::from_bytes([0x01; 32]); 8];
    let signatures = vec![Signature::from_bytes([0x02; 64]); 8];

    let result = device
        .check_ring_signatures(
            &Key::from_bytes([0x03; 32]),
            &Key::from_bytes([0x04; 32]),
            &keys,
            &signatures,
        )
        .await;

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn observer_events_mirror_the_exchange() -> anyhow::Result<()> {
    init_logger();

    let (t, _requests) = ScriptedTransport::new(&[(
        &[0xe0, 0x01, 0x01, 0x00, 0x00, 0x00],
        &[0x01, 0x02, 0x03, 0x90, 0x00],
    )]);

    let device = DeviceHandle::new(t);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    device.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    device.version().await?;

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            DeviceEvent::Send("e00101000000".to_string()),
            DeviceEvent::Receive("0102039000".to_string()),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn body_error_code_supersedes_status_word() {
    init_logger();

    let (t, _state) = MockDevice::new();
    let device = DeviceHandle::new(t);

    // The mock refuses spend key export with a 0x9400 body code under a
    // generic failure status word
    let result = device.spend_esecret_key(true).await;

    assert!(matches!(
        result,
        Err(Error::Device(DeviceError::PrivateSpend))
    ));
}

#[tokio::test]
async fn ring_signature_count_mismatch_is_rejected() -> anyhow::Result<()> {
    init_logger();

    let tx_pub = Key::from_bytes([0x01; 32]);
    let out_key = Key::from_bytes([0x02; 32]);
    let prefix = Key::from_bytes([0x03; 32]);
    let keys = vec![Key::from_bytes([0x04; 32]), Key::from_bytes([0x05; 32])];

    // Script the exact request the client will frame, but answer with a
    // single signature where two were requested
    let expected = frame_request(
        &GenerateRingSignaturesReq::new(tx_pub, 1, out_key, prefix, keys.clone(), 0),
        true,
    )?;

    let mut response = vec![0x55u8; 64];
    response.extend_from_slice(&[0x90, 0x00]);

    let (t, _requests) = ScriptedTransport::new(&[(&expected, &response)]);
    let device = DeviceHandle::new(t);

    let result = device
        .generate_ring_signatures(&tx_pub, 1, &out_key, &prefix, &keys, 0, true)
        .await;

    assert!(matches!(result, Err(Error::UnexpectedResponse(_))));

    Ok(())
}

#[tokio::test]
async fn empty_ring_is_rejected_locally() {
    init_logger();

    let (t, requests) = ScriptedTransport::new(&[]);
    let device = DeviceHandle::new(t);

    let result = device
        .generate_ring_signatures(
            &Key::from_bytes([0x01; 32]),
            0,
            &Key::from_bytes([0x02; 32]),
            &Key::from_bytes([0x03; 32]),
            &[],
            0,
            true,
        )
        .await;

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mock_device_basics() -> anyhow::Result<()> {
    init_logger();

    let (t, _state) = MockDevice::new();
    let device = DeviceHandle::new(t);

    assert!(device.is_debug().await?);
    assert_eq!(device.ident().await?, "deadbeef");
    assert!(device.check_key(&Key::from_bytes([0x01; 32])).await?);

    let keys = device.public_keys(true).await?;
    assert_eq!(keys.spend, Key::from_bytes(helpers::SPEND_PUB));
    assert_eq!(keys.view, helpers::view_public());

    Ok(())
}
