// Panel controller behaviour over an in-memory serial line

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::timeout;

use kb_link::event::EventReceiver;
use kb_link::{
    BuzzerMode, KbError, LedColor, LedMode, Listener, PanelConfig, PanelController, PanelEvent,
};

const WAIT: Duration = Duration::from_secs(2);
const CARD_FRAME: &[u8] = &[
    0x02, 0x43, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x31, 0x03,
];

/// Start a controller on one end of a pipe and consume its initial status query.
async fn connect() -> (PanelController, DuplexStream) {
    let (host, mut device) = tokio::io::duplex(256);
    let panel = PanelController::from_stream(host, &PanelConfig::default())
        .await
        .unwrap();

    let mut query = [0u8; 3];
    timeout(WAIT, device.read_exact(&mut query))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(query, [0x02, b'S', 0x03]);
    (panel, device)
}

async fn next_event(events: &mut EventReceiver) -> PanelEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for panel event")
        .expect("event channel closed")
}

async fn read_frame(device: &mut DuplexStream, len: usize) -> Vec<u8> {
    let mut frame = vec![0u8; len];
    timeout(WAIT, device.read_exact(&mut frame))
        .await
        .unwrap()
        .unwrap();
    frame
}

fn counting_listener() -> (Listener, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let listener: Listener = Arc::new(move |card_id: &str| {
        sink.lock().unwrap().push(card_id.to_string());
    });
    (listener, seen)
}

#[tokio::test]
async fn test_modes_unknown_before_first_sync() {
    let (panel, _device) = connect().await;
    assert!(matches!(
        panel.get_led_mode(LedColor::Green).await,
        Err(KbError::UnknownMode { byte: 0 })
    ));
    assert!(matches!(
        panel.get_buzzer_mode().await,
        Err(KbError::UnknownMode { .. })
    ));
    assert!(panel.is_link_up());
}

#[tokio::test]
async fn test_status_sync_sets_all_modes() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    device
        .write_all(&[0x02, b'S', 0x30, 0x31, 0x32, 0x31, 0x03])
        .await
        .unwrap();

    match next_event(&mut events).await {
        PanelEvent::StatusSynced(status) => assert_eq!(status.as_bytes(), b"0121"),
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(panel.get_led_mode(LedColor::Green).await.unwrap(), LedMode::Off);
    assert_eq!(panel.get_led_mode(LedColor::Orange).await.unwrap(), LedMode::On);
    assert_eq!(panel.get_led_mode(LedColor::Red).await.unwrap(), LedMode::Blink);
    assert_eq!(panel.get_buzzer_mode().await.unwrap(), BuzzerMode::On);
}

#[tokio::test]
async fn test_corrupt_status_byte_surfaces_on_query() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    device.write_all(b"\x02S0910\x03").await.unwrap();
    next_event(&mut events).await;

    assert_eq!(panel.get_led_mode(LedColor::Green).await.unwrap(), LedMode::Off);
    assert!(matches!(
        panel.get_led_mode(LedColor::Orange).await,
        Err(KbError::UnknownMode { byte: b'9' })
    ));
    assert_eq!(panel.get_buzzer_mode().await.unwrap(), BuzzerMode::Off);
}

#[tokio::test]
async fn test_set_led_mode_is_optimistic() {
    let (panel, mut device) = connect().await;

    panel.set_led_mode(LedColor::Red, LedMode::On).await.unwrap();
    assert_eq!(panel.get_led_mode(LedColor::Red).await.unwrap(), LedMode::On);
    // Other channels are untouched
    assert!(panel.get_led_mode(LedColor::Green).await.is_err());

    assert_eq!(read_frame(&mut device, 6).await, b"\x02XX1X\x03");
}

#[tokio::test]
async fn test_set_buzzer_mode() {
    let (panel, mut device) = connect().await;

    panel.set_buzzer_mode(BuzzerMode::ContinuousPulse).await.unwrap();
    assert_eq!(
        panel.get_buzzer_mode().await.unwrap(),
        BuzzerMode::ContinuousPulse
    );
    assert_eq!(read_frame(&mut device, 6).await, b"\x02XXX4\x03");
}

#[tokio::test]
async fn test_status_sync_overwrites_local_changes() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    panel.set_led_mode(LedColor::Green, LedMode::Blink).await.unwrap();
    device.write_all(b"\x02S0000\x03").await.unwrap();
    next_event(&mut events).await;

    assert_eq!(panel.get_led_mode(LedColor::Green).await.unwrap(), LedMode::Off);
    assert_eq!(panel.status().await.as_bytes(), b"0000");
}

#[tokio::test]
async fn test_card_scan_reaches_each_listener_once() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    let (first, seen_first) = counting_listener();
    let (second, seen_second) = counting_listener();
    let id = panel.add_listener(first.clone());
    assert_eq!(panel.add_listener(first), id);
    panel.add_listener(second);

    device.write_all(CARD_FRAME).await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        PanelEvent::CardScanned {
            card_id: "00000001".to_string()
        }
    );
    assert_eq!(*seen_first.lock().unwrap(), vec!["00000001".to_string()]);
    assert_eq!(*seen_second.lock().unwrap(), vec!["00000001".to_string()]);
}

#[tokio::test]
async fn test_removed_listener_is_not_called() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    let (listener, seen) = counting_listener();
    let id = panel.add_listener(listener);
    assert!(panel.remove_listener(id));

    device.write_all(CARD_FRAME).await.unwrap();
    next_event(&mut events).await;
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_panicking_listener_keeps_link_up() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    panel.add_listener(Arc::new(|_: &str| panic!("listener failure")));
    let (listener, seen) = counting_listener();
    panel.add_listener(listener);

    device.write_all(CARD_FRAME).await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        PanelEvent::CardScanned { .. }
    ));
    assert_eq!(*seen.lock().unwrap(), vec!["00000001".to_string()]);

    // The read task must still be processing frames
    device.write_all(b"\x02S0121\x03").await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        PanelEvent::StatusSynced(_)
    ));
    assert_eq!(panel.get_led_mode(LedColor::Green).await.unwrap(), LedMode::Off);
    assert!(panel.is_link_up());
}

#[tokio::test]
async fn test_zero_event_capacity_is_clamped() {
    let (host, mut device) = tokio::io::duplex(256);
    let config = PanelConfig {
        event_capacity: 0,
        ..PanelConfig::default()
    };
    let panel = PanelController::from_stream(host, &config).await.unwrap();
    assert_eq!(read_frame(&mut device, 3).await, b"\x02S\x03");

    let mut events = panel.subscribe();
    device.write_all(CARD_FRAME).await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        PanelEvent::CardScanned { .. }
    ));
}

#[tokio::test]
async fn test_frames_split_into_single_bytes() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    panel.add_listener(Arc::new(move |_: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    for byte in CARD_FRAME {
        device.write_all(&[*byte]).await.unwrap();
        device.flush().await.unwrap();
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        next_event(&mut events).await,
        PanelEvent::CardScanned { .. }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_noise_and_unknown_frames_are_skipped() {
    let (panel, mut device) = connect().await;
    let mut events = panel.subscribe();

    let mut data = b"\xFF\xFEjunk".to_vec();
    data.extend_from_slice(b"\x02Q0000\x03");
    data.extend_from_slice(b"\x02S01\x03");
    data.extend_from_slice(CARD_FRAME);
    device.write_all(&data).await.unwrap();

    assert_eq!(
        next_event(&mut events).await,
        PanelEvent::CardScanned {
            card_id: "00000001".to_string()
        }
    );
    assert!(panel.get_led_mode(LedColor::Green).await.is_err());
    assert!(panel.is_link_up());
}

#[tokio::test]
async fn test_concurrent_commands_do_not_interleave() {
    let (panel, mut device) = connect().await;
    let panel = Arc::new(panel);

    let mut tasks = Vec::new();
    for color in LedColor::ALL {
        let panel = panel.clone();
        tasks.push(tokio::spawn(async move {
            panel.set_led_mode(color, LedMode::Blink).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let wire = read_frame(&mut device, 18).await;
    let mut frames: Vec<&[u8]> = wire.chunks(6).collect();
    frames.sort();
    assert_eq!(
        frames,
        vec![&b"\x022XXX\x03"[..], &b"\x02X2XX\x03"[..], &b"\x02XX2X\x03"[..]]
    );
    for color in LedColor::ALL {
        assert_eq!(panel.get_led_mode(color).await.unwrap(), LedMode::Blink);
    }
}

#[tokio::test]
async fn test_link_down_when_device_disappears() {
    let (panel, device) = connect().await;
    let mut events = panel.subscribe();

    drop(device);

    assert!(matches!(
        next_event(&mut events).await,
        PanelEvent::LinkDown { .. }
    ));
    assert!(!panel.is_link_up());

    let err = panel
        .set_led_mode(LedColor::Green, LedMode::On)
        .await
        .unwrap_err();
    assert!(matches!(err, KbError::TransportIo(_)));
}

#[tokio::test]
async fn test_close_stops_link() {
    let (mut panel, _device) = connect().await;
    panel.close().await.unwrap();
    assert!(!panel.is_link_up());
}

#[tokio::test]
async fn test_request_status_resends_query() {
    let (panel, mut device) = connect().await;
    panel.request_status().await.unwrap();
    assert_eq!(read_frame(&mut device, 3).await, b"\x02S\x03");
}

#[tokio::test]
async fn test_led_and_buzzer_handles() {
    use kb_link::{PanelBuzzer, PanelLed};

    let (panel, mut device) = connect().await;
    let panel = Arc::new(panel);

    let leds = PanelLed::all(&panel);
    assert_eq!(leds.len(), 3);
    assert_eq!(leds[1].name(), "Orange LED");

    leds[1].turn_on(Some(LedMode::Blink)).await.unwrap();
    assert!(leds[1].is_on().await.unwrap());
    assert_eq!(read_frame(&mut device, 6).await, b"\x02X2XX\x03");

    leds[2].turn_on(None).await.unwrap();
    assert_eq!(leds[2].mode().await.unwrap(), LedMode::On);
    leds[2].turn_off().await.unwrap();
    assert!(!leds[2].is_on().await.unwrap());
    assert_eq!(read_frame(&mut device, 12).await, b"\x02XX1X\x03\x02XX0X\x03");

    let buzzer = PanelBuzzer::new(panel.clone());
    assert_eq!(buzzer.name(), "Buzzer");
    buzzer.turn_on().await.unwrap();
    assert_eq!(buzzer.mode().await.unwrap(), BuzzerMode::On);
    buzzer.turn_off().await.unwrap();
    assert!(!buzzer.is_on().await.unwrap());
    assert_eq!(read_frame(&mut device, 12).await, b"\x02XXX1\x03\x02XXX0\x03");
}
