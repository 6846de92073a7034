use apcusim::agent::{ApcuAgent, FrameKind, MAX_FRAMES_PER_TICK};
use apcusim::config::{ComponentId, SimulationMode, SimulatorConfig, TransportKind};
use apcusim::agent::AgentError;
use apcusim::protocol::{parse_health_message, subsystem_of, ProtocolError, MAX_DATAGRAM_SIZE};
use apcusim::subsystems::SubsystemId;

fn test_config(id: &str) -> SimulatorConfig {
    SimulatorConfig::new(ComponentId::new(id).unwrap())
}

#[test]
fn test_agent_lifecycle() {
    let config = test_config("component_1");
    let mut agent = ApcuAgent::seeded(&config, 1);

    assert!(!agent.is_running());
    assert!(agent.update().unwrap().is_none());
    assert_eq!(agent.stats().ticks, 0);

    agent.start();
    assert!(agent.is_running());
    assert!(agent.update().unwrap().is_some());
    assert_eq!(agent.stats().ticks, 1);

    agent.stop();
    assert!(agent.update().unwrap().is_none());
    assert_eq!(agent.stats().ticks, 1);
}

#[test]
fn test_frames_per_tick() {
    let config = test_config("component_2");
    let mut agent = ApcuAgent::seeded(&config, 2);
    agent.start();

    // Full telemetry rides on every fifth tick, starting with the first
    for tick in 0..11u64 {
        let frames = agent.update().unwrap().unwrap();
        let expected = if tick % 5 == 0 { MAX_FRAMES_PER_TICK } else { MAX_FRAMES_PER_TICK - 1 };
        assert_eq!(frames.len(), expected, "tick {}", tick);

        assert_eq!(frames[0].kind, FrameKind::Health);
        for (frame, id) in frames[1..=10].iter().zip(SubsystemId::ALL) {
            assert_eq!(frame.kind, FrameKind::Subsystem(id));
        }
        if tick % 5 == 0 {
            assert_eq!(frames[11].kind, FrameKind::FullTelemetry);
        }
    }

    assert_eq!(agent.stats().full_telemetry_sent, 3);
    assert_eq!(agent.stats().frames_encoded, 3 * 12 + 8 * 11);
}

#[test]
fn test_full_telemetry_can_be_disabled() {
    let mut config = test_config("component_basic");
    config.full_telemetry = false;
    let mut agent = ApcuAgent::seeded(&config, 3);
    agent.start();

    for _ in 0..6 {
        let frames = agent.update().unwrap().unwrap();
        assert_eq!(frames.len(), MAX_FRAMES_PER_TICK - 1);
        assert!(frames.iter().all(|f| f.kind != FrameKind::FullTelemetry));
    }
    assert_eq!(agent.stats().full_telemetry_sent, 0);
}

#[test]
fn test_same_seed_same_run() {
    let config = test_config("component_det");
    let mut a = ApcuAgent::seeded(&config, 1234);
    let mut b = ApcuAgent::seeded(&config, 1234);
    a.start();
    b.start();

    for _ in 0..50 {
        let frames_a = a.update().unwrap().unwrap();
        let frames_b = b.update().unwrap().unwrap();
        assert_eq!(frames_a, frames_b);
    }
    assert_eq!(a.state().degradation(), b.state().degradation());
}

#[test]
fn test_every_frame_is_a_valid_health_message() {
    let mut config = test_config("component_wire");
    config.mode = SimulationMode::Degraded;
    let mut agent = ApcuAgent::seeded(&config, 77);
    agent.start();

    for _ in 0..10 {
        for frame in agent.update().unwrap().unwrap().iter() {
            let message = parse_health_message(frame.payload.as_bytes()).unwrap();
            assert_eq!(message.component_id, "component_wire");
            assert!(message.status().is_some());
            assert!((0.0..=100.0).contains(&message.size));
        }
    }
}

#[test]
fn test_mode_sets_initial_degradation() {
    let mut config = test_config("component_crit");
    config.mode = SimulationMode::Critical;
    let agent = ApcuAgent::seeded(&config, 5);
    assert_eq!(agent.state().degradation(), 0.7);
    assert_eq!(agent.codec().transport(), TransportKind::Tcp);

    config.transport = TransportKind::Udp;
    let agent = ApcuAgent::seeded(&config, 5);
    assert_eq!(agent.codec().transport(), TransportKind::Udp);
}

#[test]
fn test_encode_does_not_advance_state() {
    let config = test_config("component_enc");
    let mut agent = ApcuAgent::seeded(&config, 8);
    agent.start();
    agent.update().unwrap();

    let first = agent.encode_frames(1).unwrap();
    let second = agent.encode_frames(1).unwrap();
    assert_eq!(first, second);
    assert_eq!(agent.stats().ticks, 1);
}

#[test]
fn test_subsystem_frame_kind_matches_payload() {
    let config = test_config("component_kinds");
    let mut agent = ApcuAgent::seeded(&config, 31);
    agent.start();

    let frames = agent.update().unwrap().unwrap();
    let mut subsystem_frames = 0;
    for frame in frames.iter() {
        let name = subsystem_of(frame.payload.as_bytes());
        match frame.kind {
            FrameKind::Subsystem(id) => {
                subsystem_frames += 1;
                assert_eq!(name.as_deref(), Some(id.display_name()));
            }
            FrameKind::Health | FrameKind::FullTelemetry => assert_eq!(name, None),
        }
    }
    assert_eq!(subsystem_frames, SubsystemId::ALL.len());
}

#[test]
fn test_long_component_id_is_carried_through() {
    let id = "antenna_array_left_quadrant_controller_unit_serial_0000000000000001";
    let config = test_config(id);
    assert!(config.validate().is_ok());

    let mut agent = ApcuAgent::seeded(&config, 4);
    agent.start();
    for frame in agent.update().unwrap().unwrap().iter() {
        let message = parse_health_message(frame.payload.as_bytes()).unwrap();
        assert_eq!(message.component_id, id);
    }
}

#[test]
fn test_failed_encode_counts_nothing_as_sent() {
    // Too large for any datagram, so the very first payload fails to encode
    let mut config = test_config(&"x".repeat(MAX_DATAGRAM_SIZE));
    config.transport = TransportKind::Udp;
    let mut agent = ApcuAgent::seeded(&config, 6);
    agent.start();

    let result = agent.update();
    assert!(matches!(
        result,
        Err(AgentError::Protocol(ProtocolError::MessageTooLarge { .. }))
    ));
    assert_eq!(agent.stats().full_telemetry_sent, 0);
    assert_eq!(agent.stats().frames_encoded, 0);
}

#[test]
fn test_full_telemetry_count_matches_frames_returned() {
    let config = test_config("component_count");
    let mut agent = ApcuAgent::seeded(&config, 9);
    agent.start();

    let mut returned = 0u64;
    for _ in 0..23 {
        let frames = agent.update().unwrap().unwrap();
        returned += frames.iter().filter(|f| f.kind == FrameKind::FullTelemetry).count() as u64;
    }
    assert_eq!(returned, 5);
    assert_eq!(agent.stats().full_telemetry_sent, returned);
}
