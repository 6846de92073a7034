use apcusim::subsystems::{
    ApcuController, BitStatus, BoardCheck, BoardData, BoardStatus, Channel, ChannelEvent, CheckResult,
    Quadrant, Subsystem, TemperatureMonitor, TemperatureStatus, TripStatus, CHANNELS_PER_QUADRANT,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(test)]
mod channel_tests {
    use super::*;

    #[test]
    fn test_channel_initialization() {
        let mut rng = StdRng::seed_from_u64(1);
        let channel = Channel::new(7, 2, &mut rng);
        let state = channel.get_state();

        assert_eq!(state.index, 7);
        assert_eq!(state.quadrant, 2);
        assert!(state.on);
        assert_eq!(state.trip_status, TripStatus::Normal);
        assert_eq!(state.bit_status, BitStatus::Normal);
        assert!(state.voltage >= 27.85 && state.voltage <= 28.15);
        assert!(state.current >= 0.06 && state.current <= 0.70);
        assert_eq!(channel.health_score(), 100.0);
        assert!(channel.is_healthy());
    }

    #[test]
    fn test_channel_values_stay_bounded_under_full_degradation() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut channel = Channel::new(0, 0, &mut rng);

        for _ in 0..20_000 {
            channel.step(1.0, &mut rng);
            assert!(channel.voltage() >= 26.0 && channel.voltage() <= 29.0);
            assert!(channel.current() >= 0.0 && channel.current() <= 1.0);
            let score = channel.health_score();
            assert!((0.0..=100.0).contains(&score));
        }
    }

    #[test]
    fn test_tripped_channel_is_never_on() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut channel = Channel::new(4, 1, &mut rng);
        let mut saw_trip = false;

        for _ in 0..20_000 {
            channel.step(1.0, &mut rng);
            if channel.trip_status() == TripStatus::Tripped {
                saw_trip = true;
                assert!(!channel.is_on());
            }
        }

        // At 2.2% per tick a trip over this many ticks is a certainty
        assert!(saw_trip);
    }

    #[test]
    fn test_channel_event_transitions() {
        let mut channel = Channel::nominal(0, 0);

        channel.apply(ChannelEvent::Trip);
        assert!(channel.is_tripped());
        assert!(!channel.is_on());
        assert_eq!(channel.health_score(), 20.0);

        channel.apply(ChannelEvent::Fault);
        assert!(channel.is_faulted());
        assert_eq!(channel.health_score(), 0.0);

        channel.apply(ChannelEvent::TripCleared);
        assert!(channel.is_on());
        assert_eq!(channel.health_score(), 80.0);

        channel.apply(ChannelEvent::FaultCleared);
        channel.apply(ChannelEvent::PowerOff);
        assert_eq!(channel.health_score(), 50.0);

        channel.apply(ChannelEvent::PowerOn);
        assert_eq!(channel.health_score(), 100.0);
    }
}

#[cfg(test)]
mod quadrant_tests {
    use super::*;

    #[test]
    fn test_quadrant_identity() {
        let quadrant = Quadrant::nominal(1);
        assert_eq!(quadrant.name(), "Quadrant 1 (CF)");
        assert_eq!(quadrant.code(), "CF");
        assert_eq!(quadrant.channels().len(), CHANNELS_PER_QUADRANT);
        for (i, channel) in quadrant.channels().iter().enumerate() {
            assert_eq!(channel.index() as usize, i);
            assert_eq!(channel.quadrant(), 1);
        }
    }

    #[test]
    fn test_quadrant_health_is_channel_mean() {
        let mut quadrant = Quadrant::nominal(0);
        assert_eq!(quadrant.health_score(), 100.0);

        // Four channels at 50 out of sixteen
        for channel in quadrant.channels_mut().iter_mut().take(4) {
            channel.apply(ChannelEvent::PowerOff);
        }
        assert_eq!(quadrant.health_score(), 87.5);
        assert_eq!(quadrant.active_count(), 12);

        quadrant.channels_mut()[5].apply(ChannelEvent::Trip);
        let summary = quadrant.get_state();
        assert_eq!(summary.active, 11);
        assert_eq!(summary.tripped, 1);
        assert_eq!(summary.faulted, 0);
    }
}

#[cfg(test)]
mod thermal_tests {
    use super::*;

    #[test]
    fn test_thermal_nominal_state() {
        let thermal = TemperatureMonitor::new();
        let state = thermal.get_state();

        assert_eq!(state.sensor_a_c, 41.79);
        assert_eq!(state.sensor_b_c, 49.10);
        assert_eq!(state.sensor_c_c, 42.78);
        assert_eq!(state.status, TemperatureStatus::Normal);
        assert_eq!(thermal.health_score(), 100.0);
    }

    #[test]
    fn test_thermal_penalties_and_status() {
        let mut thermal = TemperatureMonitor::new();

        thermal.set_sensors([56.0, 45.0, 45.0]);
        assert_eq!(thermal.health_score(), 90.0);
        assert_eq!(thermal.status(), TemperatureStatus::Normal);

        thermal.set_sensors([61.0, 61.0, 45.0]);
        assert_eq!(thermal.health_score(), 60.0);
        assert_eq!(thermal.status(), TemperatureStatus::Warning);

        thermal.set_sensors([66.0, 66.0, 66.0]);
        assert_eq!(thermal.health_score(), 40.0);
        assert_eq!(thermal.status(), TemperatureStatus::Critical);

        thermal.set_sensors([120.0, 10.0, 45.0]);
        assert_eq!(thermal.sensors(), [70.0, 30.0, 45.0]);
    }

    #[test]
    fn test_thermal_drift_bounded() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut thermal = TemperatureMonitor::new();

        for _ in 0..10_000 {
            thermal.step(1.0, &mut rng);
            for reading in thermal.sensors() {
                assert!((30.0..=70.0).contains(&reading));
            }
            assert_eq!(thermal.status(), TemperatureStatus::from_max_temp(thermal.max_temp()));
        }
    }
}

#[cfg(test)]
mod board_tests {
    use super::*;

    #[test]
    fn test_board_data_bounds_and_health() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut board = BoardData::new();
        assert_eq!(board.input_voltage(), 27.85);
        assert_eq!(board.input_current(), 5.33);

        for _ in 0..10_000 {
            board.step(1.0, &mut rng);
            assert!((25.0..=30.0).contains(&board.input_voltage()));
            assert!((3.0..=8.0).contains(&board.input_current()));
        }

        board.set_input_voltage(26.0);
        assert_eq!(board.health_score(), 70.0);
        board.set_input_voltage(28.0);
        assert_eq!(board.health_score(), 100.0);
    }

    #[test]
    fn test_board_status_scoring() {
        let mut status = BoardStatus::new();
        assert_eq!(status.health_score(), 100.0);

        status.set_check(BoardCheck::Cbit, CheckResult::Fail);
        status.set_check(BoardCheck::Pbit, CheckResult::Fail);
        status.set_check(BoardCheck::CrcUserFlash, CheckResult::Fail);
        assert_eq!(status.pass_count(), 3);
        assert_eq!(status.health_score(), 50.0);

        let state = status.get_state();
        assert_eq!(state.cbit, CheckResult::Fail);
        assert_eq!(state.crc_factory_flash, CheckResult::Pass);
    }

    #[test]
    fn test_board_checks_recover() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut status = BoardStatus::new();
        for check in BoardCheck::ALL {
            status.set_check(check, CheckResult::Fail);
        }
        assert_eq!(status.health_score(), 0.0);

        // 10% recovery per check per tick
        for _ in 0..500 {
            status.step(0.0, &mut rng);
        }
        assert!(status.pass_count() > 0);
    }
}

#[cfg(test)]
mod controller_tests {
    use super::*;

    #[test]
    fn test_controller_nominal() {
        let controller = ApcuController::new();
        assert_eq!(controller.link_status(), [true; 4]);
        assert!(controller.sequence_on());
        assert_eq!(controller.array_voltage(), 27.87);
        assert_eq!(controller.array_current(), 22.35);
        assert_eq!(controller.health_score(), 100.0);
    }

    #[test]
    fn test_controller_health_follows_links() {
        let mut controller = ApcuController::new();
        controller.set_link(2, false);
        assert_eq!(controller.links_up(), 3);
        assert_eq!(controller.health_score(), 75.0);

        for q in 0..4 {
            controller.set_link(q, false);
        }
        assert_eq!(controller.health_score(), 0.0);
    }

    #[test]
    fn test_controller_array_bounded() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut controller = ApcuController::new();

        for _ in 0..10_000 {
            controller.step(1.0, &mut rng);
            assert!((25.0..=30.0).contains(&controller.array_voltage()));
            assert!((15.0..=30.0).contains(&controller.array_current()));
        }
    }
}
