use apcusim::health::{classify, color_for, HealthAggregator, HealthStatus};
use apcusim::state::{ControllerState, OperatingMode, ResetSource};
use apcusim::subsystems::{BoardCheck, ChannelEvent, CheckResult, Subsystem, SubsystemId};
use apcusim::{ComponentId, SimulationMode};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn fresh_state(seed: u64) -> ControllerState {
    let mut rng = StdRng::seed_from_u64(seed);
    ControllerState::new(ComponentId::new("component_1").unwrap(), 0.0, &mut rng)
}

#[cfg(test)]
mod classification_tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(classify(90.0), HealthStatus::Operational);
        assert_eq!(classify(89.99), HealthStatus::Warning);
        assert_eq!(classify(70.0), HealthStatus::Warning);
        assert_eq!(classify(40.0), HealthStatus::Degraded);
        assert_eq!(classify(10.0), HealthStatus::Critical);
        assert_eq!(classify(9.99), HealthStatus::Offline);
    }

    #[test]
    fn test_every_status_has_a_distinct_color() {
        let statuses = [
            HealthStatus::Operational,
            HealthStatus::Warning,
            HealthStatus::Degraded,
            HealthStatus::Critical,
            HealthStatus::Offline,
        ];
        for status in statuses {
            assert_eq!(HealthStatus::from_color(color_for(status)), Some(status));
        }
    }
}

#[cfg(test)]
mod aggregation_tests {
    use super::*;

    #[test]
    fn test_fresh_unit_is_operational() {
        let state = fresh_state(7);
        let health = HealthAggregator::overall_health(&state);

        assert!(health >= 90.0, "fresh unit scored {}", health);
        assert_eq!(HealthAggregator::overall_status(&state), HealthStatus::Operational);
        assert_eq!(state.mode_status().operating, OperatingMode::Operating);
    }

    #[test]
    fn test_nominal_default_state_scores_full() {
        let state = ControllerState::default();
        let breakdown = HealthAggregator::breakdown(&state);

        for entry in breakdown.entries() {
            assert_eq!(entry.value, 100.0, "{} not at full health", entry.id.display_name());
        }
        assert!((breakdown.weighted_average() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_links_down_and_channels_off() {
        let mut state = ControllerState::default();
        for q in 0..4 {
            state.controller_mut().set_link(q, false);
        }
        for quadrant in state.quadrants_mut() {
            for channel in quadrant.channels_mut() {
                channel.apply(ChannelEvent::PowerOff);
            }
        }

        assert_eq!(state.controller().health_score(), 0.0);
        assert_eq!(state.mean_quadrant_health(), 50.0);
        assert_eq!(state.qtrm_health(), 50.0);
        assert_eq!(state.aqc_health(), 25.0);

        // 0.10·0 + 0.05·100 + 0.05·100 + 0.10·100 + 4·0.15·50 + 0.05·50 + 0.05·25
        let health = HealthAggregator::overall_health(&state);
        assert!((health - 53.75).abs() < 1e-9, "got {}", health);
        assert_eq!(classify(health), HealthStatus::Degraded);
    }

    #[test]
    fn test_all_board_checks_failed() {
        let mut state = ControllerState::default();
        for check in BoardCheck::ALL {
            state.board_status_mut().set_check(check, CheckResult::Fail);
        }

        let breakdown = HealthAggregator::breakdown(&state);
        assert_eq!(breakdown.get(SubsystemId::BoardStatus), 0.0);
        assert!((breakdown.weighted_average() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_subsystem_values_match_components() {
        let mut state = fresh_state(12);
        state.quadrants_mut()[2].channels_mut()[0].apply(ChannelEvent::Trip);

        let quadrant_ids = [
            SubsystemId::Quadrant0,
            SubsystemId::Quadrant1,
            SubsystemId::Quadrant2,
            SubsystemId::Quadrant3,
        ];
        for (q, id) in quadrant_ids.into_iter().enumerate() {
            assert_eq!(HealthAggregator::subsystem_value(&state, id), state.quadrants()[q].health_score());
        }
        assert_eq!(HealthAggregator::subsystem_value(&state, SubsystemId::Qtrms), state.qtrm_health());
        assert!(HealthAggregator::subsystem_value(&state, SubsystemId::Quadrant2) < 100.0);
        assert_eq!(HealthAggregator::subsystem_value(&state, SubsystemId::Quadrant1), 100.0);
    }
}

#[cfg(test)]
mod evolution_tests {
    use super::*;

    #[test]
    fn test_long_run_at_full_degradation_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = ControllerState::with_mode(
            ComponentId::new("component_stress").unwrap(),
            SimulationMode::Critical,
            &mut rng,
        );

        for _ in 0..10_000 {
            state.set_degradation(1.0);
            state.tick(&mut rng);

            assert!((0.0..=1.0).contains(&state.degradation()));
            for channel in state.channels() {
                assert!((26.0..=29.0).contains(&channel.voltage()));
                assert!((0.0..=1.0).contains(&channel.current()));
                assert!(!(channel.is_tripped() && channel.is_on()));
            }
            for reading in state.thermal().sensors() {
                assert!((30.0..=70.0).contains(&reading));
            }
            assert!((25.0..=30.0).contains(&state.controller().array_voltage()));
            assert!((15.0..=30.0).contains(&state.controller().array_current()));
            assert!((25.0..=30.0).contains(&state.board_data().input_voltage()));
            assert!((3.0..=8.0).contains(&state.board_data().input_current()));

            let breakdown = HealthAggregator::breakdown(&state);
            for entry in breakdown.entries() {
                assert!((0.0..=100.0).contains(&entry.value));
            }
            let overall = breakdown.weighted_average();
            assert!((0.0..=100.0).contains(&overall));
        }
    }

    #[test]
    fn test_mode_follows_degradation() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = fresh_state(5);

        state.set_degradation(0.4);
        state.tick(&mut rng);
        // Degradation drifts by at most 0.05 per tick
        assert_eq!(state.mode_status().operating, OperatingMode::Warning);

        state.set_degradation(0.9);
        state.tick(&mut rng);
        assert_eq!(state.mode_status().operating, OperatingMode::Degraded);

        state.set_degradation(0.1);
        state.tick(&mut rng);
        assert_eq!(state.mode_status().operating, OperatingMode::Operating);

        // Reset source is fixed whatever the mode
        assert_eq!(state.mode_status().reset_source, ResetSource::Software);
    }

    #[test]
    fn test_set_degradation_clamps() {
        let mut state = ControllerState::default();
        state.set_degradation(3.0);
        assert_eq!(state.degradation(), 1.0);
        state.set_degradation(-1.0);
        assert_eq!(state.degradation(), 0.0);
    }
}
