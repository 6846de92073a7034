use super::{Channel, Subsystem, CHANNELS_PER_QUADRANT};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const QUADRANT_NAMES: [&str; 4] = [
    "Quadrant 0 (CB)",
    "Quadrant 1 (CF)",
    "Quadrant 2 (CD)",
    "Quadrant 3 (CE)",
];

pub const QUADRANT_CODES: [&str; 4] = ["CB", "CF", "CD", "CE"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantSummary {
    pub index: u8,
    pub health: f64,
    pub active: u8,
    pub tripped: u8,
    pub faulted: u8,
}

/// One antenna section and its sixteen power channels.
#[derive(Debug, Clone)]
pub struct Quadrant {
    index: u8,
    channels: [Channel; CHANNELS_PER_QUADRANT],
}

impl Quadrant {
    pub fn new<R: Rng + ?Sized>(index: u8, rng: &mut R) -> Self {
        debug_assert!((index as usize) < QUADRANT_NAMES.len(), "Quadrant index {} out of range", index);

        Self {
            index,
            channels: core::array::from_fn(|ch| Channel::new(ch as u8, index, rng)),
        }
    }

    pub fn nominal(index: u8) -> Self {
        Self {
            index,
            channels: core::array::from_fn(|ch| Channel::nominal(ch as u8, index)),
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn name(&self) -> &'static str {
        QUADRANT_NAMES[self.index as usize]
    }

    pub fn code(&self) -> &'static str {
        QUADRANT_CODES[self.index as usize]
    }

    pub fn channels(&self) -> &[Channel; CHANNELS_PER_QUADRANT] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel; CHANNELS_PER_QUADRANT] {
        &mut self.channels
    }

    pub fn active_count(&self) -> u8 {
        self.channels.iter().filter(|ch| ch.is_on()).count() as u8
    }

    pub fn tripped_count(&self) -> u8 {
        self.channels.iter().filter(|ch| ch.is_tripped()).count() as u8
    }

    pub fn faulted_count(&self) -> u8 {
        self.channels.iter().filter(|ch| ch.is_faulted()).count() as u8
    }
}

impl Subsystem for Quadrant {
    type State = QuadrantSummary;

    fn step<R: Rng + ?Sized>(&mut self, degradation: f64, rng: &mut R) {
        for channel in &mut self.channels {
            channel.step(degradation, rng);
        }
    }

    fn health_score(&self) -> f64 {
        let total: f64 = self.channels.iter().map(Subsystem::health_score).sum();
        total / CHANNELS_PER_QUADRANT as f64
    }

    fn get_state(&self) -> Self::State {
        QuadrantSummary {
            index: self.index,
            health: self.health_score(),
            active: self.active_count(),
            tripped: self.tripped_count(),
            faulted: self.faulted_count(),
        }
    }
}
