//! Force layout integrator.
//!
//! One step, unit timestep:
//!
//! 1. Springs: each connection pulls its endpoints together, equal and opposite.
//! 2. For every ordered pair of distinct nodes, Coulomb-like repulsion
//!    `offset * k_r / |offset|^3` plus a weak cohesive pull `-offset * k_b`.
//! 3. Damping scales every velocity.
//! 4. `position += velocity`.
//!
//! Distances are clamped to `min_distance` before cubing so coincident or
//! nearly coincident nodes push apart with a bounded impulse.

use modeller_core::error::{ModelError, Result};
use modeller_core::types::Vec3;
use serde::{Deserialize, Serialize};

/// Whether steps advance the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimulationState {
    Paused,
    #[default]
    Running,
}

impl SimulationState {
    pub fn toggled(self) -> Self {
        match self {
            SimulationState::Paused => SimulationState::Running,
            SimulationState::Running => SimulationState::Paused,
        }
    }

    pub fn is_running(self) -> bool {
        self == SimulationState::Running
    }
}

/// Force constants and renderable geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Hooke constant for connections.
    pub spring: f32,
    /// Coulomb constant between every pair of nodes.
    pub repulsion: f32,
    /// Pull toward every other node, keeps the layout bounded.
    pub cohesion: f32,
    /// Velocity multiplier applied each step.
    pub damping: f32,
    /// Distance floor for the repulsion term.
    pub min_distance: f32,
    /// Half-size of the cube new nodes spawn in.
    pub spawn_extent: f32,
    /// Label anchor relative to its node.
    pub label_offset: Vec3,
    pub sphere_radius: f32,
    pub line_width: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            spring: 0.005,
            repulsion: 50.0,
            cohesion: 0.0005,
            damping: 0.5,
            min_distance: 1.0,
            spawn_extent: 100.0,
            label_offset: Vec3::new(0.0, 2.0, 0.0),
            sphere_radius: 1.0,
            line_width: 1.0,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("spring", self.spring),
            ("repulsion", self.repulsion),
            ("cohesion", self.cohesion),
            ("spawn_extent", self.spawn_extent),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::invalid_config(field, format!("must be a finite value >= 0, got {value}")));
            }
        }

        let positive = [
            ("min_distance", self.min_distance),
            ("sphere_radius", self.sphere_radius),
            ("line_width", self.line_width),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ModelError::invalid_config(field, format!("must be a finite value > 0, got {value}")));
            }
        }

        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ModelError::invalid_config(
                "damping",
                format!("must be within [0, 1], got {}", self.damping),
            ));
        }
        if !self.label_offset.is_finite() {
            return Err(ModelError::invalid_config("label_offset", "must be finite"));
        }
        Ok(())
    }

    /// Resting distance of two connected nodes with no other nodes around.
    pub fn equilibrium_distance(&self) -> f32 {
        (self.repulsion / (self.spring + self.cohesion)).cbrt()
    }
}

/// Advance `positions`/`velocities` by one step. `springs` holds index pairs
/// into both slices.
pub fn step(
    config: &PhysicsConfig,
    positions: &mut [Vec3],
    velocities: &mut [Vec3],
    springs: &[(usize, usize)],
) {
    debug_assert_eq!(positions.len(), velocities.len());
    let n = positions.len();

    for &(u, v) in springs {
        let dv = (positions[v] - positions[u]) * config.spring;
        velocities[u] += dv;
        velocities[v] -= dv;
    }

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut offset = positions[i] - positions[j];
            if offset.length_squared() == 0.0 {
                let sign = if i < j { -1.0 } else { 1.0 };
                offset = Vec3::new(sign * config.min_distance, 0.0, 0.0);
            }
            let len = offset.length().max(config.min_distance);
            velocities[i] += offset * (config.repulsion / (len * len * len));
            velocities[i] -= offset * config.cohesion;
        }
    }

    for (position, velocity) in positions.iter_mut().zip(velocities.iter_mut()) {
        *velocity *= config.damping;
        *position += *velocity;
    }
}
