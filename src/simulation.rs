use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::agent::Agent;
use crate::config::{ConfigError, SimConfig};
use crate::trail_field::TrailField;

/// Owns the trail field and the fixed agent population, and drives the
/// per-frame protocol: fade once, then several synchronized substeps.
#[derive(Resource)]
pub struct Simulation {
    field: TrailField,
    agents: Vec<Agent>,
    rng: StdRng,
    // One pre-drawn jitter per agent, refilled each substep
    jitters: Vec<f32>,
    pub frame: u64,
}

impl Simulation {
    pub fn new(config: &SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let agents = (0..config.agent_count)
            .map(|_| Agent::spawn_random(&mut rng, config.width as f32, config.height as f32))
            .collect();

        Ok(Self {
            field: TrailField::new(config.width, config.height),
            agents,
            rng,
            jitters: vec![0.0; config.agent_count],
            frame: 0,
        })
    }

    /// One frame: fade exactly once, then run the configured number of
    /// substeps. The display buffer is only meant to be read after this
    /// returns; there is no partial-frame visibility.
    pub fn step(&mut self, config: &SimConfig) {
        self.field.fade(config.fade_fraction);

        for _ in 0..config.substeps_per_frame {
            self.substep(config);
        }
        self.frame += 1;
    }

    /// Decide-all, then move-all. Every heading decision in a substep is
    /// made against the field as it stood before the substep's writes,
    /// so agent processing order cannot leak into the outcome.
    fn substep(&mut self, config: &SimConfig) {
        // Jitters come off the owned rng in agent order, so a fixed seed
        // replays the same run no matter how the heading pass is sharded.
        for jitter in &mut self.jitters {
            *jitter = self
                .rng
                .gen_range(-config.jitter_bound..=config.jitter_bound);
        }

        let field = &self.field;
        self.agents
            .par_iter_mut()
            .zip(&self.jitters)
            .for_each(|(agent, &jitter)| agent.update_heading(field, config, jitter));

        // Position writes are idempotent constant stamps; they commute,
        // so a plain sequential pass is enough.
        for agent in &mut self.agents {
            agent.update_position(&mut self.field, config);
        }
    }

    pub fn field(&self) -> &TrailField {
        &self.field
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn display_buffer(&self) -> Vec<u8> {
        self.field.to_display_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_config() -> SimConfig {
        SimConfig {
            width: 20,
            height: 20,
            agent_count: 1,
            substeps_per_frame: 1,
            jitter_bound: 0.0,
            fade_fraction: 0.0,
            trail_radius: 1,
            seed: Some(7),
            ..SimConfig::default()
        }
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let config = SimConfig {
            agent_count: 0,
            ..SimConfig::default()
        };
        assert!(Simulation::new(&config).is_err());
    }

    #[test]
    fn agents_spawn_inside_the_field() {
        let config = SimConfig {
            seed: Some(3),
            ..SimConfig::default()
        };
        let sim = Simulation::new(&config).unwrap();

        assert_eq!(sim.agents().len(), config.agent_count);
        for agent in sim.agents() {
            assert!((0.0..config.width as f32).contains(&agent.x));
            assert!((0.0..config.height as f32).contains(&agent.y));
        }
    }

    #[test]
    fn single_agent_substep_scenario() {
        // One agent at (10,10) heading 0, trail radius 1, no fade, no
        // jitter: after one substep the field is white except a 5-cell
        // diamond around (11,10).
        let config = scenario_config();
        let mut sim = Simulation::new(&config).unwrap();
        sim.agents[0] = Agent {
            x: 10.0,
            y: 10.0,
            heading: 0.0,
        };

        sim.step(&config);

        let agent = &sim.agents[0];
        assert!((agent.x - 11.0).abs() < 1e-6);
        assert!((agent.y - 10.0).abs() < 1e-6);

        for y in 0..20 {
            for x in 0..20 {
                let dx = x - 11;
                let dy = y - 10;
                let expected = if dx * dx + dy * dy <= 1 {
                    config.trail_color
                } else {
                    [1.0, 1.0, 1.0]
                };
                assert_eq!(sim.field().cell(x, y), expected, "cell ({x},{y})");
            }
        }
    }

    #[test]
    fn overlapping_stamps_are_order_independent() {
        // Two agents whose trails overlap; swapping their processing
        // order must leave the field byte-identical.
        let config = SimConfig {
            agent_count: 2,
            ..scenario_config()
        };

        let facing = [
            Agent {
                x: 10.0,
                y: 10.0,
                heading: 0.0,
            },
            Agent {
                x: 13.0,
                y: 10.0,
                heading: std::f32::consts::PI,
            },
        ];

        let mut forward = Simulation::new(&config).unwrap();
        forward.agents[0] = facing[0].clone();
        forward.agents[1] = facing[1].clone();
        forward.step(&config);

        let mut reversed = Simulation::new(&config).unwrap();
        reversed.agents[0] = facing[1].clone();
        reversed.agents[1] = facing[0].clone();
        reversed.step(&config);

        assert_eq!(forward.display_buffer(), reversed.display_buffer());
    }

    #[test]
    fn fixed_seed_reproduces_a_run() {
        let config = SimConfig {
            width: 64,
            height: 64,
            agent_count: 40,
            seed: Some(42),
            ..SimConfig::default()
        };

        let mut a = Simulation::new(&config).unwrap();
        let mut b = Simulation::new(&config).unwrap();
        for _ in 0..5 {
            a.step(&config);
            b.step(&config);
        }

        assert_eq!(a.display_buffer(), b.display_buffer());
        for (left, right) in a.agents().iter().zip(b.agents()) {
            assert_eq!(left.x, right.x);
            assert_eq!(left.y, right.y);
            assert_eq!(left.heading, right.heading);
        }
    }

    #[test]
    fn field_stays_in_range_over_many_frames() {
        let config = SimConfig {
            width: 32,
            height: 32,
            agent_count: 20,
            seed: Some(11),
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(&config).unwrap();

        for _ in 0..25 {
            sim.step(&config);
            for y in 0..32 {
                for x in 0..32 {
                    for ch in sim.field().cell(x, y) {
                        assert!((0.0..=1.0).contains(&ch));
                    }
                }
            }
        }
    }

    #[test]
    fn frame_counter_advances_per_step() {
        let config = scenario_config();
        let mut sim = Simulation::new(&config).unwrap();
        sim.step(&config);
        sim.step(&config);
        assert_eq!(sim.frame, 2);
    }
}
