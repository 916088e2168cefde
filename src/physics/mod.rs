//! Force-directed layout engine with alpha cooling.
//!
//! Each [`Simulation::step`] cools `alpha` toward its target and then applies, in order,
//! link springs, many-body charge, centering, collision and axis springs before
//! integrating velocities. Pinned bodies keep exerting forces but never move.

mod forces;
mod quadtree;

use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::LayoutConfig;
use crate::error::GraphError;
use forces::{
	ChargeParams, LinkTerm, apply_axis_springs, apply_center, apply_collide, apply_links,
	apply_many_body, link_terms,
};

/// A 2D point or displacement in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
	/// Horizontal component.
	pub x: f64,
	/// Vertical component.
	pub y: f64,
}

impl Vec2 {
	/// The origin.
	pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

	/// Builds a vector from its components.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Squared euclidean length.
	pub fn length_sq(self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	/// Euclidean length.
	pub fn length(self) -> f64 {
		self.length_sq().sqrt()
	}

	/// Distance to `other`.
	pub fn distance(self, other: Self) -> f64 {
		(self - other).length()
	}
}

impl Add for Vec2 {
	type Output = Self;
	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Vec2 {
	type Output = Self;
	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Vec2 {
	type Output = Self;
	fn mul(self, rhs: f64) -> Self {
		Self::new(self.x * rhs, self.y * rhs)
	}
}

impl Div<f64> for Vec2 {
	type Output = Self;
	fn div(self, rhs: f64) -> Self {
		Self::new(self.x / rhs, self.y / rhs)
	}
}

impl AddAssign for Vec2 {
	fn add_assign(&mut self, rhs: Self) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl SubAssign for Vec2 {
	fn sub_assign(&mut self, rhs: Self) {
		self.x -= rhs.x;
		self.y -= rhs.y;
	}
}

/// Whether a body is driven by the forces or held in place by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Pin {
	/// Position fully driven by the layout.
	#[default]
	Free,
	/// Position fixed at the given point.
	Pinned(Vec2),
}

/// One simulated point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	/// Current position.
	pub position: Vec2,
	/// Velocity carried into the next step.
	pub velocity: Vec2,
	/// Pin state.
	pub pin: Pin,
}

/// An attractive spring between two bodies, by index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
	/// Index of the source body.
	pub source: usize,
	/// Index of the target body.
	pub target: usize,
	/// Relative spring strength.
	pub weight: f64,
}

/// Per-step alpha multiplier that reaches `alpha_min` after `steps` steps.
pub fn decay_for_steps(steps: f64, alpha_min: f64) -> Result<f64, GraphError> {
	if !steps.is_finite() || steps <= 0.0 {
		return Err(GraphError::InvalidDecay(steps));
	}
	let decay = 1.0 - alpha_min.powf(1.0 / steps);
	if decay.is_finite() && decay > 0.0 && decay < 1.0 {
		Ok(decay)
	} else {
		Err(GraphError::InvalidDecay(steps))
	}
}

/// Iterative force layout over a fixed set of bodies and springs.
pub struct Simulation {
	bodies: Vec<Body>,
	links: Vec<LinkTerm>,
	config: LayoutConfig,
	center: Vec2,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	running: bool,
	rng: ChaCha8Rng,
	positions: Vec<Vec2>,
	predicted: Vec<Vec2>,
}

impl Simulation {
	/// Creates a simulation with `body_count` bodies scattered uniformly over
	/// `[0, width] × [0, height]` from the configured seed.
	///
	/// Spring endpoints must be valid body indices.
	pub fn new(
		body_count: usize,
		springs: &[Spring],
		config: &LayoutConfig,
		width: f64,
		height: f64,
	) -> Result<Self, GraphError> {
		let alpha_decay = decay_for_steps(config.decay_steps, config.alpha_min)?;
		let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
		let bodies = (0..body_count)
			.map(|_| Body {
				position: Vec2::new(
					rng.gen_range(0.0..=width.max(0.0)),
					rng.gen_range(0.0..=height.max(0.0)),
				),
				..Body::default()
			})
			.collect();

		Ok(Self {
			bodies,
			links: link_terms(body_count, springs),
			config: config.clone(),
			center: Vec2::new(width / 2.0, height / 2.0),
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay,
			running: true,
			rng,
			positions: Vec::with_capacity(body_count),
			predicted: Vec::with_capacity(body_count),
		})
	}

	/// The simulated bodies, indexed like the input nodes.
	pub fn bodies(&self) -> &[Body] {
		&self.bodies
	}

	/// Mutable access to the bodies, used to write back clamped positions.
	pub fn bodies_mut(&mut self) -> &mut [Body] {
		&mut self.bodies
	}

	/// Current alpha.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Sets alpha without restarting.
	pub fn set_alpha(&mut self, alpha: f64) {
		self.alpha = alpha;
	}

	/// Value alpha cools toward.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Sets the value alpha cools toward.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
	}

	/// Current per-step alpha multiplier.
	pub fn alpha_decay(&self) -> f64 {
		self.alpha_decay
	}

	/// Sets the per-step alpha multiplier.
	pub fn set_alpha_decay(&mut self, decay: f64) {
		self.alpha_decay = decay;
	}

	/// Point the centering force pulls the mean position onto.
	pub fn set_center(&mut self, center: Vec2) {
		self.center = center;
	}

	/// Whether steps still have an effect.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Resumes stepping without touching positions or alpha.
	pub fn restart(&mut self) {
		self.running = true;
	}

	/// Pins body `index` at `point`.
	pub fn pin(&mut self, index: usize, point: Vec2) {
		if let Some(body) = self.bodies.get_mut(index) {
			body.pin = Pin::Pinned(point);
		}
	}

	/// Advances one step. Returns whether the simulation is still running afterwards.
	pub fn step(&mut self) -> bool {
		if !self.running {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		let alpha = self.alpha;
		let config = &self.config;

		apply_links(&mut self.bodies, &self.links, config.link_distance, alpha, &mut self.rng);

		self.positions.clear();
		self.positions.extend(self.bodies.iter().map(|body| body.position));
		apply_many_body(
			&mut self.bodies,
			&self.positions,
			ChargeParams {
				strength: config.charge_strength,
				theta_sq: config.theta * config.theta,
				distance_min_sq: config.distance_min * config.distance_min,
			},
			alpha,
			&mut self.rng,
		);

		apply_center(&mut self.bodies, self.center, config.center_strength);
		apply_collide(
			&mut self.bodies,
			&mut self.predicted,
			config.collide_radius,
			config.collide_strength,
			&mut self.rng,
		);
		apply_axis_springs(
			&mut self.bodies,
			Vec2::new(config.axis_target_x, config.axis_target_y),
			config.axis_strength,
			alpha,
		);

		let keep = 1.0 - config.velocity_decay;
		for body in &mut self.bodies {
			match body.pin {
				Pin::Free => {
					body.velocity = body.velocity * keep;
					body.position += body.velocity;
				}
				Pin::Pinned(point) => {
					body.position = point;
					body.velocity = Vec2::ZERO;
				}
			}
		}

		if self.alpha < self.config.alpha_min {
			self.running = false;
		}
		self.running
	}

	/// Steps until the simulation stops or `max_steps` is reached. Returns the steps taken.
	pub fn settle(&mut self, max_steps: usize) -> usize {
		let mut steps = 0;
		while steps < max_steps && self.step() {
			steps += 1;
		}
		steps
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn two_node_sim(seed: u64) -> Simulation {
		let config = LayoutConfig {
			seed,
			..LayoutConfig::default()
		};
		Simulation::new(
			2,
			&[Spring {
				source: 0,
				target: 1,
				weight: 1.0,
			}],
			&config,
			800.0,
			600.0,
		)
		.expect("default decay is valid")
	}

	#[test]
	fn decay_reaches_alpha_min_after_target_steps() {
		let decay = decay_for_steps(30.0, 0.001).expect("positive steps");
		let alpha = (1.0 - decay).powi(30);
		assert!((alpha - 0.001).abs() < 1e-12);
	}

	#[test]
	fn decay_rejects_non_positive_steps() {
		assert!(decay_for_steps(0.0, 0.001).is_err());
		assert!(decay_for_steps(-3.0, 0.001).is_err());
		assert!(decay_for_steps(f64::NAN, 0.001).is_err());
	}

	#[test]
	fn alpha_strictly_decreases_until_stop() {
		let mut sim = two_node_sim(7);
		let mut previous = sim.alpha();
		while sim.step() {
			assert!(sim.alpha() < previous);
			previous = sim.alpha();
		}
		assert!(sim.alpha() < LayoutConfig::default().alpha_min);
		assert!(!sim.step());
	}

	#[test]
	fn initial_bodies_lie_in_bounds() {
		let config = LayoutConfig::default();
		let sim = Simulation::new(50, &[], &config, 320.0, 240.0).expect("valid config");
		for body in sim.bodies() {
			assert!((0.0..=320.0).contains(&body.position.x));
			assert!((0.0..=240.0).contains(&body.position.y));
		}
	}

	#[test]
	fn same_seed_gives_same_layout() {
		let springs: Vec<Spring> = (1..40)
			.map(|i| Spring {
				source: i,
				target: i / 3,
				weight: 0.5,
			})
			.collect();
		let config = LayoutConfig::default();
		let mut first = Simulation::new(40, &springs, &config, 800.0, 600.0).expect("valid");
		let mut second = Simulation::new(40, &springs, &config, 800.0, 600.0).expect("valid");

		first.settle(10_000);
		second.settle(10_000);

		for (a, b) in first.bodies().iter().zip(second.bodies()) {
			assert!(a.position.distance(b.position) < 1e-6);
		}
	}

	#[test]
	fn linked_pair_settles_at_collision_separation() {
		let mut sim = two_node_sim(3);
		sim.settle(10_000);

		let [a, b] = [sim.bodies()[0], sim.bodies()[1]];
		let separation = a.position.distance(b.position);
		let expected = 2.0 * LayoutConfig::default().collide_radius;
		assert!(
			(separation - expected).abs() < 5.0,
			"separation {separation} not near {expected}"
		);
	}

	#[test]
	fn pinned_body_holds_its_position() {
		let mut sim = two_node_sim(11);
		let anchor = Vec2::new(100.0, 100.0);
		sim.pin(0, anchor);
		sim.settle(10_000);

		assert_eq!(sim.bodies()[0].position, anchor);
		assert_eq!(sim.bodies()[0].velocity, Vec2::ZERO);
	}

	#[test]
	fn restart_with_target_keeps_running() {
		let mut sim = two_node_sim(5);
		sim.settle(10_000);
		assert!(!sim.is_running());

		sim.set_alpha_target(0.3);
		sim.restart();
		for _ in 0..500 {
			assert!(sim.step());
		}
		assert!((sim.alpha() - 0.3).abs() < 1e-3);
	}
}
