use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::quadtree::{Cell, Quadtree};
use super::{Body, Vec2};

/// Tiny random offset used to separate exactly coincident points.
pub(super) fn jiggle(rng: &mut ChaCha8Rng) -> f64 {
	(rng.gen_range(0.0..1.0) - 0.5) * 1e-6
}

/// A resolved spring with its precomputed degree bias.
#[derive(Clone, Copy, Debug)]
pub(super) struct LinkTerm {
	pub(super) source: usize,
	pub(super) target: usize,
	pub(super) strength: f64,
	/// Share of the correction taken by the target endpoint.
	pub(super) bias: f64,
}

pub(super) fn link_terms(body_count: usize, springs: &[super::Spring]) -> Vec<LinkTerm> {
	let mut degree = vec![0usize; body_count];
	for spring in springs {
		degree[spring.source] += 1;
		degree[spring.target] += 1;
	}

	springs
		.iter()
		.filter(|spring| spring.source != spring.target)
		.map(|spring| {
			let (source, target) = (degree[spring.source] as f64, degree[spring.target] as f64);
			LinkTerm {
				source: spring.source,
				target: spring.target,
				strength: spring.weight,
				bias: source / (source + target),
			}
		})
		.collect()
}

pub(super) fn apply_links(
	bodies: &mut [Body],
	links: &[LinkTerm],
	distance: f64,
	alpha: f64,
	rng: &mut ChaCha8Rng,
) {
	for link in links {
		let (source, target) = (&bodies[link.source], &bodies[link.target]);
		let mut delta = (target.position + target.velocity) - (source.position + source.velocity);
		if delta.x == 0.0 {
			delta.x = jiggle(rng);
		}
		if delta.y == 0.0 {
			delta.y = jiggle(rng);
		}

		let length = delta.length();
		let correction = delta * ((length - distance) / length * alpha * link.strength);

		bodies[link.target].velocity -= correction * link.bias;
		bodies[link.source].velocity += correction * (1.0 - link.bias);
	}
}

#[derive(Clone, Copy, Debug)]
pub(super) struct ChargeParams {
	pub(super) strength: f64,
	pub(super) theta_sq: f64,
	pub(super) distance_min_sq: f64,
}

pub(super) fn apply_many_body(
	bodies: &mut [Body],
	positions: &[Vec2],
	params: ChargeParams,
	alpha: f64,
	rng: &mut ChaCha8Rng,
) {
	let Some(tree) = Quadtree::build(positions) else {
		return;
	};

	for (index, body) in bodies.iter_mut().enumerate() {
		let mut force = Vec2::ZERO;
		accumulate_charge(&tree, tree.root(), index, positions, params, alpha, rng, &mut force);
		body.velocity += force;
	}
}

#[allow(clippy::too_many_arguments)]
fn accumulate_charge(
	tree: &Quadtree,
	cell: &Cell,
	index: usize,
	positions: &[Vec2],
	params: ChargeParams,
	alpha: f64,
	rng: &mut ChaCha8Rng,
	force: &mut Vec2,
) {
	let point = positions[index];

	if cell.is_leaf() {
		for &other in tree.members(cell) {
			if other == index {
				continue;
			}
			let mut delta = positions[other] - point;
			if delta.x == 0.0 {
				delta.x = jiggle(rng);
			}
			if delta.y == 0.0 {
				delta.y = jiggle(rng);
			}
			let mut distance_sq = delta.length_sq();
			if distance_sq < params.distance_min_sq {
				distance_sq = (params.distance_min_sq * distance_sq).sqrt();
			}
			*force += delta * (params.strength * alpha / distance_sq);
		}
		return;
	}

	let delta = cell.centroid - point;
	let mut distance_sq = delta.length_sq();
	if (cell.size * cell.size) / params.theta_sq < distance_sq {
		if distance_sq < params.distance_min_sq {
			distance_sq = (params.distance_min_sq * distance_sq).sqrt();
		}
		*force += delta * (params.strength * cell.mass * alpha / distance_sq);
		return;
	}

	for child in tree.children(cell) {
		accumulate_charge(tree, child, index, positions, params, alpha, rng, force);
	}
}

/// Translates every body so the mean position lands on `center`.
pub(super) fn apply_center(bodies: &mut [Body], center: Vec2, strength: f64) {
	if bodies.is_empty() {
		return;
	}

	let mut mean = Vec2::ZERO;
	for body in bodies.iter() {
		mean += body.position;
	}
	let shift = (mean / bodies.len() as f64 - center) * strength;

	for body in bodies.iter_mut() {
		body.position -= shift;
	}
}

/// Pushes apart bodies whose predicted positions sit closer than `2 * radius`.
pub(super) fn apply_collide(
	bodies: &mut [Body],
	predicted: &mut Vec<Vec2>,
	radius: f64,
	strength: f64,
	rng: &mut ChaCha8Rng,
) {
	predicted.clear();
	predicted.extend(bodies.iter().map(|body| body.position + body.velocity));
	let Some(tree) = Quadtree::build(predicted) else {
		return;
	};

	let reach = radius * 2.0;
	let mut candidates = Vec::new();
	for index in 0..bodies.len() {
		let point = bodies[index].position + bodies[index].velocity;

		candidates.clear();
		tree.visit_near(predicted[index], reach, |other| {
			if other > index {
				candidates.push(other);
			}
		});

		for &other in &candidates {
			let neighbour = &bodies[other];
			let mut delta = point - (neighbour.position + neighbour.velocity);
			let mut distance_sq = delta.length_sq();
			if distance_sq >= reach * reach {
				continue;
			}
			if delta.x == 0.0 {
				delta.x = jiggle(rng);
				distance_sq += delta.x * delta.x;
			}
			if delta.y == 0.0 {
				delta.y = jiggle(rng);
				distance_sq += delta.y * delta.y;
			}

			let distance = distance_sq.sqrt();
			let push = delta * ((reach - distance) / distance * strength);
			// Equal radii split the correction evenly.
			bodies[index].velocity += push * 0.5;
			bodies[other].velocity -= push * 0.5;
		}
	}
}

pub(super) fn apply_axis_springs(bodies: &mut [Body], target: Vec2, strength: f64, alpha: f64) {
	for body in bodies {
		body.velocity += (target - body.position) * (strength * alpha);
	}
}
