use crate::config::ViewportConfig;
use crate::physics::Vec2;

fn ease_cubic_in_out(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// Screen = world * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	pub fn apply(&self, world: Vec2) -> Vec2 {
		Vec2::new(world.x * self.k + self.x, world.y * self.k + self.y)
	}

	pub fn invert(&self, screen: Vec2) -> Vec2 {
		Vec2::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
	}
}

#[derive(Clone, Copy, Debug)]
struct ResetAnimation {
	from: ViewTransform,
	started_ms: f64,
}

/// Drawing surface size plus the pan/zoom transform applied to it.
#[derive(Clone, Debug)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
	transform: ViewTransform,
	min_scale: f64,
	max_scale: f64,
	reset_duration_ms: f64,
	reset: Option<ResetAnimation>,
}

impl Viewport {
	pub fn new(width: f64, height: f64, config: &ViewportConfig) -> Self {
		Self {
			width,
			height,
			transform: ViewTransform::IDENTITY,
			min_scale: config.min_scale,
			max_scale: config.max_scale,
			reset_duration_ms: config.reset_duration_ms,
			reset: None,
		}
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn screen_to_world(&self, sx: f64, sy: f64) -> Vec2 {
		self.transform.invert(Vec2::new(sx, sy))
	}

	pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
		self.transform.apply(world)
	}

	/// Scales about the screen point `(sx, sy)`, keeping the world point under it fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.reset = None;
		let t = &mut self.transform;
		let new_k = (t.k * factor).clamp(self.min_scale, self.max_scale);
		let ratio = new_k / t.k;
		t.x = sx - (sx - t.x) * ratio;
		t.y = sy - (sy - t.y) * ratio;
		t.k = new_k;
	}

	pub fn set_translation(&mut self, x: f64, y: f64) {
		self.reset = None;
		self.transform.x = x;
		self.transform.y = y;
	}

	pub fn begin_reset(&mut self, now_ms: f64) {
		self.reset = Some(ResetAnimation {
			from: self.transform,
			started_ms: now_ms,
		});
	}

	/// Moves an in-flight reset forward to `now_ms`. Returns whether it is still running.
	pub fn advance(&mut self, now_ms: f64) -> bool {
		let Some(reset) = self.reset else {
			return false;
		};

		let t = if self.reset_duration_ms > 0.0 {
			((now_ms - reset.started_ms) / self.reset_duration_ms).clamp(0.0, 1.0)
		} else {
			1.0
		};
		// Interpolate the world point under the midpoint together with the scale, then
		// rebuild the translation so that point stays on the midpoint.
		let e = ease_cubic_in_out(t);
		let mid = self.center();
		let start = reset.from.invert(mid);
		let focus = start + (mid - start) * e;
		let k = reset.from.k + (1.0 - reset.from.k) * e;
		self.transform = ViewTransform {
			x: mid.x - focus.x * k,
			y: mid.y - focus.y * k,
			k,
		};

		if t >= 1.0 {
			self.transform = ViewTransform::IDENTITY;
			self.reset = None;
		}
		self.reset.is_some()
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	pub fn center(&self) -> Vec2 {
		Vec2::new(self.width / 2.0, self.height / 2.0)
	}

	/// Clamps a world point into `[0, width] × [0, height]`.
	pub fn clamp(&self, point: Vec2) -> Vec2 {
		Vec2::new(point.x.clamp(0.0, self.width), point.y.clamp(0.0, self.height))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(800.0, 600.0, &ViewportConfig::default())
	}

	#[test]
	fn zoom_keeps_pointer_anchor_and_respects_extent() {
		let mut vp = viewport();
		let anchor = vp.screen_to_world(200.0, 150.0);

		vp.zoom_at(200.0, 150.0, 1.1);
		let after = vp.screen_to_world(200.0, 150.0);
		assert!(anchor.distance(after) < 1e-9);

		for _ in 0..100 {
			vp.zoom_at(200.0, 150.0, 1.1);
		}
		assert_eq!(vp.transform().k, 5.0);

		for _ in 0..200 {
			vp.zoom_at(200.0, 150.0, 0.9);
		}
		assert_eq!(vp.transform().k, 0.5);
	}

	#[test]
	fn reset_animates_back_to_identity() {
		let mut vp = viewport();
		vp.zoom_at(100.0, 100.0, 2.0);
		vp.set_translation(40.0, -25.0);

		vp.begin_reset(1_000.0);
		assert!(vp.advance(1_375.0));
		let halfway = vp.transform();
		assert!(halfway.k > 1.0 && halfway.k < 2.0);

		assert!(!vp.advance(1_750.0));
		assert_eq!(vp.transform(), ViewTransform::IDENTITY);
		assert!(!vp.advance(2_000.0));
	}

	#[test]
	fn reset_pivots_about_viewport_midpoint() {
		let mut vp = viewport();
		vp.zoom_at(100.0, 100.0, 3.0);
		vp.set_translation(-250.0, 40.0);
		let mid = vp.center();
		let start = vp.screen_to_world(mid.x, mid.y);

		vp.begin_reset(0.0);
		vp.advance(375.0);

		// Halfway in time is halfway along the eased path.
		let expected = start + (mid - start) * 0.5;
		let focus = vp.screen_to_world(mid.x, mid.y);
		assert!(focus.distance(expected) < 1e-9);
		assert!((vp.transform().k - 2.0).abs() < 1e-12);
	}

	#[test]
	fn gesture_cancels_reset() {
		let mut vp = viewport();
		vp.set_translation(10.0, 10.0);
		vp.begin_reset(0.0);
		vp.set_translation(15.0, 10.0);

		assert!(!vp.advance(10_000.0));
		assert_eq!(vp.transform().x, 15.0);
	}

	#[test]
	fn clamp_pins_points_to_surface() {
		let vp = viewport();
		assert_eq!(vp.clamp(Vec2::new(-5.0, 700.0)), Vec2::new(0.0, 600.0));
		assert_eq!(vp.clamp(Vec2::new(10.0, 20.0)), Vec2::new(10.0, 20.0));
	}
}
