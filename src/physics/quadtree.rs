use std::ops::Range;

use super::Vec2;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: u32 = 12;

/// Square cell. Leaves own a run of point indices; inner cells only aggregate.
pub(super) struct Cell {
	/// Mean position of the points below this cell.
	pub(super) centroid: Vec2,
	/// Number of points below this cell.
	pub(super) mass: f64,
	/// Side length.
	pub(super) size: f64,
	center: Vec2,
	members: Range<usize>,
	children: Vec<usize>,
}

impl Cell {
	pub(super) fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	fn distance_sq_to(&self, point: Vec2) -> f64 {
		let half = self.size * 0.5;
		let dx = ((self.center.x - point.x).abs() - half).max(0.0);
		let dy = ((self.center.y - point.y).abs() - half).max(0.0);
		dx * dx + dy * dy
	}
}

/// Point quadtree stored as a flat arena; cell 0 is the root.
pub(super) struct Quadtree {
	cells: Vec<Cell>,
	order: Vec<usize>,
}

impl Quadtree {
	/// `None` for an empty set or any non-finite point.
	pub(super) fn build(points: &[Vec2]) -> Option<Self> {
		let first = *points.first()?;
		let (mut lo, mut hi) = (first, first);
		for point in points {
			if !point.x.is_finite() || !point.y.is_finite() {
				return None;
			}
			lo = Vec2::new(lo.x.min(point.x), lo.y.min(point.y));
			hi = Vec2::new(hi.x.max(point.x), hi.y.max(point.y));
		}

		let half = (hi.x - lo.x).max(hi.y - lo.y) * 0.5 + 1.0;
		let mut tree = Self {
			cells: Vec::new(),
			order: (0..points.len()).collect(),
		};
		tree.split((lo + hi) * 0.5, half, 0..points.len(), points, 0);
		Some(tree)
	}

	fn split(&mut self, center: Vec2, half: f64, members: Range<usize>, points: &[Vec2], depth: u32) -> usize {
		let id = self.cells.len();
		let slice = &self.order[members.clone()];
		let mass = slice.len() as f64;
		let centroid = slice.iter().fold(Vec2::ZERO, |sum, &i| sum + points[i]) / mass;
		self.cells.push(Cell {
			centroid,
			mass,
			size: half * 2.0,
			center,
			members: members.clone(),
			children: Vec::new(),
		});
		if slice.len() <= LEAF_CAPACITY || depth >= MAX_DEPTH {
			return id;
		}

		// Bit 0: right half, bit 1: lower half.
		let quadrant = |p: Vec2| usize::from(p.x >= center.x) | usize::from(p.y >= center.y) << 1;
		self.order[members.clone()].sort_by_key(|&i| quadrant(points[i]));

		let quarter = half * 0.5;
		let mut start = members.start;
		let mut children = Vec::with_capacity(4);
		for q in 0..4 {
			let len = self.order[start..members.end]
				.iter()
				.take_while(|&&i| quadrant(points[i]) == q)
				.count();
			if len == 0 {
				continue;
			}
			let offset = Vec2::new(
				if q & 1 == 0 { -quarter } else { quarter },
				if q & 2 == 0 { -quarter } else { quarter },
			);
			children.push(self.split(center + offset, quarter, start..start + len, points, depth + 1));
			start += len;
		}
		self.cells[id].children = children;
		id
	}

	pub(super) fn root(&self) -> &Cell {
		&self.cells[0]
	}

	pub(super) fn children<'a>(&'a self, cell: &'a Cell) -> impl Iterator<Item = &'a Cell> + 'a {
		cell.children.iter().map(|&id| &self.cells[id])
	}

	/// Point indices held by a leaf.
	pub(super) fn members(&self, cell: &Cell) -> &[usize] {
		&self.order[cell.members.clone()]
	}

	/// Calls `visit` for every point in a leaf whose cell lies within `radius` of `point`.
	///
	/// Pruning is by cell only; callers still test exact distances.
	pub(super) fn visit_near(&self, point: Vec2, radius: f64, mut visit: impl FnMut(usize)) {
		let mut pending = vec![0];
		while let Some(id) = pending.pop() {
			let cell = &self.cells[id];
			if cell.distance_sq_to(point) > radius * radius {
				continue;
			}
			if cell.is_leaf() {
				self.members(cell).iter().for_each(|&i| visit(i));
			} else {
				pending.extend_from_slice(&cell.children);
			}
		}
	}
}
