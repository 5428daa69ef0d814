use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct Bounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl Bounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for point in points.iter().filter(|point| point.is_finite()) {
            min = min.min(*point);
            max = max.max(*point);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let span = (max - min).max_elem().max(1.0);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half_extent
            && (point.y - self.center.y).abs() <= self.half_extent
    }

    pub(super) fn side(self) -> f32 {
        self.half_extent * 2.0
    }

    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let dx = ((self.center.x - other.center.x).abs() - reach).max(0.0);
        let dy = ((self.center.y - other.center.y).abs() - reach).max(0.0);
        dx * dx + dy * dy
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }
}

#[derive(Debug)]
pub(super) struct Cell {
    pub(super) bounds: Bounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    /// Node indices, populated on leaves only.
    pub(super) members: Vec<usize>,
    children: [Option<usize>; 4],
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Quadtree stored as a flat arena; cell 0 is the root.
#[derive(Debug)]
pub(super) struct Quadtree {
    cells: Vec<Cell>,
}

impl Quadtree {
    /// Non-finite positions are left out of the tree.
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = Bounds::enclosing(positions)?;
        let members = (0..positions.len())
            .filter(|&index| positions[index].is_finite())
            .collect::<Vec<_>>();
        let mut cells = Vec::with_capacity(positions.len() / LEAF_CAPACITY * 2 + 1);
        Self::build_cell(&mut cells, bounds, members, positions, 0);
        Some(Self { cells })
    }

    fn build_cell(
        cells: &mut Vec<Cell>,
        bounds: Bounds,
        members: Vec<usize>,
        positions: &[Vec2],
        depth: usize,
    ) -> usize {
        let mass = members.len() as f32;
        let center_of_mass = if members.is_empty() {
            bounds.center
        } else {
            members
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        let index = cells.len();
        cells.push(Cell {
            bounds,
            center_of_mass,
            mass,
            members,
            children: [None; 4],
        });

        if depth >= MAX_DEPTH || cells[index].members.len() <= LEAF_CAPACITY {
            return index;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &member in &cells[index].members {
            buckets[bounds.quadrant_of(positions[member])].push(member);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return index;
        }

        cells[index].members.clear();
        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let child =
                Self::build_cell(cells, bounds.quadrant(quadrant), bucket, positions, depth + 1);
            cells[index].children[quadrant] = Some(child);
        }
        index
    }

    pub(super) fn root(&self) -> &Cell {
        &self.cells[0]
    }

    pub(super) fn children<'a>(&'a self, cell: &'a Cell) -> impl Iterator<Item = &'a Cell> + 'a {
        cell.children
            .iter()
            .flatten()
            .map(move |&child| &self.cells[child])
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.cells.len()
    }
}
