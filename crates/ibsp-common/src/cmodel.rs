// cmodel.rs — swept collision against map brushes
//
// A trace walks the node tree along the segment, splitting it at each plane
// it crosses (expanded by the shape's extents), and clips the shape against
// every brush in the leafs it reaches. The closest entry over all brushes
// wins.

use std::cell::RefCell;

use crate::bspfile::BspMap;
use crate::q_shared::{
    box_on_plane_side, dot_product, vector_compare, vector_lerp, CPlane, Contents, Trace, Vec3,
};

/// Hits are pulled back by this much so the mover never ends up touching
/// the surface it stopped against.
pub const DIST_EPSILON: f32 = 0.03125;

/// What gets swept from start to end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceShape {
    Ray,
    Sphere { radius: f32 },
    /// axis-aligned box relative to the traced origin
    Box { mins: Vec3, maxs: Vec3 },
}

impl TraceShape {
    /// A zero-sized box is a ray.
    pub fn from_bounds(mins: &Vec3, maxs: &Vec3) -> Self {
        TraceShape::Box { mins: *mins, maxs: *maxs }.canonical()
    }

    fn canonical(self) -> Self {
        match self {
            TraceShape::Sphere { radius } if radius <= 0.0 => TraceShape::Ray,
            TraceShape::Box { mins, maxs } if mins == [0.0; 3] && maxs == [0.0; 3] => TraceShape::Ray,
            other => other,
        }
    }

    /// Axis-aligned bounds of the shape around its origin.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        match *self {
            TraceShape::Ray => ([0.0; 3], [0.0; 3]),
            TraceShape::Sphere { radius } => ([-radius; 3], [radius; 3]),
            TraceShape::Box { mins, maxs } => (mins, maxs),
        }
    }

    /// Symmetric half-size used when splitting against node planes.
    pub fn extents(&self) -> Vec3 {
        let (mins, maxs) = self.bounds();
        [
            (-mins[0]).max(maxs[0]),
            (-mins[1]).max(maxs[1]),
            (-mins[2]).max(maxs[2]),
        ]
    }
}

// ============================================================
// Per-trace state
// ============================================================

thread_local! {
    /// Trace counter and per-brush stamps. A brush whose stamp equals the
    /// current count was already clipped by this trace.
    static CHECKCOUNT: RefCell<(u32, Vec<u32>)> = const { RefCell::new((0, Vec::new())) };
}

struct TraceWork<'a> {
    map: &'a BspMap,
    shape: TraceShape,
    start: Vec3,
    end: Vec3,
    extents: Vec3,
    contents: Contents,
    checkcount: u32,
    /// borrowed from CHECKCOUNT for the length of the trace
    brush_stamps: Vec<u32>,
    trace: Trace,
}

impl<'a> TraceWork<'a> {
    fn new(map: &'a BspMap, shape: TraceShape, start: &Vec3, end: &Vec3, contents: Contents) -> Self {
        let (checkcount, brush_stamps) = CHECKCOUNT.with(|cc| {
            let mut cc = cc.borrow_mut();
            cc.0 = cc.0.wrapping_add(1);
            if cc.0 == 0 {
                cc.1.fill(0);
                cc.0 = 1;
            }
            if cc.1.len() < map.brushes.len() {
                cc.1.resize(map.brushes.len(), 0);
            }
            (cc.0, std::mem::take(&mut cc.1))
        });
        Self {
            map,
            shape,
            start: *start,
            end: *end,
            extents: shape.extents(),
            contents,
            checkcount,
            brush_stamps,
            trace: Trace::default(),
        }
    }

    /// Hand the stamps back for the next trace on this thread.
    fn finish(self) -> Trace {
        let TraceWork { brush_stamps, trace, .. } = self;
        CHECKCOUNT.with(|cc| cc.borrow_mut().1 = brush_stamps);
        trace
    }

    /// Returns false if the brush was already handled by this trace.
    fn mark_checked(&mut self, brush: usize) -> bool {
        if self.brush_stamps[brush] == self.checkcount {
            return false;
        }
        self.brush_stamps[brush] = self.checkcount;
        true
    }

    /// How far the shape reaches across a node plane.
    fn node_offset(&self, plane: &CPlane) -> f32 {
        match self.shape {
            TraceShape::Ray => 0.0,
            TraceShape::Sphere { radius } => radius,
            TraceShape::Box { .. } => {
                if plane.plane_type < 3 {
                    self.extents[plane.plane_type as usize]
                } else {
                    (self.extents[0] * plane.normal[0]).abs()
                        + (self.extents[1] * plane.normal[1]).abs()
                        + (self.extents[2] * plane.normal[2]).abs()
                }
            }
        }
    }

    /// Brush plane distance pushed out so the shape's origin can be tested
    /// as a point.
    fn side_dist(&self, plane: &CPlane) -> f32 {
        match self.shape {
            TraceShape::Ray => plane.dist,
            TraceShape::Sphere { radius } => plane.dist + radius,
            TraceShape::Box { mins, maxs } => {
                let mut ofs = [0.0f32; 3];
                for j in 0..3 {
                    ofs[j] = if plane.normal[j] < 0.0 { maxs[j] } else { mins[j] };
                }
                plane.dist - dot_product(&ofs, &plane.normal)
            }
        }
    }

    fn brush_sides(&self, brush: usize) -> std::ops::Range<usize> {
        let b = &self.map.brushes[brush];
        let first = b.firstside as usize;
        first..first + b.numsides as usize
    }

    fn check_brush(&mut self, brush: usize) {
        let sides = self.brush_sides(brush);
        if sides.is_empty() {
            return;
        }

        let mut enterfrac: f32 = -1.0;
        let mut leavefrac: f32 = 1.0;
        let mut clipplane: Option<usize> = None;
        let mut leadside: Option<usize> = None;
        let mut getout = false;
        let mut startout = false;

        for side in sides {
            let planenum = self.map.brushsides[side].planenum as usize;
            let plane = &self.map.cplanes[planenum];
            let dist = self.side_dist(plane);

            let d1 = dot_product(&self.start, &plane.normal) - dist;
            let d2 = dot_product(&self.end, &plane.normal) - dist;

            if d2 > 0.0 {
                getout = true;
            }
            if d1 > 0.0 {
                startout = true;
            }

            // completely in front of this face, no intersection
            if d1 > 0.0 && d2 >= d1 {
                return;
            }
            if d1 <= 0.0 && d2 <= 0.0 {
                continue;
            }

            if d1 > d2 {
                // entering
                let f = (d1 - DIST_EPSILON) / (d1 - d2);
                if f > enterfrac {
                    enterfrac = f;
                    clipplane = Some(planenum);
                    leadside = Some(side);
                }
            } else {
                // leaving
                let f = (d1 + DIST_EPSILON) / (d1 - d2);
                if f < leavefrac {
                    leavefrac = f;
                }
            }
        }

        if !startout {
            self.trace.startsolid = true;
            if !getout {
                self.trace.allsolid = true;
                self.trace.fraction = 0.0;
                self.trace.contents = self.map.brush_contents(brush);
            }
            return;
        }

        if enterfrac < leavefrac && enterfrac > -1.0 && enterfrac < self.trace.fraction {
            self.trace.fraction = enterfrac.max(0.0);
            if let Some(p) = clipplane {
                self.trace.plane = self.map.cplanes[p];
            }
            if let Some(s) = leadside {
                self.trace.surface_flags = self.map.side_surface_flags(s);
            }
            self.trace.contents = self.map.brush_contents(brush);
        }
    }

    fn test_brush_position(&mut self, brush: usize) {
        let sides = self.brush_sides(brush);
        if sides.is_empty() {
            return;
        }
        for side in sides {
            let plane = &self.map.cplanes[self.map.brushsides[side].planenum as usize];
            let d1 = dot_product(&self.start, &plane.normal) - self.side_dist(plane);
            if d1 > 0.0 {
                return;
            }
        }
        self.trace.startsolid = true;
        self.trace.allsolid = true;
        self.trace.fraction = 0.0;
        self.trace.contents = self.map.brush_contents(brush);
    }

    fn leaf_brush_list(&self, leaf: usize) -> &'a [i32] {
        let map = self.map;
        let l = &map.leafs[leaf];
        let first = l.firstleafbrush as usize;
        &map.leafbrushes[first..first + l.numleafbrushes as usize]
    }

    /// First visit of a brush whose contents match the mask.
    fn wants_brush(&mut self, brush: usize) -> bool {
        self.mark_checked(brush) && self.map.brush_contents(brush).intersects(self.contents)
    }

    fn trace_to_leaf(&mut self, leaf: usize) {
        for &b in self.leaf_brush_list(leaf) {
            let brush = b as usize;
            if !self.wants_brush(brush) {
                continue;
            }
            self.check_brush(brush);
            if self.trace.fraction == 0.0 {
                return;
            }
        }
    }

    fn test_in_leaf(&mut self, leaf: usize) {
        for &b in self.leaf_brush_list(leaf) {
            let brush = b as usize;
            if !self.wants_brush(brush) {
                continue;
            }
            self.test_brush_position(brush);
            if self.trace.allsolid {
                return;
            }
        }
    }

    fn check_node(&mut self, num: i32, p1f: f32, p2f: f32, p1: &Vec3, p2: &Vec3) {
        // already hit something nearer
        if self.trace.fraction <= p1f {
            return;
        }

        if num < 0 {
            self.trace_to_leaf(!num as usize);
            return;
        }

        let node = &self.map.nodes[num as usize];
        let children = node.children;
        let plane = &self.map.cplanes[node.planenum as usize];

        let t1 = plane.distance(p1);
        let t2 = plane.distance(p2);
        let offset = self.node_offset(plane);

        if t1 >= offset && t2 >= offset {
            self.check_node(children[0], p1f, p2f, p1, p2);
            return;
        }
        if t1 < -offset && t2 < -offset {
            self.check_node(children[1], p1f, p2f, p1, p2);
            return;
        }

        // the segment crosses: split it, nearer side first
        let (side, frac, frac2) = if t1 < t2 {
            let idist = 1.0 / (t1 - t2);
            (
                1usize,
                ((t1 - offset + DIST_EPSILON) * idist).clamp(0.0, 1.0),
                ((t1 + offset + DIST_EPSILON) * idist).clamp(0.0, 1.0),
            )
        } else if t1 > t2 {
            let idist = 1.0 / (t1 - t2);
            (
                0usize,
                ((t1 + offset + DIST_EPSILON) * idist).clamp(0.0, 1.0),
                ((t1 - offset - DIST_EPSILON) * idist).clamp(0.0, 1.0),
            )
        } else {
            (0usize, 1.0, 0.0)
        };

        let midf = p1f + (p2f - p1f) * frac;
        let mid = vector_lerp(p1, p2, frac);
        self.check_node(children[side], p1f, midf, p1, &mid);

        let midf2 = p1f + (p2f - p1f) * frac2;
        let mid2 = vector_lerp(p1, p2, frac2);
        self.check_node(children[side ^ 1], midf2, p2f, &mid2, p2);
    }
}

// ============================================================
// Queries
// ============================================================

fn head_node(map: &BspMap) -> Option<i32> {
    if !map.nodes.is_empty() {
        Some(0)
    } else if !map.leafs.is_empty() {
        // a lone leaf
        Some(-1)
    } else {
        None
    }
}

fn box_leafnums_r(map: &BspMap, mut nodenum: i32, mins: &Vec3, maxs: &Vec3, list: &mut Vec<usize>) {
    loop {
        if nodenum < 0 {
            list.push(!nodenum as usize);
            return;
        }
        let node = &map.nodes[nodenum as usize];
        let plane = &map.cplanes[node.planenum as usize];
        match box_on_plane_side(mins, maxs, plane) {
            1 => nodenum = node.children[0],
            2 => nodenum = node.children[1],
            _ => {
                box_leafnums_r(map, node.children[0], mins, maxs, list);
                nodenum = node.children[1];
            }
        }
    }
}

/// Every leaf the box touches.
pub fn box_leafnums(map: &BspMap, mins: &Vec3, maxs: &Vec3) -> Vec<usize> {
    let mut list = Vec::new();
    if let Some(head) = head_node(map) {
        box_leafnums_r(map, head, mins, maxs, &mut list);
    }
    list
}

/// Sweep `shape` from `start` to `end` against every brush whose contents
/// intersect `mask`. The map is only read, so traces can run concurrently.
pub fn trace(map: &BspMap, shape: &TraceShape, start: &Vec3, end: &Vec3, mask: Contents) -> Trace {
    let shape = shape.canonical();
    let Some(head) = head_node(map) else {
        return Trace {
            endpos: *end,
            ..Trace::default()
        };
    };

    let mut work = TraceWork::new(map, shape, start, end, mask);

    // position test special case
    if vector_compare(start, end) {
        let (mins, maxs) = shape.bounds();
        let c1 = [start[0] + mins[0] - 1.0, start[1] + mins[1] - 1.0, start[2] + mins[2] - 1.0];
        let c2 = [start[0] + maxs[0] + 1.0, start[1] + maxs[1] + 1.0, start[2] + maxs[2] + 1.0];
        for leaf in box_leafnums(map, &c1, &c2) {
            work.test_in_leaf(leaf);
            if work.trace.allsolid {
                break;
            }
        }
        let mut trace = work.finish();
        trace.endpos = *start;
        return trace;
    }

    work.check_node(head, 0.0, 1.0, start, end);

    let mut trace = work.finish();
    trace.fraction = trace.fraction.clamp(0.0, 1.0);
    if trace.fraction == 1.0 {
        trace.endpos = *end;
    } else {
        trace.endpos = vector_lerp(start, end, trace.fraction);
    }
    trace
}

/// Box sweep in the argument order the movement code uses.
pub fn box_trace(map: &BspMap, start: &Vec3, end: &Vec3, mins: &Vec3, maxs: &Vec3, mask: Contents) -> Trace {
    trace(map, &TraceShape::from_bounds(mins, maxs), start, end, mask)
}

/// OR of the contents of every brush containing `p`.
pub fn point_contents(map: &BspMap, p: &Vec3) -> Contents {
    let Some(head) = head_node(map) else {
        return Contents::empty();
    };
    let leaf = if head < 0 { 0 } else { crate::vis::find_leaf(map, p) };
    let l = &map.leafs[leaf];
    let first = l.firstleafbrush as usize;
    let count = l.numleafbrushes as usize;

    let mut contents = Contents::empty();
    for &b in &map.leafbrushes[first..first + count] {
        let brush = &map.brushes[b as usize];
        let first_side = brush.firstside as usize;
        let inside = brush.numsides > 0
            && map.brushsides[first_side..first_side + brush.numsides as usize]
                .iter()
                .all(|side| map.cplanes[side.planenum as usize].distance(p) <= 0.0);
        if inside {
            contents |= map.brush_contents(b as usize);
        }
    }
    contents
}

// ============================================================
// Tests
// ============================================================
