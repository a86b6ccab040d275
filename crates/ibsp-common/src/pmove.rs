// pmove.rs — box movement with stair stepping and wall sliding
//
// One mover serves players and monsters alike; they differ only in their
// MoveParams (hull, step height, content mask).

use crate::bspfile::BspMap;
use crate::cmodel::box_trace;
use crate::common::com_dprintf;
use crate::cvar::cvar_variable_value;
use crate::q_shared::{
    cross_product, dot_product, vector_add, vector_compare, vector_ma, vector_scale, Contents,
    Trace, Vec3, MASK_MONSTERSOLID, MASK_PLAYERSOLID, VEC3_ORIGIN,
};

// ============================================================
// Constants
// ============================================================

/// Safety valve against geometry that keeps deflecting the box.
pub const MAX_SLIDE_ITERATIONS: usize = 10;
/// Surfaces whose normal has a smaller z are walls, not floors.
pub const MIN_STEP_NORMAL: f32 = 0.7;
pub const DEFAULT_STEP_HEIGHT: f32 = 18.0;
pub const DEFAULT_OVERBOUNCE: f32 = 1.001;

const STOP_EPSILON: f32 = 0.1;
const MAX_CLIP_PLANES: usize = 5;
/// Smallest horizontal move used by the forward step probe on an axis
/// that is moving at all.
const STEP_FORWARD_MIN: f32 = 0.25;
const UNSTUCK_STEP: f32 = 4.0;
const UNSTUCK_MAX_STEPS: usize = 8;
const UNSTUCK_DIRECTIONS: [Vec3; 6] = [
    [0.0, 0.0, 1.0],
    [0.0, 0.0, -1.0],
    [1.0, 0.0, 0.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
];

// ============================================================
// Collision seam
// ============================================================

/// Box sweeps the mover relies on. Implemented by `BspMap`; tests supply
/// stubs.
pub trait TraceWorld {
    fn trace(&self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, mask: Contents) -> Trace;
}

impl TraceWorld for BspMap {
    fn trace(&self, start: &Vec3, mins: &Vec3, maxs: &Vec3, end: &Vec3, mask: Contents) -> Trace {
        box_trace(self, start, end, mins, maxs, mask)
    }
}

// ============================================================
// Parameters and state
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveParams {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub step_height: f32,
    pub content_mask: Contents,
    pub overbounce: f32,
}

impl MoveParams {
    /// Standing player hull.
    pub fn player() -> Self {
        Self {
            mins: [-15.0, -15.0, -24.0],
            maxs: [15.0, 15.0, 32.0],
            step_height: DEFAULT_STEP_HEIGHT,
            content_mask: MASK_PLAYERSOLID,
            overbounce: DEFAULT_OVERBOUNCE,
        }
    }

    /// Player hull with `pm_stepheight` and `pm_overbounce` applied.
    pub fn player_from_cvars() -> Self {
        let mut params = Self::player();
        let step = cvar_variable_value("pm_stepheight");
        if step > 0.0 {
            params.step_height = step;
        }
        let overbounce = cvar_variable_value("pm_overbounce");
        if overbounce > 0.0 {
            params.overbounce = overbounce;
        }
        params
    }

    pub fn monster(mins: Vec3, maxs: Vec3) -> Self {
        Self {
            mins,
            maxs,
            step_height: DEFAULT_STEP_HEIGHT,
            content_mask: MASK_MONSTERSOLID,
            overbounce: DEFAULT_OVERBOUNCE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicBody {
    pub origin: Vec3,
    pub velocity: Vec3,
    /// Standing on a walkable floor. `slide_move` maintains this: it is set
    /// on landing and cleared when the body walks off a ledge or moves
    /// upward. Callers may clear it themselves, e.g. when starting a jump,
    /// so that gravity applies on the next frame.
    pub grounded: bool,
}

impl KinematicBody {
    pub fn new(origin: Vec3) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// Airborne bodies accelerate downward.
    pub fn apply_gravity(&mut self, gravity: f32, dt: f32) {
        if !self.grounded {
            self.velocity[2] -= gravity * dt;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Completed,
    /// started inside a brush but the sweep got out; snapped to its end
    Recovered,
    /// wedged in solid, moved to a nearby free spot
    Unstuck,
    /// wedged in solid with no free spot nearby; the body did not move
    StuckInSolid,
    /// ran out of iterations before using up the timestep
    DegenerateSweep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideMoveReport {
    pub outcome: MoveOutcome,
    pub iterations: usize,
    /// a stair step was taken during the move
    pub stepped: bool,
}

/// Slide off of the impacting surface. Moving into the plane pushes back
/// slightly more than needed, moving away slightly less.
pub fn clip_velocity(v: &Vec3, normal: &Vec3, overbounce: f32) -> Vec3 {
    let mut backoff = dot_product(v, normal);
    if backoff < 0.0 {
        backoff *= overbounce;
    } else {
        backoff /= overbounce;
    }
    let mut out = [0.0f32; 3];
    for i in 0..3 {
        out[i] = v[i] - normal[i] * backoff;
        if out[i] > -STOP_EPSILON && out[i] < STOP_EPSILON {
            out[i] = 0.0;
        }
    }
    out
}

// ============================================================
// Slide-move state machine
// ============================================================

enum SlideState {
    Sliding,
    StepProbeUp { blocked: Trace },
    StepProbeForward { up: Vec3, blocked: Trace },
    StepProbeDown { forward: Vec3, blocked: Trace },
    Done(MoveOutcome),
}

struct SlideMover<'a, W: TraceWorld + ?Sized> {
    world: &'a W,
    params: &'a MoveParams,
    body: &'a mut KinematicBody,
    time_left: f32,
    primal_velocity: Vec3,
    planes: Vec<Vec3>,
    iterations: usize,
    stepped: bool,
}

impl<'a, W: TraceWorld + ?Sized> SlideMover<'a, W> {
    fn trace(&self, start: &Vec3, end: &Vec3) -> Trace {
        self.world.trace(start, &self.params.mins, &self.params.maxs, end, self.params.content_mask)
    }

    fn run(&mut self) -> MoveOutcome {
        let mut state = SlideState::Sliding;
        loop {
            state = match state {
                SlideState::Sliding => self.sweep(),
                SlideState::StepProbeUp { blocked } => self.probe_up(blocked),
                SlideState::StepProbeForward { up, blocked } => self.probe_forward(up, blocked),
                SlideState::StepProbeDown { forward, blocked } => self.probe_down(forward, blocked),
                SlideState::Done(outcome) => return outcome,
            };
        }
    }

    fn sweep(&mut self) -> SlideState {
        if self.time_left <= 0.0 || vector_compare(&self.body.velocity, &VEC3_ORIGIN) {
            return SlideState::Done(MoveOutcome::Completed);
        }
        if self.iterations >= MAX_SLIDE_ITERATIONS {
            return SlideState::Done(MoveOutcome::DegenerateSweep);
        }
        self.iterations += 1;

        let end = vector_ma(&self.body.origin, self.time_left, &self.body.velocity);
        let tr = self.trace(&self.body.origin, &end);

        if tr.allsolid {
            return self.unstick();
        }
        if tr.startsolid {
            com_dprintf(&format!(
                "slide move: start in solid at {:?}, snapping out\n",
                self.body.origin
            ));
            self.body.origin = tr.endpos;
            self.body.velocity = VEC3_ORIGIN;
            return SlideState::Done(MoveOutcome::Recovered);
        }

        if tr.fraction > 0.0 {
            // actually covered some distance
            self.body.origin = tr.endpos;
            self.planes.clear();
        }

        if tr.fraction == 1.0 {
            self.time_left = 0.0;
            if self.body.grounded {
                self.step_down();
            }
            return SlideState::Done(MoveOutcome::Completed);
        }

        self.time_left -= self.time_left * tr.fraction;

        if tr.plane.normal[2] < MIN_STEP_NORMAL && self.body.velocity[2] <= 0.0 {
            SlideState::StepProbeUp { blocked: tr }
        } else {
            self.slide(&tr)
        }
    }

    fn probe_up(&mut self, blocked: Trace) -> SlideState {
        let mut up = self.body.origin;
        up[2] += self.params.step_height;
        let tr = self.trace(&self.body.origin, &up);
        if tr.startsolid || tr.hit() {
            return self.fall_back(&blocked);
        }
        SlideState::StepProbeForward { up, blocked }
    }

    fn probe_forward(&mut self, up: Vec3, blocked: Trace) -> SlideState {
        let v = &self.body.velocity;
        let mut delta = [v[0] * self.time_left, v[1] * self.time_left, 0.0];
        for d in delta.iter_mut().take(2) {
            if *d != 0.0 && d.abs() < STEP_FORWARD_MIN {
                *d = STEP_FORWARD_MIN.copysign(*d);
            }
        }
        if delta[0] == 0.0 && delta[1] == 0.0 {
            return self.fall_back(&blocked);
        }

        let forward = vector_add(&up, &delta);
        let tr = self.trace(&up, &forward);
        if tr.startsolid || tr.hit() {
            return self.fall_back(&blocked);
        }
        SlideState::StepProbeDown { forward, blocked }
    }

    fn probe_down(&mut self, forward: Vec3, blocked: Trace) -> SlideState {
        let mut down = forward;
        down[2] -= self.params.step_height;
        let tr = self.trace(&forward, &down);
        let landed = !tr.startsolid
            && tr.hit()
            && tr.endpos[2] >= self.body.origin[2]
            && tr.plane.normal[2] > MIN_STEP_NORMAL;
        if !landed {
            return self.fall_back(&blocked);
        }

        self.body.origin = tr.endpos;
        self.body.grounded = true;
        self.stepped = true;
        // the forward probe used up the rest of the timestep
        self.time_left = 0.0;
        SlideState::Done(MoveOutcome::Completed)
    }

    /// A step was not possible: stick to the ground if standing on it, then
    /// slide along whatever stopped the sweep.
    fn fall_back(&mut self, blocked: &Trace) -> SlideState {
        if self.body.grounded {
            self.step_down();
        }
        self.slide(blocked)
    }

    /// Pull a grounded body down onto the floor below, at most one step.
    fn step_down(&mut self) -> bool {
        let mut down = self.body.origin;
        down[2] -= self.params.step_height;
        let tr = self.trace(&self.body.origin, &down);
        if !tr.startsolid && tr.hit() && tr.plane.normal[2] > MIN_STEP_NORMAL {
            self.body.origin = tr.endpos;
            self.body.grounded = true;
            true
        } else {
            self.body.grounded = false;
            false
        }
    }

    fn slide(&mut self, blocked: &Trace) -> SlideState {
        let normal = blocked.plane.normal;
        if normal[2] > MIN_STEP_NORMAL {
            self.body.grounded = true;
        }

        if self.planes.len() >= MAX_CLIP_PLANES {
            self.body.velocity = VEC3_ORIGIN;
            return SlideState::Done(MoveOutcome::Completed);
        }
        self.planes.push(normal);

        // make the velocity parallel to all of the clip planes
        let mut found = false;
        for i in 0..self.planes.len() {
            let clipped = clip_velocity(&self.body.velocity, &self.planes[i], self.params.overbounce);
            let ok = self
                .planes
                .iter()
                .enumerate()
                .all(|(j, p)| j == i || dot_product(&clipped, p) >= 0.0);
            if ok {
                self.body.velocity = clipped;
                found = true;
                break;
            }
        }

        if !found {
            // go along the crease
            if self.planes.len() != 2 {
                self.body.velocity = VEC3_ORIGIN;
                return SlideState::Done(MoveOutcome::Completed);
            }
            let dir = cross_product(&self.planes[0], &self.planes[1]);
            let d = dot_product(&dir, &self.body.velocity);
            self.body.velocity = vector_scale(&dir, d);
        }

        // turned back on itself, stop dead
        if dot_product(&self.body.velocity, &self.primal_velocity) <= 0.0 {
            self.body.velocity = VEC3_ORIGIN;
            return SlideState::Done(MoveOutcome::Completed);
        }
        SlideState::Sliding
    }

    /// Look for free space along the six axes at growing distances.
    fn unstick(&mut self) -> SlideState {
        self.body.velocity = VEC3_ORIGIN;
        for step in 1..=UNSTUCK_MAX_STEPS {
            let dist = UNSTUCK_STEP * step as f32;
            for dir in &UNSTUCK_DIRECTIONS {
                let spot = vector_ma(&self.body.origin, dist, dir);
                if !self.trace(&spot, &spot).startsolid {
                    com_dprintf(&format!(
                        "slide move: unstuck from {:?} to {:?}\n",
                        self.body.origin, spot
                    ));
                    self.body.origin = spot;
                    return SlideState::Done(MoveOutcome::Unstuck);
                }
            }
        }
        com_dprintf(&format!("slide move: stuck in solid at {:?}\n", self.body.origin));
        SlideState::Done(MoveOutcome::StuckInSolid)
    }
}

/// Move `body` through `world` for `dt` seconds at its current velocity.
/// Gravity is the caller's business; see `KinematicBody::apply_gravity`.
pub fn slide_move<W: TraceWorld + ?Sized>(
    world: &W,
    body: &mut KinematicBody,
    params: &MoveParams,
    dt: f32,
) -> SlideMoveReport {
    // moving up leaves the ground; never stick back down to it
    if body.velocity[2] > 0.0 {
        body.grounded = false;
    }
    let primal_velocity = body.velocity;
    let mut mover = SlideMover {
        world,
        params,
        body,
        time_left: dt,
        primal_velocity,
        planes: Vec::with_capacity(MAX_CLIP_PLANES),
        iterations: 0,
        stepped: false,
    };
    let outcome = mover.run();
    SlideMoveReport {
        outcome,
        iterations: mover.iterations,
        stepped: mover.stepped,
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q_shared::{vector_lerp, CPlane};
    use crate::test_map::{box_room_map, stairs_map};

    fn clear(end: &Vec3) -> Trace {
        Trace {
            endpos: *end,
            ..Trace::default()
        }
    }

    /// Open air, no collisions.
    struct OpenAir;

    impl TraceWorld for OpenAir {
        fn trace(&self, _start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _mask: Contents) -> Trace {
            clear(end)
        }
    }

    /// Solid floor filling everything below z = 0.
    struct Floor;

    impl TraceWorld for Floor {
        fn trace(&self, start: &Vec3, mins: &Vec3, _maxs: &Vec3, end: &Vec3, _mask: Contents) -> Trace {
            let floor = -mins[2];
            if start[2] < floor {
                return Trace {
                    startsolid: true,
                    allsolid: end[2] < floor,
                    fraction: 0.0,
                    endpos: *start,
                    ..Trace::default()
                };
            }
            if end[2] >= floor {
                return clear(end);
            }
            let frac = ((start[2] - floor) / (start[2] - end[2])).clamp(0.0, 1.0);
            let mut endpos = vector_lerp(start, end, frac);
            endpos[2] = floor;
            Trace {
                fraction: frac,
                endpos,
                plane: CPlane::new([0.0, 0.0, 1.0], 0.0),
                contents: Contents::SOLID,
                ..Trace::default()
            }
        }
    }

    /// Solid below z = 8, including for position tests.
    struct Buried;

    impl TraceWorld for Buried {
        fn trace(&self, start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _mask: Contents) -> Trace {
            if start[2] < 8.0 {
                Trace {
                    startsolid: true,
                    allsolid: true,
                    fraction: 0.0,
                    endpos: *start,
                    ..Trace::default()
                }
            } else {
                clear(end)
            }
        }
    }

    /// Everything is solid.
    struct Rock;

    impl TraceWorld for Rock {
        fn trace(&self, start: &Vec3, _mins: &Vec3, _maxs: &Vec3, _end: &Vec3, _mask: Contents) -> Trace {
            Trace {
                startsolid: true,
                allsolid: true,
                fraction: 0.0,
                endpos: *start,
                ..Trace::default()
            }
        }
    }

    /// Starts inside something but always gets out.
    struct Emerging;

    impl TraceWorld for Emerging {
        fn trace(&self, _start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _mask: Contents) -> Trace {
            Trace {
                startsolid: true,
                ..clear(end)
            }
        }
    }

    /// Every sweep gets halfway against a floor-like plane.
    struct Halfway;

    impl TraceWorld for Halfway {
        fn trace(&self, start: &Vec3, _mins: &Vec3, _maxs: &Vec3, end: &Vec3, _mask: Contents) -> Trace {
            Trace {
                fraction: 0.5,
                endpos: vector_lerp(start, end, 0.5),
                plane: CPlane::new([0.0, 0.0, 1.0], 0.0),
                ..Trace::default()
            }
        }
    }

    fn moving(origin: Vec3, velocity: Vec3, grounded: bool) -> KinematicBody {
        KinematicBody { origin, velocity, grounded }
    }

    #[test]
    fn test_clip_velocity() {
        let out = clip_velocity(&[10.0, 0.0, -10.0], &[0.0, 0.0, 1.0], 1.0);
        assert!((out[0] - 10.0).abs() < 1e-6);
        assert!(out[1].abs() < 1e-6);
        assert!(out[2].abs() < 1e-6); // vertical component removed
    }

    #[test]
    fn test_clip_velocity_overbounce_sign() {
        // into the plane: projection multiplied, bounces slightly off
        let out = clip_velocity(&[0.0, 0.0, -100.0], &[0.0, 0.0, 1.0], 1.01);
        assert!((out[2] - 1.0).abs() < 0.01);
        // away from the plane: projection divided, keeps most of it
        let out = clip_velocity(&[0.0, 0.0, 100.0], &[0.0, 0.0, 1.0], 2.0);
        assert!((out[2] - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_clip_velocity_wall_slide() {
        let out = clip_velocity(&[100.0, 50.0, 0.0], &[-1.0, 0.0, 0.0], 1.001);
        // pushed just off the wall
        assert!(out[0] <= 0.0 && out[0] > -0.2, "{}", out[0]);
        assert!((out[1] - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_open_air_full_move() {
        let mut body = moving([0.0, 0.0, 100.0], [10.0, -20.0, 5.0], false);
        let report = slide_move(&OpenAir, &mut body, &MoveParams::player(), 0.5);
        assert_eq!(report.outcome, MoveOutcome::Completed);
        assert_eq!(report.iterations, 1);
        assert_eq!(body.origin, [5.0, -10.0, 102.5]);
        assert!(!body.grounded);
    }

    #[test]
    fn test_walking_off_ledge_ungrounds() {
        let mut body = moving([0.0, 0.0, 100.0], [10.0, 0.0, 0.0], true);
        slide_move(&OpenAir, &mut body, &MoveParams::player(), 0.1);
        assert!(!body.grounded);
    }

    #[test]
    fn test_landing_grounds_body() {
        let mut body = moving([0.0, 0.0, 64.0], [50.0, 0.0, -400.0], false);
        let report = slide_move(&Floor, &mut body, &MoveParams::player(), 0.5);
        assert_eq!(report.outcome, MoveOutcome::Completed);
        assert!(body.grounded);
        assert!((body.origin[2] - 24.0).abs() < 0.5);
        assert!(body.velocity[2].abs() < 1.0);
        assert!(body.velocity[0] > 0.0);
    }

    #[test]
    fn test_ground_stick_keeps_grounded() {
        let mut body = moving([0.0, 0.0, 24.0], [100.0, 0.0, 0.0], true);
        let report = slide_move(&Floor, &mut body, &MoveParams::player(), 0.1);
        assert_eq!(report.outcome, MoveOutcome::Completed);
        assert!(body.grounded);
        assert!((body.origin[0] - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_unstuck_search() {
        let mut body = moving([0.0, 0.0, 0.0], [10.0, 0.0, 0.0], false);
        let report = slide_move(&Buried, &mut body, &MoveParams::player(), 1.0);
        assert_eq!(report.outcome, MoveOutcome::Unstuck);
        assert_eq!(body.origin, [0.0, 0.0, 8.0]);
        assert_eq!(body.velocity, VEC3_ORIGIN);
    }

    #[test]
    fn test_stuck_in_solid() {
        let mut body = moving([1.0, 2.0, 3.0], [10.0, 0.0, 0.0], true);
        let report = slide_move(&Rock, &mut body, &MoveParams::player(), 1.0);
        assert_eq!(report.outcome, MoveOutcome::StuckInSolid);
        assert_eq!(body.origin, [1.0, 2.0, 3.0]);
        assert_eq!(body.velocity, VEC3_ORIGIN);
    }

    #[test]
    fn test_start_solid_recovers() {
        let mut body = moving([0.0; 3], [10.0, 0.0, 0.0], false);
        let report = slide_move(&Emerging, &mut body, &MoveParams::player(), 1.0);
        assert_eq!(report.outcome, MoveOutcome::Recovered);
        assert_eq!(body.origin, [10.0, 0.0, 0.0]);
        assert_eq!(body.velocity, VEC3_ORIGIN);
    }

    #[test]
    fn test_iteration_budget() {
        let mut body = moving([0.0; 3], [10.0, 0.0, 0.0], false);
        let report = slide_move(&Halfway, &mut body, &MoveParams::player(), 1.0);
        assert_eq!(report.outcome, MoveOutcome::DegenerateSweep);
        assert_eq!(report.iterations, MAX_SLIDE_ITERATIONS);
    }

    #[test]
    fn test_monster_mask() {
        let params = MoveParams::monster([-16.0; 3], [16.0; 3]);
        assert!(params.content_mask.contains(Contents::MONSTERCLIP));
        assert!(!params.content_mask.contains(Contents::PLAYERCLIP));
        assert!(MoveParams::player().content_mask.contains(Contents::PLAYERCLIP));
    }

    #[test]
    fn test_grounded_body_moving_up_rises() {
        let map = BspMap::from_bytes("room", &box_room_map()).unwrap();
        let start = [0.0, 0.0, 24.03125];
        let mut body = moving(start, [0.0, 0.0, 270.0], true);
        let report = slide_move(&map, &mut body, &MoveParams::player(), 0.05);
        assert_eq!(report.outcome, MoveOutcome::Completed);
        assert!(!body.grounded);
        assert!((body.origin[2] - (start[2] + 13.5)).abs() < 1e-3, "{:?}", body.origin);
        assert_eq!(body.velocity, [0.0, 0.0, 270.0]);

        // next frame gravity applies again
        body.apply_gravity(800.0, 0.05);
        assert!(body.velocity[2] < 270.0);
    }

    #[test]
    fn test_jump_off_stub_floor() {
        let mut body = moving([0.0, 0.0, 24.0], [50.0, 0.0, 100.0], true);
        slide_move(&Floor, &mut body, &MoveParams::player(), 0.1);
        assert!(!body.grounded);
        assert!((body.origin[2] - 34.0).abs() < 1e-4);
    }

    fn stairs() -> BspMap {
        BspMap::from_bytes("stairs", &stairs_map()).unwrap()
    }

    fn feet_params(step_height: f32) -> MoveParams {
        MoveParams {
            mins: [-16.0, -16.0, 0.0],
            maxs: [16.0, 16.0, 56.0],
            step_height,
            ..MoveParams::player()
        }
    }

    #[test]
    fn test_climbs_single_stair() {
        let map = stairs();
        let start = [0.0, 0.0, 0.03125];
        let mut body = moving(start, [100.0, 0.0, 0.0], true);
        let report = slide_move(&map, &mut body, &feet_params(18.0), 1.0);
        assert_eq!(report.outcome, MoveOutcome::Completed);
        assert!(report.stepped);
        assert!((body.origin[2] - start[2] - 16.0).abs() < 0.1, "{:?}", body.origin);
        assert!(body.grounded);
        assert_eq!(body.velocity[0], 100.0);
        assert!(body.origin[0] > 64.0);
    }

    #[test]
    fn test_stair_too_high_slides() {
        let map = stairs();
        let start = [0.0, 0.0, 0.03125];
        let mut body = moving(start, [100.0, 50.0, 0.0], true);
        let report = slide_move(&map, &mut body, &feet_params(8.0), 1.0);
        assert!(!report.stepped);
        assert!(body.origin[0] < 48.1);
        assert!(body.origin[1] > 40.0);
        assert!((body.origin[2] - start[2]).abs() < 0.1);
        assert!(body.grounded);
    }
}
