//! Kinematic agent movement: ground snapping, Quake-style acceleration and
//! ray-probe wall resolution.
//!
//! An agent's position is the top of its body (eye height for the player).
//! Feet sit at `position.y - height`.

use std::f32::consts::FRAC_1_SQRT_2;

use engine_core::Vec3;

use crate::CollisionQuery;

/// Extra reach of the downward ground probe beyond the agent height.
pub const GROUND_PROBE_REACH: f32 = 0.5;
/// A ground hit within `height + GROUND_SNAP_TOLERANCE` counts as standing.
pub const GROUND_SNAP_TOLERANCE: f32 = 0.1;
/// Extra reach of horizontal wall probes beyond the agent radius.
pub const WALL_PROBE_REACH: f32 = 0.1;
/// Added to every wall push so the agent ends up just clear of the surface.
pub const WALL_PUSH_EPSILON: f32 = 0.01;
/// Floor height used when no collision geometry is registered.
pub const FALLBACK_FLOOR_Y: f32 = 0.0;
/// Ankle probe height above the feet.
pub const ANKLE_OFFSET: f32 = 0.2;
/// Head probe distance below the top of the agent.
pub const HEAD_CLEARANCE: f32 = 0.1;

/// Horizontal wall probe directions, resolved in this order every tick.
pub const WALL_PROBE_DIRECTIONS: [Vec3; 8] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
    Vec3::new(FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
    Vec3::new(FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2),
    Vec3::new(-FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
    Vec3::new(-FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2),
];

/// Per-agent movement state carried between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentBody {
    pub velocity: Vec3,
    pub grounded: bool,
    /// Current (smoothed) body height.
    pub height: f32,
    pub time_since_grounded: f32,
    /// Remaining time a buffered jump request stays valid.
    pub jump_buffer: f32,
}

impl AgentBody {
    pub fn new(height: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            grounded: true,
            height,
            time_since_grounded: 0.0,
            jump_buffer: 0.0,
        }
    }

    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }

    /// Store the result of [`move_agent`] and advance the airborne timer.
    pub fn apply(&mut self, result: &AgentMove, dt: f32) {
        self.velocity = result.velocity;
        self.grounded = result.grounded;
        if result.grounded {
            self.time_since_grounded = 0.0;
        } else {
            self.time_since_grounded += dt;
        }
    }
}

/// Inputs to one [`move_agent`] step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveParams {
    pub height: f32,
    pub radius: f32,
    /// Desired horizontal direction; zero for no input.
    pub wish_direction: Vec3,
    pub max_speed: f32,
    pub accel: f32,
    pub friction: f32,
    pub gravity: f32,
    /// Skip ground friction (sliding).
    pub skidding: bool,
}

/// Output of one [`move_agent`] step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentMove {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
}

/// Probe straight down from `position`. Returns the ground height when the
/// agent is standing on something.
pub fn probe_ground<Q: CollisionQuery + ?Sized>(position: Vec3, height: f32, query: &Q) -> Option<f32> {
    if !query.has_geometry() {
        let distance = position.y - FALLBACK_FLOOR_Y;
        return (distance <= height + GROUND_SNAP_TOLERANCE).then_some(FALLBACK_FLOOR_Y);
    }
    let hit = query.cast_ray(position, Vec3::NEG_Y, height + GROUND_PROBE_REACH)?;
    (hit.distance <= height + GROUND_SNAP_TOLERANCE).then_some(hit.point.y)
}

/// Scale horizontal velocity down by `friction * dt`, never reversing it.
pub fn apply_friction(velocity: &mut Vec3, friction: f32, dt: f32) {
    let speed = Vec3::new(velocity.x, 0.0, velocity.z).length();
    if speed <= f32::EPSILON {
        return;
    }
    let new_speed = (speed - speed * friction * dt).max(0.0);
    let scale = new_speed / speed;
    velocity.x *= scale;
    velocity.z *= scale;
}

/// Quake-style acceleration: only the speed missing along the wish
/// direction is added, capped at `accel * dt * max_speed` per call.
/// Returns the velocity change.
pub fn accelerate(velocity: &mut Vec3, wish_direction: Vec3, max_speed: f32, accel: f32, dt: f32) -> Vec3 {
    let wish = Vec3::new(wish_direction.x, 0.0, wish_direction.z).normalize_or_zero();
    if wish == Vec3::ZERO {
        return Vec3::ZERO;
    }
    let add_speed = max_speed - velocity.dot(wish);
    if add_speed <= 0.0 {
        return Vec3::ZERO;
    }
    let accel_speed = (accel * dt * max_speed).min(add_speed);
    let delta = wish * accel_speed;
    *velocity += delta;
    delta
}

/// Push the agent out of walls using horizontal probes at ankle, waist and
/// head height. Each push uses the position left by the previous one.
pub fn resolve_walls<Q: CollisionQuery + ?Sized>(
    position: &mut Vec3,
    velocity: &mut Vec3,
    height: f32,
    radius: f32,
    query: &Q,
) {
    if !query.has_geometry() {
        return;
    }
    let reach = radius + WALL_PROBE_REACH;
    let drops = [height - ANKLE_OFFSET, height * 0.5, HEAD_CLEARANCE];
    for direction in WALL_PROBE_DIRECTIONS {
        for drop in drops {
            let origin = *position - Vec3::Y * drop;
            let Some(hit) = query.cast_ray(origin, direction, reach) else {
                continue;
            };
            let penetration = radius - hit.distance + WALL_PUSH_EPSILON;
            if penetration <= 0.0 {
                continue;
            }
            *position -= direction * penetration;
            let into_wall = velocity.dot(direction);
            if into_wall > 0.0 {
                *velocity -= direction * into_wall;
            }
        }
    }
}

/// Advance a kinematic agent by one tick.
///
/// Order: ground probe, friction, acceleration, gravity, integration, wall
/// resolution, final ground clamp. A grounded result always has
/// `position.y == ground + height` and no downward velocity.
pub fn move_agent<Q: CollisionQuery + ?Sized>(
    position: Vec3,
    velocity: Vec3,
    params: &MoveParams,
    dt: f32,
    query: &Q,
) -> AgentMove {
    let mut position = position;
    let mut velocity = velocity;

    let mut grounded = false;
    if velocity.y <= 0.0 {
        if let Some(ground_y) = probe_ground(position, params.height, query) {
            grounded = true;
            position.y = position.y.max(ground_y + params.height);
            velocity.y = 0.0;
        }
    }

    if grounded && !params.skidding {
        apply_friction(&mut velocity, params.friction, dt);
    }

    accelerate(
        &mut velocity,
        params.wish_direction,
        params.max_speed,
        params.accel,
        dt,
    );

    if !grounded {
        velocity.y -= params.gravity * dt;
    }

    position += velocity * dt;

    resolve_walls(&mut position, &mut velocity, params.height, params.radius, query);

    grounded = false;
    if velocity.y <= 0.0 {
        if let Some(ground_y) = probe_ground(position, params.height, query) {
            grounded = true;
            position.y = ground_y + params.height;
            velocity.y = 0.0;
        }
    }

    AgentMove {
        position,
        velocity,
        grounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollisionWorld;

    const DT: f32 = 1.0 / 60.0;

    fn params(wish: Vec3) -> MoveParams {
        MoveParams {
            height: 1.6,
            radius: 0.4,
            wish_direction: wish,
            max_speed: 6.0,
            accel: 10.0,
            friction: 8.0,
            gravity: 20.0,
            skidding: false,
        }
    }

    fn floor(world: &mut CollisionWorld) {
        world
            .add_quad([
                Vec3::new(-50.0, 0.0, -50.0),
                Vec3::new(50.0, 0.0, -50.0),
                Vec3::new(50.0, 0.0, 50.0),
                Vec3::new(-50.0, 0.0, 50.0),
            ])
            .unwrap();
    }

    #[test]
    fn falls_onto_fallback_floor_without_geometry() {
        let world = CollisionWorld::new();
        let p = params(Vec3::ZERO);
        let mut pos = Vec3::new(0.0, 6.0, 0.0);
        let mut vel = Vec3::ZERO;
        let mut grounded = false;
        for _ in 0..240 {
            let r = move_agent(pos, vel, &p, DT, &world);
            pos = r.position;
            vel = r.velocity;
            grounded = r.grounded;
        }
        assert!(grounded);
        assert!((pos.y - p.height).abs() < 1e-5);
        assert_eq!(vel.y, 0.0);
    }

    #[test]
    fn below_fallback_floor_snaps_up() {
        let world = CollisionWorld::new();
        let p = params(Vec3::ZERO);
        let r = move_agent(Vec3::new(0.0, -3.0, 0.0), Vec3::ZERO, &p, DT, &world);
        assert!(r.grounded);
        assert!((r.position.y - p.height).abs() < 1e-5);
    }

    /// Every grounded result sits exactly one body height above the floor.
    #[test]
    fn grounded_results_are_clamped_to_floor() {
        let mut world = CollisionWorld::new();
        floor(&mut world);
        let mut p = params(Vec3::new(0.3, 0.0, -1.0));
        let mut pos = Vec3::new(0.5, 3.0, 0.0);
        let mut vel = Vec3::new(0.0, -1.0, 0.0);
        let mut saw_grounded = false;
        for i in 0..300 {
            if i == 150 {
                p.wish_direction = Vec3::new(-1.0, 0.0, 0.2);
            }
            let r = move_agent(pos, vel, &p, DT, &world);
            if r.grounded {
                saw_grounded = true;
                assert!((r.position.y - p.height).abs() < 1e-4, "y = {}", r.position.y);
                assert!(r.velocity.y >= 0.0);
            }
            pos = r.position;
            vel = r.velocity;
        }
        assert!(saw_grounded);
    }

    /// A single acceleration step never adds more than accel * dt * max_speed.
    #[test]
    fn acceleration_step_is_capped() {
        let cap = 10.0 * DT * 6.0;
        let starts = [
            Vec3::ZERO,
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(-8.0, 0.0, 2.0),
            Vec3::new(0.0, 4.0, 9.0),
        ];
        let wishes = [
            Vec3::X,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-0.2, 0.0, 5.0),
            Vec3::NEG_Z,
        ];
        for start in starts {
            for wish in wishes {
                let mut v = start;
                let delta = accelerate(&mut v, wish, 6.0, 10.0, DT);
                assert!(delta.length() <= cap + 1e-5);
                assert_eq!(delta.y, 0.0);
            }
        }
    }

    #[test]
    fn acceleration_stops_at_max_speed() {
        let mut v = Vec3::ZERO;
        for _ in 0..600 {
            accelerate(&mut v, Vec3::X, 6.0, 10.0, DT);
        }
        assert!((v.x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn friction_never_reverses_velocity() {
        let mut v = Vec3::new(2.0, 1.0, -1.0);
        apply_friction(&mut v, 100.0, 0.05);
        assert_eq!(v.x, 0.0);
        assert_eq!(v.z, 0.0);
        assert_eq!(v.y, 1.0);

        let mut v = Vec3::new(4.0, 0.0, 0.0);
        apply_friction(&mut v, 8.0, DT);
        assert!(v.x > 0.0 && v.x < 4.0);
    }

    #[test]
    fn skidding_skips_friction() {
        let world = CollisionWorld::new();
        let mut p = params(Vec3::ZERO);
        p.skidding = true;
        let start = Vec3::new(0.0, p.height, 0.0);
        let r = move_agent(start, Vec3::new(10.0, 0.0, 0.0), &p, DT, &world);
        assert!(r.grounded);
        assert_eq!(r.velocity.x, 10.0);
    }

    #[test]
    fn wall_stops_agent() {
        let mut world = CollisionWorld::new();
        floor(&mut world);
        world
            .add_quad([
                Vec3::new(3.0, -1.0, -10.0),
                Vec3::new(3.0, -1.0, 10.0),
                Vec3::new(3.0, 5.0, 10.0),
                Vec3::new(3.0, 5.0, -10.0),
            ])
            .unwrap();

        let p = params(Vec3::X);
        let mut pos = Vec3::new(0.0, p.height, 0.37);
        let mut vel = Vec3::ZERO;
        for _ in 0..240 {
            let r = move_agent(pos, vel, &p, DT, &world);
            pos = r.position;
            vel = r.velocity;
            assert!(pos.x < 3.0 - p.radius + 0.15, "x = {}", pos.x);
        }
        assert!(pos.x > 2.0);
    }

    #[test]
    fn removed_wall_no_longer_blocks() {
        let mut world = CollisionWorld::new();
        floor(&mut world);
        let wall = world
            .add_quad([
                Vec3::new(3.0, -1.0, -10.0),
                Vec3::new(3.0, -1.0, 10.0),
                Vec3::new(3.0, 5.0, 10.0),
                Vec3::new(3.0, 5.0, -10.0),
            ])
            .unwrap();
        assert!(world.remove_mesh(wall));

        let p = params(Vec3::X);
        let mut pos = Vec3::new(0.0, p.height, 0.37);
        let mut vel = Vec3::ZERO;
        for _ in 0..240 {
            let r = move_agent(pos, vel, &p, DT, &world);
            pos = r.position;
            vel = r.velocity;
        }
        assert!(pos.x > 5.0);
    }

    #[test]
    fn walking_off_a_ledge_becomes_airborne() {
        let mut world = CollisionWorld::new();
        world
            .add_quad([
                Vec3::new(-5.0, 0.0, -5.0),
                Vec3::new(5.0, 0.0, -5.0),
                Vec3::new(5.0, 0.0, 5.0),
                Vec3::new(-5.0, 0.0, 5.0),
            ])
            .unwrap();
        let p = params(Vec3::X);
        let mut pos = Vec3::new(4.0, p.height, 0.3);
        let mut vel = Vec3::new(6.0, 0.0, 0.0);
        let mut body = AgentBody::new(p.height);
        for _ in 0..30 {
            let r = move_agent(pos, vel, &p, DT, &world);
            body.apply(&r, DT);
            pos = r.position;
            vel = r.velocity;
        }
        assert!(!body.grounded);
        assert!(body.time_since_grounded > 0.0);
        assert!(pos.y < p.height);
    }

    fn settle_in_corner() -> (Vec3, Vec3, usize) {
        let mut world = CollisionWorld::new();
        floor(&mut world);
        world
            .add_quad([
                Vec3::new(3.0, -1.0, -10.0),
                Vec3::new(3.0, -1.0, 10.0),
                Vec3::new(3.0, 5.0, 10.0),
                Vec3::new(3.0, 5.0, -10.0),
            ])
            .unwrap();
        world
            .add_quad([
                Vec3::new(-10.0, -1.0, -3.0),
                Vec3::new(10.0, -1.0, -3.0),
                Vec3::new(10.0, 5.0, -3.0),
                Vec3::new(-10.0, 5.0, -3.0),
            ])
            .unwrap();

        let p = params(Vec3::new(1.0, 0.0, -1.0));
        let mut pos = Vec3::new(1.0, p.height, -1.0);
        let mut vel = Vec3::ZERO;
        let mut airborne_ticks = 0;
        for _ in 0..300 {
            let r = move_agent(pos, vel, &p, DT, &world);
            if !r.grounded {
                airborne_ticks += 1;
            }
            pos = r.position;
            vel = r.velocity;
        }
        (pos, vel, airborne_ticks)
    }

    /// Pushing diagonally into two perpendicular walls settles the agent one
    /// radius off each wall, grounded the whole way.
    #[test]
    fn corner_pins_agent_against_both_walls() {
        let (pos, vel, airborne_ticks) = settle_in_corner();
        let r = 0.4 + WALL_PUSH_EPSILON;
        assert_eq!(airborne_ticks, 0);
        assert!((pos.x - (3.0 - r)).abs() < 0.03, "x = {}", pos.x);
        assert!((pos.z - (-3.0 + r)).abs() < 0.03, "z = {}", pos.z);
        assert!((pos.y - 1.6).abs() < 1e-4);
        assert!(vel.x.abs() < 0.5 && vel.z.abs() < 0.5, "v = {vel}");

        let (again, _, _) = settle_in_corner();
        assert_eq!(pos, again);
    }
}
