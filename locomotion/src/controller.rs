//! Locomotion state machine.
//!
//! `LocomotionController` owns the stance, the combo counter and the climb clamp flags.
//! It is driven by three entry points:
//! - `handle_input`: semantic input events and every input-driven transition
//! - `frame_update`: once per rendered frame (speed ramp, yaw, glide attitude, grounding)
//! - `fixed_update`: once per physics tick (forces, climb clamp, step assist)
//!
//! Each call borrows a `ControllerContext` for the physics world; nothing is cached
//! between calls except the controller's own state. Observable output is queued and
//! collected with `drain_events`.

use bevy::prelude::*;

use crate::anim;
use crate::camera::{CameraState, PerspectiveChanged};
use crate::capabilities::{AnimationSink, ControllerContext, ForceMode, LayerMask};
use crate::combo::ComboState;
use crate::config::LocomotionConfig;
use crate::input::InputEvent;
use crate::math::{forward_from_yaw, right_from_yaw, smooth_damp_angle, wrap_angle, yaw_facing, yaw_of};
use crate::probe::{self, ClampEffect, ClimbClampState};
use crate::stance::{Stance, StanceChanged};

/// Below this the clamped climb vector counts as "pinned".
const CLIMB_STILL_EPSILON: f32 = 1e-6;

/// Things that happened during a controller call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LocomotionEvent {
    StanceChanged(StanceChanged),
    Jumped,
    Punched { combo: u8 },
    ComboReset,
    TargetsHit { count: usize },
    /// Ungrounded -> grounded edge of the ground check.
    Landed,
}

/// Glide orientation in degrees. Positive pitch is nose down, positive roll banks right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlideAttitude {
    /// Radians.
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl GlideAttitude {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw,
            -self.pitch.to_radians(),
            -self.roll.to_radians(),
        )
    }
}

#[derive(Component, Clone, Debug)]
pub struct LocomotionController {
    config: LocomotionConfig,
    stance: Stance,
    speed: f32,
    move_command: Vec2,
    sprint_held: bool,
    yaw_velocity: f32,
    glide: GlideAttitude,
    clamp: ClimbClampState,
    combo: ComboState,
    is_punching: bool,
    grounded: bool,
    /// False until the first ground check, so spawning on the ground is not a landing.
    ground_seen: bool,
    perspective: CameraState,
    outbox: Vec<LocomotionEvent>,
}

impl Default for LocomotionController {
    fn default() -> Self {
        Self::new(LocomotionConfig::default())
    }
}

impl LocomotionController {
    /// Standing, at walk speed, third-person mapping.
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            stance: Stance::Stand,
            speed: config.movement.walk_speed,
            move_command: Vec2::ZERO,
            sprint_held: false,
            yaw_velocity: 0.0,
            glide: GlideAttitude::default(),
            clamp: ClimbClampState::default(),
            combo: ComboState::new(config.combat.combo_reset_interval),
            is_punching: false,
            grounded: false,
            ground_seen: false,
            perspective: CameraState::ThirdPerson,
            outbox: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn move_command(&self) -> Vec2 {
        self.move_command
    }

    pub fn combo_count(&self) -> u8 {
        self.combo.count()
    }

    pub fn is_punching(&self) -> bool {
        self.is_punching
    }

    /// Result of the last frame's ground check.
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn clamp_state(&self) -> ClimbClampState {
        self.clamp
    }

    pub fn glide_attitude(&self) -> GlideAttitude {
        self.glide
    }

    pub fn perspective(&self) -> CameraState {
        self.perspective
    }

    /// Take everything queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<LocomotionEvent> {
        std::mem::take(&mut self.outbox)
    }

    // =========================================================================
    // Input
    // =========================================================================

    pub fn handle_input(&mut self, event: &InputEvent, ctx: &mut ControllerContext) {
        match *event {
            InputEvent::Move(axis) => {
                self.move_command = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
            }
            InputEvent::Sprint(held) => self.sprint_held = held,
            InputEvent::Jump => self.try_jump(ctx),
            InputEvent::Climb => self.try_enter_climb(ctx),
            InputEvent::CancelClimbOrGlide => match self.stance {
                Stance::Climb => self.exit_climb(ctx),
                Stance::Glide => self.exit_glide(ctx),
                Stance::Stand | Stance::Crouch => debug!("Cancel ignored: not climbing or gliding"),
            },
            InputEvent::Crouch => self.toggle_crouch(ctx),
            InputEvent::Glide => self.try_enter_glide(ctx),
            InputEvent::Punch => self.try_punch(ctx),
            // The camera coordinator owns perspective; we hear about it via on_perspective_changed.
            InputEvent::TogglePerspective => {}
        }
    }

    pub fn on_perspective_changed(
        &mut self,
        change: &PerspectiveChanged,
        animator: &mut dyn AnimationSink,
    ) {
        self.perspective = change.state;
        animator.set_bool(anim::IS_FIRST_PERSON, change.state == CameraState::FirstPerson);
    }

    /// External "attack animation finished" notification.
    pub fn attack_finished(&mut self, ctx: &mut ControllerContext) {
        if !self.is_punching {
            return;
        }
        self.is_punching = false;
        self.combo.rearm(ctx.now);

        let position = ctx.body.position();
        let rotation = ctx.body.rotation();
        let combat = &self.config.combat;
        let hits = ctx.query.overlap_capsule(
            position + rotation * combat.hit_point_a,
            position + rotation * combat.hit_point_b,
            combat.hit_radius,
            LayerMask::HITTABLE,
        );
        if hits.is_empty() {
            return;
        }
        for &entity in &hits {
            ctx.commands.destroy(entity);
        }
        info!("Punch destroyed {} target(s)", hits.len());
        self.outbox.push(LocomotionEvent::TargetsHit { count: hits.len() });
    }

    fn check_grounded(&self, ctx: &ControllerContext) -> bool {
        probe::is_grounded(
            ctx.query,
            ctx.body.position(),
            Quat::from_rotation_y(yaw_of(ctx.body.rotation())),
            &self.config.probe,
        )
    }

    fn try_jump(&mut self, ctx: &mut ControllerContext) {
        if self.stance != Stance::Stand || !self.check_grounded(ctx) {
            debug!("Jump refused in {} (needs grounded stand)", self.stance.display_name());
            return;
        }
        ctx.body
            .add_force(Vec3::Y * self.config.movement.jump_force, ForceMode::Impulse);
        ctx.animator.set_trigger(anim::JUMP);
        self.outbox.push(LocomotionEvent::Jumped);
    }

    fn try_punch(&mut self, ctx: &mut ControllerContext) {
        if self.stance != Stance::Stand || self.is_punching {
            return;
        }
        self.is_punching = true;
        let combo = self.combo.advance(ctx.now);
        ctx.animator.set_int(anim::COMBO, i32::from(combo));
        ctx.animator.set_trigger(anim::PUNCH);
        self.outbox.push(LocomotionEvent::Punched { combo });
    }

    // =========================================================================
    // Stance transitions
    // =========================================================================

    /// Record a stance change. Returns false when already in `to`.
    fn set_stance(&mut self, to: Stance, ctx: &ControllerContext) -> bool {
        let from = self.stance;
        if from == to {
            return false;
        }
        self.stance = to;
        let yaw = yaw_of(ctx.body.rotation());
        info!("Stance {} -> {}", from.display_name(), to.display_name());
        self.outbox
            .push(LocomotionEvent::StanceChanged(StanceChanged { from, to, yaw }));
        true
    }

    fn try_enter_climb(&mut self, ctx: &mut ControllerContext) {
        if self.stance != Stance::Stand {
            debug!("Climb refused in {}", self.stance.display_name());
            return;
        }
        if !self.check_grounded(ctx) {
            debug!("Climb refused: not grounded");
            return;
        }

        let probe_config = &self.config.probe;
        let position = ctx.body.position();
        let rotation = ctx.body.rotation();
        let anchor = probe::climb_anchor(position, rotation, probe_config);
        let forward = forward_from_yaw(yaw_of(rotation));
        let Some(hit) = probe::find_climb_surface(ctx.query, anchor, forward, probe_config) else {
            debug!("Climb refused: no climbable surface ahead");
            return;
        };

        // Face the wall, yaw only.
        let mut facing = hit.bounds.closest_point(anchor) - anchor;
        facing.y = 0.0;
        let yaw = if facing.length_squared() > CLIMB_STILL_EPSILON {
            yaw_facing(facing)
        } else {
            yaw_of(rotation)
        };
        let forward = forward_from_yaw(yaw);
        let offset = probe_config.climb_offset;

        ctx.body.set_rotation(Quat::from_rotation_y(yaw));
        ctx.body
            .set_position(hit.point + forward * offset.z + Vec3::Y * offset.y);
        set_gravity(ctx, false);
        ctx.body.halt();
        ctx.collider.set_shape(self.config.shape.climb);

        self.clamp = ClimbClampState::default();
        self.yaw_velocity = 0.0;
        self.set_stance(Stance::Climb, ctx);
    }

    fn exit_climb(&mut self, ctx: &mut ControllerContext) {
        if self.stance != Stance::Climb {
            return;
        }
        let forward = forward_from_yaw(yaw_of(ctx.body.rotation()));
        set_gravity(ctx, true);
        ctx.body
            .set_position(ctx.body.position() - forward * self.config.probe.climb_exit_pushback);
        ctx.collider.set_shape(self.config.shape.stand);

        self.clamp = ClimbClampState::default();
        self.speed = self.config.movement.walk_speed;
        self.set_stance(Stance::Stand, ctx);
    }

    fn toggle_crouch(&mut self, ctx: &mut ControllerContext) {
        match self.stance {
            Stance::Stand => {
                ctx.collider.set_shape(self.config.shape.crouch);
                self.speed = self.config.movement.crouch_speed;
                self.set_stance(Stance::Crouch, ctx);
            }
            Stance::Crouch => {
                if !probe::has_stand_clearance(ctx.query, ctx.body.position(), &self.config.probe) {
                    debug!("Stand refused: no headroom");
                    return;
                }
                ctx.collider.set_shape(self.config.shape.stand);
                self.speed = self.config.movement.walk_speed;
                self.set_stance(Stance::Stand, ctx);
            }
            Stance::Climb | Stance::Glide => {
                debug!("Crouch refused in {}", self.stance.display_name());
            }
        }
    }

    fn try_enter_glide(&mut self, ctx: &mut ControllerContext) {
        if self.stance != Stance::Stand {
            debug!("Glide refused in {}", self.stance.display_name());
            return;
        }
        if self.check_grounded(ctx) {
            debug!("Glide refused: grounded");
            return;
        }
        self.glide = GlideAttitude {
            yaw: yaw_of(ctx.body.rotation()),
            pitch: 0.0,
            roll: 0.0,
        };
        self.set_stance(Stance::Glide, ctx);
    }

    fn exit_glide(&mut self, ctx: &mut ControllerContext) {
        if self.stance != Stance::Glide {
            return;
        }
        // Level out, keep heading.
        self.glide.pitch = 0.0;
        self.glide.roll = 0.0;
        ctx.body.set_rotation(Quat::from_rotation_y(self.glide.yaw));
        ctx.body.set_angular_velocity(Vec3::ZERO);
        self.yaw_velocity = 0.0;
        self.set_stance(Stance::Stand, ctx);
    }

    // =========================================================================
    // Per-frame update
    // =========================================================================

    pub fn frame_update(&mut self, dt: f32, ctx: &mut ControllerContext) {
        if self.combo.poll(ctx.now) {
            debug!("Combo reset");
            ctx.animator.set_int(anim::COMBO, 0);
            self.outbox.push(LocomotionEvent::ComboReset);
        }

        let grounded = self.check_grounded(ctx);
        if grounded && !self.grounded && self.ground_seen {
            self.outbox.push(LocomotionEvent::Landed);
        }
        self.grounded = grounded;
        self.ground_seen = true;

        // Touching ground always ends a glide, whatever input is pending.
        if grounded && self.stance == Stance::Glide {
            self.exit_glide(ctx);
        }

        self.update_speed(dt);

        match self.stance {
            Stance::Stand | Stance::Crouch => self.update_ground_yaw(dt, ctx),
            Stance::Glide => self.update_glide_attitude(dt, ctx),
            Stance::Climb => {}
        }

        self.write_animation(ctx);
    }

    fn update_speed(&mut self, dt: f32) {
        let movement = &self.config.movement;
        if self.stance == Stance::Crouch {
            self.speed = movement.crouch_speed;
            return;
        }
        let target = if self.sprint_held {
            movement.sprint_speed
        } else {
            movement.walk_speed
        };
        let step = movement.walk_sprint_transition * dt;
        let delta = (target - self.speed).clamp(-step, step);
        self.speed = (self.speed + delta).clamp(movement.walk_speed, movement.sprint_speed);
    }

    fn update_ground_yaw(&mut self, dt: f32, ctx: &mut ControllerContext) {
        if self.is_punching {
            return;
        }
        match self.perspective {
            CameraState::FirstPerson => {
                ctx.body.set_rotation(Quat::from_rotation_y(wrap_angle(ctx.camera_yaw)));
                self.yaw_velocity = 0.0;
            }
            CameraState::ThirdPerson => {
                if self.move_command.length() <= self.config.movement.deadzone {
                    return;
                }
                let input = self.move_command;
                let target = ctx.camera_yaw - input.x.atan2(input.y);
                let current = yaw_of(ctx.body.rotation());
                let yaw = smooth_damp_angle(
                    current,
                    target,
                    &mut self.yaw_velocity,
                    self.config.movement.rotation_smooth_time,
                    dt,
                );
                ctx.body.set_rotation(Quat::from_rotation_y(wrap_angle(yaw)));
            }
        }
    }

    fn update_glide_attitude(&mut self, dt: f32, ctx: &mut ControllerContext) {
        let glide = &self.config.glide;
        let input = self.move_command;

        self.glide.pitch =
            (self.glide.pitch + input.y * glide.pitch_rate * dt).clamp(glide.min_pitch, glide.max_pitch);
        self.glide.yaw = wrap_angle(self.glide.yaw - (input.x * glide.yaw_rate * dt).to_radians());
        self.glide.roll =
            (self.glide.roll + input.x * glide.roll_rate * dt).clamp(-glide.max_roll, glide.max_roll);

        ctx.body.set_rotation(self.glide.rotation());
    }

    fn write_animation(&self, ctx: &mut ControllerContext) {
        let velocity = ctx.body.linear_velocity();
        let horizontal = Vec2::new(velocity.x, velocity.z).length();
        let animator = &mut *ctx.animator;
        animator.set_float(anim::SPEED, horizontal);
        animator.set_bool(anim::IS_GROUNDED, self.grounded);
        animator.set_bool(anim::IS_CROUCH, self.stance == Stance::Crouch);
        animator.set_bool(anim::IS_CLIMBING, self.stance == Stance::Climb);
        animator.set_bool(anim::IS_GLIDING, self.stance == Stance::Glide);
    }

    // =========================================================================
    // Physics tick
    // =========================================================================

    pub fn fixed_update(&mut self, ctx: &mut ControllerContext) {
        match self.stance {
            Stance::Stand | Stance::Crouch => self.apply_ground_movement(ctx),
            Stance::Climb => self.apply_climb_movement(ctx),
            Stance::Glide => self.apply_glide_forces(ctx),
        }
    }

    /// World-space move direction for Stand/Crouch, or None inside the deadzone.
    ///
    /// Third person pushes along the body's current (damped) heading; first person
    /// translates relative to the body, which already tracks the camera.
    fn ground_direction(&self, ctx: &ControllerContext) -> Option<Vec3> {
        let input = self.move_command;
        if input.length() <= self.config.movement.deadzone {
            return None;
        }
        let yaw = yaw_of(ctx.body.rotation());
        let direction = match self.perspective {
            CameraState::ThirdPerson => forward_from_yaw(yaw) * input.length(),
            CameraState::FirstPerson => {
                forward_from_yaw(yaw) * input.y + right_from_yaw(yaw) * input.x
            }
        };
        Some(direction.clamp_length_max(1.0))
    }

    fn apply_ground_movement(&mut self, ctx: &mut ControllerContext) {
        if self.is_punching {
            return;
        }
        let Some(direction) = self.ground_direction(ctx) else {
            return;
        };
        ctx.body.add_force(direction * self.speed, ForceMode::Continuous);

        let rotation = Quat::from_rotation_y(yaw_of(ctx.body.rotation()));
        if probe::step_detected(ctx.query, ctx.body.position(), rotation, &self.config.probe) {
            ctx.body
                .add_force(Vec3::Y * self.config.probe.step_force, ForceMode::Continuous);
        }
    }

    fn apply_climb_movement(&mut self, ctx: &mut ControllerContext) {
        let probe_config = &self.config.probe;
        let position = ctx.body.position();
        let rotation = ctx.body.rotation();

        let anchor = probe::climb_anchor(position, rotation, probe_config);
        let sampled = probe::sample_clamp_state(ctx.query, anchor, rotation, probe_config);
        let (clamp, effects) = probe::update_clamp_state(self.clamp, sampled);
        self.clamp = clamp;

        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        let requested = right * self.move_command.x + up * self.move_command.y;
        let clamped = probe::clamp_climb_move(requested, &self.clamp);

        if clamped.length_squared() > CLIMB_STILL_EPSILON {
            ctx.body
                .add_force(clamped * probe_config.climb_speed, ForceMode::Continuous);
        } else {
            // Pinned against an edge: no drift.
            ctx.body.halt();
        }
        for effect in effects {
            match effect {
                ClampEffect::HaltMotion => ctx.body.halt(),
            }
        }

        ctx.animator
            .set_float(anim::CLIMB_VELOCITY_X, clamped.dot(right));
        ctx.animator.set_float(anim::CLIMB_VELOCITY_Y, clamped.dot(up));
    }

    fn apply_glide_forces(&mut self, ctx: &mut ControllerContext) {
        let glide = &self.config.glide;
        let rotation = ctx.body.rotation();
        let lift = glide.lift_scale * (self.glide.pitch + glide.air_drag);
        let force = rotation * Vec3::Y * lift + rotation * Vec3::NEG_Z * glide.glide_speed;
        ctx.body.add_force(force, ForceMode::Continuous);
    }
}

/// Write the gravity flag only when it actually changes.
fn set_gravity(ctx: &mut ControllerContext, enabled: bool) {
    if ctx.body.gravity_enabled() != enabled {
        ctx.body.set_gravity_enabled(enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::SurfaceBounds;
    use crate::test_support::{spawn_entities, Harness};
    use std::f32::consts::{FRAC_PI_2, PI};

    const DT: f32 = 1.0 / 60.0;

    fn controller() -> LocomotionController {
        LocomotionController::default()
    }

    fn grounded() -> Harness {
        let mut h = Harness::default();
        h.world.grounded = true;
        h
    }

    /// Grounded in front of a climbable wall spanning x in [-2, 2], face at z = -0.5.
    fn facing_wall() -> Harness {
        let mut h = grounded();
        h.world.add_surface(
            LayerMask::CLIMBABLE,
            SurfaceBounds::from_center_half_extents(Vec3::new(0.0, 1.0, -0.75), Vec3::new(2.0, 2.0, 0.25)),
            |origin, direction| direction.z < -0.5 && origin.x.abs() < 2.0,
        );
        h
    }

    fn stance_changes(events: &[LocomotionEvent]) -> Vec<(Stance, Stance)> {
        events
            .iter()
            .filter_map(|e| match e {
                LocomotionEvent::StanceChanged(c) => Some((c.from, c.to)),
                _ => None,
            })
            .collect()
    }

    fn send(c: &mut LocomotionController, h: &mut Harness, event: InputEvent) {
        c.handle_input(&event, &mut h.ctx());
    }

    fn climbing() -> (LocomotionController, Harness) {
        let mut c = controller();
        let mut h = facing_wall();
        send(&mut c, &mut h, InputEvent::Climb);
        assert_eq!(c.stance(), Stance::Climb);
        c.drain_events();
        (c, h)
    }

    #[test]
    fn test_starts_standing_at_walk_speed() {
        let c = controller();
        assert_eq!(c.stance(), Stance::Stand);
        assert_eq!(c.speed(), c.config().movement.walk_speed);
        assert_eq!(c.combo_count(), 0);
    }

    #[test]
    fn test_enter_climb_snaps_to_wall() {
        let mut c = controller();
        let mut h = facing_wall();
        h.body.linear_velocity = Vec3::new(1.0, 2.0, 3.0);

        send(&mut c, &mut h, InputEvent::Climb);

        assert_eq!(c.stance(), Stance::Climb);
        assert!(!h.body.gravity);
        assert_eq!(h.body.linear_velocity, Vec3::ZERO);
        assert_eq!(h.capsule.shape, c.config().shape.climb);
        // Ray from (0, 0.3, 0) hits at (0, 0.3, -0.5); offset (0, 0.1, -0.4) along forward/up.
        assert!((h.body.position - Vec3::new(0.0, 0.4, -0.1)).length() < 1e-4);
        assert!(yaw_of(h.body.rotation).abs() < 1e-4);
        assert_eq!(stance_changes(&c.drain_events()), vec![(Stance::Stand, Stance::Climb)]);
    }

    #[test]
    fn test_climb_faces_closest_point_of_surface() {
        let mut c = controller();
        let mut h = grounded();
        // Wall off to the front-left: the ray hits, but the nearest face point is at -X.
        h.world.add_surface(
            LayerMask::CLIMBABLE,
            SurfaceBounds::from_center_half_extents(Vec3::new(-1.5, 1.0, -0.3), Vec3::new(1.0, 2.0, 1.0)),
            |_, direction| direction.z < -0.5,
        );
        send(&mut c, &mut h, InputEvent::Climb);
        assert_eq!(c.stance(), Stance::Climb);
        // Closest point to the anchor is (-0.5, 0.3, 0): straight left.
        assert!((yaw_of(h.body.rotation) - FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_climb_refused_without_ground_or_wall() {
        let mut c = controller();

        let mut airborne = facing_wall();
        airborne.world.grounded = false;
        send(&mut c, &mut airborne, InputEvent::Climb);
        assert_eq!(c.stance(), Stance::Stand);
        assert!(airborne.body.gravity);

        let mut open = grounded();
        send(&mut c, &mut open, InputEvent::Climb);
        assert_eq!(c.stance(), Stance::Stand);
        assert_eq!(open.capsule.writes, 0);
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_climb_again_while_climbing_is_a_no_op() {
        let (mut c, mut h) = climbing();
        let (gravity_writes, shape_writes, position) =
            (h.body.gravity_writes, h.capsule.writes, h.body.position);

        send(&mut c, &mut h, InputEvent::Climb);

        assert_eq!(c.stance(), Stance::Climb);
        assert_eq!(h.body.gravity_writes, gravity_writes);
        assert_eq!(h.capsule.writes, shape_writes);
        assert_eq!(h.body.position, position);
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_cancel_climb_restores_gravity_and_pushes_back() {
        let (mut c, mut h) = climbing();
        let before = h.body.position;

        send(&mut c, &mut h, InputEvent::CancelClimbOrGlide);

        assert_eq!(c.stance(), Stance::Stand);
        assert!(h.body.gravity);
        assert_eq!(h.capsule.shape, c.config().shape.stand);
        // Facing -Z, so backward is +Z.
        assert!((h.body.position - (before + Vec3::Z)).length() < 1e-4);
        assert_eq!(c.clamp_state(), ClimbClampState::default());
        assert_eq!(stance_changes(&c.drain_events()), vec![(Stance::Climb, Stance::Stand)]);
    }

    #[test]
    fn test_climb_leaves_disabled_gravity_alone() {
        let mut c = controller();
        let mut h = facing_wall();
        h.body.gravity = false;

        send(&mut c, &mut h, InputEvent::Climb);
        assert_eq!(c.stance(), Stance::Climb);
        assert_eq!(h.body.gravity_writes, 0);

        send(&mut c, &mut h, InputEvent::CancelClimbOrGlide);
        assert!(h.body.gravity);
        assert_eq!(h.body.gravity_writes, 1);
    }

    #[test]
    fn test_cancel_while_standing_changes_nothing() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::CancelClimbOrGlide);

        assert_eq!(c.stance(), Stance::Stand);
        assert_eq!(h.body.gravity_writes, 0);
        assert_eq!(h.capsule.writes, 0);
        assert_eq!(h.body.position, Vec3::ZERO);
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_climb_move_uses_body_axes() {
        let (mut c, mut h) = climbing();
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(0.0, 1.0)));
        h.body.forces.clear();

        c.fixed_update(&mut h.ctx());

        let speed = c.config().probe.climb_speed;
        assert!((h.body.continuous_force() - Vec3::Y * speed).length() < 1e-4);
        assert!((h.animator.floats[anim::CLIMB_VELOCITY_Y] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_falling_edge_halts_even_with_remaining_motion() {
        let (mut c, mut h) = climbing();
        // Only the right probe (x = +0.4) runs off the wall.
        h.world.clear_walls();
        h.world.add_wall(LayerMask::CLIMBABLE, |origin, _| origin.x < 0.2);
        h.body.linear_velocity = Vec3::new(0.5, 0.5, 0.0);
        h.body.angular_velocity = Vec3::new(0.0, 0.3, 0.0);

        send(&mut c, &mut h, InputEvent::Move(Vec2::new(1.0, 1.0)));
        h.body.forces.clear();
        c.fixed_update(&mut h.ctx());

        assert!(!c.clamp_state().right_climbable);
        assert_eq!(h.body.linear_velocity, Vec3::ZERO);
        assert_eq!(h.body.angular_velocity, Vec3::ZERO);
        // Upward motion survives the clamp.
        let speed = c.config().probe.climb_speed;
        assert!((h.body.continuous_force() - Vec3::Y * speed).length() < 1e-4);
    }

    #[test]
    fn test_pinned_climb_zeroes_velocity_every_tick() {
        let (mut c, mut h) = climbing();
        h.world.clear_walls();
        h.world.add_wall(LayerMask::CLIMBABLE, |origin, _| origin.x < 0.2);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(1.0, 0.0)));
        c.fixed_update(&mut h.ctx());

        // No new edge on the second tick, but the clamped move is zero.
        h.body.linear_velocity = Vec3::new(0.2, 0.0, 0.0);
        h.body.forces.clear();
        c.fixed_update(&mut h.ctx());

        assert_eq!(h.body.linear_velocity, Vec3::ZERO);
        assert!(h.body.forces.is_empty());
    }

    #[test]
    fn test_turned_around_climb_blocks_lost_right_side() {
        let mut c = controller();
        let mut h = grounded();
        // Facing +Z at a wall spanning x in [-2, 2], face at z = 0.5.
        h.body.rotation = Quat::from_rotation_y(PI);
        h.world.add_surface(
            LayerMask::CLIMBABLE,
            SurfaceBounds::from_center_half_extents(Vec3::new(0.0, 1.0, 0.75), Vec3::new(2.0, 2.0, 0.25)),
            |origin, direction| direction.z > 0.5 && origin.x.abs() < 2.0,
        );
        send(&mut c, &mut h, InputEvent::Climb);
        assert_eq!(c.stance(), Stance::Climb);
        assert!((h.body.rotation * Vec3::X - Vec3::NEG_X).length() < 1e-4);

        // Body right is world -X, so the right probe (x = -0.4) runs off the wall.
        h.world.clear_walls();
        h.world
            .add_wall(LayerMask::CLIMBABLE, |origin, direction| direction.z > 0.5 && origin.x > -0.2);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(1.0, 0.0)));
        h.body.forces.clear();
        c.fixed_update(&mut h.ctx());

        assert!(!c.clamp_state().right_climbable);
        assert!(c.clamp_state().left_climbable);
        assert!(c.clamp_state().is_flipped);
        assert!(h.body.continuous_force().x > -1e-4);
        assert_eq!(h.body.linear_velocity, Vec3::ZERO);

        // Moving left (world +X) is still allowed.
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(-1.0, 0.0)));
        h.body.forces.clear();
        c.fixed_update(&mut h.ctx());
        let speed = c.config().probe.climb_speed;
        assert!((h.body.continuous_force() - Vec3::X * speed).length() < 1e-3);
    }

    #[test]
    fn test_crouch_and_stand_with_clearance() {
        let mut c = controller();
        let mut h = grounded();

        send(&mut c, &mut h, InputEvent::Crouch);
        assert_eq!(c.stance(), Stance::Crouch);
        assert_eq!(h.capsule.shape, c.config().shape.crouch);
        assert_eq!(c.speed(), c.config().movement.crouch_speed);

        h.world.add_wall(LayerMask::OBSTACLE, |_, direction| direction.y > 0.5);
        send(&mut c, &mut h, InputEvent::Crouch);
        assert_eq!(c.stance(), Stance::Crouch);

        h.world.clear_walls();
        send(&mut c, &mut h, InputEvent::Crouch);
        assert_eq!(c.stance(), Stance::Stand);
        assert_eq!(h.capsule.shape, c.config().shape.stand);
        assert_eq!(c.speed(), c.config().movement.walk_speed);
        assert_eq!(
            stance_changes(&c.drain_events()),
            vec![(Stance::Stand, Stance::Crouch), (Stance::Crouch, Stance::Stand)]
        );
    }

    #[test]
    fn test_sprint_ramps_between_walk_and_sprint() {
        let mut c = controller();
        let mut h = grounded();
        let movement = c.config().movement.clone();

        send(&mut c, &mut h, InputEvent::Sprint(true));
        c.frame_update(0.25, &mut h.ctx());
        let expected = movement.walk_speed + movement.walk_sprint_transition * 0.25;
        assert!((c.speed() - expected).abs() < 1e-4);

        c.frame_update(10.0, &mut h.ctx());
        assert_eq!(c.speed(), movement.sprint_speed);

        send(&mut c, &mut h, InputEvent::Sprint(false));
        c.frame_update(10.0, &mut h.ctx());
        assert_eq!(c.speed(), movement.walk_speed);
    }

    #[test]
    fn test_crouch_disables_sprint() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Crouch);
        send(&mut c, &mut h, InputEvent::Sprint(true));
        c.frame_update(1.0, &mut h.ctx());
        assert_eq!(c.speed(), c.config().movement.crouch_speed);
    }

    #[test]
    fn test_third_person_force_follows_body_heading() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(0.0, 1.0)));

        c.fixed_update(&mut h.ctx());
        let walk = c.config().movement.walk_speed;
        assert!((h.body.continuous_force() - Vec3::NEG_Z * walk).length() < 1e-4);

        // Turned to face -X: the push turns with the body.
        h.body.forces.clear();
        h.body.rotation = Quat::from_rotation_y(FRAC_PI_2);
        c.fixed_update(&mut h.ctx());
        assert!((h.body.continuous_force() - Vec3::NEG_X * walk).length() < 1e-4);
    }

    #[test]
    fn test_third_person_push_stays_on_heading_while_turning() {
        let mut c = controller();
        let mut h = grounded();
        // Camera ahead, input to the right: the target heading is -PI/2.
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(1.0, 0.0)));

        c.frame_update(DT, &mut h.ctx());
        let yaw = yaw_of(h.body.rotation);
        assert!(yaw < 0.0 && yaw > -FRAC_PI_2 + 0.1);

        c.fixed_update(&mut h.ctx());
        let force = h.body.continuous_force();
        let heading = h.body.rotation * Vec3::NEG_Z;
        let walk = c.config().movement.walk_speed;
        assert!((force - heading * walk).length() < 1e-4);
        // Not the raw input direction.
        assert!(force.normalize().dot(Vec3::X) < 0.99);
    }

    #[test]
    fn test_first_person_force_follows_body() {
        let mut c = controller();
        let mut h = grounded();
        c.on_perspective_changed(
            &PerspectiveChanged {
                state: CameraState::FirstPerson,
            },
            &mut h.animator,
        );
        assert!(h.animator.bools[anim::IS_FIRST_PERSON]);

        h.body.rotation = Quat::from_rotation_y(FRAC_PI_2);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(1.0, 0.0)));
        c.fixed_update(&mut h.ctx());

        // Body faces -X, so its right is -Z.
        let walk = c.config().movement.walk_speed;
        assert!((h.body.continuous_force() - Vec3::NEG_Z * walk).length() < 1e-4);
    }

    #[test]
    fn test_first_person_yaw_tracks_camera() {
        let mut c = controller();
        let mut h = grounded();
        c.on_perspective_changed(
            &PerspectiveChanged {
                state: CameraState::FirstPerson,
            },
            &mut (),
        );
        h.camera_yaw = 1.2;
        c.frame_update(DT, &mut h.ctx());
        assert!((yaw_of(h.body.rotation) - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_third_person_yaw_is_damped() {
        let mut c = controller();
        let mut h = grounded();
        h.camera_yaw = 1.0;
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(0.0, 1.0)));

        c.frame_update(DT, &mut h.ctx());
        let first = yaw_of(h.body.rotation);
        assert!(first > 0.0 && first < 1.0);

        for _ in 0..120 {
            c.frame_update(DT, &mut h.ctx());
        }
        assert!((yaw_of(h.body.rotation) - 1.0).abs() < 1e-2);
    }

    #[test]
    fn test_deadzone_input_neither_turns_nor_moves() {
        let mut c = controller();
        let mut h = grounded();
        h.camera_yaw = 1.0;
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(0.05, 0.05)));

        c.frame_update(DT, &mut h.ctx());
        c.fixed_update(&mut h.ctx());

        assert_eq!(h.body.rotation, Quat::IDENTITY);
        assert!(h.body.forces.is_empty());
    }

    #[test]
    fn test_move_input_is_clamped() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(4.0, -3.0)));
        assert_eq!(c.move_command(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_step_assist_pushes_up() {
        let mut c = controller();
        let mut h = grounded();
        let feet_y = c.config().probe.ground_checker_offset.y;
        h.world
            .add_wall(LayerMask::STEP, move |origin, _| origin.y < feet_y + 0.2);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(0.0, 1.0)));

        c.fixed_update(&mut h.ctx());

        assert!((h.body.continuous_force().y - c.config().probe.step_force).abs() < 1e-4);
    }

    #[test]
    fn test_glide_requires_air() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Glide);
        assert_eq!(c.stance(), Stance::Stand);

        h.world.grounded = false;
        send(&mut c, &mut h, InputEvent::Glide);
        assert_eq!(c.stance(), Stance::Glide);
        assert_eq!(c.glide_attitude().pitch, 0.0);
    }

    #[test]
    fn test_grounding_forces_glide_to_stand() {
        let mut c = controller();
        let mut h = Harness::default();
        send(&mut c, &mut h, InputEvent::Glide);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(1.0, 1.0)));
        c.frame_update(0.5, &mut h.ctx());
        assert_eq!(c.stance(), Stance::Glide);
        c.drain_events();

        h.world.grounded = true;
        c.frame_update(DT, &mut h.ctx());

        assert_eq!(c.stance(), Stance::Stand);
        assert_eq!(c.glide_attitude().pitch, 0.0);
        assert_eq!(c.glide_attitude().roll, 0.0);
        let up = h.body.rotation * Vec3::Y;
        assert!((up - Vec3::Y).length() < 1e-4);
        let events = c.drain_events();
        assert!(events.contains(&LocomotionEvent::Landed));
        assert_eq!(stance_changes(&events), vec![(Stance::Glide, Stance::Stand)]);
    }

    #[test]
    fn test_glide_attitude_is_bounded() {
        let mut c = controller();
        let mut h = Harness::default();
        send(&mut c, &mut h, InputEvent::Glide);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(1.0, 1.0)));

        // Right input turns right (yaw decreases).
        c.frame_update(0.1, &mut h.ctx());
        assert!(c.glide_attitude().yaw < 0.0);

        c.frame_update(10.0, &mut h.ctx());
        let glide = c.config().glide.clone();
        let attitude = c.glide_attitude();
        assert_eq!(attitude.pitch, glide.max_pitch);
        assert_eq!(attitude.roll, glide.max_roll);

        send(&mut c, &mut h, InputEvent::Move(Vec2::new(-1.0, -1.0)));
        c.frame_update(10.0, &mut h.ctx());
        assert_eq!(c.glide_attitude().pitch, glide.min_pitch);
        assert_eq!(c.glide_attitude().roll, -glide.max_roll);
    }

    #[test]
    fn test_glide_lift_and_thrust() {
        let mut c = controller();
        let mut h = Harness::default();
        send(&mut c, &mut h, InputEvent::Glide);

        c.fixed_update(&mut h.ctx());

        let glide = c.config().glide.clone();
        let expected = Vec3::Y * glide.lift_scale * glide.air_drag + Vec3::NEG_Z * glide.glide_speed;
        assert!((h.body.continuous_force() - expected).length() < 1e-4);
    }

    #[test]
    fn test_cancel_glide_levels_body() {
        let mut c = controller();
        let mut h = Harness::default();
        send(&mut c, &mut h, InputEvent::Glide);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(0.0, 1.0)));
        c.frame_update(0.5, &mut h.ctx());

        send(&mut c, &mut h, InputEvent::CancelClimbOrGlide);

        assert_eq!(c.stance(), Stance::Stand);
        assert!((h.body.rotation * Vec3::Y - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_jump_only_when_grounded_standing() {
        let mut c = controller();
        let mut h = Harness::default();
        send(&mut c, &mut h, InputEvent::Jump);
        assert!(h.body.impulses().is_empty());

        h.world.grounded = true;
        send(&mut c, &mut h, InputEvent::Jump);
        assert_eq!(h.body.impulses(), vec![Vec3::Y * c.config().movement.jump_force]);
        assert_eq!(h.animator.triggers, vec![anim::JUMP]);
        assert_eq!(c.drain_events(), vec![LocomotionEvent::Jumped]);

        send(&mut c, &mut h, InputEvent::Crouch);
        send(&mut c, &mut h, InputEvent::Jump);
        assert_eq!(h.body.impulses().len(), 1);
    }

    #[test]
    fn test_combo_sequence_wraps() {
        let mut c = controller();
        let mut h = grounded();
        let mut combos = Vec::new();
        for i in 0..7 {
            h.now = i as f64 * 0.2;
            send(&mut c, &mut h, InputEvent::Punch);
            c.attack_finished(&mut h.ctx());
            combos.push(c.combo_count());
        }
        assert_eq!(combos, vec![1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(h.animator.ints[anim::COMBO], 1);
    }

    #[test]
    fn test_punch_ignored_while_punching() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Punch);
        send(&mut c, &mut h, InputEvent::Punch);

        assert!(c.is_punching());
        assert_eq!(c.combo_count(), 1);
        assert_eq!(c.drain_events(), vec![LocomotionEvent::Punched { combo: 1 }]);
        assert_eq!(h.animator.triggers, vec![anim::PUNCH]);
    }

    #[test]
    fn test_punch_locks_movement() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Punch);
        send(&mut c, &mut h, InputEvent::Move(Vec2::new(0.0, 1.0)));
        c.fixed_update(&mut h.ctx());
        assert!(h.body.forces.is_empty());

        c.attack_finished(&mut h.ctx());
        c.fixed_update(&mut h.ctx());
        assert!(!h.body.forces.is_empty());
    }

    #[test]
    fn test_punch_refused_outside_stand() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Crouch);
        send(&mut c, &mut h, InputEvent::Punch);
        assert!(!c.is_punching());
        assert_eq!(c.combo_count(), 0);
    }

    #[test]
    fn test_combo_resets_once_after_quiet_window() {
        let mut c = controller();
        let mut h = grounded();
        send(&mut c, &mut h, InputEvent::Punch);
        h.now = 0.1;
        c.attack_finished(&mut h.ctx());
        c.drain_events();

        h.now = 1.0;
        c.frame_update(DT, &mut h.ctx());
        assert_eq!(c.combo_count(), 1);

        h.now = 1.2;
        c.frame_update(DT, &mut h.ctx());
        h.now = 5.0;
        c.frame_update(DT, &mut h.ctx());

        assert_eq!(c.combo_count(), 0);
        let resets = c
            .drain_events()
            .into_iter()
            .filter(|e| *e == LocomotionEvent::ComboReset)
            .count();
        assert_eq!(resets, 1);
    }

    #[test]
    fn test_attack_finished_destroys_targets() {
        let mut c = controller();
        let mut h = grounded();
        let targets = spawn_entities(2);
        h.world.hittable = targets.clone();

        // Not punching: nothing happens.
        c.attack_finished(&mut h.ctx());
        assert!(h.commands.destroyed.is_empty());

        send(&mut c, &mut h, InputEvent::Punch);
        c.attack_finished(&mut h.ctx());

        assert_eq!(h.commands.destroyed, targets);
        assert!(!c.is_punching());
        assert!(c.drain_events().contains(&LocomotionEvent::TargetsHit { count: 2 }));
    }

    #[test]
    fn test_landing_edge_and_animation() {
        let mut c = controller();
        let mut h = Harness::default();
        h.body.linear_velocity = Vec3::new(3.0, -9.0, 4.0);

        c.frame_update(DT, &mut h.ctx());
        assert!(!c.drain_events().contains(&LocomotionEvent::Landed));
        assert!(!h.animator.bools[anim::IS_GROUNDED]);
        assert!((h.animator.floats[anim::SPEED] - 5.0).abs() < 1e-4);

        h.world.grounded = true;
        c.frame_update(DT, &mut h.ctx());
        c.frame_update(DT, &mut h.ctx());
        let landings = c
            .drain_events()
            .into_iter()
            .filter(|e| *e == LocomotionEvent::Landed)
            .count();
        assert_eq!(landings, 1);
        assert!(c.is_grounded());
    }

    #[test]
    fn test_spawning_on_ground_is_not_a_landing() {
        let mut c = controller();
        let mut h = grounded();

        c.frame_update(DT, &mut h.ctx());
        c.frame_update(DT, &mut h.ctx());

        assert!(c.is_grounded());
        assert!(h.animator.bools[anim::IS_GROUNDED]);
        assert!(!c.drain_events().contains(&LocomotionEvent::Landed));

        // A real fall and touchdown still counts.
        h.world.grounded = false;
        c.frame_update(DT, &mut h.ctx());
        h.world.grounded = true;
        c.frame_update(DT, &mut h.ctx());
        assert!(c.drain_events().contains(&LocomotionEvent::Landed));
    }

    #[test]
    fn test_stance_changes_chain() {
        let mut c = controller();
        let mut h = facing_wall();
        let script = [
            InputEvent::Crouch,
            InputEvent::Climb,
            InputEvent::Crouch,
            InputEvent::Climb,
            InputEvent::Glide,
            InputEvent::CancelClimbOrGlide,
            InputEvent::Crouch,
        ];
        for event in script {
            send(&mut c, &mut h, event);
        }
        h.world.grounded = false;
        send(&mut c, &mut h, InputEvent::Glide);

        let changes = stance_changes(&c.drain_events());
        assert_eq!(changes.first().map(|change| change.0), Some(Stance::Stand));
        for pair in changes.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
        assert_eq!(changes.last().map(|change| change.1), Some(c.stance()));
    }
}
