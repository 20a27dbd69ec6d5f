//! Animation parameter names written through `AnimationSink`.

pub const SPEED: &str = "Speed";
pub const IS_GROUNDED: &str = "IsGrounded";
pub const IS_CROUCH: &str = "IsCrouch";
pub const IS_CLIMBING: &str = "IsClimbing";
pub const IS_GLIDING: &str = "IsGliding";
pub const IS_FIRST_PERSON: &str = "IsFirstPerson";
pub const CLIMB_VELOCITY_X: &str = "ClimbVelocityX";
pub const CLIMB_VELOCITY_Y: &str = "ClimbVelocityY";
pub const COMBO: &str = "Combo";

// Triggers
pub const PUNCH: &str = "Punch";
pub const JUMP: &str = "Jump";
