//! Semantic input events and the per-frame router that raises them.
//!
//! The router is sampled once per frame with the raw button/axis levels. It turns them
//! into `InputEvent`s (level events every frame, pulses on the press edge) and hands each
//! event to every subscriber of its kind in registration order.
//!
//! Subscribers receive a caller-supplied context `C` at dispatch time, so a handler can
//! mutate whatever owns the controller (an ECS `World`, a test harness) without shared
//! ownership.

use bevy::prelude::*;

/// Raw device levels for one frame. Buttons are "held this frame".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawInput {
    /// x = lateral, y = forward/back.
    pub move_axis: Vec2,
    pub sprint: bool,
    pub jump: bool,
    pub climb: bool,
    pub cancel: bool,
    pub toggle_perspective: bool,
    pub crouch: bool,
    pub glide: bool,
    pub punch: bool,
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Raised every frame, even when zero.
    Move(Vec2),
    /// Level state of the sprint button.
    Sprint(bool),
    Jump,
    Climb,
    /// Leaves whichever of climb/glide is active.
    CancelClimbOrGlide,
    TogglePerspective,
    Crouch,
    Glide,
    Punch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputEventKind {
    Move,
    Sprint,
    Jump,
    Climb,
    CancelClimbOrGlide,
    TogglePerspective,
    Crouch,
    Glide,
    Punch,
}

impl InputEventKind {
    pub const ALL: [InputEventKind; 9] = [
        InputEventKind::Move,
        InputEventKind::Sprint,
        InputEventKind::Jump,
        InputEventKind::Climb,
        InputEventKind::CancelClimbOrGlide,
        InputEventKind::TogglePerspective,
        InputEventKind::Crouch,
        InputEventKind::Glide,
        InputEventKind::Punch,
    ];
}

impl InputEvent {
    pub fn kind(&self) -> InputEventKind {
        match self {
            InputEvent::Move(_) => InputEventKind::Move,
            InputEvent::Sprint(_) => InputEventKind::Sprint,
            InputEvent::Jump => InputEventKind::Jump,
            InputEvent::Climb => InputEventKind::Climb,
            InputEvent::CancelClimbOrGlide => InputEventKind::CancelClimbOrGlide,
            InputEvent::TogglePerspective => InputEventKind::TogglePerspective,
            InputEvent::Crouch => InputEventKind::Crouch,
            InputEvent::Glide => InputEventKind::Glide,
            InputEvent::Punch => InputEventKind::Punch,
        }
    }
}

/// Token returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    kind: InputEventKind,
    id: u64,
}

type Handler<C> = Box<dyn FnMut(&mut C, &InputEvent) + Send + Sync>;

pub struct InputEventRouter<C> {
    /// Kept in registration order.
    subscribers: Vec<(Subscription, Handler<C>)>,
    next_id: u64,
    previous: RawInput,
}

impl<C> Default for InputEventRouter<C> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
            previous: RawInput::default(),
        }
    }
}

impl<C> InputEventRouter<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        kind: InputEventKind,
        handler: impl FnMut(&mut C, &InputEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let subscription = Subscription {
            kind,
            id: self.next_id,
        };
        self.next_id += 1;
        self.subscribers.push((subscription, Box::new(handler)));
        subscription
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != subscription);
        self.subscribers.len() != before
    }

    /// Turn one frame of raw levels into events: `Move`, `Sprint`, then any pulses.
    pub fn sample(&mut self, raw: &RawInput) -> Vec<InputEvent> {
        let previous = std::mem::replace(&mut self.previous, *raw);

        let move_axis = raw.move_axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
        let mut events = vec![InputEvent::Move(move_axis), InputEvent::Sprint(raw.sprint)];

        let pulses = [
            (raw.jump, previous.jump, InputEvent::Jump),
            (raw.climb, previous.climb, InputEvent::Climb),
            (raw.cancel, previous.cancel, InputEvent::CancelClimbOrGlide),
            (
                raw.toggle_perspective,
                previous.toggle_perspective,
                InputEvent::TogglePerspective,
            ),
            (raw.crouch, previous.crouch, InputEvent::Crouch),
            (raw.glide, previous.glide, InputEvent::Glide),
            (raw.punch, previous.punch, InputEvent::Punch),
        ];
        for (held, was_held, event) in pulses {
            if held && !was_held {
                events.push(event);
            }
        }
        events
    }

    pub fn dispatch(&mut self, ctx: &mut C, events: &[InputEvent]) {
        for event in events {
            let kind = event.kind();
            for (subscription, handler) in self.subscribers.iter_mut() {
                if subscription.kind == kind {
                    handler(ctx, event);
                }
            }
        }
    }

    /// `sample` + `dispatch`. Returns the events raised this frame.
    pub fn process_frame(&mut self, ctx: &mut C, raw: &RawInput) -> Vec<InputEvent> {
        let events = self.sample(raw);
        self.dispatch(ctx, &events);
        events
    }
}
