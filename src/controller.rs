//! Controller steering the agent.
//!
//! The agent is steered by either the reactive autopilot or the keyboard. The autopilot is used by
//! default and takes control again if no arrow key has been pressed for a few seconds.

use std::time::Duration;

use bevy::prelude::*;

use sensor_sim::domain::{self, ReactiveController, Steering};

const MANUAL_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Controller;

impl Plugin for Controller {
    fn build(&self, app: &mut App) {
        app.init_resource::<Pilot>()
            .add_systems(Update, control);
    }
}

#[derive(Resource, Default)]
pub struct Pilot {
    autopilot: ReactiveController,
    manual: Option<Steering>,
    idle: Duration,
}

impl Pilot {
    pub fn is_manual(&self) -> bool {
        self.manual.is_some()
    }
}

impl domain::Controller for Pilot {
    fn steer(&mut self, activations: &[f64]) -> Steering {
        match self.manual {
            Some(steering) => steering,
            None => self.autopilot.steer(activations),
        }
    }
}

pub fn control(keys: Res<ButtonInput<KeyCode>>, time: Res<Time>, mut pilot: ResMut<Pilot>) {
    let axis = |positive: KeyCode, negative: KeyCode| {
        f64::from(i8::from(keys.pressed(positive)) - i8::from(keys.pressed(negative)))
    };
    let steering = Steering::new(
        axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
        axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
    );

    if steering != Steering::default() {
        pilot.manual = Some(steering);
        pilot.idle = Duration::ZERO;
    } else if pilot.manual.is_some() {
        pilot.idle += time.delta();
        pilot.manual = if pilot.idle < MANUAL_TIMEOUT {
            Some(Steering::default())
        } else {
            info!("autopilot resumed");
            None
        };
    }
}
