//! Simulation of the agent in a world with walls, obstacles and goals.
//!
//! Each frame advances the world by the elapsed time: the pilot steers on the last activations,
//! the agent moves unless it would hit something solid, the quadtree catches up and the sensors
//! are refreshed.

use bevy::prelude::*;

use crate::{
    controller::{control, Pilot},
    resource::WorldRes,
};

pub struct Simulator;

impl Plugin for Simulator {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, simulate.after(control));
    }
}

fn simulate(time: Res<Time>, mut world: ResMut<WorldRes>, mut pilot: ResMut<Pilot>) {
    world.step(time.delta(), &mut *pilot);
}
