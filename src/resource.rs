//! The resource module encapsulates domain entities for use with Bevy.

use std::ops::{Deref, DerefMut};

use bevy::ecs::system::Resource;

use sensor_sim::domain;

#[derive(Resource)]
pub struct WorldRes(domain::World);

impl Deref for WorldRes {
    type Target = domain::World;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WorldRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::World> for WorldRes {
    fn from(value: domain::World) -> Self {
        Self(value)
    }
}

#[derive(Resource)]
pub struct ScenarioRes(domain::ScenarioConfig);

impl Deref for ScenarioRes {
    type Target = domain::ScenarioConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ScenarioRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::ScenarioConfig> for ScenarioRes {
    fn from(value: domain::ScenarioConfig) -> Self {
        Self(value)
    }
}
