//! Agent navigation profiles
//!
//! Designers configure agents from data: which link types they may use,
//! their size class, and their movement tolerances. Profiles round-trip
//! through RON and JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::nav::{LinkTypes, NavSize, link_flags};

use super::{NavAgent, PathFollower};

/// A serializable navigation configuration for one kind of agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Profile name, for logging and tooling.
    pub name: String,
    pub size: NavSize,
    #[serde(default)]
    pub mounted: bool,
    /// Allow the character to walk on dry land.
    pub allow_walk: bool,
    /// Allow the character to use jump links.
    #[serde(default)]
    pub allow_jump: bool,
    /// Allow the character to use drop links.
    #[serde(default)]
    pub allow_drop: bool,
    /// Allow the character to move in water.
    #[serde(default)]
    pub allow_swim: bool,
    /// Allow the character to jump ledges.
    #[serde(default)]
    pub allow_ledge: bool,
    /// Allow the character to use climb links.
    #[serde(default)]
    pub allow_climb: bool,
    /// Allow the character to use teleporters.
    #[serde(default)]
    pub allow_teleport: bool,
    /// Speed as a fraction of the actor's base rate.
    pub move_speed: f32,
    /// Distance from a destination that counts as arrival.
    pub move_tolerance: f32,
    /// Per-tick displacement below which the agent is stuck.
    pub stuck_tolerance: f32,
    /// Ticks of grace before stuck checks begin.
    pub stuck_test_delay: u32,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: String::from("walker"),
            size: NavSize::Regular,
            mounted: false,
            allow_walk: true,
            allow_jump: false,
            allow_drop: false,
            allow_swim: false,
            allow_ledge: false,
            allow_climb: false,
            allow_teleport: false,
            move_speed: 1.0,
            move_tolerance: 0.25,
            stuck_tolerance: 0.01,
            stuck_test_delay: 30,
        }
    }
}

impl AgentProfile {
    /// The link permissions this profile grants.
    #[must_use]
    pub fn link_types(&self) -> LinkTypes {
        let mut flags = 0;
        if self.allow_walk {
            flags |= link_flags::WALK;
        }
        if self.allow_jump {
            flags |= link_flags::JUMP;
        }
        if self.allow_drop {
            flags |= link_flags::DROP;
        }
        if self.allow_swim {
            flags |= link_flags::SWIM;
        }
        if self.allow_ledge {
            flags |= link_flags::LEDGE;
        }
        if self.allow_climb {
            flags |= link_flags::CLIMB;
        }
        if self.allow_teleport {
            flags |= link_flags::TELEPORT;
        }
        LinkTypes::from_flags(flags)
    }

    /// Push this profile's settings into live agent components.
    pub fn apply(&self, nav: &mut NavAgent, follower: &mut PathFollower) {
        nav.link_types = self.link_types();
        nav.size = self.size;
        nav.mounted = self.mounted;
        follower.set_move_speed(self.move_speed);
        follower.set_move_tolerance(self.move_tolerance);
        follower.set_stuck_tolerance(self.stuck_tolerance);
        follower.set_stuck_test_delay(self.stuck_test_delay);
    }

    /// Save the profile to a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ProfileError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ProfileError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a profile from a RON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path).map_err(|e| ProfileError::IoError(e.to_string()))?;
        let profile: AgentProfile =
            ron::from_str(&content).map_err(|e| ProfileError::DeserializeError(e.to_string()))?;
        Ok(profile)
    }

    /// Save the profile to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ProfileError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ProfileError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ProfileError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a profile from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let content = fs::read_to_string(path).map_err(|e| ProfileError::IoError(e.to_string()))?;
        let profile: AgentProfile = serde_json::from_str(&content)
            .map_err(|e| ProfileError::DeserializeError(e.to_string()))?;
        Ok(profile)
    }
}

/// Errors that can occur while loading or saving profiles
#[derive(Debug, Clone)]
pub enum ProfileError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ProfileError {}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::agent::Pose;

    #[test]
    fn test_profile_round_trip_ron() {
        let mut profile = AgentProfile::default();
        profile.name = String::from("scout");
        profile.allow_jump = true;
        profile.allow_ledge = true;
        profile.size = NavSize::Small;

        let ron_str =
            ron::ser::to_string_pretty(&profile, ron::ser::PrettyConfig::default()).unwrap();
        assert!(ron_str.contains("scout"));

        let loaded: AgentProfile = ron::from_str(&ron_str).unwrap();
        assert_eq!(loaded.name, "scout");
        assert!(loaded.allow_jump);
        assert_eq!(loaded.size, NavSize::Small);
    }

    #[test]
    fn test_profile_round_trip_json() {
        let mut profile = AgentProfile::default();
        profile.allow_swim = true;
        profile.stuck_test_delay = 12;

        let json_str = serde_json::to_string(&profile).unwrap();
        let loaded: AgentProfile = serde_json::from_str(&json_str).unwrap();
        assert!(loaded.allow_swim);
        assert_eq!(loaded.stuck_test_delay, 12);
    }

    #[test]
    fn test_apply_configures_components() {
        let mut profile = AgentProfile::default();
        profile.allow_jump = true;
        profile.size = NavSize::Large;
        profile.move_speed = 2.5; // clamped by the follower
        profile.stuck_test_delay = 5;

        let pose = Pose::new(Vec3::ZERO);
        let mut nav = NavAgent::default();
        let mut follower = PathFollower::new(&pose);
        profile.apply(&mut nav, &mut follower);

        assert!(nav.link_types.jump);
        assert!(nav.link_types.walk);
        assert_eq!(nav.size, NavSize::Large);
    }

    #[test]
    fn test_link_types_from_flags_match() {
        let mut profile = AgentProfile::default();
        profile.allow_climb = true;
        profile.allow_teleport = true;

        let types = profile.link_types();
        assert!(types.walk);
        assert!(types.climb);
        assert!(types.teleport);
        assert!(!types.drop);
    }
}
