pub mod collider;
pub mod config;
pub mod game_logic;
pub mod level;
pub mod listener;
pub mod lobby;
pub mod notices;
pub mod participant;
pub mod phase;
pub mod pose;
pub mod powerups;
pub mod presentation;
pub mod procedure;
pub mod projectile;
pub mod session;
pub mod stats;
pub mod target;

pub use participant::{Participant, ParticipantServices};
