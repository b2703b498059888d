//! Clearlag - population control for a live world simulation

pub mod command;
pub mod control;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod notify;
pub mod population;
pub mod scheduler;
pub mod simulation;
