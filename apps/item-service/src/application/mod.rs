//! Application layer - storage port, resource service and DTOs.

pub mod dto;
pub mod ports;
pub mod services;
