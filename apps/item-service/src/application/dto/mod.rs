//! Data Transfer Objects
//!
//! Input and output shapes at the service boundary. Request DTOs keep every
//! field optional so that missing input surfaces as a validation error from
//! the service rather than a deserialization failure.

mod item_dto;
mod user_dto;

pub use item_dto::{CreateItemDto, UpdateItemDto};
pub use user_dto::{LoginDto, LoginResultDto, RegisterUserDto, RegisteredUserDto};
