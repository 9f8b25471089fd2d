//! HTTP handlers for the resource families.

pub mod resource;
