//! Core types for the partner map.
//!
//! This module provides type-safe wrappers for the Salesforce records the
//! dashboard is built from.

pub mod cart_row;
pub mod coordinates;
pub mod id;
pub mod records;

pub use cart_row::CartRow;
pub use coordinates::{Coordinates, CoordinatesError, EARTH_MEAN_RADIUS_KM};
pub use id::*;
pub use records::{Account, CartItem, Material, Order};
