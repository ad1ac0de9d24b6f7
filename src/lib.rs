//! Spatial indexing and sensing core for 2D agent simulations.


pub mod domain;
