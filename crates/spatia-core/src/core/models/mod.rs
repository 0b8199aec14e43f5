//! Data model for spatial samples: the [`point::Point`] coordinate triple and
//! the [`element::Element`] metadata that supplies per-point masses.

pub mod element;
pub mod point;
