pub mod bias;
pub mod generator;
pub mod kind;
pub mod rng;
pub mod series;
