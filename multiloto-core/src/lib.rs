pub mod models;
pub mod parse;
pub mod registry;
pub mod stats;
pub mod ticket;
pub mod weights;
