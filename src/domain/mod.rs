// Domain layer - Core trimming logic

pub mod cut_set;
pub mod errors;
pub mod model;
pub mod rules;
