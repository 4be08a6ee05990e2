pub mod aggregator;
pub mod booster;
pub mod data;
pub mod features;
pub mod predictor;
pub mod team_names;
