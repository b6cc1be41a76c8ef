mod common;
mod cycle_detection;
mod dependency;
