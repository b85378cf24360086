pub mod engine;
pub mod incidence;
pub mod network;
pub mod neuron;
pub mod params;
pub mod record;
pub mod synapse;
pub mod time_series;

mod partition;
mod types;
mod util;
