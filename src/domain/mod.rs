// Domain layer: measurement models, ports, and the numeric services behind the analysis.

pub mod model;
pub mod ports;

pub mod services;
