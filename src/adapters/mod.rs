// Adapters layer: concrete output renderers for analysis results.

pub mod export;
pub mod plot;
