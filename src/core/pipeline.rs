pub use crate::app::pipelines::light_loss_pipeline::{
    LightLossPipeline, PROFILE_CSV_FILENAME, REPORT_JSON_FILENAME,
};
