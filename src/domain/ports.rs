use crate::domain::model::{AnalysisResult, CoordinateSpace, OutputFormat, RoiRequest, RoiSample};
use crate::domain::services::feedback::FeedbackThresholds;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn image_path(&self) -> &str;
    fn roi_request(&self) -> Option<RoiRequest>;
    fn coordinate_space(&self) -> CoordinateSpace;
    fn length(&self) -> f64;
    fn smoothing_window(&self) -> usize;
    fn thresholds(&self) -> FeedbackThresholds;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[OutputFormat];
    fn plot_filename(&self) -> &str;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RoiSample>;
    async fn transform(&self, sample: RoiSample) -> Result<AnalysisResult>;
    async fn load(&self, result: AnalysisResult) -> Result<Vec<String>>;
}
