use crate::domain::model::{CoordinateSpace, Roi, RoiRequest};
use crate::utils::error::{AnalyzerError, Result};

pub const MAX_DISPLAY_WIDTH: u32 = 1200;
pub const MAX_DISPLAY_HEIGHT: u32 = 800;
pub const MIN_ZOOM_LEVEL: f64 = 0.1;
pub const ZOOM_FACTOR: f64 = 1.2;

impl Roi {
    /// Orders, truncates and clamps the corners to the image bounds.
    pub fn from_request(request: &RoiRequest, image_width: u32, image_height: u32) -> Result<Self> {
        let r = request.ordered();
        let clamp = |v: f64, max: u32| -> u32 { (v.trunc().max(0.0) as u64).min(max as u64) as u32 };

        let roi = Roi {
            x1: clamp(r.x1, image_width),
            y1: clamp(r.y1, image_height),
            x2: clamp(r.x2, image_width),
            y2: clamp(r.y2, image_height),
        };

        if roi.x1 >= roi.x2 || roi.y1 >= roi.y2 {
            return Err(AnalyzerError::roi(format!(
                "ROI too small or invalid after clamping to {}x{} image: {}",
                image_width, image_height, roi
            )));
        }

        Ok(roi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayLimits {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            max_width: MAX_DISPLAY_WIDTH,
            max_height: MAX_DISPLAY_HEIGHT,
        }
    }
}

/// Preview geometry: a possibly downscaled copy of the image shown at a zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    image_width: u32,
    image_height: u32,
    display_width: u32,
    display_height: u32,
    display_scale_factor: f64,
    zoom: f64,
}

impl Viewport {
    pub fn new(image_width: u32, image_height: u32, limits: DisplayLimits) -> Self {
        let mut display_width = image_width;
        let mut display_height = image_height;
        let mut display_scale_factor = 1.0;

        if image_width > limits.max_width || image_height > limits.max_height {
            let scale = (limits.max_width as f64 / image_width as f64)
                .min(limits.max_height as f64 / image_height as f64);
            display_width = ((image_width as f64 * scale) as u32).max(1);
            display_height = ((image_height as f64 * scale) as u32).max(1);
            display_scale_factor = image_width as f64 / display_width as f64;
        }

        Self {
            image_width,
            image_height,
            display_width,
            display_height,
            display_scale_factor,
            zoom: 1.0,
        }
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom.max(MIN_ZOOM_LEVEL);
        self
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn display_scale_factor(&self) -> f64 {
        self.display_scale_factor
    }

    pub fn zoom_in(&mut self) {
        self.zoom *= ZOOM_FACTOR;
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_FACTOR).max(MIN_ZOOM_LEVEL);
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    pub fn zoomed_size(&self) -> (u32, u32) {
        let w = (self.display_width as f64 * self.zoom) as u32;
        let h = (self.display_height as f64 * self.zoom) as u32;
        (w.max(1), h.max(1))
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Canvas corners to original-image pixel corners (truncated, unclamped).
    pub fn canvas_to_image(&self, request: &RoiRequest) -> RoiRequest {
        let r = request.ordered();
        let map = |c: f64| ((c / self.zoom) * self.display_scale_factor).trunc();
        RoiRequest::new(map(r.x1), map(r.y1), map(r.x2), map(r.y2))
    }

    pub fn image_to_canvas(&self, roi: &Roi) -> (f64, f64, f64, f64) {
        let map = |c: u32| c as f64 / self.display_scale_factor * self.zoom;
        (map(roi.x1), map(roi.y1), map(roi.x2), map(roi.y2))
    }
}

pub fn resolve_roi(
    request: &RoiRequest,
    space: CoordinateSpace,
    image_width: u32,
    image_height: u32,
) -> Result<Roi> {
    let image_request = match space {
        CoordinateSpace::Image => *request,
        CoordinateSpace::Canvas { zoom } => {
            let viewport = Viewport::new(image_width, image_height, DisplayLimits::default())
                .with_zoom(zoom);
            tracing::debug!(
                "Mapping canvas ROI {} at zoom {:.3} (display factor {:.4})",
                request,
                viewport.zoom(),
                viewport.display_scale_factor()
            );
            viewport.canvas_to_image(request)
        }
    };

    let roi = Roi::from_request(&image_request, image_width, image_height)?;
    tracing::debug!("ROI set (original coords): {}", roi);
    Ok(roi)
}
