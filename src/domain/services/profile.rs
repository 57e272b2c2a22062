use crate::domain::model::DbProfile;
use crate::utils::error::{AnalyzerError, Result};
use image::{DynamicImage, GrayImage, Luma};

const MIN_POSITIVE: f64 = 1e-9;

/// Converts to 8-bit luma with ITU-R 601-2 weights (16.16 fixed point, rounded).
///
/// Gray inputs keep their values; alpha is ignored.
pub fn to_grayscale(img: DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray,
        DynamicImage::ImageLumaA8(gray_alpha) => {
            GrayImage::from_fn(gray_alpha.width(), gray_alpha.height(), |x, y| {
                Luma([gray_alpha.get_pixel(x, y).0[0]])
            })
        }
        other => {
            let rgb = other.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let l = r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000;
                Luma([(l >> 16) as u8])
            })
        }
    }
}

/// Column-wise sum of pixel values, left to right.
pub fn intensity_profile(pixels: &GrayImage) -> Option<Vec<f64>> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let mut profile = vec![0.0f64; width as usize];
    for (x, _, px) in pixels.enumerate_pixels() {
        profile[x as usize] += px.0[0] as f64;
    }
    Some(profile)
}

pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Centered moving average with edge padding; output length equals input length.
///
/// Even or zero windows leave the data untouched, as does a series shorter
/// than the window.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window < 1 || window % 2 == 0 {
        if window != 1 {
            tracing::warn!(
                "Invalid smoothing window {}. Must be odd and >= 1. Smoothing disabled.",
                window
            );
        }
        return data.to_vec();
    }
    if data.len() < window {
        return data.to_vec();
    }

    let pad = window / 2;
    let first = data[0];
    let last = data[data.len() - 1];

    let padded: Vec<f64> = std::iter::repeat(first)
        .take(pad)
        .chain(data.iter().copied())
        .chain(std::iter::repeat(last).take(pad))
        .collect();

    padded
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Normalizes to the profile peak and converts to dB, dropping non-positive points.
pub fn db_profile(profile: &[f64]) -> Result<DbProfile> {
    if profile.is_empty() {
        return Err(AnalyzerError::analysis("Intensity profile is empty"));
    }

    let peak = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(peak > MIN_POSITIVE) {
        return Err(AnalyzerError::analysis(
            "Peak intensity is near zero. Cannot calculate dB profile.",
        ));
    }

    let (valid_indices, values): (Vec<usize>, Vec<f64>) = profile
        .iter()
        .enumerate()
        .map(|(i, v)| (i, v / peak))
        .filter(|(_, n)| *n > MIN_POSITIVE)
        .map(|(i, n)| (i, 10.0 * n.log10()))
        .unzip();

    if valid_indices.is_empty() {
        return Err(AnalyzerError::analysis(
            "No positive intensity values after normalization. Cannot calculate dB profile.",
        ));
    }

    Ok(DbProfile {
        values,
        valid_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_intensity_profile_sums_columns() {
        let img = GrayImage::from_fn(3, 2, |x, y| Luma([(x * 10 + y) as u8]));
        // column 0: 0+1, column 1: 10+11, column 2: 20+21
        assert_eq!(intensity_profile(&img), Some(vec![1.0, 21.0, 41.0]));
    }

    #[test]
    fn test_to_grayscale_uses_601_weights() {
        let rgb = image::RgbImage::from_fn(4, 1, |x, _| {
            image::Rgb([[255, 0, 0], [0, 0, 255], [255, 255, 255], [90, 90, 90]][x as usize])
        });
        let gray = to_grayscale(DynamicImage::ImageRgb8(rgb));
        let values: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
        // 紅色 255 → 76 (Rec. 709 會得到 54)
        assert_eq!(values, vec![76, 29, 255, 90]);
    }

    #[test]
    fn test_to_grayscale_keeps_gray_input() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([x as u8 * 100]));
        assert_eq!(to_grayscale(DynamicImage::ImageLuma8(gray.clone())), gray);

        let rgba = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 255, 0]));
        assert_eq!(to_grayscale(DynamicImage::ImageRgba8(rgba)).get_pixel(0, 0).0[0], 29);
    }

    #[test]
    fn test_intensity_profile_empty_crop() {
        assert_eq!(intensity_profile(&GrayImage::new(0, 4)), None);
    }

    #[test]
    fn test_linspace_includes_endpoints() {
        assert_eq!(linspace(0.0, 2.0, 5), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(linspace(0.0, 2.0, 1), vec![0.0]);
        assert!(linspace(0.0, 2.0, 0).is_empty());
    }

    #[test]
    fn test_moving_average_pads_with_edges() {
        let smoothed = moving_average(&[3.0, 6.0, 9.0, 12.0], 3);
        // 左邊補 3，右邊補 12
        assert_eq!(smoothed, vec![4.0, 6.0, 9.0, 11.0]);
    }

    #[test]
    fn test_moving_average_invalid_windows_passthrough() {
        let data = [1.0, 5.0, 2.0, 8.0];
        assert_eq!(moving_average(&data, 4), data.to_vec());
        assert_eq!(moving_average(&data, 0), data.to_vec());
        assert_eq!(moving_average(&data, 1), data.to_vec());
        assert_eq!(moving_average(&data, 5), data.to_vec());
    }

    #[test]
    fn test_db_profile_normalizes_to_peak() {
        let db = db_profile(&[100.0, 10.0, 0.0, 1.0]).unwrap();
        assert_eq!(db.valid_indices, vec![0, 1, 3]);
        assert!((db.values[0] - 0.0).abs() < 1e-12);
        assert!((db.values[1] + 10.0).abs() < 1e-12);
        assert!((db.values[2] + 20.0).abs() < 1e-12);
        assert!(!db.is_complete(4));
    }

    #[test]
    fn test_db_profile_rejects_dark_profile() {
        assert!(db_profile(&[0.0, 0.0, 0.0]).is_err());
        assert!(db_profile(&[]).is_err());
    }
}
