use crate::domain::model::AnalysisResult;
use crate::utils::error::{AnalyzerError, Result};
use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, LATIN_FONTS};
use image::{ImageEncoder, Rgb, RgbImage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
const DATA: Rgb<u8> = Rgb([31, 119, 180]);
const SMOOTHED: Rgb<u8> = Rgb([44, 160, 44]);
const FIT: Rgb<u8> = Rgb([214, 39, 40]);
const TEXT: Rgb<u8> = Rgb([0, 0, 0]);
const LEGEND_BORDER: Rgb<u8> = Rgb([200, 200, 200]);

const GRID_DIVISIONS: u32 = 5;
const GLYPH: i64 = 8;
const LINE_HEIGHT: i64 = 11;

const TITLE: &str = "Intensity Profile (dB scale) and Linear Fit";
const X_LABEL: &str = "Distance (units)";
const Y_LABEL: &str = "Relative Intensity (dB)";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
}

impl Default for PlotOptions {
    // 6 x 2.5 吋 @ 150 dpi
    fn default() -> Self {
        Self {
            width: 900,
            height: 375,
            margin_left: 72,
            margin_right: 20,
            margin_top: 20,
            margin_bottom: 40,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Axes {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Axes {
    fn to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let px = self.left + (x - self.x_min) / (self.x_max - self.x_min) * self.width;
        let py = self.top + (self.y_max - y) / (self.y_max - self.y_min) * self.height;
        (px.round() as i64, py.round() as i64)
    }
}

fn span(values: impl Iterator<Item = f64>, pad_fraction: f64) -> Option<(f64, f64)> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;

    if (max - min).abs() < 1e-12 {
        return Some((min - 1.0, max + 1.0));
    }
    let pad = (max - min) * pad_fraction;
    Some((min - pad, max + pad))
}

/// Smoothed dB curve on the fitted x positions, when every raw point produced a value.
fn smoothed_series(result: &AnalysisResult) -> Option<Vec<f64>> {
    let smoothed_db = result.smoothed_db.as_ref()?;
    if !smoothed_db.is_complete(result.x_data.len()) {
        tracing::warn!("Smoothed profile length mismatch, skipping smoothed curve");
        return None;
    }
    Some(
        result
            .db
            .valid_indices
            .iter()
            .map(|&i| smoothed_db.values[i])
            .collect(),
    )
}

/// Draws the dB profile, smoothed curve and fitted line with title, ticks and legend.
pub fn render_plot(result: &AnalysisResult, options: &PlotOptions) -> Result<RgbImage> {
    let plot_w = options
        .width
        .checked_sub(options.margin_left + options.margin_right)
        .filter(|w| *w > 1);
    let plot_h = options
        .height
        .checked_sub(options.margin_top + options.margin_bottom)
        .filter(|h| *h > 1);
    let (plot_w, plot_h) = match (plot_w, plot_h) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(AnalyzerError::PlotError {
                message: format!(
                    "{}x{} canvas leaves no room inside the margins",
                    options.width, options.height
                ),
            })
        }
    };

    let x_fit = result.fitted_x();
    let smoothed = smoothed_series(result);
    let fit_y: Vec<f64> = x_fit.iter().map(|&x| result.fit.predict(x)).collect();

    let (x_min, x_max) = span(x_fit.iter().copied(), 0.0).ok_or_else(|| AnalyzerError::PlotError {
        message: "no valid dB data to plot".to_string(),
    })?;
    let y_values = result
        .db
        .values
        .iter()
        .chain(fit_y.iter())
        .chain(smoothed.iter().flatten())
        .copied();
    let (y_min, y_max) = span(y_values, 0.05).ok_or_else(|| AnalyzerError::PlotError {
        message: "dB values are not finite".to_string(),
    })?;

    let axes = Axes {
        left: options.margin_left as f64,
        top: options.margin_top as f64,
        width: plot_w as f64,
        height: plot_h as f64,
        x_min,
        x_max,
        y_min,
        y_max,
    };

    let mut img = RgbImage::from_pixel(options.width, options.height, WHITE);
    draw_grid(&mut img, &axes);
    draw_axis_labels(&mut img, &axes);

    let dots: Vec<(i64, i64)> = x_fit
        .iter()
        .zip(&result.db.values)
        .map(|(&x, &y)| axes.to_pixel(x, y))
        .collect();
    for &(px, py) in &dots {
        draw_dot(&mut img, px, py, 2, DATA);
    }

    if let Some(series) = &smoothed {
        draw_polyline(&mut img, &axes, &x_fit, series, SMOOTHED);
    }
    if let (Some(&first), Some(&last)) = (x_fit.first(), x_fit.last()) {
        draw_polyline(
            &mut img,
            &axes,
            &[first, last],
            &[result.fit.predict(first), result.fit.predict(last)],
            FIT,
        );
    }

    draw_legend(&mut img, &axes, &legend_entries(result, smoothed.is_some()), &dots);
    Ok(img)
}

pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buffer)
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);

    loop {
        put(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn draw_polyline(img: &mut RgbImage, axes: &Axes, xs: &[f64], ys: &[f64], color: Rgb<u8>) {
    let points: Vec<(i64, i64)> = xs.iter().zip(ys).map(|(&x, &y)| axes.to_pixel(x, y)).collect();
    for pair in points.windows(2) {
        // 兩像素寬
        draw_line(img, pair[0], pair[1], color);
        draw_line(img, (pair[0].0, pair[0].1 + 1), (pair[1].0, pair[1].1 + 1), color);
    }
}

fn draw_dot(img: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_grid(img: &mut RgbImage, axes: &Axes) {
    let left = axes.left as i64;
    let top = axes.top as i64;
    let right = (axes.left + axes.width) as i64;
    let bottom = (axes.top + axes.height) as i64;

    for i in 1..GRID_DIVISIONS {
        let gx = left + (axes.width * i as f64 / GRID_DIVISIONS as f64) as i64;
        let gy = top + (axes.height * i as f64 / GRID_DIVISIONS as f64) as i64;
        draw_line(img, (gx, top), (gx, bottom), GRID);
        draw_line(img, (left, gy), (right, gy), GRID);
    }

    draw_line(img, (left, top), (right, top), FRAME);
    draw_line(img, (left, bottom), (right, bottom), FRAME);
    draw_line(img, (left, top), (left, bottom), FRAME);
    draw_line(img, (right, top), (right, bottom), FRAME);
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn text_width(text: &str) -> i64 {
    text.chars().count() as i64 * GLYPH
}

/// Left-to-right text with its top-left corner at `(x, y)`.
fn draw_text(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
    for (k, c) in text.chars().enumerate() {
        let origin = x + k as i64 * GLYPH;
        for (gy, row) in glyph(c).iter().enumerate() {
            for gx in 0..8 {
                if row & (1 << gx) != 0 {
                    put(img, origin + gx as i64, y + gy as i64, color);
                }
            }
        }
    }
}

/// Bottom-to-top text; `(x, y)` is the bottom-left corner.
fn draw_text_vertical(img: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
    for (k, c) in text.chars().enumerate() {
        let origin = k as i64 * GLYPH;
        for (gy, row) in glyph(c).iter().enumerate() {
            for gx in 0..8 {
                if row & (1 << gx) != 0 {
                    put(img, x + gy as i64, y - origin - gx as i64, color);
                }
            }
        }
    }
}

/// Tick text with precision chosen from the tick step.
fn format_tick(value: f64, span: f64) -> String {
    let step = span / GRID_DIVISIONS as f64;
    let value = if value.abs() < step.abs() * 1e-6 { 0.0 } else { value };

    let text = if !(step.is_finite() && step > 0.0) {
        format!("{}", value)
    } else if step < 1e-3 || value.abs() >= 1e5 {
        format!("{:.1e}", value)
    } else {
        let decimals = (-step.log10()).ceil().clamp(0.0, 3.0) as usize;
        format!("{:.*}", decimals, value)
    };

    // "-0.0" → "0.0"
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

fn draw_axis_labels(img: &mut RgbImage, axes: &Axes) {
    let left = axes.left as i64;
    let top = axes.top as i64;
    let bottom = (axes.top + axes.height) as i64;
    let img_w = img.width() as i64;

    let title_x = left + (axes.width as i64 - text_width(TITLE)) / 2;
    draw_text(img, title_x.max(0), (top - GLYPH) / 2, TITLE, TEXT);

    for i in 0..=GRID_DIVISIONS {
        let t = i as f64 / GRID_DIVISIONS as f64;

        let gx = left + (axes.width * t) as i64;
        let x_value = axes.x_min + (axes.x_max - axes.x_min) * t;
        let label = format_tick(x_value, axes.x_max - axes.x_min);
        let w = text_width(&label);
        let lx = (gx - w / 2).clamp(0, (img_w - w).max(0));
        draw_line(img, (gx, bottom), (gx, bottom + 3), FRAME);
        draw_text(img, lx, bottom + 6, &label, TEXT);

        let gy = top + (axes.height * t) as i64;
        let y_value = axes.y_max - (axes.y_max - axes.y_min) * t;
        let label = format_tick(y_value, axes.y_max - axes.y_min);
        draw_line(img, (left - 3, gy), (left, gy), FRAME);
        draw_text(img, left - 6 - text_width(&label), gy - GLYPH / 2, &label, TEXT);
    }

    let x_label_x = left + (axes.width as i64 - text_width(X_LABEL)) / 2;
    draw_text(img, x_label_x.max(0), bottom + 8 + LINE_HEIGHT, X_LABEL, TEXT);

    let y_label_bottom = top + (axes.height as i64 + text_width(Y_LABEL)) / 2;
    draw_text_vertical(img, 2, y_label_bottom, Y_LABEL, TEXT);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Swatch {
    Dot(Rgb<u8>),
    Line(Rgb<u8>),
    None,
}

fn legend_entries(result: &AnalysisResult, with_smoothed: bool) -> Vec<(Swatch, String)> {
    let fit = &result.fit;
    let mut entries = vec![(Swatch::Dot(DATA), "Intensity Data (dB)".to_string())];
    if with_smoothed {
        entries.push((
            Swatch::Line(SMOOTHED),
            format!("Smoothed (w={})", result.smoothing_window),
        ));
    }
    entries.push((Swatch::Line(FIT), "Linear Fit (dB): y = mx + b".to_string()));
    entries.push((
        Swatch::None,
        format!(
            "m={:.4} dB/unit, b={:.2} dB, R²={:.3}",
            fit.slope_db, fit.intercept_db, fit.r_squared
        ),
    ));
    entries
}

/// Places the legend in the plot corner covering the fewest data points.
fn draw_legend(img: &mut RgbImage, axes: &Axes, entries: &[(Swatch, String)], dots: &[(i64, i64)]) {
    let text_w = entries.iter().map(|(_, t)| text_width(t)).max().unwrap_or(0);
    let box_w = 6 + 22 + 6 + text_w + 6;
    let box_h = entries.len() as i64 * LINE_HEIGHT + 8;

    let left = axes.left as i64 + 6;
    let top = axes.top as i64 + 6;
    let right = (axes.left + axes.width) as i64 - 6 - box_w;
    let bottom = (axes.top + axes.height) as i64 - 6 - box_h;
    let corners = [(right, top), (left, bottom), (left, top), (right, bottom)];

    let covered = |&(bx, by): &(i64, i64)| {
        dots.iter()
            .filter(|&&(px, py)| px >= bx && px <= bx + box_w && py >= by && py <= by + box_h)
            .count()
    };
    let (bx, by) = corners
        .iter()
        .copied()
        .min_by_key(|c| covered(c))
        .unwrap_or((right, top));

    for y in by..=by + box_h {
        for x in bx..=bx + box_w {
            put(img, x, y, WHITE);
        }
    }
    draw_line(img, (bx, by), (bx + box_w, by), LEGEND_BORDER);
    draw_line(img, (bx, by + box_h), (bx + box_w, by + box_h), LEGEND_BORDER);
    draw_line(img, (bx, by), (bx, by + box_h), LEGEND_BORDER);
    draw_line(img, (bx + box_w, by), (bx + box_w, by + box_h), LEGEND_BORDER);

    for (row, (swatch, label)) in entries.iter().enumerate() {
        let ty = by + 5 + row as i64 * LINE_HEIGHT;
        let cy = ty + GLYPH / 2;
        match *swatch {
            Swatch::Dot(color) => draw_dot(img, bx + 17, cy, 2, color),
            Swatch::Line(color) => {
                draw_line(img, (bx + 6, cy), (bx + 28, cy), color);
                draw_line(img, (bx + 6, cy + 1), (bx + 28, cy + 1), color);
            }
            Swatch::None => {}
        }
        draw_text(img, bx + 34, ty, label, TEXT);
    }
}
