//! Heuristic presence and gaze detection over raw pixels

use crate::analysis::{DetectionStatus, FrameStatistics};
use crate::{ClassifierConfig, PresenceError};
use camera_capture::frame::{PixelFrame, BYTES_PER_PIXEL};
use std::time::Instant;
use tracing::debug;

#[inline]
fn rgb_at(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 3] {
    let idx = (y as usize * width as usize + x as usize) * BYTES_PER_PIXEL;
    [data[idx], data[idx + 1], data[idx + 2]]
}

#[inline]
fn brightness([r, g, b]: [u8; 3]) -> f32 {
    (r as f32 + g as f32 + b as f32) / 3.0
}

/// Mean absolute deviation of the channels from their mean
#[inline]
fn spread(px: [u8; 3], mean: f32) -> f32 {
    px.iter().map(|&c| (c as f32 - mean).abs()).sum::<f32>() / 3.0
}

#[inline]
fn channel_range([r, g, b]: [u8; 3]) -> u8 {
    r.max(g).max(b) - r.min(g).min(b)
}

#[inline]
fn color_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs())
        .sum()
}

/// Warm, flesh and skin-tone rules, only inside the skin brightness window
fn is_skin(px: [u8; 3], brightness: f32, config: &ClassifierConfig) -> bool {
    if brightness < config.skin_brightness_min || brightness > config.skin_brightness_max {
        return false;
    }
    let [r, g, b] = px.map(i32::from);

    let warm = r > g && g > b && r - b > 20 && r > 60;
    let flesh = r > 95
        && g > 40
        && b > 20
        && r > g
        && r > b
        && (r - g) > 15
        && channel_range(px) > 15;
    let tone = r > 80 && g > 50 && b > 30 && r >= g && g >= b && r - b > 10;

    warm || flesh || tone
}

/// Compute statistics for `frame`.
///
/// Returns `Ok(None)` when the frame is empty or no pixel could be sampled.
/// `previous` only contributes motion when its dimensions match.
pub fn analyze_frame(
    frame: &PixelFrame,
    previous: Option<&PixelFrame>,
    config: &ClassifierConfig,
) -> Result<Option<FrameStatistics>, PresenceError> {
    if frame.is_empty() {
        return Ok(None);
    }
    if !frame.is_well_formed() {
        return Err(PresenceError::MalformedFrame {
            width: frame.width(),
            height: frame.height(),
            len: frame.data().len(),
        });
    }

    let (width, height) = (frame.width(), frame.height());
    let data = frame.data();
    let previous = previous
        .filter(|p| p.same_size(frame) && p.is_well_formed())
        .map(|p| p.data());

    let stride = config.sample_stride.max(1) as usize;
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let radius = config.center_radius_ratio * width.min(height) as f32;
    let radius_sq = radius * radius;

    let mut sampled = 0usize;
    let mut brightness_sum = 0.0f32;
    let mut variance_sum = 0.0f32;
    let mut skin = 0usize;
    let mut dark = 0usize;
    let mut edges = 0usize;
    let mut uniform = 0usize;
    let mut moving = 0usize;
    let mut center_active = 0usize;

    for y in (0..height).step_by(stride) {
        for x in (0..width).step_by(stride) {
            let px = rgb_at(data, width, x, y);
            let b = brightness(px);

            sampled += 1;
            brightness_sum += b;
            variance_sum += spread(px, b);

            let is_skin_px = is_skin(px, b, config);
            if is_skin_px {
                skin += 1;
            }
            if b < config.dark_brightness {
                dark += 1;
            }
            if channel_range(px) < config.uniform_tolerance {
                uniform += 1;
            }

            let is_edge = x > 0 && y > 0 && {
                let left = brightness(rgb_at(data, width, x - 1, y));
                let up = brightness(rgb_at(data, width, x, y - 1));
                (b - left).abs() > config.edge_threshold || (b - up).abs() > config.edge_threshold
            };
            if is_edge {
                edges += 1;
            }

            let is_moving = previous
                .map(|prev| color_distance(px, rgb_at(prev, width, x, y)) > config.motion_threshold)
                .unwrap_or(false);
            if is_moving {
                moving += 1;
            }

            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= radius_sq && (is_skin_px || is_edge || is_moving) {
                center_active += 1;
            }
        }
    }

    if sampled == 0 {
        return Ok(None);
    }

    let n = sampled as f32;
    Ok(Some(FrameStatistics {
        sampled,
        avg_brightness: brightness_sum / n,
        avg_variance: variance_sum / n,
        skin_ratio: skin as f32 / n,
        dark_ratio: dark as f32 / n,
        center_activity: center_active as f32 / n,
        motion_ratio: moving as f32 / n,
        edge_ratio: edges as f32 / n,
        uniform_ratio: uniform as f32 / n,
    }))
}

/// Stateful classifier keeping one previous frame for the motion check
pub struct PresenceClassifier {
    config: ClassifierConfig,
    previous: Option<PixelFrame>,
    last_stats: Option<FrameStatistics>,
}

impl PresenceClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, PresenceError> {
        config.validate()?;
        Ok(Self {
            config,
            previous: None,
            last_stats: None,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Statistics of the last classified frame
    pub fn last_stats(&self) -> Option<&FrameStatistics> {
        self.last_stats.as_ref()
    }

    /// Classify a frame and remember it for the next motion check
    pub fn classify(&mut self, frame: &PixelFrame) -> Result<DetectionStatus, PresenceError> {
        let started = Instant::now();

        let stats = match analyze_frame(frame, self.previous.as_ref(), &self.config)? {
            Some(stats) => stats,
            None => {
                self.last_stats = None;
                return Ok(DetectionStatus::none());
            }
        };

        let status = stats.evaluate(&self.config);
        debug!(
            skin = stats.skin_ratio,
            dark = stats.dark_ratio,
            center = stats.center_activity,
            motion = stats.motion_ratio,
            uniform = stats.uniform_ratio,
            "Frame {} classified: {:?}",
            frame.sequence,
            status
        );

        self.previous = Some(frame.clone());
        self.last_stats = Some(stats);
        metrics::histogram!("presence_classify_seconds").record(started.elapsed().as_secs_f64());

        Ok(status)
    }

    /// Forget the previous frame
    pub fn reset(&mut self) {
        self.previous = None;
        self.last_stats = None;
    }
}
