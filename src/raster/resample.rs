//! Area-averaging (box filter) resampling.

use super::buffer::{pack_rgb, unpack_rgb, RasterImage};

/// Per-destination-pixel list of `(source index, coverage weight)`.
fn area_weights(src: u32, dst: u32) -> Vec<Vec<(usize, f64)>> {
    let scale = src as f64 / dst as f64;
    (0..dst)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (d as f64 + 1.0) * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src);
            (first..last)
                .filter_map(|s| {
                    let lo = start.max(s as f64);
                    let hi = end.min(s as f64 + 1.0);
                    (hi > lo).then_some((s as usize, hi - lo))
                })
                .collect()
        })
        .collect()
}

impl RasterImage {
    /// Resamples to `width x height` by averaging the source area each
    /// destination pixel covers.
    ///
    /// Works for both reduction and enlargement. Zero target dimensions are
    /// raised to 1.
    pub fn resize_area_average(&self, width: u32, height: u32) -> RasterImage {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        if self.data().is_empty() {
            return RasterImage::new(width, height);
        }

        let src_w = self.width() as usize;
        let xw = area_weights(self.width(), width);
        let yw = area_weights(self.height(), height);

        // Horizontal pass into a float buffer, one row per source row.
        let mut horizontal = vec![[0f64; 3]; width as usize * self.height() as usize];
        for (sy, src_row) in self.data().chunks_exact(src_w).enumerate() {
            let dst_row = &mut horizontal[sy * width as usize..(sy + 1) * width as usize];
            for (dx, weights) in xw.iter().enumerate() {
                let mut acc = [0f64; 3];
                let mut total = 0.0;
                for &(sx, w) in weights {
                    let c = unpack_rgb(src_row[sx]);
                    for i in 0..3 {
                        acc[i] += c[i] as f64 * w;
                    }
                    total += w;
                }
                if total > 0.0 {
                    for v in &mut acc {
                        *v /= total;
                    }
                }
                dst_row[dx] = acc;
            }
        }

        let mut out = RasterImage::new(width, height);
        for (dy, weights) in yw.iter().enumerate() {
            for dx in 0..width as usize {
                let mut acc = [0f64; 3];
                let mut total = 0.0;
                for &(sy, w) in weights {
                    let c = horizontal[sy * width as usize + dx];
                    for i in 0..3 {
                        acc[i] += c[i] * w;
                    }
                    total += w;
                }
                let rgb = if total > 0.0 {
                    [
                        (acc[0] / total).round() as u32,
                        (acc[1] / total).round() as u32,
                        (acc[2] / total).round() as u32,
                    ]
                } else {
                    [0, 0, 0]
                };
                out.set_value(dx as u32, dy as u32, pack_rgb(rgb));
            }
        }
        out
    }
}
