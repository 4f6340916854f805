/// Normalized 1D Gaussian weights for `-radius..=radius`, sigma = radius / 2.
///
/// Radius 0 yields the identity kernel `[1.0]`.
pub fn gaussian_kernel(radius: u32) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = radius as f32 / 2.0;
    let denom = 2.0 * sigma * sigma;
    let r = radius as i32;
    let mut weights: Vec<f32> = (-r..=r)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Separable Gaussian blur over a row-major scalar field, border-clamped.
///
/// Horizontal pass then vertical pass. Every output pixel accumulates the
/// same taps in the same order, so a constant field stays bit-identical
/// from pixel to pixel.
pub fn gaussian_blur(field: &[f32], width: u32, height: u32, radius: u32) -> Vec<f32> {
    let w = width as usize;
    let h = height as usize;
    debug_assert_eq!(field.len(), w * h, "field size mismatch");

    let kernel = gaussian_kernel(radius);
    let r = radius as i64;
    let max_x = w as i64 - 1;
    let max_y = h as i64 - 1;

    let mut horizontal = vec![0.0f32; w * h];
    for y in 0..h {
        let row = &field[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (x as i64 + k as i64 - r).clamp(0, max_x) as usize;
                acc += row[sx] * weight;
            }
            horizontal[y * w + x] = acc;
        }
    }

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y as i64 + k as i64 - r).clamp(0, max_y) as usize;
                acc += horizontal[sy * w + x] * weight;
            }
            out[y * w + x] = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_sums_to_one() {
        for radius in [1, 4, 6, 10] {
            let k = gaussian_kernel(radius);
            assert_eq!(k.len(), 2 * radius as usize + 1);
            let sum: f32 = k.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "radius {radius} sums to {sum}");
        }
    }

    #[test]
    fn test_kernel_symmetric_peak_center() {
        let k = gaussian_kernel(6);
        for i in 0..6 {
            assert_eq!(k[i], k[12 - i]);
            assert!(k[i] < k[i + 1]);
        }
    }

    #[test]
    fn test_zero_radius_is_identity() {
        let field = vec![0.1, 0.9, 0.4, 0.2];
        assert_eq!(gaussian_blur(&field, 2, 2, 0), field);
    }

    #[test]
    fn test_constant_field_uniform_output() {
        let field = vec![0.37; 9 * 7];
        let out = gaussian_blur(&field, 9, 7, 6);
        for v in &out {
            assert_eq!(*v, out[0]);
            assert!((v - 0.37).abs() < 1e-5);
        }
    }

    #[test]
    fn test_blur_spreads_impulse() {
        let mut field = vec![0.0; 11 * 11];
        field[5 * 11 + 5] = 1.0;
        let out = gaussian_blur(&field, 11, 11, 2);
        assert!(out[5 * 11 + 5] < 1.0);
        assert!(out[5 * 11 + 6] > 0.0);
        assert!(out[6 * 11 + 6] > 0.0);
        let total: f32 = out.iter().sum();
        assert!((total - 1.0).abs() < 1e-4, "energy {total}");
    }
}
