/// 3×3 Sobel gradient `(gx, gy)` at `(x, y)`, border-clamped.
///
/// `gx` is positive when the field increases to the right, `gy` when it
/// increases downward (image rows).
pub fn sobel_gradient(field: &[f32], width: u32, height: u32, x: u32, y: u32) -> (f32, f32) {
    let w = width as i64;
    let max_x = w - 1;
    let max_y = height as i64 - 1;
    let at = |dx: i64, dy: i64| -> f32 {
        let sx = (x as i64 + dx).clamp(0, max_x);
        let sy = (y as i64 + dy).clamp(0, max_y);
        field[(sy * w + sx) as usize]
    };

    let tl = at(-1, -1);
    let tm = at(0, -1);
    let tr = at(1, -1);
    let ml = at(-1, 0);
    let mr = at(1, 0);
    let bl = at(-1, 1);
    let bm = at(0, 1);
    let br = at(1, 1);

    let gx = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
    let gy = (bl + 2.0 * bm + br) - (tl + 2.0 * tm + tr);
    (gx, gy)
}
