/// Replace every sample of a pixel interleaved `line` by its difference to
/// the same component of the previous pixel (TIFF predictor 2).
///
/// Only gray and RGB lines are differenced, other band counts are left
/// untouched.
pub fn horizontal_difference(line: &mut [u8], bands: usize) {
    if bands != 1 && bands != 3 {
        return;
    }
    for i in (bands..line.len()).rev() {
        line[i] = line[i].wrapping_sub(line[i - bands]);
    }
}
