use std::ffi::{CStr, c_char, c_int};

use serde::Deserialize;

const BYTES_PER_PIXEL: usize = 4;

/// Classic sepia matrix, one row per output channel.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Sepia plugin parameters.
#[derive(Deserialize)]
#[serde(default)]
struct SepiaParams {
    /// Blend between original (0.0) and full sepia (1.0).
    intensity: f32,
}

impl Default for SepiaParams {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

/// Plugin entry point, exported with C-compatible ABI.
///
/// Returns 0 on success, non-zero on error.
///
/// # Safety
///
/// - `rgba_data` must point to a valid buffer of size
///   `width * height * 4` bytes.
/// - `params` must be a valid pointer to a null-terminated
///   C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn process_image(
    width: u32,
    height: u32,
    rgba_data: *mut u8,
    params: *const c_char,
) -> c_int {
    if rgba_data.is_null() || params.is_null() {
        return 1;
    }

    let Some(w) = usize::try_from(width).ok().filter(|&v| v > 0) else {
        return 2;
    };
    let Some(h) = usize::try_from(height).ok().filter(|&v| v > 0) else {
        return 2;
    };
    let Some(buf_len) = w
        .checked_mul(h)
        .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
    else {
        return 3;
    };

    // SAFETY: rgba_data is non-null and buf_len does not overflow.
    // The host guarantees the buffer behind the pointer is that long.
    let data = unsafe { std::slice::from_raw_parts_mut(rgba_data, buf_len) };

    // SAFETY: params is non-null and the host passes a
    // null-terminated C string.
    let params_str = unsafe { CStr::from_ptr(params) }.to_str().unwrap_or("");

    let Ok(sepia_params) = serde_json::from_str::<SepiaParams>(params_str)
    else {
        return 4;
    };
    if !(0.0..=1.0).contains(&sepia_params.intensity) {
        return 5;
    }

    apply_sepia(data, sepia_params.intensity);

    0
}

/// Tones every pixel towards sepia. Alpha is left as is.
fn apply_sepia(data: &mut [u8], intensity: f32) {
    for pixel in data.chunks_exact_mut(BYTES_PER_PIXEL) {
        let rgb = [
            f32::from(pixel[0]),
            f32::from(pixel[1]),
            f32::from(pixel[2]),
        ];

        for (channel, row) in SEPIA.iter().enumerate() {
            let toned = row[0].mul_add(rgb[0], row[1].mul_add(rgb[1], row[2] * rgb[2]));
            let blended = (toned - rgb[channel]).mul_add(intensity, rgb[channel]);

            // Clamped to [0, 255] before the cast.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                pixel[channel] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
