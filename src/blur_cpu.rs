use crate::{ReelError, ReelResult};

/// Separable Gaussian blur over a tightly packed 8-bit buffer with `channels` bytes per pixel.
///
/// Kernel sizes must be odd and positive; a size of 1 leaves that axis untouched. Sigma for each
/// axis is derived from its kernel size (see [`sigma_for_kernel`]). Samples outside the image
/// clamp to the nearest edge pixel.
pub fn blur_u8(
    src: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    kernel: (u32, u32),
) -> ReelResult<Vec<u8>> {
    validate_kernel_size(kernel)?;
    if channels == 0 || channels > 4 {
        return Err(ReelError::validation(format!(
            "blur expects 1..=4 channels, got {channels}"
        )));
    }
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| ReelError::validation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(ReelError::validation(
            "blur_u8 expects src matching width*height*channels",
        ));
    }
    if kernel == (1, 1) || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kx = gaussian_kernel_q16(kernel.0)?;
    let ky = gaussian_kernel_q16(kernel.1)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, channels, &kx);
    vertical_pass(&tmp, &mut out, width, height, channels, &ky);
    Ok(out)
}

pub fn validate_kernel_size(kernel: (u32, u32)) -> ReelResult<()> {
    for k in [kernel.0, kernel.1] {
        if k == 0 || k.is_multiple_of(2) {
            return Err(ReelError::validation(format!(
                "blur kernel size must be positive and odd, got {}x{}",
                kernel.0, kernel.1
            )));
        }
    }
    Ok(())
}

/// Sigma used for a kernel of `ksize` taps when no explicit sigma is given.
pub fn sigma_for_kernel(ksize: u32) -> f64 {
    0.3 * ((f64::from(ksize) - 1.0) * 0.5 - 1.0) + 0.8
}

fn gaussian_kernel_q16(ksize: u32) -> ReelResult<Vec<u32>> {
    if ksize <= 1 {
        return Ok(vec![1 << 16]);
    }

    let sigma = sigma_for_kernel(ksize);
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ReelError::validation("blur sigma must be > 0"));
    }

    let r = (ksize / 2) as i32;
    let mut weights_f = Vec::<f64>::with_capacity(ksize as usize);
    let mut sum = 0.0f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(ReelError::validation("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Rounding drift goes to the center tap so the kernel sums to exactly 1.0 in q16.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, ch: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * ch;
                for c in 0..ch {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * ch;
            for c in 0..ch {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, ch: usize, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * ch;
                for c in 0..ch {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * ch;
            for c in 0..ch {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}
