//! Row-driven execution shared by every buffer operation.
//!
//! Output rows are independent, so they are filled in parallel with Rayon
//! when the `parallel` feature is on and sequentially otherwise. Either way
//! the token is polled before each row and the result is identical.

use tracing::debug;
use xray_core::{PixelBuffer, CHANNELS};

use crate::{CancelToken, OpsError, OpsResult};

/// Calls `f(y, row)` for every `row_len`-sized row of `dst`.
pub(crate) fn for_each_row<T, F>(
    dst: &mut [T],
    row_len: usize,
    cancel: &CancelToken,
    f: F,
) -> OpsResult<()>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if dst.is_empty() || row_len == 0 {
        return Ok(());
    }

    #[cfg(feature = "parallel")]
    let result = {
        use rayon::prelude::*;
        dst.par_chunks_mut(row_len)
            .enumerate()
            .try_for_each(|(y, row)| {
                cancel.check()?;
                f(y, row);
                Ok(())
            })
    };

    #[cfg(not(feature = "parallel"))]
    let result = dst
        .chunks_mut(row_len)
        .enumerate()
        .try_for_each(|(y, row)| {
            cancel.check()?;
            f(y, row);
            Ok(())
        });

    if let Err(OpsError::Cancelled) = result {
        debug!(row_len, "row pass cancelled");
    }
    result
}

/// Builds a `width x height` buffer whose rows are produced by `f(y, row)`.
pub(crate) fn build_buffer<F>(
    width: u32,
    height: u32,
    cancel: &CancelToken,
    f: F,
) -> OpsResult<PixelBuffer>
where
    F: Fn(usize, &mut [u8]) + Sync + Send,
{
    let row_len = width as usize * CHANNELS;
    let mut out = vec![0u8; row_len * height as usize];
    for_each_row(&mut out, row_len, cancel, f)?;
    Ok(PixelBuffer::from_data(width, height, out)?)
}

/// Builds a buffer the size of `src` whose rows are produced by `f(y, row)`.
pub(crate) fn fill_buffer<F>(src: &PixelBuffer, cancel: &CancelToken, f: F) -> OpsResult<PixelBuffer>
where
    F: Fn(usize, &mut [u8]) + Sync + Send,
{
    build_buffer(src.width(), src.height(), cancel, f)
}

/// Applies a per-pixel mapping.
pub(crate) fn map_pixels<F>(src: &PixelBuffer, cancel: &CancelToken, f: F) -> OpsResult<PixelBuffer>
where
    F: Fn([u8; 4]) -> [u8; 4] + Sync + Send,
{
    let row_len = src.row_len();
    let data = src.data();
    fill_buffer(src, cancel, |y, row| {
        let src_row = &data[y * row_len..(y + 1) * row_len];
        for (o, i) in row
            .chunks_exact_mut(CHANNELS)
            .zip(src_row.chunks_exact(CHANNELS))
        {
            o.copy_from_slice(&f([i[0], i[1], i[2], i[3]]));
        }
    })
}

/// Transposes a `width x height` plane so columns become rows.
pub(crate) fn transpose<T: Copy + Default>(src: &[T], width: usize, height: usize) -> Vec<T> {
    let mut dst = vec![T::default(); src.len()];
    for y in 0..height {
        for x in 0..width {
            dst[x * height + y] = src[y * width + x];
        }
    }
    dst
}
