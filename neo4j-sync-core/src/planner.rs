//! Batch planning

use crate::model::Window;

/// Windows covering `[start, total)` in steps of `batch_size`
///
/// The last window is clipped so it never reaches past `total`. A start at
/// or beyond `total` plans nothing. Windows come out in ascending offset
/// order and must be drained in that order.
#[must_use]
pub fn plan(total: u64, start: u64, batch_size: u64) -> Vec<Window> {
    if batch_size == 0 || start >= total {
        return Vec::new();
    }
    let mut windows = Vec::with_capacity(((total - start).div_ceil(batch_size)) as usize);
    let mut offset = start;
    while offset < total {
        let size = batch_size.min(total - offset);
        windows.push(Window { offset, size });
        offset += size;
    }
    windows
}
