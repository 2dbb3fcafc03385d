//! Label size estimation.
//!
//! Node boxes are sized from their text alone so that layout never needs a
//! font backend: roughly 8px per character plus padding, wrapping once the
//! width clamp is hit and growing 20px per wrapped line.

use crate::graph::Size;

const CHAR_WIDTH: usize = 8;
const HORIZONTAL_PADDING: usize = 40;
const MIN_WIDTH: usize = 120;
const MAX_WIDTH: usize = 300;
const MAX_WIDTH_EXPANDED: usize = 400;
const LINE_HEIGHT: usize = 20;
const VERTICAL_PADDING: usize = 24;
const MIN_HEIGHT: usize = 50;

/// Estimate the box of a node holding `text`.
///
/// `expanded` widens the clamp for detail nodes. Pure and deterministic.
#[must_use]
pub fn estimate_size(text: &str, expanded: bool) -> Size {
    let len = text.chars().count();
    let max_width = if expanded { MAX_WIDTH_EXPANDED } else { MAX_WIDTH };

    let width = (len * CHAR_WIDTH + HORIZONTAL_PADDING).clamp(MIN_WIDTH, max_width);
    let per_line = (width - HORIZONTAL_PADDING) / CHAR_WIDTH;
    let lines = len.div_ceil(per_line);
    let height = (lines * LINE_HEIGHT + VERTICAL_PADDING).max(MIN_HEIGHT);

    Size {
        width: width as f64,
        height: height as f64,
    }
}
