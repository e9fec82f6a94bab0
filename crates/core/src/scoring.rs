//! Scoring module - line clear points, leveling and gravity speed
//!
//! Compatibility note:
//! The point table is the flat classic table (40/100/300/1200) multiplied by
//! the current level, where levels start at 1. There are no drop points,
//! combos or back-to-back bonuses.

use crate::types::{
    BASE_GRAVITY_MS, GRAVITY_STEP_MS, LINES_PER_LEVEL, LINE_SCORES, MIN_GRAVITY_MS,
};

/// Points for clearing `lines` rows at once at `level`.
/// Anything outside 1-4 lines scores nothing.
pub fn calculate_line_score(lines: usize, level: u32) -> u32 {
    if lines == 0 || lines >= LINE_SCORES.len() {
        return 0;
    }
    LINE_SCORES[lines].saturating_mul(level)
}

/// Level for a running line total. Level increases every 10 lines, starting at 1.
pub fn calculate_level(total_lines: u32) -> u32 {
    total_lines / LINES_PER_LEVEL + 1
}

/// Gravity period for a level (in milliseconds)
/// 1000ms at level 1, 100ms faster per level, never below 100ms
pub fn gravity_interval_ms(level: u32) -> u32 {
    let speedup = level.saturating_sub(1).saturating_mul(GRAVITY_STEP_MS);
    BASE_GRAVITY_MS.saturating_sub(speedup).max(MIN_GRAVITY_MS)
}
