//! Decides whether engine output is an actual translation of its input.
//! Engines may silently echo the input for pairs they cannot handle; such
//! output must not be cached or reported as a translation.

use super::detect::ScriptPresence;

/// Relative length change above which same-script output counts as translated.
pub const DEFAULT_DIFFERENCE_THRESHOLD: f32 = 0.2;

/// True when `output` differs from `input` by script family or by more
/// than `threshold` in relative length.
pub fn is_different_enough(input: &str, output: &str, threshold: f32) -> bool {
    if input == output {
        return false;
    }
    if ScriptPresence::of(input) != ScriptPresence::of(output) {
        return true;
    }

    let in_len = input.chars().count();
    let out_len = output.chars().count();
    if in_len == 0 {
        return out_len > 0;
    }
    in_len.abs_diff(out_len) as f32 / in_len as f32 > threshold
}
