//! Counter fragments with zero padding.

/// Format the counter value for the given (scope-adjusted) index.
///
/// On arithmetic overflow the module emits a sentinel of `padding` `#`
/// characters instead of failing the whole preview.
pub fn apply(start: i64, step: i64, padding: usize, index: usize) -> String {
    let Ok(index) = i64::try_from(index) else {
        return fallback(padding);
    };

    match index.checked_mul(step).and_then(|offset| start.checked_add(offset)) {
        Some(value) => format!("{value:0padding$}"),
        None => {
            tracing::error!(start, step, index, "counter overflow");
            fallback(padding)
        },
    }
}

fn fallback(padding: usize) -> String {
    "#".repeat(padding.max(1))
}
