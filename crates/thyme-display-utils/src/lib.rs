//! This crate contains utility functions for displaying numeric vectors,
//! intervals and nested blocks in a consistent way across the workspace.

use std::fmt::Display;

/// Size of a tab when displaying nested blocks
pub const TAB_SIZE: usize = 4;

/// Join the elements of an iterator into a single string using the given
/// separator
///
/// The separator is only placed between elements, never at the end.
///
/// # Example
///
/// ```
/// use thyme_display_utils::join_display;
///
/// let ids = vec![1, 2, 3];
/// assert_eq!(join_display(ids.iter(), " -> "), "1 -> 2 -> 3");
/// ```
pub fn join_display<I, S>(items: I, sep: S) -> String
where
    I: IntoIterator,
    I::Item: Display,
    S: Into<String>,
{
    items
        .into_iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(sep.into().as_str())
}

/// Render a coordinate tuple as `(x1, x2, ..., xn)`
///
/// # Example
///
/// ```
/// use thyme_display_utils::display_point;
///
/// assert_eq!(display_point(&[0.25, 0.5]), "(0.25, 0.5)");
/// assert_eq!(display_point(&[1.0]), "(1)");
/// ```
pub fn display_point(coords: &[f64]) -> String {
    format!("({})", join_display(coords.iter(), ", "))
}

/// Render a closed interval as `[lo, hi]`
///
/// # Example
///
/// ```
/// use thyme_display_utils::display_interval;
///
/// assert_eq!(display_interval(0.0, 1.5), "[0, 1.5]");
/// ```
pub fn display_interval(lo: f64, hi: f64) -> String {
    format!("[{lo}, {hi}]")
}

/// Render a list of per-dimension intervals as `[a, b] x [c, d] x ...`
pub fn display_interval_product(intervals: impl IntoIterator<Item = (f64, f64)>) -> String {
    join_display(
        intervals
            .into_iter()
            .map(|(lo, hi)| display_interval(lo, hi)),
        " x ",
    )
}

/// Indent every non-empty line of the input by one tab
///
/// A trailing newline of the input is preserved.
///
/// # Example
///
/// ```
/// use thyme_display_utils::indent_lines;
///
/// assert_eq!(indent_lines("a\nb"), "    a\n    b");
/// ```
pub fn indent_lines<S>(input: S) -> String
where
    S: Into<String>,
{
    let input: String = input.into();
    let tab = " ".repeat(TAB_SIZE);

    // split_inclusive keeps each line's newline, so the fold reproduces
    // the input verbatim apart from the inserted tabs
    input
        .split_inclusive('\n')
        .fold(String::with_capacity(input.len()), |mut out, line| {
            if line != "\n" {
                out.push_str(&tab);
            }
            out.push_str(line);
            out
        })
}
