//! Series parsing and polyline layout
//!
//! A sparkline source is a literal comma list such as `10,8,20,5`. Tokens are
//! coerced to `f64` the forgiving way: surrounding whitespace is ignored, an
//! empty token counts as zero and anything else unparsable becomes `NaN`.
//!
//! # Degenerate input
//!
//! Nothing here guards against degenerate series:
//!
//! ```text
//! Input     | min / max   | Effect on the path
//! ----------|-------------|------------------------------------
//! ""        | +inf / -inf | zero points, no commands
//! "5,5,5"   | 5 / 5       | 0/0 -> every y is NaN
//! "1,x,3"   | 1 / 3       | the `x` point has a NaN y
//! ```
//!
//! Surfaces drop non-finite commands, the same way a canvas ignores
//! `lineTo(NaN, NaN)`.

use serde::Serialize;

/// Fallback width multiplier: pixels per data point
pub const FALLBACK_PX_PER_POINT: f64 = 2.0;

/// Parsed numeric series for one source element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub values: Vec<f64>,
}

/// Lowest and highest finite-comparable values of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
}

impl PathCommand {
    pub fn point(&self) -> Point {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
        }
    }
}

/// A single connected polyline across the surface
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparkPath {
    pub commands: Vec<PathCommand>,
}

impl SparkPath {
    pub fn line_to_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::LineTo(_)))
            .count()
    }

    pub fn move_to_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Split raw element text into tokens. Blank text has no tokens at all.
pub fn tokenize(text: &str) -> Vec<&str> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',').collect()
}

/// Strict decimal literal: optional sign, digits with an optional fraction,
/// optional exponent. `Infinity` is the only spelled-out value accepted; `inf`
/// and `nan` are not numbers here.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned == "Infinity" {
        return text.parse().ok();
    }
    let leads_with_digit = unsigned
        .bytes()
        .next()
        .is_some_and(|b| b.is_ascii_digit() || b == b'.');
    let decimal_chars = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !leads_with_digit || !decimal_chars {
        return None;
    }
    text.parse().ok()
}

/// Coerce one token to a number
pub fn coerce(token: &str) -> f64 {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    parse_decimal(trimmed).unwrap_or(f64::NAN)
}

impl Series {
    pub fn from_tokens(tokens: &[&str]) -> Self {
        Self {
            values: tokens.iter().map(|t| coerce(t)).collect(),
        }
    }

    pub fn parse(text: &str) -> Self {
        Self::from_tokens(&tokenize(text))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Single pass min/max. The seeds sit outside any real value so the
    /// first comparable value always replaces both; NaN never does.
    pub fn bounds(&self) -> Bounds {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.values {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Bounds { min, max }
    }

    /// Lay the series out on a `width` x `height` surface.
    ///
    /// The first point issues a move followed by a line to itself, then one
    /// line per remaining point: N points give N line-tos and one move.
    pub fn layout(&self, width: f64, height: f64) -> SparkPath {
        let Bounds { min, max } = self.bounds();
        let n = self.values.len() as f64;
        let step = width / n;

        let mut commands = Vec::with_capacity(self.values.len() + 1);
        for (i, &v) in self.values.iter().enumerate() {
            let point = Point {
                x: step * i as f64,
                y: height - ((v - min) / (max - min)) * height,
            };
            if i == 0 {
                commands.push(PathCommand::MoveTo(point));
            }
            commands.push(PathCommand::LineTo(point));
        }

        SparkPath { commands }
    }
}

/// Width used when the element reports no usable computed width
pub fn fallback_width(token_count: usize) -> f64 {
    token_count as f64 * FALLBACK_PX_PER_POINT
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // TOKEN COERCION TESTS
    // ==========================================================================

    #[test]
    fn test_tokenize_plain_list() {
        assert_eq!(tokenize("10,8,20,5"), vec!["10", "8", "20", "5"]);
    }

    #[test]
    fn test_tokenize_blank_is_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n ").is_empty());
    }

    #[test]
    fn test_coerce_whitespace_and_empty() {
        assert_eq!(coerce(" 4.5 "), 4.5);
        assert_eq!(coerce(""), 0.0);
        assert!(coerce("abc").is_nan());
    }

    #[test]
    fn test_coerce_rejects_spelled_out_floats() {
        for token in ["inf", "-inf", "infinity", "INF", "nan", "NaN"] {
            assert!(coerce(token).is_nan(), "{}", token);
        }
        assert_eq!(coerce("Infinity"), f64::INFINITY);
        assert_eq!(coerce("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_parse_decimal_syntax() {
        assert_eq!(parse_decimal("1.5e3"), Some(1500.0));
        assert_eq!(parse_decimal("-.5"), Some(-0.5));
        assert_eq!(parse_decimal("+7"), Some(7.0));
        assert_eq!(parse_decimal("1e"), None);
        assert_eq!(parse_decimal("e5"), None);
        assert_eq!(parse_decimal("0x1F"), None);
    }

    #[test]
    fn test_word_token_only_degrades_its_point() {
        let series = Series::parse("1,inf,3");
        let bounds = series.bounds();
        assert_eq!((bounds.min, bounds.max), (1.0, 3.0));

        let path = series.layout(4.0, 10.0);
        let ys: Vec<f64> = path.commands.iter().skip(1).map(|c| c.point().y).collect();
        assert_eq!(ys[0], 10.0);
        assert!(ys[1].is_nan());
        assert_eq!(ys[2], 0.0);
    }

    // ==========================================================================
    // BOUNDS TESTS
    // ==========================================================================

    #[test]
    fn test_bounds_basic() {
        let s = Series::parse("10,8,20,5");
        assert_eq!(s.bounds(), Bounds { min: 5.0, max: 20.0 });
    }

    #[test]
    fn test_bounds_large_values_still_seed() {
        // A fixed seed like 9999 would never be replaced here
        let s = Series::parse("15000,12000");
        assert_eq!(s.bounds(), Bounds { min: 12000.0, max: 15000.0 });
    }

    #[test]
    fn test_bounds_negative_values() {
        let s = Series::parse("-3,-7,-1");
        assert_eq!(s.bounds(), Bounds { min: -7.0, max: -1.0 });
    }

    #[test]
    fn test_bounds_ignore_nan() {
        let s = Series::parse("1,x,3");
        assert_eq!(s.bounds(), Bounds { min: 1.0, max: 3.0 });
    }

    #[test]
    fn test_bounds_empty_keeps_seeds() {
        let b = Series::default().bounds();
        assert_eq!(b.min, f64::INFINITY);
        assert_eq!(b.max, f64::NEG_INFINITY);
    }

    // ==========================================================================
    // LAYOUT TESTS
    // ==========================================================================

    #[test]
    fn test_layout_command_counts() {
        let path = Series::parse("1,2,3,4,5").layout(50.0, 10.0);
        assert_eq!(path.line_to_count(), 5);
        assert_eq!(path.move_to_count(), 1);
        assert_eq!(path.commands.len(), 6);
        assert!(matches!(path.commands[0], PathCommand::MoveTo(_)));
        assert_eq!(path.commands[0].point(), path.commands[1].point());
    }

    #[test]
    fn test_layout_extremes_map_to_edges() {
        let height = 20.0;
        let path = Series::parse("10,8,20,5").layout(40.0, height);
        // commands: move(p0), line(p0), line(p1), line(p2), line(p3)
        let p2 = path.commands[3].point();
        let p3 = path.commands[4].point();
        assert_eq!(p2.y, 0.0, "max value sits at the top");
        assert_eq!(p3.y, height, "min value sits at the bottom");
    }

    #[test]
    fn test_layout_x_spacing() {
        let path = Series::parse("1,2,3,4").layout(40.0, 10.0);
        let xs: Vec<f64> = path.commands[1..].iter().map(|c| c.point().x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_layout_constant_series_is_non_finite() {
        let path = Series::parse("5,5,5").layout(6.0, 16.0);
        assert_eq!(path.line_to_count(), 3);
        assert!(path.commands.iter().all(|c| !c.point().y.is_finite()));
    }

    #[test]
    fn test_layout_empty_series_has_no_commands() {
        let path = Series::parse("").layout(0.0, 16.0);
        assert!(path.is_empty());
    }

    #[test]
    fn test_layout_nan_point_only_affects_itself() {
        let path = Series::parse("1,x,3").layout(30.0, 10.0);
        let finite: Vec<bool> = path.commands[1..].iter().map(|c| c.point().is_finite()).collect();
        assert_eq!(finite, vec![true, false, true]);
    }

    #[test]
    fn test_fallback_width() {
        assert_eq!(fallback_width(4), 8.0);
        assert_eq!(fallback_width(0), 0.0);
    }
}
