//! Render descriptions for synthetic bars.
//!
//! The engine never draws; it describes a candle (body rectangle plus
//! optional wick lines) and hands the description to a [`RenderSink`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tickbars_types::Color;

use crate::{SyntheticBar, price_to_f64};

/// Prefix of every chart object name.
pub const OBJECT_NAME_PREFIX: &str = "Custom Tick Chart";

/// Line style of a body outline or wick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    /// Solid line.
    #[default]
    Solid,
    /// Dotted line.
    Dots,
    /// Sparse dots.
    DotsRare,
    /// Very sparse dots.
    DotsVeryRare,
    /// Alternating dashes and dots.
    LinesDots,
    /// Dashed line.
    Lines,
}

/// Colors and strokes used to describe bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawStyle {
    /// Body color of bars that close at or above their open.
    pub bullish_body: Color,
    /// Body color of bars that close below their open.
    pub bearish_body: Color,
    /// Body alpha (0-255).
    pub body_opacity: u8,
    /// Body outline thickness.
    pub body_thickness: u32,
    /// Body outline style.
    pub body_line_style: LineStyle,
    /// Fill the body rectangle.
    pub fill_body: bool,
    /// Describe wicks at all.
    pub show_wicks: bool,
    /// Wick color of bullish bars.
    pub bullish_wick: Color,
    /// Wick color of bearish bars.
    pub bearish_wick: Color,
    /// Wick alpha (0-255).
    pub wicks_opacity: u8,
    /// Wick thickness.
    pub wicks_thickness: u32,
    /// Wick line style.
    pub wicks_line_style: LineStyle,
}

const LIME: Color = Color::from_argb(255, 0, 255, 0);
const RED: Color = Color::from_argb(255, 255, 0, 0);

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            bullish_body: LIME,
            bearish_body: RED,
            body_opacity: 100,
            body_thickness: 1,
            body_line_style: LineStyle::Solid,
            fill_body: true,
            show_wicks: true,
            bullish_wick: LIME,
            bearish_wick: RED,
            wicks_opacity: 100,
            wicks_thickness: 2,
            wicks_line_style: LineStyle::Solid,
        }
    }
}

impl DrawStyle {
    fn body_color(&self, bearish: bool) -> Color {
        let color = if bearish {
            self.bearish_body
        } else {
            self.bullish_body
        };
        color.with_alpha(self.body_opacity)
    }

    fn wick_color(&self, bearish: bool) -> Color {
        let color = if bearish {
            self.bearish_wick
        } else {
            self.bullish_wick
        };
        color.with_alpha(self.wicks_opacity)
    }
}

/// Body rectangle from `(start_time, open)` to `(end_time, close)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyRect {
    /// Chart object name.
    pub name: String,
    /// Left edge.
    pub start_time: DateTime<Utc>,
    /// Right edge.
    pub end_time: DateTime<Utc>,
    /// Open price edge.
    pub open: f64,
    /// Close price edge.
    pub close: f64,
    /// Outline and fill color.
    pub color: Color,
    /// Outline thickness.
    pub thickness: u32,
    /// Outline style.
    pub line_style: LineStyle,
    /// Whether the rectangle is filled.
    pub filled: bool,
}

/// Vertical wick line at the bar's center time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WickLine {
    /// Chart object name.
    pub name: String,
    /// Horizontal position.
    pub time: DateTime<Utc>,
    /// Price where the wick leaves the body.
    pub from: f64,
    /// Price at the wick's tip.
    pub to: f64,
    /// Line color.
    pub color: Color,
    /// Line thickness.
    pub thickness: u32,
    /// Line style.
    pub line_style: LineStyle,
}

/// Everything a host needs to draw one synthetic bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarDrawing {
    /// True if drawn in bearish colors.
    pub bearish: bool,
    /// Body rectangle.
    pub body: BodyRect,
    /// Upper wick, if wicks are shown.
    pub upper_wick: Option<WickLine>,
    /// Lower wick, if wicks are shown.
    pub lower_wick: Option<WickLine>,
}

/// Receiver of bar render descriptions.
///
/// Descriptions for the same bar reuse the same object names, so a sink
/// replaces earlier drawings of that bar.
pub trait RenderSink {
    /// Draws (or redraws) one bar.
    fn draw_bar(&mut self, drawing: &BarDrawing);
}

/// Discards every description.
impl RenderSink for () {
    fn draw_bar(&mut self, _drawing: &BarDrawing) {}
}

/// Collects every description in order.
impl RenderSink for Vec<BarDrawing> {
    fn draw_bar(&mut self, drawing: &BarDrawing) {
        self.push(drawing.clone());
    }
}

/// Turns synthetic bars into [`BarDrawing`]s.
#[derive(Debug, Clone)]
pub struct BarPainter {
    style: DrawStyle,
    suffix: String,
}

impl BarPainter {
    /// Creates a painter with a unique per-session object name suffix.
    #[must_use]
    pub fn new(style: DrawStyle) -> Self {
        let suffix = format!("{OBJECT_NAME_PREFIX}_{}", uuid::Uuid::new_v4().simple());
        Self::with_suffix(style, suffix)
    }

    /// Creates a painter with a fixed object name suffix.
    #[must_use]
    pub fn with_suffix(style: DrawStyle, suffix: impl Into<String>) -> Self {
        Self {
            style,
            suffix: suffix.into(),
        }
    }

    /// Returns the object name suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }


    /// Describes `bar`.
    #[must_use]
    pub fn describe(&self, bar: &SyntheticBar) -> BarDrawing {
        let style = &self.style;
        let bearish = bar.is_bearish();
        let name = format!("{}.{}", bar.first_source_index, self.suffix);

        let open = price_to_f64(bar.open);
        let close = price_to_f64(bar.close);
        let high = price_to_f64(bar.high);
        let low = price_to_f64(bar.low);

        let (upper_wick, lower_wick) = if style.show_wicks {
            let time = bar.center_time();
            let (upper_from, lower_from) = if bearish { (open, close) } else { (close, open) };
            let wick = |suffix: &str, from: f64, to: f64| WickLine {
                name: format!("{name}.{suffix}"),
                time,
                from,
                to,
                color: style.wick_color(bearish),
                thickness: style.wicks_thickness,
                line_style: style.wicks_line_style,
            };
            (
                Some(wick("UpperWick", upper_from, high)),
                Some(wick("LowerWick", lower_from, low)),
            )
        } else {
            (None, None)
        };

        BarDrawing {
            bearish,
            body: BodyRect {
                name,
                start_time: bar.start_time,
                end_time: bar.end_time,
                open,
                close,
                color: style.body_color(bearish),
                thickness: style.body_thickness,
                line_style: style.body_line_style,
                filled: style.fill_body,
            },
            upper_wick,
            lower_wick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone};
    use rust_decimal::Decimal;

    fn bar(open: i64, high: i64, low: i64, close: i64) -> SyntheticBar {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        SyntheticBar {
            start_time: start,
            end_time: start + TimeDelta::minutes(4),
            first_source_index: 42,
            source_index: 45,
            fold_count: 4,
            open: Decimal::from(open),
            high: Decimal::from(high),
            low: Decimal::from(low),
            close: Decimal::from(close),
        }
    }

    #[test]
    fn test_bullish_drawing() {
        let painter = BarPainter::with_suffix(DrawStyle::default(), "test");
        let drawing = painter.describe(&bar(10, 15, 8, 12));

        assert!(!drawing.bearish);
        assert_eq!(drawing.body.name, "42.test");
        assert_eq!(drawing.body.color, LIME.with_alpha(100));
        assert!(drawing.body.filled);
        assert_relative_eq!(drawing.body.open, 10.0);
        assert_relative_eq!(drawing.body.close, 12.0);

        let upper = drawing.upper_wick.unwrap();
        let lower = drawing.lower_wick.unwrap();
        assert_eq!(upper.name, "42.test.UpperWick");
        assert_eq!(lower.name, "42.test.LowerWick");
        assert_eq!(upper.time, bar(10, 15, 8, 12).start_time + TimeDelta::minutes(2));
        assert_relative_eq!(upper.from, 12.0);
        assert_relative_eq!(upper.to, 15.0);
        assert_relative_eq!(lower.from, 10.0);
        assert_relative_eq!(lower.to, 8.0);
        assert_eq!(upper.thickness, 2);
    }

    #[test]
    fn test_bearish_drawing() {
        let painter = BarPainter::with_suffix(DrawStyle::default(), "test");
        let drawing = painter.describe(&bar(12, 15, 8, 10));

        assert!(drawing.bearish);
        assert_eq!(drawing.body.color, RED.with_alpha(100));
        let upper = drawing.upper_wick.unwrap();
        let lower = drawing.lower_wick.unwrap();
        assert_relative_eq!(upper.from, 12.0);
        assert_relative_eq!(lower.from, 10.0);
        assert_eq!(upper.color, RED.with_alpha(100));
    }

    #[test]
    fn test_doji_is_bullish() {
        let painter = BarPainter::with_suffix(DrawStyle::default(), "test");
        assert!(!painter.describe(&bar(10, 11, 9, 10)).bearish);
    }

    #[test]
    fn test_hidden_wicks() {
        let style = DrawStyle {
            show_wicks: false,
            fill_body: false,
            ..DrawStyle::default()
        };
        let drawing = BarPainter::with_suffix(style, "test").describe(&bar(10, 15, 8, 12));
        assert!(drawing.upper_wick.is_none());
        assert!(drawing.lower_wick.is_none());
        assert!(!drawing.body.filled);
    }

    #[test]
    fn test_unique_suffix() {
        let a = BarPainter::new(DrawStyle::default());
        let b = BarPainter::new(DrawStyle::default());
        assert!(a.suffix().starts_with(OBJECT_NAME_PREFIX));
        assert_ne!(a.suffix(), b.suffix());
    }

    #[test]
    fn test_style_from_json() {
        let style: DrawStyle =
            serde_json::from_str(r##"{"bullish_body": "#0000FF", "wicks_line_style": "dots"}"##)
                .unwrap();
        assert_eq!(style.bullish_body, Color::from_argb(255, 0, 0, 255));
        assert_eq!(style.wicks_line_style, LineStyle::Dots);
        assert_eq!(style.bearish_body, RED);
    }
}
