//! Grouped bar chart of per-group validation counts

use image::Rgb;

use crate::model::report::{GroupTally, TallyField};
use crate::model::{ChartColors, ChartConfig};

use super::canvas::{fit_text, Canvas, BLACK, GLYPH_SIZE, LIGHT_GREY};
use super::{encode_canvas, parse_color, series_color, ChartError};

const MARGIN_LEFT: u32 = 80;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 60;
const MARGIN_BOTTOM: u32 = 60;
const MAX_TICKS: i64 = 8;

/// One bar per group
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub data_attr: TallyField,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartAttrs {
    /// Name of the grouping dimension, shown under the x-axis
    pub label_accessor: String,
    pub ylabel: String,
    pub title: String,
    pub chart_bars: Vec<ChartBar>,
}

impl BarChartAttrs {
    /// Valid / Invalid / No Software bars in the configured colors
    pub fn validation_split(
        label_accessor: impl Into<String>,
        ylabel: impl Into<String>,
        title: impl Into<String>,
        colors: &ChartColors,
    ) -> Self {
        let bar = |label: &str, field: TallyField| ChartBar {
            label: label.to_string(),
            data_attr: field,
            color: series_color(colors, field).to_string(),
        };
        Self {
            label_accessor: label_accessor.into(),
            ylabel: ylabel.into(),
            title: title.into(),
            chart_bars: vec![
                bar("Valid", TallyField::Valid),
                bar("Invalid", TallyField::Invalid),
                bar("No Software", TallyField::NoSoftware),
            ],
        }
    }
}

/// Y-axis ticks for a maximum value: start at zero, leave 20% headroom,
/// use a 1/2/5 step and at most eight intervals.
pub fn integer_ticks(max: i64) -> Vec<i64> {
    let max = max.max(0);
    let top = ((max * 6 + 4) / 5).max(1);

    let mut magnitude = 1;
    let step = 'search: loop {
        for factor in [1, 2, 5] {
            let step = factor * magnitude;
            if (top + step - 1) / step <= MAX_TICKS {
                break 'search step;
            }
        }
        magnitude *= 10;
    };

    let intervals = (top + step - 1) / step;
    (0..=intervals).map(|i| i * step).collect()
}

struct Layout {
    left: i64,
    top: i64,
    width: u32,
    height: u32,
    slots: usize,
    y_max: i64,
}

impl Layout {
    fn new(config: &ChartConfig, slots: usize, y_max: i64) -> Self {
        Self {
            left: i64::from(MARGIN_LEFT),
            top: i64::from(MARGIN_TOP),
            width: config
                .per_platform_width
                .saturating_sub(MARGIN_LEFT + MARGIN_RIGHT),
            height: config
                .per_platform_height
                .saturating_sub(MARGIN_TOP + MARGIN_BOTTOM),
            slots: slots.max(1),
            y_max: y_max.max(1),
        }
    }

    fn bottom(&self) -> i64 {
        self.top + i64::from(self.height)
    }

    fn right(&self) -> i64 {
        self.left + i64::from(self.width)
    }

    fn slot_width(&self) -> f64 {
        f64::from(self.width) / self.slots as f64
    }

    fn slot_center(&self, index: usize) -> f64 {
        self.left as f64 + self.slot_width() * (index as f64 + 0.5)
    }

    fn y_for(&self, value: i64) -> i64 {
        let scaled = value as f64 * f64::from(self.height) / self.y_max as f64;
        self.bottom() - scaled.round() as i64
    }
}

/// Render per-group tallies as an encoded grouped bar chart.
///
/// Each row becomes one slot on the x-axis holding one bar per entry of
/// `attrs.chart_bars`, offset from the slot center by multiples of the
/// configured bar width.
pub fn render_bar_chart(
    rows: &[GroupTally],
    attrs: &BarChartAttrs,
    config: &ChartConfig,
) -> Result<String, ChartError> {
    let colors = attrs
        .chart_bars
        .iter()
        .map(|bar| parse_color(&bar.color))
        .collect::<Result<Vec<_>, _>>()?;

    let max = rows
        .iter()
        .flat_map(|row| attrs.chart_bars.iter().map(move |bar| row.counts.get(bar.data_attr)))
        .max()
        .unwrap_or(0);
    let ticks = integer_ticks(max);
    let y_max = ticks.last().copied().unwrap_or(1);

    let mut canvas = Canvas::new(config.per_platform_width, config.per_platform_height);
    let layout = Layout::new(config, rows.len(), y_max);

    for tick in &ticks {
        let y = layout.y_for(*tick);
        canvas.hline(layout.left, layout.right(), y, LIGHT_GREY);
        let label = tick.to_string();
        let width = i64::from(Canvas::text_width(&label, 1));
        canvas.draw_text(layout.left - 6 - width, y - 4, &label, 1, BLACK);
    }

    let bar_width = (layout.slot_width() * config.per_platform_bar_width).max(1.0);
    let center_pos = (attrs.chart_bars.len() as f64 - 1.0) / 2.0;
    for (index, row) in rows.iter().enumerate() {
        let center = layout.slot_center(index);
        for (pos, (bar, color)) in attrs.chart_bars.iter().zip(&colors).enumerate() {
            let value = row.counts.get(bar.data_attr);
            let bar_center = center + (pos as f64 - center_pos) * bar_width;
            draw_bar(&mut canvas, &layout, bar_center, bar_width, value, *color);
        }

        let tick_label = fit_text(row.display_label(), layout.slot_width() as u32, 1);
        canvas.draw_text_centered(center as i64, layout.bottom() + 8, &tick_label, 1, BLACK);
    }

    canvas.hline(layout.left, layout.right(), layout.bottom(), BLACK);
    canvas.vline(layout.left, layout.top, layout.bottom(), BLACK);

    draw_legend(&mut canvas, &layout, attrs, &colors);

    canvas.draw_text_centered(
        i64::from(config.per_platform_width / 2),
        16,
        &attrs.title,
        2,
        BLACK,
    );
    canvas.draw_text_centered(
        (layout.left + layout.right()) / 2,
        i64::from(config.per_platform_height) - 24,
        &attrs.label_accessor,
        1,
        BLACK,
    );
    let ylabel_len = i64::from(Canvas::text_width(&attrs.ylabel, 1));
    canvas.draw_text_vertical(
        12,
        (layout.top + layout.bottom() + ylabel_len) / 2,
        &attrs.ylabel,
        1,
        BLACK,
    );

    tracing::debug!(
        title = %attrs.title,
        groups = rows.len(),
        "Rendered bar chart"
    );
    encode_canvas(&canvas)
}

fn draw_bar(
    canvas: &mut Canvas,
    layout: &Layout,
    center: f64,
    width: f64,
    value: i64,
    color: Rgb<u8>,
) {
    let x = (center - width / 2.0).round() as i64;
    let top = layout.y_for(value.max(0));
    let height = (layout.bottom() - top).max(0) as u32;
    canvas.fill_rect(x, top, width.round() as u32, height, color);

    // Value written upwards above the bar
    let label = value.to_string();
    let glyph_x = center.round() as i64 - i64::from(GLYPH_SIZE / 2);
    canvas.draw_text_vertical(glyph_x, top - 3, &label, 1, BLACK);
}

fn draw_legend(canvas: &mut Canvas, layout: &Layout, attrs: &BarChartAttrs, colors: &[Rgb<u8>]) {
    let swatch = 10;
    let y = layout.top - 22;
    let mut x = layout.right();
    for (bar, color) in attrs.chart_bars.iter().zip(colors).rev() {
        x -= i64::from(Canvas::text_width(&bar.label, 1));
        canvas.draw_text(x, y + 1, &bar.label, 1, BLACK);
        x -= i64::from(swatch) + 4;
        canvas.fill_rect(x, y, swatch, swatch, *color);
        x -= 16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::decode_chart;
    use crate::model::report::Counts;

    fn attrs() -> BarChartAttrs {
        BarChartAttrs::validation_split(
            "platform",
            "Device",
            "Valid per Platform",
            &ChartColors::default(),
        )
    }

    fn decode(encoded: &str) -> image::RgbImage {
        image::load_from_memory(&decode_chart(encoded))
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_ticks_small_values() {
        assert_eq!(integer_ticks(0), vec![0, 1]);
        assert_eq!(integer_ticks(3), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_ticks_nice_steps() {
        assert_eq!(integer_ticks(10), vec![0, 2, 4, 6, 8, 10, 12]);
        assert_eq!(integer_ticks(100), vec![0, 20, 40, 60, 80, 100, 120]);
        let ticks = integer_ticks(12345);
        assert!(ticks.len() <= 9);
        assert!(*ticks.last().unwrap() >= 12345);
    }

    #[test]
    fn test_validation_split_colors() {
        let attrs = attrs();
        assert_eq!(attrs.chart_bars.len(), 3);
        assert_eq!(attrs.chart_bars[0].data_attr, TallyField::Valid);
        assert_eq!(attrs.chart_bars[0].color, "#D5E8D4");
        assert_eq!(attrs.chart_bars[2].label, "No Software");
    }

    #[test]
    fn test_renders_configured_size() {
        let rows = vec![
            GroupTally::new(Some("cisco_ios".into()), Counts::new(10, 7, 2, 1)),
            GroupTally::new(None, Counts::new(3, 0, 0, 3)),
        ];
        let config = ChartConfig {
            per_platform_width: 600,
            per_platform_height: 300,
            ..ChartConfig::default()
        };
        let img = decode(&render_bar_chart(&rows, &attrs(), &config).unwrap());
        assert_eq!(img.dimensions(), (600, 300));
    }

    #[test]
    fn test_empty_rows_still_render() {
        let config = ChartConfig::default();
        let encoded = render_bar_chart(&[], &attrs(), &config).unwrap();
        let img = decode(&encoded);
        assert_eq!(img.dimensions(), (1000, 500));
    }

    #[test]
    fn test_valid_bar_drawn_in_configured_color() {
        let rows = vec![GroupTally::new(
            Some("eos".into()),
            Counts::new(10, 10, 0, 0),
        )];
        let config = ChartConfig::default();
        let img = decode(&render_bar_chart(&rows, &attrs(), &config).unwrap());

        let layout = Layout::new(&config, 1, 12);
        let bar_width = layout.slot_width() * config.per_platform_bar_width;
        let x = (layout.slot_center(0) - bar_width) as u32;
        let y = (layout.bottom() - 5) as u32;
        let green = parse_color(&config.colors.valid).unwrap();
        assert_eq!(*img.get_pixel(x, y), green);
    }

    #[test]
    fn test_bad_bar_color() {
        let mut attrs = attrs();
        attrs.chart_bars[1].color = "red".to_string();
        let err = render_bar_chart(&[], &attrs, &ChartConfig::default()).unwrap_err();
        assert!(matches!(err, ChartError::InvalidColor(_)));
    }
}
