//! Global validation split as a pie chart

use crate::model::report::{Tally, TallyField};
use crate::model::ChartConfig;

use super::canvas::{Canvas, BLACK};
use super::{encode_canvas, parse_color, series_color, ChartError};

const START_ANGLE: f64 = 90.0;
const EXPLODE: f64 = 0.1;
const TITLE_BAND: u32 = 40;

/// Which counts become slices, and their legends
#[derive(Debug, Clone, PartialEq)]
pub struct PieChartAttrs {
    pub aggr_labels: Vec<TallyField>,
    pub chart_labels: Vec<String>,
}

impl PieChartAttrs {
    /// Valid / Invalid / No Software slices
    pub fn validation_split() -> Self {
        Self {
            aggr_labels: vec![TallyField::Valid, TallyField::Invalid, TallyField::NoSoftware],
            chart_labels: vec![
                "Valid".to_string(),
                "Invalid".to_string(),
                "No Software".to_string(),
            ],
        }
    }
}

/// Render the tally as an encoded pie chart.
///
/// Returns `Ok(None)` when there is nothing to plot: no tally, no slices
/// requested, or every plotted count is zero.
pub fn render_pie_chart(
    tally: Option<&Tally>,
    attrs: &PieChartAttrs,
    config: &ChartConfig,
) -> Result<Option<String>, ChartError> {
    let Some(tally) = tally else {
        return Ok(None);
    };
    if attrs.aggr_labels.is_empty() {
        return Ok(None);
    }
    if attrs.aggr_labels.len() != attrs.chart_labels.len() {
        return Err(ChartError::InvalidAttributes(format!(
            "{} slices but {} labels",
            attrs.aggr_labels.len(),
            attrs.chart_labels.len()
        )));
    }

    let sizes: Vec<i64> = attrs
        .aggr_labels
        .iter()
        .map(|field| tally.counts.get(*field).max(0))
        .collect();
    let sum: i64 = sizes.iter().sum();
    if sum == 0 {
        tracing::debug!(name = %tally.name, "Nothing to plot, skipping pie chart");
        return Ok(None);
    }

    let colors = attrs
        .aggr_labels
        .iter()
        .map(|field| parse_color(series_color(&config.colors, *field)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut canvas = Canvas::new(config.pie_width, config.pie_height);
    let plot_height = config.pie_height.saturating_sub(TITLE_BAND);
    let radius = f64::from(config.pie_width.min(plot_height)) * 0.32;
    let cx = f64::from(config.pie_width) / 2.0;
    let cy = f64::from(plot_height) / 2.0 + 10.0;
    let offset = radius * EXPLODE;

    let mut start = START_ANGLE;
    for ((size, color), label) in sizes.iter().zip(&colors).zip(&attrs.chart_labels) {
        if *size == 0 {
            continue;
        }
        let fraction = *size as f64 / sum as f64;
        let sweep = fraction * 360.0;
        let mid = (start + sweep / 2.0).to_radians();
        let (dir_x, dir_y) = (mid.cos(), -mid.sin());
        let wx = cx + offset * dir_x;
        let wy = cy + offset * dir_y;

        canvas.fill_wedge(wx, wy, radius, start, sweep, *color);

        let percent = format!("{:.1}%", fraction * 100.0);
        canvas.draw_text_centered(
            (wx + radius * 0.6 * dir_x) as i64,
            (wy + radius * 0.6 * dir_y) as i64 - 4,
            &percent,
            1,
            BLACK,
        );

        let lx = wx + radius * 1.12 * dir_x;
        let ly = (wy + radius * 1.12 * dir_y) as i64 - 8;
        let width = i64::from(Canvas::text_width(label, 2));
        let lx = if dir_x < -0.1 {
            lx as i64 - width
        } else if dir_x > 0.1 {
            lx as i64
        } else {
            lx as i64 - width / 2
        };
        canvas.draw_text(lx, ly, label, 2, BLACK);

        start += sweep;
    }

    canvas.draw_text_centered(
        cx as i64,
        i64::from(config.pie_height - TITLE_BAND / 2 - 8),
        &tally.name,
        2,
        BLACK,
    );

    tracing::debug!(name = %tally.name, total = tally.counts.total, "Rendered pie chart");
    encode_canvas(&canvas).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::decode_chart;
    use crate::model::report::Counts;

    #[test]
    fn test_no_tally_no_image() {
        let out = render_pie_chart(
            None,
            &PieChartAttrs::validation_split(),
            &ChartConfig::default(),
        )
        .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_all_zero_short_circuits() {
        let tally = Tally::new("Devices", Counts::default());
        let out = render_pie_chart(
            Some(&tally),
            &PieChartAttrs::validation_split(),
            &ChartConfig::default(),
        )
        .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_empty_attrs_no_image() {
        let tally = Tally::new("Devices", Counts::new(3, 3, 0, 0));
        let attrs = PieChartAttrs {
            aggr_labels: vec![],
            chart_labels: vec![],
        };
        let out = render_pie_chart(Some(&tally), &attrs, &ChartConfig::default()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_mismatched_labels_rejected() {
        let tally = Tally::new("Devices", Counts::new(3, 3, 0, 0));
        let attrs = PieChartAttrs {
            aggr_labels: vec![TallyField::Valid, TallyField::Invalid],
            chart_labels: vec!["Valid".to_string()],
        };
        let err = render_pie_chart(Some(&tally), &attrs, &ChartConfig::default()).unwrap_err();
        assert!(matches!(err, ChartError::InvalidAttributes(_)));
    }

    #[test]
    fn test_renders_png_of_configured_size() {
        let tally = Tally::new("Devices", Counts::new(10, 7, 2, 1));
        let config = ChartConfig {
            pie_width: 320,
            pie_height: 240,
            ..ChartConfig::default()
        };
        let encoded = render_pie_chart(Some(&tally), &PieChartAttrs::validation_split(), &config)
            .unwrap()
            .unwrap();
        assert!(!encoded.is_empty());

        let png = decode_chart(&encoded);
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), 320);
        assert_eq!(img.height(), 240);
    }

    #[test]
    fn test_single_slice_fills_circle() {
        let tally = Tally::new("Devices", Counts::new(5, 5, 0, 0));
        let config = ChartConfig::default();
        let encoded = render_pie_chart(Some(&tally), &PieChartAttrs::validation_split(), &config)
            .unwrap()
            .unwrap();
        let img = image::load_from_memory(&decode_chart(&encoded))
            .unwrap()
            .to_rgb8();

        // A lone slice is nudged straight down; the center row stays inside it
        let cx = config.pie_width / 2;
        let plot_height = config.pie_height - TITLE_BAND;
        let cy = plot_height / 2 + 10;
        let green = parse_color(&config.colors.valid).unwrap();
        assert_eq!(*img.get_pixel(cx - 40, cy), green);
    }

    #[test]
    fn test_bad_color_reported() {
        let tally = Tally::new("Devices", Counts::new(1, 1, 0, 0));
        let mut config = ChartConfig::default();
        config.colors.valid = "green".to_string();
        let err = render_pie_chart(Some(&tally), &PieChartAttrs::validation_split(), &config)
            .unwrap_err();
        assert!(matches!(err, ChartError::InvalidColor(_)));
    }
}
