use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;

use chrono::{DateTime, Utc};
use log::info;

// matplotlib's tab10 palette.
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub fn color_cycle() -> impl Iterator<Item = &'static str> {
    PALETTE.iter().copied().cycle()
}

/// One plotted line. `None` data points are simply not drawn, which is how
/// the remaining-points series stops at today.
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub name: String,
    pub color: String,
    pub dashed: bool,
    pub data: BTreeMap<DateTime<Utc>, Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct BurndownChartData {
    pub sprint_name: String,
    pub utc_chart_start: DateTime<Utc>,
    pub utc_chart_end: DateTime<Utc>,
    pub utc_sprint_start: DateTime<Utc>,
    pub utc_sprint_end: DateTime<Utc>,
    pub total_points: f64,
    pub series: Vec<ChartSeries>,
    pub points_label: String,
}

pub struct BurndownChart {
    data: BurndownChartData,
}

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 65.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;

impl BurndownChart {
    pub fn new(data: BurndownChartData) -> Self {
        BurndownChart { data }
    }

    /// Render the chart as an SVG document at `filepath`.
    pub fn generate_chart(&self, filepath: &str) -> io::Result<()> {
        info!("Rendering chart to {}", filepath);
        fs::write(filepath, self.render_svg())
    }

    fn render_svg(&self) -> String {
        let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

        let num_days = (self.data.utc_chart_end - self.data.utc_chart_start)
            .num_days()
            .max(1) as f64;
        let y_max = self.y_max();

        let x = |date: DateTime<Utc>| {
            let day = (date - self.data.utc_chart_start).num_days() as f64;
            MARGIN_LEFT + day / num_days * plot_w
        };
        let y = |value: f64| MARGIN_TOP + (1.0 - value / y_max) * plot_h;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" font-family="sans-serif">"#,
            WIDTH, HEIGHT
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="28" font-size="18" text-anchor="middle">{}</text>"#,
            WIDTH / 2.0,
            escape(&self.data.sprint_name)
        );

        // Horizontal gridlines and y labels.
        for step in 0..=4 {
            let value = y_max * step as f64 / 4.0;
            let line_y = y(value);
            let _ = writeln!(
                svg,
                r##"<line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="#dddddd"/>"##,
                MARGIN_LEFT,
                line_y,
                WIDTH - MARGIN_RIGHT,
                line_y
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.1}" font-size="11" text-anchor="end">{:.0}</text>"#,
                MARGIN_LEFT - 8.0,
                line_y + 4.0,
                value
            );
        }

        // Day ticks, thinned to roughly ten labels.
        let tick_step = ((num_days / 10.0).ceil() as i64).max(1);
        let mut day = self.data.utc_chart_start;
        while day <= self.data.utc_chart_end {
            let tick_x = x(day);
            let _ = writeln!(
                svg,
                r##"<line x1="{:.1}" y1="{}" x2="{:.1}" y2="{}" stroke="#999999"/>"##,
                tick_x,
                HEIGHT - MARGIN_BOTTOM,
                tick_x,
                HEIGHT - MARGIN_BOTTOM + 5.0
            );
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{}" font-size="11" text-anchor="middle">{}</text>"#,
                tick_x,
                HEIGHT - MARGIN_BOTTOM + 20.0,
                day.format("%m-%d")
            );
            day = day + chrono::Duration::days(tick_step);
        }

        // Axes.
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="black"/>"#,
            MARGIN_LEFT,
            MARGIN_TOP,
            MARGIN_LEFT,
            HEIGHT - MARGIN_BOTTOM
        );
        let _ = writeln!(
            svg,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="black"/>"#,
            MARGIN_LEFT,
            HEIGHT - MARGIN_BOTTOM,
            WIDTH - MARGIN_RIGHT,
            HEIGHT - MARGIN_BOTTOM
        );
        let _ = writeln!(
            svg,
            r#"<text x="18" y="{}" font-size="13" text-anchor="middle" transform="rotate(-90 18 {})">{}</text>"#,
            HEIGHT / 2.0,
            HEIGHT / 2.0,
            escape(&self.data.points_label)
        );

        // Series polylines.
        for series in &self.data.series {
            let points: Vec<String> = series
                .data
                .iter()
                .filter_map(|(date, value)| value.map(|v| (date, v)))
                .map(|(date, value)| format!("{:.1},{:.1}", x(*date), y(value)))
                .collect();
            if points.is_empty() {
                continue;
            }
            let dash = if series.dashed {
                r#" stroke-dasharray="6,4""#
            } else {
                ""
            };
            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{}" stroke-width="2"{} points="{}"/>"#,
                series.color,
                dash,
                points.join(" ")
            );
        }

        // Legend, top right.
        for (i, series) in self.data.series.iter().enumerate() {
            let legend_y = MARGIN_TOP + 16.0 * i as f64;
            let _ = writeln!(
                svg,
                r#"<line x1="{}" y1="{:.1}" x2="{}" y2="{:.1}" stroke="{}" stroke-width="2"/>"#,
                WIDTH - MARGIN_RIGHT - 150.0,
                legend_y,
                WIDTH - MARGIN_RIGHT - 125.0,
                legend_y,
                series.color
            );
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.1}" font-size="12">{}</text>"#,
                WIDTH - MARGIN_RIGHT - 118.0,
                legend_y + 4.0,
                escape(&series.name)
            );
        }

        svg.push_str("</svg>\n");
        svg
    }

    // Headroom above the tallest plotted value so lines stay inside the
    // frame.
    fn y_max(&self) -> f64 {
        let series_max = self
            .data
            .series
            .iter()
            .flat_map(|series| series.data.values().flatten())
            .fold(0.0_f64, |acc, v| acc.max(*v));
        series_max.max(self.data.total_points).max(1.0) * 1.05
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, 0, 0, 0).unwrap()
    }

    fn sample_chart() -> BurndownChart {
        let mut data = BTreeMap::new();
        data.insert(day(1), Some(5.0));
        data.insert(day(2), Some(3.0));
        data.insert(day(3), None);

        BurndownChart::new(BurndownChartData {
            sprint_name: "Sprint <1>".to_owned(),
            utc_chart_start: day(1),
            utc_chart_end: day(3),
            utc_sprint_start: day(1),
            utc_sprint_end: day(3),
            total_points: 5.0,
            series: vec![ChartSeries {
                name: "Burndown".to_owned(),
                color: "#1f77b4".to_owned(),
                dashed: false,
                data,
            }],
            points_label: "Outstanding Points".to_owned(),
        })
    }

    #[test]
    fn renders_series_and_labels() {
        let svg = sample_chart().render_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Burndown"));
        assert!(svg.contains("Outstanding Points"));
        // Title is escaped.
        assert!(svg.contains("Sprint &lt;1&gt;"));
        // Two plotted points, the None is dropped.
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn writes_svg_file() {
        let path = std::env::temp_dir().join("burndown-chart-test.svg");
        sample_chart()
            .generate_chart(path.to_str().unwrap())
            .unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("</svg>"));
    }

    #[test]
    fn color_cycle_repeats() {
        let colors: Vec<&str> = color_cycle().take(12).collect();
        assert_eq!(colors[0], "#1f77b4");
        assert_eq!(colors[10], colors[0]);
    }
}
