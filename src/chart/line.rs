//! Line Chart
//!
//! Single-series line chart with categorical timestamp labels on the x-axis.
//! Points are joined by straight segments and the area under the line is not
//! filled.

use std::fmt::Write as _;

/// Series stroke color
const BORDER_COLOR: &str = "rgb(156, 175, 136)";
/// Point fill color
const POINT_COLOR: &str = "rgba(156, 175, 136, 0.2)";

const BACKGROUND: &str = "#1f2937"; // gray-800
const GRID: &str = "#374151"; // gray-700
const AXIS_TEXT: &str = "#9ca3af"; // gray-400
const MUTED_TEXT: &str = "#6b7280"; // gray-500
const STALE_BADGE: &str = "#f59e0b"; // amber-500

/// Upper bound on x-axis labels drawn, regardless of point count
const MAX_X_LABELS: usize = 6;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A live line chart and the data it currently displays
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    title: String,
    dataset_label: String,
    x_title: String,
    y_title: String,
    labels: Vec<String>,
    values: Vec<f64>,
    stale: bool,
}

impl LineChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            dataset_label: "Temperature over time".to_string(),
            x_title: "Timestamp".to_string(),
            y_title: "Temperature (°C)".to_string(),
            labels: Vec::new(),
            values: Vec::new(),
            stale: false,
        }
    }

    /// Temperature chart for a device
    pub fn temperature(device_id: &str) -> Self {
        Self::new(format!("Device {} Temperature", device_id))
    }

    /// Replace labels and series data in place
    pub fn set_data(&mut self, labels: Vec<String>, values: Vec<f64>) {
        if labels.len() != values.len() {
            tracing::warn!(
                chart = %self.title,
                labels = labels.len(),
                values = values.len(),
                "Label/value length mismatch, extra entries are not drawn"
            );
        }
        self.labels = labels;
        self.values = values;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dataset_label(&self) -> &str {
        &self.dataset_label
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of drawable points
    pub fn point_count(&self) -> usize {
        self.labels.len().min(self.values.len())
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn set_stale(&mut self, stale: bool) {
        self.stale = stale;
    }

    /// Title as displayed, including the stale badge when set
    pub fn display_title(&self) -> String {
        if self.stale {
            format!("{} (stale)", self.title)
        } else {
            self.title.clone()
        }
    }

    /// Y-axis bounds with 10% padding; flat or empty series get ±1
    fn y_bounds(&self) -> (f64, f64) {
        let points = &self.values[..self.point_count()];
        let mut min = points.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if !min.is_finite() || !max.is_finite() {
            return (-1.0, 1.0);
        }

        let range = max - min;
        let padding = if range > 0.0 { range * 0.1 } else { 1.0 };
        min -= padding;
        max += padding;
        (min, max)
    }

    /// Render as an SVG document of the given size
    pub fn to_svg(&self, width: f64, height: f64) -> String {
        let margin_left = 60.0;
        let margin_right = 20.0;
        let margin_top = 40.0;
        let margin_bottom = 60.0;

        let chart_width = width - margin_left - margin_right;
        let chart_height = height - margin_top - margin_bottom;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = width,
            h = height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{}"/>"#, BACKGROUND);

        let title_color = if self.stale { STALE_BADGE } else { AXIS_TEXT };
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="24" fill="{}" font-family="sans-serif" font-size="16" text-anchor="middle">{}</text>"#,
            width / 2.0,
            title_color,
            escape_xml(&self.display_title())
        );

        let (y_min, y_max) = self.y_bounds();

        // Horizontal grid lines with y-axis labels
        for i in 0..=5 {
            let y = margin_top + (i as f64 / 5.0) * chart_height;
            let value = y_max - (i as f64 / 5.0) * (y_max - y_min);
            let _ = writeln!(
                svg,
                r#"<line x1="{}" y1="{y:.1}" x2="{}" y2="{y:.1}" stroke="{}" stroke-width="1"/>"#,
                margin_left,
                width - margin_right,
                GRID,
                y = y
            );
            let _ = writeln!(
                svg,
                r#"<text x="5" y="{:.1}" fill="{}" font-family="sans-serif" font-size="12">{:.1}</text>"#,
                y + 4.0,
                AXIS_TEXT,
                value
            );
        }

        let count = self.point_count();
        if count == 0 {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" fill="{}" font-family="sans-serif" font-size="16" text-anchor="middle">No readings yet</text>"#,
                width / 2.0,
                height / 2.0,
                MUTED_TEXT
            );
        } else {
            // Categorical x: evenly spaced by index; a single point sits in the middle
            let x_at = |i: usize| -> f64 {
                if count == 1 {
                    margin_left + chart_width / 2.0
                } else {
                    margin_left + (i as f64 / (count - 1) as f64) * chart_width
                }
            };
            let y_at = |v: f64| -> f64 { margin_top + ((y_max - v) / (y_max - y_min)) * chart_height };

            let points: Vec<String> = (0..count)
                .map(|i| format!("{:.1},{:.1}", x_at(i), y_at(self.values[i])))
                .collect();

            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{}" stroke-width="2" points="{}"/>"#,
                BORDER_COLOR,
                points.join(" ")
            );

            for i in 0..count {
                let _ = writeln!(
                    svg,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{}" stroke="{}"/>"#,
                    x_at(i),
                    y_at(self.values[i]),
                    POINT_COLOR,
                    BORDER_COLOR
                );
            }

            let step = count.div_ceil(MAX_X_LABELS).max(1);
            for i in (0..count).step_by(step) {
                let _ = writeln!(
                    svg,
                    r#"<text x="{:.1}" y="{}" fill="{}" font-family="sans-serif" font-size="11" text-anchor="middle">{}</text>"#,
                    x_at(i),
                    height - margin_bottom + 18.0,
                    AXIS_TEXT,
                    escape_xml(&self.labels[i])
                );
            }
        }

        // Axis titles
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" fill="{}" font-family="sans-serif" font-size="12" text-anchor="middle">{}</text>"#,
            margin_left + chart_width / 2.0,
            height - 12.0,
            AXIS_TEXT,
            escape_xml(&self.x_title)
        );
        let _ = writeln!(
            svg,
            r#"<text x="14" y="{y}" fill="{}" font-family="sans-serif" font-size="12" text-anchor="middle" transform="rotate(-90 14 {y})">{}</text>"#,
            AXIS_TEXT,
            escape_xml(&self.y_title),
            y = margin_top + chart_height / 2.0
        );

        svg.push_str("</svg>\n");
        svg
    }

    /// One-line unicode sparkline of the series
    pub fn sparkline(&self) -> String {
        let points = &self.values[..self.point_count()];
        let min = points.iter().copied().fold(f64::INFINITY, f64::min);
        let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        points
            .iter()
            .map(|v| {
                if range <= 0.0 {
                    SPARK_LEVELS[SPARK_LEVELS.len() / 2]
                } else {
                    let level = ((v - min) / range * (SPARK_LEVELS.len() - 1) as f64).round();
                    SPARK_LEVELS[level as usize]
                }
            })
            .collect()
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
