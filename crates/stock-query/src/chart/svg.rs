//! SVG scene for charts

use super::{Chart, ChartKind, ChartSpec, Series};
use crate::table::format_number;
use std::fmt::Write;

pub const PLOT_WIDTH: f64 = 1000.0;
pub const PLOT_HEIGHT: f64 = 600.0;
pub const PLACEHOLDER_WIDTH: f64 = 600.0;
pub const PLACEHOLDER_HEIGHT: f64 = 400.0;

const FONT: &str = "sans-serif";
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

// Plot area inside the 1000x600 figure; the bottom margin leaves room for
// rotated tick labels and the axis label.
const LEFT: f64 = 90.0;
const RIGHT: f64 = 970.0;
const TOP: f64 = 60.0;
const BOTTOM: f64 = 450.0;

/// Render `chart` as a standalone SVG document
pub fn render(chart: &Chart) -> String {
    match chart {
        Chart::Placeholder { message } => placeholder(message),
        Chart::Plot(spec) => plot(spec),
    }
}

fn placeholder(message: &str) -> String {
    let mut out = open(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT);
    let _ = writeln!(
        out,
        r#"<text x="{}" y="{}" font-family="{FONT}" font-size="24" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
        PLACEHOLDER_WIDTH / 2.0,
        PLACEHOLDER_HEIGHT / 2.0,
        escape(message)
    );
    out.push_str("</svg>\n");
    out
}

fn open(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n\
         <rect width=\"{width}\" height=\"{height}\" fill=\"#ffffff\"/>\n"
    )
}

/// Map values onto the vertical pixel range of the plot area
struct YScale {
    min: f64,
    max: f64,
}

impl YScale {
    fn y(&self, value: f64) -> f64 {
        BOTTOM - (value - self.min) / (self.max - self.min) * (BOTTOM - TOP)
    }
}

fn plot(spec: &ChartSpec) -> String {
    let mut out = open(PLOT_WIDTH, PLOT_HEIGHT);
    let (ticks, scale) = y_axis(spec);
    let band = (RIGHT - LEFT) / spec.categories.len().max(1) as f64;
    let center = |i: usize| LEFT + (i as f64 + 0.5) * band;

    let _ = writeln!(
        out,
        r#"<text x="{}" y="35" font-family="{FONT}" font-size="20" text-anchor="middle">{}</text>"#,
        (LEFT + RIGHT) / 2.0,
        escape(&spec.title)
    );

    // Y ticks and optional grid
    for value in &ticks {
        let y = scale.y(*value);
        if spec.grid {
            let _ = writeln!(
                out,
                r##"<line x1="{LEFT}" y1="{y:.2}" x2="{RIGHT}" y2="{y:.2}" stroke="#b0b0b0" stroke-opacity="0.3"/>"##
            );
        }
        let _ = writeln!(
            out,
            r##"<line x1="{}" y1="{y:.2}" x2="{LEFT}" y2="{y:.2}" stroke="#000000"/>"##,
            LEFT - 5.0
        );
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{:.2}" font-family="{FONT}" font-size="12" text-anchor="end">{}</text>"#,
            LEFT - 8.0,
            y + 4.0,
            escape(&format_number(round_tick(*value)))
        );
    }

    // X ticks
    for &i in spec.ticks.iter().filter(|&&i| i < spec.categories.len()) {
        let x = center(i);
        if spec.grid {
            let _ = writeln!(
                out,
                r##"<line x1="{x:.2}" y1="{TOP}" x2="{x:.2}" y2="{BOTTOM}" stroke="#b0b0b0" stroke-opacity="0.3"/>"##
            );
        }
        let _ = writeln!(
            out,
            r##"<line x1="{x:.2}" y1="{BOTTOM}" x2="{x:.2}" y2="{}" stroke="#000000"/>"##,
            BOTTOM + 5.0
        );
        let label_y = BOTTOM + 16.0;
        let _ = writeln!(
            out,
            r#"<text x="{x:.2}" y="{label_y}" font-family="{FONT}" font-size="12" text-anchor="end" transform="rotate(-45 {x:.2} {label_y})">{}</text>"#,
            escape(&spec.categories[i])
        );
    }

    match spec.kind {
        ChartKind::Bar => bars(&mut out, spec, &scale, band),
        ChartKind::Line => {
            for (s, series) in spec.series.iter().enumerate() {
                line(&mut out, series, colour(s), &scale, &center);
            }
        }
    }

    // Axes frame
    let _ = writeln!(
        out,
        r##"<rect x="{LEFT}" y="{TOP}" width="{}" height="{}" fill="none" stroke="#000000"/>"##,
        RIGHT - LEFT,
        BOTTOM - TOP
    );

    let _ = writeln!(
        out,
        r#"<text x="{}" y="{}" font-family="{FONT}" font-size="14" text-anchor="middle">{}</text>"#,
        (LEFT + RIGHT) / 2.0,
        PLOT_HEIGHT - 15.0,
        escape(&spec.x_label)
    );
    let y_mid = (TOP + BOTTOM) / 2.0;
    let _ = writeln!(
        out,
        r#"<text x="25" y="{y_mid}" font-family="{FONT}" font-size="14" text-anchor="middle" transform="rotate(-90 25 {y_mid})">{}</text>"#,
        escape(&spec.y_label)
    );

    legend(&mut out, &spec.series, spec.kind);
    out.push_str("</svg>\n");
    out
}

fn bars(out: &mut String, spec: &ChartSpec, scale: &YScale, band: f64) {
    let group = band * 0.8;
    let width = group / spec.series.len().max(1) as f64;
    let base = scale.y(0.0_f64.clamp(scale.min, scale.max));

    for (s, series) in spec.series.iter().enumerate() {
        for (i, value) in series.values.iter().enumerate() {
            let Some(value) = value else { continue };
            let x = LEFT + i as f64 * band + (band - group) / 2.0 + s as f64 * width;
            let y = scale.y(*value);
            let _ = writeln!(
                out,
                r#"<rect x="{x:.2}" y="{:.2}" width="{width:.2}" height="{:.2}" fill="{}"/>"#,
                y.min(base),
                (y - base).abs(),
                colour(s)
            );
        }
    }
}

fn line(out: &mut String, series: &Series, colour: &str, scale: &YScale, center: &impl Fn(usize) -> f64) {
    // Split at gaps so missing values break the line
    let mut segment: Vec<(f64, f64)> = Vec::new();
    let mut segments = Vec::new();
    for (i, value) in series.values.iter().enumerate() {
        match value {
            Some(v) => segment.push((center(i), scale.y(*v))),
            None if !segment.is_empty() => segments.push(std::mem::take(&mut segment)),
            None => {}
        }
    }
    if !segment.is_empty() {
        segments.push(segment);
    }

    for points in &segments {
        let path: Vec<String> = points.iter().map(|(x, y)| format!("{x:.2},{y:.2}")).collect();
        let _ = writeln!(
            out,
            r#"<polyline points="{}" fill="none" stroke="{colour}" stroke-width="2"/>"#,
            path.join(" ")
        );
        if series.markers {
            for (x, y) in points {
                let _ = writeln!(out, r#"<circle cx="{x:.2}" cy="{y:.2}" r="4" fill="{colour}"/>"#);
            }
        }
    }
}

fn legend(out: &mut String, series: &[Series], kind: ChartKind) {
    if series.is_empty() {
        return;
    }
    let longest = series.iter().map(|s| s.name.chars().count()).max().unwrap_or(0);
    let width = 40.0 + longest as f64 * 7.5;
    let height = 10.0 + series.len() as f64 * 20.0;
    let x = RIGHT - width - 10.0;
    let y = TOP + 10.0;

    let _ = writeln!(
        out,
        r##"<rect x="{x:.2}" y="{y}" width="{width:.2}" height="{height}" fill="#ffffff" fill-opacity="0.8" stroke="#cccccc"/>"##
    );
    for (s, entry) in series.iter().enumerate() {
        let row = y + 15.0 + s as f64 * 20.0;
        match kind {
            ChartKind::Bar => {
                let _ = writeln!(
                    out,
                    r#"<rect x="{:.2}" y="{:.2}" width="18" height="10" fill="{}"/>"#,
                    x + 8.0,
                    row - 5.0,
                    colour(s)
                );
            }
            ChartKind::Line => {
                let _ = writeln!(
                    out,
                    r#"<line x1="{:.2}" y1="{row}" x2="{:.2}" y2="{row}" stroke="{}" stroke-width="2"/>"#,
                    x + 6.0,
                    x + 28.0,
                    colour(s)
                );
            }
        }
        let _ = writeln!(
            out,
            r#"<text x="{:.2}" y="{:.2}" font-family="{FONT}" font-size="12">{}</text>"#,
            x + 34.0,
            row + 4.0,
            escape(&entry.name)
        );
    }
}

fn colour(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Y range rounded outward to a "nice" step, plus its tick values
fn y_axis(spec: &ChartSpec) -> (Vec<f64>, YScale) {
    let values = spec
        .series
        .iter()
        .flat_map(|s| s.values.iter().flatten())
        .copied()
        .filter(|v| v.is_finite());

    let (mut min, mut max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() {
        (min, max) = (0.0, 1.0);
    }
    if spec.kind == ChartKind::Bar {
        min = min.min(0.0);
        max = max.max(0.0);
    }
    if (max - min).abs() < f64::EPSILON {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.1 };
        min -= pad;
        max += pad;
    }

    let step = nice_step((max - min) / 5.0);
    let lo = (min / step).floor() * step;
    let hi = (max / step).ceil() * step;
    let count = ((hi - lo) / step).round() as usize;
    let ticks = (0..=count).map(|k| lo + k as f64 * step).collect();
    (ticks, YScale { min: lo, max: hi })
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let residual = raw / magnitude;
    let nice = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Strip float noise such as 0.30000000000000004 from tick labels
fn round_tick(value: f64) -> f64 {
    // `+ 0.0` turns -0 into 0
    (value * 1e9).round() / 1e9 + 0.0
}

/// Escape text for use inside SVG markup
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
