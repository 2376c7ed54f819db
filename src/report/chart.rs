//! SVG chart generation.
//!
//! Builds a single SVG figure with two panels: daily visits over time
//! and the most visited pages. Empty series produce empty panels.

use crate::config::ChartStyle;
use crate::models::{Aggregate, DailyTotal, TopPage};
use chrono::{Datelike, NaiveDate, Weekday};

const FONT_FAMILY: &str = "DejaVu Sans, Helvetica, Arial, sans-serif";
const MARGIN: f64 = 30.0;
const TITLE_HEIGHT: f64 = 70.0;
const PANEL_GAP: f64 = 50.0;
const MAX_LABEL_CHARS: usize = 28;

/// Rectangle in SVG user units.
#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn inset(&self, left: f64, top: f64, right: f64, bottom: f64) -> Rect {
        Rect {
            x: self.x + left,
            y: self.y + top,
            w: (self.w - left - right).max(1.0),
            h: (self.h - top - bottom).max(1.0),
        }
    }

    fn bottom(&self) -> f64 {
        self.y + self.h
    }

    fn right(&self) -> f64 {
        self.x + self.w
    }
}

/// Render the analytics figure as an SVG document.
pub fn render_svg(aggregate: &Aggregate, style: &ChartStyle, days_back: u32) -> String {
    let width = f64::from(style.width);
    let height = f64::from(style.height);
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = style.width,
        h = style.height,
        font = FONT_FAMILY,
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        style.width,
        style.height,
        escape(&style.background)
    ));
    svg.push('\n');

    // Figure title
    svg.push_str(&text(
        width / 2.0,
        TITLE_HEIGHT / 2.0 + 8.0,
        &style.title,
        &style.accent,
        20.0,
        "middle",
        Some("bold"),
    ));

    let panel_w = (width - 2.0 * MARGIN - PANEL_GAP) / 2.0;
    let panel_h = height - TITLE_HEIGHT - MARGIN;
    let left = Rect {
        x: MARGIN,
        y: TITLE_HEIGHT,
        w: panel_w,
        h: panel_h,
    };
    let right = Rect {
        x: MARGIN + panel_w + PANEL_GAP,
        ..left
    };

    svg.push_str(&daily_panel(&aggregate.daily, style, days_back, left));
    svg.push_str(&top_pages_panel(&aggregate.top_pages, style, right));

    svg.push_str("</svg>\n");
    svg
}

/// Time series of daily totals.
fn daily_panel(daily: &[DailyTotal], style: &ChartStyle, days_back: u32, area: Rect) -> String {
    let mut section = String::new();

    section.push_str(&text(
        area.x + area.w / 2.0,
        area.y + 18.0,
        &format!("Daily Visits (Last {} Days)", days_back),
        &style.accent,
        15.0,
        "middle",
        None,
    ));

    let plot = area.inset(60.0, 36.0, 10.0, 70.0);
    section.push_str(&panel_background(plot, style));

    let max = daily.iter().map(|d| d.count).max().unwrap_or(0);
    let (y_max, y_ticks) = axis_ticks(max);

    for tick in &y_ticks {
        let y = plot.bottom() - (*tick as f64 / y_max as f64) * plot.h;
        section.push_str(&line(plot.x, y, plot.right(), y, &style.grid, 0.5));
        section.push_str(&text(
            plot.x - 8.0,
            y + 4.0,
            &tick.to_string(),
            &style.text,
            11.0,
            "end",
            None,
        ));
    }

    // Y axis label
    section.push_str(&format!(
        r#"<text x="{x:.1}" y="{y:.1}" fill="{fill}" font-size="12" text-anchor="middle" transform="rotate(-90 {x:.1} {y:.1})">Visits</text>"#,
        x = area.x + 12.0,
        y = plot.y + plot.h / 2.0,
        fill = escape(&style.text),
    ));
    section.push('\n');

    if !daily.is_empty() {
        let (positions, ticks) = x_layout(daily);
        let points: Vec<(f64, f64)> = positions
            .iter()
            .zip(daily)
            .map(|(fx, d)| {
                (
                    plot.x + fx * plot.w,
                    plot.bottom() - (d.count as f64 / y_max as f64) * plot.h,
                )
            })
            .collect();

        // Area under the line
        let mut area_points = format!("{:.1},{:.1}", points[0].0, plot.bottom());
        for (x, y) in &points {
            area_points.push_str(&format!(" {:.1},{:.1}", x, y));
        }
        area_points.push_str(&format!(
            " {:.1},{:.1}",
            points[points.len() - 1].0,
            plot.bottom()
        ));
        section.push_str(&format!(
            r#"<polygon points="{}" fill="{}" fill-opacity="0.15"/>"#,
            area_points,
            escape(&style.line)
        ));
        section.push('\n');

        let line_points: Vec<String> = points
            .iter()
            .map(|(x, y)| format!("{:.1},{:.1}", x, y))
            .collect();
        section.push_str(&format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2" stroke-linejoin="round"/>"#,
            line_points.join(" "),
            escape(&style.line)
        ));
        section.push('\n');

        for (fx, label) in ticks {
            let x = plot.x + fx * plot.w;
            let y = plot.bottom() + 14.0;
            section.push_str(&line(x, plot.bottom(), x, plot.bottom() + 4.0, &style.text, 1.0));
            section.push_str(&format!(
                r#"<text x="{x:.1}" y="{y:.1}" fill="{fill}" font-size="11" text-anchor="end" transform="rotate(-40 {x:.1} {y:.1})">{label}</text>"#,
                x = x,
                y = y,
                fill = escape(&style.text),
                label = escape(&label),
            ));
            section.push('\n');
        }
    }

    section.push_str(&panel_border(plot, style));
    section
}

/// Horizontal bar chart, highest count at the top.
fn top_pages_panel(pages: &[TopPage], style: &ChartStyle, area: Rect) -> String {
    let mut section = String::new();

    section.push_str(&text(
        area.x + area.w / 2.0,
        area.y + 18.0,
        "Top Pages",
        &style.accent,
        15.0,
        "middle",
        None,
    ));

    let plot = area.inset(190.0, 36.0, 20.0, 70.0);
    section.push_str(&panel_background(plot, style));

    let max = pages.iter().map(|p| p.count).max().unwrap_or(0);
    let (x_max, x_ticks) = axis_ticks(max);

    for tick in &x_ticks {
        let x = plot.x + (*tick as f64 / x_max as f64) * plot.w;
        section.push_str(&line(x, plot.y, x, plot.bottom(), &style.grid, 0.5));
        section.push_str(&text(
            x,
            plot.bottom() + 18.0,
            &tick.to_string(),
            &style.text,
            11.0,
            "middle",
            None,
        ));
    }

    section.push_str(&text(
        plot.x + plot.w / 2.0,
        plot.bottom() + 44.0,
        "Views",
        &style.text,
        12.0,
        "middle",
        None,
    ));

    if !pages.is_empty() {
        let row = plot.h / pages.len() as f64;
        let bar_h = row * 0.6;

        for (rank, page) in pages.iter().enumerate() {
            let center = plot.y + row * (rank as f64 + 0.5);
            let bar_w = (page.count as f64 / x_max as f64) * plot.w;

            section.push_str(&format!(
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                plot.x,
                center - bar_h / 2.0,
                bar_w,
                bar_h,
                escape(&style.bar)
            ));
            section.push('\n');
            section.push_str(&text(
                plot.x - 8.0,
                center + 4.0,
                &shorten(&page.path, MAX_LABEL_CHARS),
                &style.text,
                11.0,
                "end",
                None,
            ));
        }
    }

    section.push_str(&panel_border(plot, style));
    section
}

/// Horizontal positions (0.0..=1.0) for each day and the labelled ticks.
///
/// Days that all parse as dates are placed on a time axis with a tick on
/// every Monday. Otherwise points are spaced evenly and every seventh one
/// is labelled with its raw value.
fn x_layout(daily: &[DailyTotal]) -> (Vec<f64>, Vec<(f64, String)>) {
    let dates: Option<Vec<NaiveDate>> = daily
        .iter()
        .map(|d| NaiveDate::parse_from_str(&d.day, "%Y-%m-%d").ok())
        .collect();

    match dates {
        Some(dates) => {
            let first = dates[0];
            let last = dates[dates.len() - 1];
            let span = (last - first).num_days();
            let fraction = |date: NaiveDate| {
                if span == 0 {
                    0.5
                } else {
                    (date - first).num_days() as f64 / span as f64
                }
            };

            let positions = dates.iter().map(|d| fraction(*d)).collect();
            let ticks = if span == 0 {
                vec![(0.5, first.format("%b %d").to_string())]
            } else {
                first
                    .iter_days()
                    .take_while(|d| *d <= last)
                    .filter(|d| d.weekday() == Weekday::Mon)
                    .map(|d| (fraction(d), d.format("%b %d").to_string()))
                    .collect()
            };
            (positions, ticks)
        }
        None => {
            let n = daily.len();
            let fraction = |i: usize| {
                if n == 1 {
                    0.5
                } else {
                    i as f64 / (n - 1) as f64
                }
            };
            let positions = (0..n).map(fraction).collect();
            let ticks = (0..n)
                .step_by(7)
                .map(|i| (fraction(i), daily[i].day.clone()))
                .collect();
            (positions, ticks)
        }
    }
}

/// Axis upper bound and tick values for data whose maximum is `max`.
fn axis_ticks(max: u64) -> (u64, Vec<u64>) {
    if max == 0 {
        return (1, vec![0, 1]);
    }

    let rough = (max as f64 / 5.0).max(1.0);
    let magnitude = 10f64.powf(rough.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= rough)
        .unwrap_or(10.0 * magnitude)
        .max(1.0) as u64;

    let upper = max
        .div_ceil(step)
        .checked_mul(step)
        .unwrap_or(max);
    let ticks = (0..=upper / step).map(|i| i * step).collect();
    (upper, ticks)
}

fn panel_background(plot: Rect, style: &ChartStyle) -> String {
    format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>\n",
        plot.x,
        plot.y,
        plot.w,
        plot.h,
        escape(&style.panel)
    )
}

fn panel_border(plot: Rect, style: &ChartStyle) -> String {
    format!(
        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1\"/>\n",
        plot.x,
        plot.y,
        plot.w,
        plot.h,
        escape(&style.grid)
    )
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) -> String {
    format!(
        "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
        x1,
        y1,
        x2,
        y2,
        escape(stroke),
        width
    )
}

fn text(
    x: f64,
    y: f64,
    content: &str,
    fill: &str,
    size: f64,
    anchor: &str,
    weight: Option<&str>,
) -> String {
    let weight = weight
        .map(|w| format!(" font-weight=\"{}\"", w))
        .unwrap_or_default();
    format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" font-size=\"{}\" text-anchor=\"{}\"{}>{}</text>\n",
        x,
        y,
        escape(fill),
        size,
        anchor,
        weight,
        escape(content)
    )
}

/// Truncate long labels with an ellipsis.
fn shorten(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Escape text for use in SVG content and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
