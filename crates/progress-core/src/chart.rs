//! Inline SVG line chart of an item's progress over time.
//!
//! The y-axis is fixed to 0–100 %. The x-axis is proportional to time between
//! the first and last sample; when every sample shares one instant (including
//! the single-sample case) points are centered horizontally.

use crate::render::{escape_html, DisplayOptions};
use crate::types::{ItemId, Sample};

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 340.0;
const PAD_LEFT: f64 = 64.0;
const PAD_RIGHT: f64 = 28.0;
const PAD_TOP: f64 = 44.0;
const PAD_BOTTOM: f64 = 56.0;
const Y_TICKS: [u8; 5] = [0, 25, 50, 75, 100];

fn plot_width() -> f64 {
    WIDTH - PAD_LEFT - PAD_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - PAD_TOP - PAD_BOTTOM
}

fn y_pos(pct: u8) -> f64 {
    let clamped = f64::from(pct.min(100));
    PAD_TOP + (1.0 - clamped / 100.0) * plot_height()
}

/// Horizontal positions for `samples`, one per sample.
fn x_positions(samples: &[Sample]) -> Vec<f64> {
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Vec::new();
    };
    let t0 = first.timestamp.datetime().timestamp_micros();
    let span = last.timestamp.datetime().timestamp_micros() - t0;
    samples
        .iter()
        .map(|s| {
            if span <= 0 {
                PAD_LEFT + plot_width() / 2.0
            } else {
                let dt = s.timestamp.datetime().timestamp_micros() - t0;
                PAD_LEFT + (dt as f64 / span as f64) * plot_width()
            }
        })
        .collect()
}

/// Render `samples` (ascending by timestamp) as an embeddable chart fragment.
///
/// The wrapping `div` carries the points as JSON in `data-series` so page
/// script can attach to it; the SVG itself needs no script to display.
pub fn render_chart(item: &ItemId, samples: &[Sample], display: &DisplayOptions) -> String {
    let series = serde_json::Value::Array(
        samples
            .iter()
            .map(|s| {
                serde_json::json!({
                    "t": s.timestamp.encode(),
                    "p": s.progress_percentage,
                })
            })
            .collect(),
    );

    let mut svg = String::new();
    for tick in Y_TICKS {
        let y = y_pos(tick);
        svg.push_str(&format!(
            "<line class=\"chart-grid\" x1=\"{PAD_LEFT:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" />\n",
            WIDTH - PAD_RIGHT
        ));
        svg.push_str(&format!(
            "<text class=\"chart-label\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{tick}%</text>\n",
            PAD_LEFT - 10.0,
            y + 4.0
        ));
    }

    svg.push_str(&format!(
        "<text class=\"chart-title\" x=\"{:.1}\" y=\"26.0\" text-anchor=\"middle\">Progress Over Time - {}</text>\n",
        WIDTH / 2.0,
        escape_html(item.as_str())
    ));
    svg.push_str(&format!(
        "<text class=\"chart-axis-title\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">Time</text>\n",
        PAD_LEFT + plot_width() / 2.0,
        HEIGHT - 10.0
    ));
    let mid_y = PAD_TOP + plot_height() / 2.0;
    svg.push_str(&format!(
        "<text class=\"chart-axis-title\" x=\"18.0\" y=\"{mid_y:.1}\" \
         transform=\"rotate(-90 18.0 {mid_y:.1})\" text-anchor=\"middle\">Progress %</text>\n"
    ));

    if samples.is_empty() {
        svg.push_str(&format!(
            "<text class=\"chart-label\" x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">No data yet</text>\n",
            PAD_LEFT + plot_width() / 2.0,
            PAD_TOP + plot_height() / 2.0
        ));
    } else {
        let xs = x_positions(samples);

        if samples.len() > 1 {
            let path: Vec<String> = xs
                .iter()
                .zip(samples)
                .enumerate()
                .map(|(i, (x, s))| {
                    let cmd = if i == 0 { 'M' } else { 'L' };
                    format!("{cmd}{x:.1},{:.1}", y_pos(s.progress_percentage))
                })
                .collect();
            svg.push_str(&format!(
                "<path class=\"chart-line\" d=\"{}\" />\n",
                path.join(" ")
            ));
        }

        for (x, s) in xs.iter().zip(samples) {
            svg.push_str(&format!(
                "<circle class=\"chart-point\" cx=\"{x:.1}\" cy=\"{:.1}\" r=\"4\"><title>{}: {}%</title></circle>\n",
                y_pos(s.progress_percentage),
                escape_html(&s.timestamp.display(display.utc_offset)),
                s.progress_percentage
            ));
        }

        let label_y = HEIGHT - PAD_BOTTOM + 20.0;
        let date = |s: &Sample| {
            s.timestamp
                .datetime()
                .with_timezone(&display.utc_offset)
                .format("%Y-%m-%d")
                .to_string()
        };
        let (first_x, last_x) = (xs[0], xs[xs.len() - 1]);
        if (last_x - first_x).abs() < f64::EPSILON {
            svg.push_str(&format!(
                "<text class=\"chart-label\" x=\"{first_x:.1}\" y=\"{label_y:.1}\" text-anchor=\"middle\">{}</text>\n",
                date(&samples[0])
            ));
        } else {
            svg.push_str(&format!(
                "<text class=\"chart-label\" x=\"{first_x:.1}\" y=\"{label_y:.1}\" text-anchor=\"start\">{}</text>\n",
                date(&samples[0])
            ));
            svg.push_str(&format!(
                "<text class=\"chart-label\" x=\"{last_x:.1}\" y=\"{label_y:.1}\" text-anchor=\"end\">{}</text>\n",
                date(&samples[samples.len() - 1])
            ));
        }
    }

    format!(
        "<div class=\"progress-chart\" data-item=\"{item}\" data-series=\"{series}\">\n\
         <svg viewBox=\"0 0 {WIDTH} {HEIGHT}\" role=\"img\" aria-label=\"Progress over time for {item}\">\n\
         {svg}</svg>\n\
         </div>",
        item = escape_html(item.as_str()),
        series = escape_html(&series.to_string()),
    )
}
