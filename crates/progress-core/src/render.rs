//! HTML rendering for the item detail page and the homepage index.
//!
//! Both renderers are pure: identical contexts produce byte-identical output.

use crate::paths::{self, HOMEPAGE_FROM_ITEM};
use crate::types::{ItemId, Sample};
use chrono::{FixedOffset, Offset, Utc};
use std::cmp::Ordering;

// ---------------------------------------------------------------------------
// DisplayOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    pub title: String,
    /// Offset applied to stored UTC timestamps when shown on a page.
    pub utc_offset: FixedOffset,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            title: "Progress".to_string(),
            utc_offset: Utc.fix(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Order latest samples by percentage descending, then item id ascending.
pub fn rank_latest(latest: &[Sample]) -> Vec<&Sample> {
    let mut ranked: Vec<&Sample> = latest.iter().collect();
    ranked.sort_by(|a, b| match b.progress_percentage.cmp(&a.progress_percentage) {
        Ordering::Equal => a.item_id.cmp(&b.item_id),
        other => other,
    });
    ranked
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"UTF-8\" />\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n\
         <title>{title}</title>\n\
         <style>{STYLE}</style>\n\
         </head>\n\
         <body>\n\
         <main class=\"page\">\n\
         {body}\
         </main>\n\
         </body>\n\
         </html>\n"
    )
}

// ---------------------------------------------------------------------------
// Item page
// ---------------------------------------------------------------------------

pub struct ItemPage<'a> {
    pub item_id: &'a ItemId,
    /// Ascending by timestamp.
    pub samples: &'a [Sample],
    /// Pre-rendered chart fragment, embedded verbatim.
    pub chart: &'a str,
    pub display: &'a DisplayOptions,
}

pub fn render_item_page(ctx: &ItemPage<'_>) -> String {
    let item = escape_html(ctx.item_id.as_str());
    let site = escape_html(&ctx.display.title);

    let mut body = format!(
        "<nav><a href=\"{HOMEPAGE_FROM_ITEM}\">&larr; All items</a></nav>\n\
         <h1>Progress for {item}</h1>\n"
    );
    if let Some(latest) = ctx.samples.last() {
        body.push_str(&format!(
            "<p class=\"subtitle\">Latest: {}% &middot; {} sample{}</p>\n",
            latest.progress_percentage,
            ctx.samples.len(),
            if ctx.samples.len() == 1 { "" } else { "s" }
        ));
    }
    body.push_str(&format!(
        "<section class=\"chart-card\">\n{}\n</section>\n",
        ctx.chart
    ));

    body.push_str(
        "<table class=\"samples\">\n\
         <thead><tr><th>Timestamp</th><th>Progress (%)</th></tr></thead>\n\
         <tbody>\n",
    );
    for s in ctx.samples {
        body.push_str(&format!(
            "<tr><td><time datetime=\"{}\">{}</time></td><td>{}</td></tr>\n",
            s.timestamp.encode(),
            escape_html(&s.timestamp.display(ctx.display.utc_offset)),
            s.progress_percentage
        ));
    }
    body.push_str("</tbody>\n</table>\n");

    page(&format!("{site}: {item}"), &body)
}

// ---------------------------------------------------------------------------
// Homepage
// ---------------------------------------------------------------------------

pub struct Homepage<'a> {
    pub item_ids: &'a [ItemId],
    /// One latest sample per item, in any order.
    pub latest: &'a [Sample],
    pub base_url: &'a str,
    pub display: &'a DisplayOptions,
}

pub fn render_homepage(ctx: &Homepage<'_>) -> String {
    let site = escape_html(&ctx.display.title);
    let href = |id: &ItemId| escape_html(&paths::url_for(ctx.base_url, &paths::item_page_key(id)));

    let mut body = format!("<h1>{site}</h1>\n");
    body.push_str(&format!(
        "<p class=\"subtitle\">{} tracked item{}</p>\n",
        ctx.item_ids.len(),
        if ctx.item_ids.len() == 1 { "" } else { "s" }
    ));

    if ctx.item_ids.is_empty() {
        body.push_str("<p class=\"empty\">No items yet.</p>\n");
        return page(&site, &body);
    }

    body.push_str("<section>\n<h2>Items</h2>\n<ul class=\"items\">\n");
    for id in ctx.item_ids {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            href(id),
            escape_html(id.as_str())
        ));
    }
    body.push_str("</ul>\n</section>\n");

    body.push_str(
        "<section>\n<h2>Latest progress</h2>\n\
         <table id=\"latest\">\n\
         <thead><tr><th>Item</th><th>Progress (%)</th><th></th><th>Updated</th></tr></thead>\n\
         <tbody>\n",
    );
    for s in rank_latest(ctx.latest) {
        body.push_str(&format!(
            "<tr><td><a href=\"{}\">{}</a></td><td>{pct}</td>\
             <td><div class=\"bar\"><span style=\"width: {pct}%\"></span></div></td>\
             <td>{}</td></tr>\n",
            href(&s.item_id),
            escape_html(s.item_id.as_str()),
            escape_html(&s.timestamp.display(ctx.display.utc_offset)),
            pct = s.progress_percentage.min(100),
        ));
    }
    body.push_str("</tbody>\n</table>\n</section>\n");

    page(&site, &body)
}

const STYLE: &str = r#"
    :root {
      --bg: #f8f3e6;
      --ink: #2b2a28;
      --muted: #6f6a63;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: #ffffff;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }
    .page { width: min(860px, 100%); margin: 0 auto; display: grid; gap: 20px; }
    h1 { margin: 0; font-family: Georgia, serif; }
    .subtitle, .empty { margin: 0; color: var(--muted); }
    a { color: var(--accent-2); }
    table { border-collapse: collapse; width: 100%; background: var(--card); }
    th, td { padding: 8px 12px; border-bottom: 1px solid rgba(47, 72, 88, 0.12); text-align: left; }
    .bar { background: rgba(47, 72, 88, 0.1); border-radius: 999px; height: 10px; min-width: 120px; }
    .bar span { display: block; height: 100%; border-radius: 999px; background: var(--accent); }
    .chart-card { background: var(--card); border-radius: 18px; padding: 12px; }
    .progress-chart svg { width: 100%; height: auto; }
    .chart-grid { stroke: rgba(47, 72, 88, 0.15); stroke-width: 1; }
    .chart-line { fill: none; stroke: var(--accent); stroke-width: 3; }
    .chart-point { fill: var(--accent-2); }
    .chart-label { fill: var(--muted); font-size: 12px; }
    .chart-title { fill: var(--ink); font-size: 15px; font-weight: 600; }
    .chart-axis-title { fill: var(--muted); font-size: 12px; font-weight: 600; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::render_chart;
    use crate::types::Stamp;
    use chrono::{Duration, TimeZone};

    fn id(s: &str) -> ItemId {
        ItemId::parse(s).unwrap()
    }

    fn sample(item: &str, minutes: i64, pct: i64) -> Sample {
        let base = Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap();
        Sample::new(
            id(item),
            Stamp::from_datetime(base + Duration::minutes(minutes)),
            pct,
        )
        .unwrap()
    }

    fn item_page(samples: &[Sample]) -> String {
        let display = DisplayOptions::default();
        let item = id("alpha");
        let chart = render_chart(&item, samples, &display);
        render_item_page(&ItemPage {
            item_id: &item,
            samples,
            chart: &chart,
            display: &display,
        })
    }

    fn homepage(ids: &[ItemId], latest: &[Sample]) -> String {
        render_homepage(&Homepage {
            item_ids: ids,
            latest,
            base_url: "https://progress.example.com",
            display: &DisplayOptions::default(),
        })
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn item_page_lists_every_sample_and_links_home() {
        let samples = vec![sample("alpha", 0, 0), sample("alpha", 90, 42)];
        let html = item_page(&samples);
        assert!(html.contains("<h1>Progress for alpha</h1>"));
        assert!(html.contains("href=\"../index.html\""));
        assert_eq!(html.matches("<tr><td><time").count(), 2);
        assert!(html.contains("<td>0</td>"));
        assert!(html.contains("<td>42</td>"));
        assert!(html.contains("class=\"progress-chart\""));
        let first = html.find("2026-04-10 12:00:00").unwrap();
        let second = html.find("2026-04-10 13:30:00").unwrap();
        assert!(first < second);
    }

    #[test]
    fn item_page_is_deterministic() {
        let samples = vec![sample("alpha", 0, 10), sample("alpha", 5, 20)];
        assert_eq!(item_page(&samples), item_page(&samples));
    }

    #[test]
    fn item_page_uses_display_offset() {
        let samples = vec![sample("alpha", 0, 10)];
        let display = DisplayOptions {
            title: "Mine".into(),
            utc_offset: FixedOffset::west_opt(3 * 3600).unwrap(),
        };
        let html = render_item_page(&ItemPage {
            item_id: &id("alpha"),
            samples: &samples,
            chart: "",
            display: &display,
        });
        assert!(html.contains("2026-04-10 09:00:00 -03:00"));
        assert!(html.contains("datetime=\"2026-04-10T12:00:00.000000Z\""));
        assert!(html.contains("<title>Mine: alpha</title>"));
    }

    #[test]
    fn rank_latest_sorts_descending_with_id_tiebreak() {
        let latest = vec![
            sample("delta", 0, 50),
            sample("beta", 0, 20),
            sample("alpha", 0, 80),
            sample("charlie", 0, 50),
        ];
        let order: Vec<&str> = rank_latest(&latest)
            .iter()
            .map(|s| s.item_id.as_str())
            .collect();
        assert_eq!(order, vec!["alpha", "charlie", "delta", "beta"]);
    }

    #[test]
    fn homepage_links_items_and_ranks_latest_table() {
        let ids = vec![id("alpha"), id("beta")];
        let latest = vec![sample("beta", 0, 20), sample("alpha", 3, 80)];
        let html = homepage(&ids, &latest);

        assert!(html.contains(
            "<li><a href=\"https://progress.example.com/alpha/index.html\">alpha</a></li>"
        ));
        assert!(html.contains(
            "<li><a href=\"https://progress.example.com/beta/index.html\">beta</a></li>"
        ));

        let table = &html[html.find("id=\"latest\"").unwrap()..];
        let alpha = table.find(">alpha</a>").unwrap();
        let beta = table.find(">beta</a>").unwrap();
        assert!(alpha < beta);
        assert!(table.contains("width: 80%"));
    }

    #[test]
    fn homepage_without_items_renders_empty_state() {
        let html = homepage(&[], &[]);
        assert!(html.contains("No items yet."));
        assert!(!html.contains("id=\"latest\""));
    }

    #[test]
    fn homepage_is_deterministic() {
        let ids = vec![id("alpha")];
        let latest = vec![sample("alpha", 0, 5)];
        assert_eq!(homepage(&ids, &latest), homepage(&ids, &latest));
    }
}
