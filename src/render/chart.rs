//! Inline SVG scatter chart of amount against transaction id

use crate::render::Escape;
use crate::types::transaction::{AnomalyLabel, ScoredTransaction};
use std::fmt;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 440.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 110.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const TICKS: usize = 5;

/// Point color per label
pub fn label_color(label: AnomalyLabel) -> &'static str {
    match label {
        AnomalyLabel::Legit => "blue",
        AnomalyLabel::Fraud => "red",
    }
}

/// Linear map from a data interval onto a pixel interval
#[derive(Debug, Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
    from: f64,
    to: f64,
}

impl Scale {
    fn new(lo: f64, hi: f64, from: f64, to: f64) -> Self {
        // Pad a degenerate domain so single points land mid-axis
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, hi + 1.0) };
        Self { lo, hi, from, to }
    }

    // Halved differences keep the arithmetic finite for any finite domain
    fn map(&self, value: f64) -> f64 {
        let half_span = self.hi / 2.0 - self.lo / 2.0;
        self.from + (value / 2.0 - self.lo / 2.0) / half_span * (self.to - self.from)
    }

    fn ticks(&self) -> impl Iterator<Item = f64> + '_ {
        (0..=TICKS).map(move |i| {
            let t = i as f64 / TICKS as f64;
            self.lo * (1.0 - t) + self.hi * t
        })
    }
}

/// Scatter of every scored row, colored by label
pub struct ScatterChart<'a> {
    rows: &'a [ScoredTransaction],
    title: &'a str,
}

impl<'a> ScatterChart<'a> {
    pub fn new(rows: &'a [ScoredTransaction], title: &'a str) -> Self {
        Self { rows, title }
    }

    fn bounds(&self) -> (Scale, Scale) {
        let (mut x_lo, mut x_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut y_lo, mut y_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for row in self.rows {
            let x = row.transaction.transaction_id as f64;
            x_lo = x_lo.min(x);
            x_hi = x_hi.max(x);
            y_lo = y_lo.min(row.transaction.amount);
            y_hi = y_hi.max(row.transaction.amount);
        }
        if self.rows.is_empty() {
            (x_lo, x_hi, y_lo, y_hi) = (0.0, 1.0, 0.0, 1.0);
        }

        let x = Scale::new(x_lo, x_hi, MARGIN_LEFT, WIDTH - MARGIN_RIGHT);
        // SVG y grows downward
        let y = Scale::new(y_lo, y_hi, HEIGHT - MARGIN_BOTTOM, MARGIN_TOP);
        (x, y)
    }
}

impl fmt::Display for ScatterChart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.bounds();
        let plot_bottom = HEIGHT - MARGIN_BOTTOM;
        let plot_right = WIDTH - MARGIN_RIGHT;

        writeln!(
            f,
            r#"<svg class="scatter" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" role="img">"#
        )?;
        writeln!(
            f,
            r#"<text x="{}" y="22" text-anchor="middle" class="chart-title">{}</text>"#,
            WIDTH / 2.0,
            Escape(self.title)
        )?;

        // Axes
        writeln!(
            f,
            r#"<line x1="{MARGIN_LEFT}" y1="{plot_bottom}" x2="{plot_right}" y2="{plot_bottom}" class="axis"/>"#
        )?;
        writeln!(
            f,
            r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{plot_bottom}" class="axis"/>"#
        )?;

        for value in x.ticks() {
            let px = x.map(value);
            writeln!(
                f,
                r#"<text x="{px:.1}" y="{:.1}" text-anchor="middle" class="tick">{value:.0}</text>"#,
                plot_bottom + 18.0
            )?;
        }
        for value in y.ticks() {
            let py = y.map(value);
            writeln!(
                f,
                r#"<line x1="{MARGIN_LEFT}" y1="{py:.1}" x2="{plot_right}" y2="{py:.1}" class="grid"/>"#
            )?;
            writeln!(
                f,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" class="tick">{value:.0}</text>"#,
                MARGIN_LEFT - 8.0,
                py + 4.0
            )?;
        }

        writeln!(
            f,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" class="axis-label">Transaction_ID</text>"#,
            (MARGIN_LEFT + plot_right) / 2.0,
            HEIGHT - 10.0
        )?;
        writeln!(
            f,
            r#"<text x="18" y="{:.1}" text-anchor="middle" class="axis-label" transform="rotate(-90 18 {:.1})">Amount</text>"#,
            (MARGIN_TOP + plot_bottom) / 2.0,
            (MARGIN_TOP + plot_bottom) / 2.0
        )?;

        // Legit first so fraud points are drawn on top
        for label in [AnomalyLabel::Legit, AnomalyLabel::Fraud] {
            for row in self.rows.iter().filter(|r| r.label == label) {
                let tx = &row.transaction;
                writeln!(
                    f,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{}"><title>{}: {:.2} ({})</title></circle>"#,
                    x.map(tx.transaction_id as f64),
                    y.map(tx.amount),
                    label_color(label),
                    tx.transaction_id,
                    tx.amount,
                    label
                )?;
            }
        }

        // Legend
        for (i, label) in [AnomalyLabel::Legit, AnomalyLabel::Fraud].into_iter().enumerate() {
            let ly = MARGIN_TOP + 10.0 + i as f64 * 20.0;
            writeln!(
                f,
                r#"<circle cx="{:.1}" cy="{ly:.1}" r="5" fill="{}"/><text x="{:.1}" y="{:.1}" class="legend">{label}</text>"#,
                plot_right + 20.0,
                label_color(label),
                plot_right + 32.0,
                ly + 4.0
            )?;
        }

        writeln!(f, "</svg>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::Transaction;

    fn rows() -> Vec<ScoredTransaction> {
        vec![
            ScoredTransaction::new(Transaction::new(1, 100.0, "Food", "Store", "Rare"), 1, 0.1),
            ScoredTransaction::new(Transaction::new(2, 110.0, "Food", "Store", "Rare"), 1, 0.1),
            ScoredTransaction::new(Transaction::new(3, 1500.0, "Fuel", "Online", "Rare"), -1, -0.2),
        ]
    }

    #[test]
    fn test_one_point_per_row_plus_legend() {
        let data = rows();
        let svg = ScatterChart::new(&data, "Amounts").to_string();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), data.len() + 2);
        assert_eq!(svg.matches(r#"r="3" fill="red""#).count(), 1);
        assert_eq!(svg.matches(r#"r="3" fill="blue""#).count(), 2);
    }

    #[test]
    fn test_points_stay_inside_plot_area() {
        let data = rows();
        let (x, y) = ScatterChart::new(&data, "t").bounds();

        for row in &data {
            let px = x.map(row.transaction.transaction_id as f64);
            let py = y.map(row.transaction.amount);
            assert!((MARGIN_LEFT..=WIDTH - MARGIN_RIGHT).contains(&px));
            assert!((MARGIN_TOP..=HEIGHT - MARGIN_BOTTOM).contains(&py));
        }
        // Highest amount sits at the top edge
        assert_eq!(y.map(1500.0), MARGIN_TOP);
    }

    #[test]
    fn test_title_is_escaped_and_empty_rows_render() {
        let svg = ScatterChart::new(&[], "<b>&</b>").to_string();
        assert!(svg.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn test_scale_handles_extreme_domain() {
        let scale = Scale::new(-1e308, 1e308, 0.0, 100.0);
        assert_eq!(scale.map(-1e308), 0.0);
        assert_eq!(scale.map(0.0), 50.0);
        assert_eq!(scale.map(1e308), 100.0);
        assert!(scale.ticks().all(f64::is_finite));
    }
}
