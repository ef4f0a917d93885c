//! Server-side rendering of the dashboard page

pub mod chart;
pub mod html;

pub use chart::ScatterChart;
pub use html::{DashboardPage, PageState};

use std::fmt;

/// Display adapter that escapes text for HTML bodies and attributes
pub struct Escape<'a>(pub &'a str);

impl fmt::Display for Escape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut last = 0;
        for (i, ch) in self.0.char_indices() {
            let replacement = match ch {
                '&' => "&amp;",
                '<' => "&lt;",
                '>' => "&gt;",
                '"' => "&quot;",
                '\'' => "&#39;",
                _ => continue,
            };
            f.write_str(&self.0[last..i])?;
            f.write_str(replacement)?;
            last = i + ch.len_utf8();
        }
        f.write_str(&self.0[last..])
    }
}
