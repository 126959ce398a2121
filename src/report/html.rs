use crate::core::engine::{DecisionSink, GroupDecision, LineRange, RunReport, Strategy};
use crate::core::record::ImageRecord;
use crate::error::Result;
use chrono::Local;
use std::fmt::Write as _;
use std::io::Write;

pub const DEFAULT_TITLE: &str = "SAMELIST";
pub const DEFAULT_IMAGE_BASE_URL: &str = "http://localhost:4567";

const BULMA_CSS: &str = "https://cdn.jsdelivr.net/npm/bulma@0.9.4/css/bulma.min.css";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    pub title: String,
    pub image_base_url: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
        }
    }
}

/// Bulma page with one row of cards per group that needs review.
pub struct HtmlReport<W: Write> {
    out: W,
    options: HtmlOptions,
}

impl<W: Write> HtmlReport<W> {
    pub fn new(out: W, options: HtmlOptions) -> Self {
        Self { out, options }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn image_url(&self, id: u64) -> String {
        format!(
            "{}/imageno/{}",
            self.options.image_base_url.trim_end_matches('/'),
            id
        )
    }

    fn card(&self, record: &ImageRecord) -> Result<String> {
        let url = escape_html(&self.image_url(record.id));
        let mut card = String::new();
        writeln!(card, "        <div class=\"column\">")?;
        writeln!(card, "          <div class=\"card\">")?;
        writeln!(card, "            <div class=\"card-content\">")?;
        writeln!(
            card,
            "              <p class=\"title is-6\">ID:{} ({} kB)</p>",
            record.id,
            record.size_bytes / 1000
        )?;
        writeln!(
            card,
            "              <p class=\"subtitle is-7\">{} x {} ({:.1} k / {:.2})</p>",
            record.width,
            record.height,
            record.area() as f64 / 1000.0,
            record.aspect_ratio()
        )?;
        writeln!(card, "            </div>")?;
        writeln!(card, "            <div class=\"card-image\">")?;
        writeln!(card, "              <figure class=\"image\">")?;
        writeln!(card, "                <a target=\"one\" href=\"{}\">", url)?;
        writeln!(card, "                  <img src=\"{}\">", url)?;
        writeln!(card, "                </a>")?;
        writeln!(card, "              </figure>")?;
        writeln!(card, "            </div>")?;
        writeln!(card, "          </div>")?;
        writeln!(card, "        </div>")?;
        Ok(card)
    }
}

impl<W: Write> DecisionSink for HtmlReport<W> {
    fn begin(&mut self, _range: LineRange, _strategy: Strategy) -> Result<()> {
        let title = escape_html(&self.options.title);
        write!(
            self.out,
            "<html>
  <head>
    <title>{title}</title>
    <link rel=\"stylesheet\" href=\"{BULMA_CSS}\">
  </head>
  <body>
  <div class=\"container\">
    <section class=\"hero\">
      <div class=\"hero-body\">
        <p class=\"title\">{title}</p>
      </div>
    </section>
    <section>
"
        )?;
        Ok(())
    }

    fn decision(&mut self, group: &GroupDecision) -> Result<()> {
        if !group.decision.ambiguous {
            return Ok(());
        }
        let mut row = format!("      <div class=\"columns\" id=\"line-{}\">\n", group.line);
        for record in &group.decision.survivors {
            row.push_str(&self.card(record)?);
        }
        row.push_str("      </div>\n");
        self.out.write_all(row.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self, range: LineRange, report: &RunReport) -> Result<()> {
        write!(
            self.out,
            "    </section>
    <footer class=\"footer\">
      <p>Lines {} to {}, strategy {}: {} group(s) to check, {} resolved. Generated {}.</p>
    </footer>
  </div>
  </body>
</html>
",
            range.start,
            range.end,
            report.strategy,
            report.ambiguous_count,
            report.resolved_count,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        self.out.flush()?;
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::Decision;

    fn render(options: HtmlOptions, groups: &[GroupDecision]) -> String {
        let range = LineRange::new(1, 10).unwrap();
        let mut report = HtmlReport::new(Vec::new(), options);
        report.begin(range, Strategy::DominancePruning).unwrap();
        for group in groups {
            report.decision(group).unwrap();
        }
        report
            .finish(range, &RunReport::new(Strategy::DominancePruning))
            .unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_card_contents() {
        let html = render(
            HtmlOptions {
                title: "Dups".to_string(),
                image_base_url: "http://images.local:4567/".to_string(),
            },
            &[GroupDecision {
                line: 4,
                decision: Decision::review(vec![
                    ImageRecord::new(1001, 1920, 1080, 245_000),
                    ImageRecord::new(1002, 1600, 1250, 198_765),
                ]),
            }],
        );

        assert!(html.contains("<title>Dups</title>"));
        assert!(html.contains("id=\"line-4\""));
        assert!(html.contains("ID:1001 (245 kB)"));
        assert!(html.contains("1920 x 1080 (2073.6 k / 1.78)"));
        assert!(html.contains("ID:1002 (198 kB)"));
        assert!(html.contains("1600 x 1250 (2000.0 k / 1.28)"));
        assert!(html.contains("href=\"http://images.local:4567/imageno/1001\""));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_resolved_groups_are_not_rendered() {
        let html = render(
            HtmlOptions::default(),
            &[GroupDecision {
                line: 2,
                decision: Decision::resolved(),
            }],
        );
        assert!(!html.contains("columns"));
        assert!(html.contains("<title>SAMELIST</title>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = render(
            HtmlOptions {
                title: "<b>A & B</b>".to_string(),
                ..HtmlOptions::default()
            },
            &[],
        );
        assert!(html.contains("&lt;b&gt;A &amp; B&lt;/b&gt;"));
        assert!(!html.contains("<b>A"));
    }
}
