use crate::core::engine::{DecisionSink, GroupDecision, LineRange, RunReport};
use crate::error::Result;
use std::io::Write;

/// Writes one JSON object per group that needs review, one per line.
pub struct JsonLinesReport<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DecisionSink for JsonLinesReport<W> {
    fn decision(&mut self, group: &GroupDecision) -> Result<()> {
        if group.decision.ambiguous {
            serde_json::to_writer(&mut self.out, group)?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn finish(&mut self, _range: LineRange, _report: &RunReport) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
