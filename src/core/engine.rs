use crate::core::classify::is_keep_all;
use crate::core::dominance::prune;
use crate::core::record::{ImageRecord, MalformedPolicy, ParsedLine, parse_line};
use crate::core::shape::filter_shapes;
use crate::core::winner::select_winner;
use crate::error::{RangeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;

/// How a group is resolved once parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Eliminate every image another image of the group beats
    #[default]
    #[value(name = "prune")]
    #[serde(rename = "prune", alias = "dominance-pruning")]
    DominancePruning,
    /// Keep a single best image per group, or show the whole group
    #[value(name = "winner")]
    #[serde(rename = "winner", alias = "single-winner-selection")]
    SingleWinnerSelection,
    /// No filtering; show every group with two or more images
    #[value(name = "pass-through")]
    PassThrough,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Strategy::DominancePruning => "prune",
            Strategy::SingleWinnerSelection => "winner",
            Strategy::PassThrough => "pass-through",
        };
        write!(f, "{}", name)
    }
}

/// Closed, 1-indexed window of input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> std::result::Result<Self, RangeError> {
        if start == 0 {
            return Err(RangeError::ZeroStart { start });
        }
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Decision {
    /// Images to show for review; empty when the group is resolved.
    pub survivors: Vec<ImageRecord>,
    pub ambiguous: bool,
}

impl Decision {
    pub fn resolved() -> Self {
        Self::default()
    }

    pub fn review(survivors: Vec<ImageRecord>) -> Self {
        Self {
            survivors,
            ambiguous: true,
        }
    }
}

/// A decision tagged with the input line it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDecision {
    pub line: usize,
    #[serde(flatten)]
    pub decision: Decision,
}

/// Counters and discards for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub strategy: Strategy,
    pub lines_read: usize,
    pub decisions: usize,
    pub ambiguous_count: usize,
    pub resolved_count: usize,
    pub kept_all_count: usize,
    pub rejected_lines: usize,
    pub discarded: Vec<u64>,
}

impl RunReport {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// The counter reported to the operator: winners in winner mode,
    /// groups needing review otherwise.
    pub fn headline_count(&self) -> usize {
        match self.strategy {
            Strategy::SingleWinnerSelection => self.resolved_count,
            _ => self.ambiguous_count,
        }
    }

    pub fn summary_line(&self) -> String {
        match self.strategy {
            Strategy::SingleWinnerSelection => format!("#WINNER={}", self.headline_count()),
            _ => format!("#CHECK={}", self.headline_count()),
        }
    }
}

/// Receives decisions as the engine produces them.
pub trait DecisionSink {
    fn begin(&mut self, _range: LineRange, _strategy: Strategy) -> Result<()> {
        Ok(())
    }

    fn decision(&mut self, decision: &GroupDecision) -> Result<()>;

    fn finish(&mut self, _range: LineRange, _report: &RunReport) -> Result<()> {
        Ok(())
    }
}

impl DecisionSink for Vec<GroupDecision> {
    fn decision(&mut self, decision: &GroupDecision) -> Result<()> {
        self.push(decision.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub strategy: Strategy,
    pub on_malformed: MalformedPolicy,
}

pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn strategy(&self) -> Strategy {
        self.options.strategy
    }

    /// Resolves one parsed group, updating the run counters. Returns `None`
    /// when nothing of the group is left to decide on.
    pub fn decide(&self, group: &[ImageRecord], report: &mut RunReport) -> Option<Decision> {
        if group.is_empty() {
            return None;
        }

        if self.options.strategy == Strategy::PassThrough {
            return Some(Self::tally(report, group.to_vec()));
        }

        let shaped = filter_shapes(group);
        report.discarded.extend(&shaped.discarded);
        if shaped.kept.is_empty() {
            return None;
        }

        if is_keep_all(&shaped.kept) {
            report.kept_all_count += 1;
            return Some(Decision::resolved());
        }

        match self.options.strategy {
            Strategy::SingleWinnerSelection => match select_winner(&shaped.kept) {
                Some(winner) => {
                    log::debug!("Winner {}", winner);
                    report.resolved_count += 1;
                    Some(Decision::resolved())
                }
                None => {
                    report.ambiguous_count += 1;
                    Some(Decision::review(shaped.kept))
                }
            },
            _ => {
                let pruned = prune(&shaped.kept);
                report.discarded.extend(&pruned.discarded);
                Some(Self::tally(report, pruned.survivors))
            }
        }
    }

    fn tally(report: &mut RunReport, survivors: Vec<ImageRecord>) -> Decision {
        if survivors.len() >= 2 {
            report.ambiguous_count += 1;
            Decision::review(survivors)
        } else {
            report.resolved_count += 1;
            Decision::resolved()
        }
    }

    /// Parses and resolves one raw input line.
    pub fn process_line(&self, line: &str, report: &mut RunReport) -> Option<Decision> {
        match parse_line(line, self.options.on_malformed) {
            ParsedLine::Blank => None,
            ParsedLine::Rejected(_) => {
                report.rejected_lines += 1;
                None
            }
            ParsedLine::Group(group) => self.decide(&group, report),
        }
    }

    /// Reads `reader` up to the end of `range`, handing each decision to
    /// `sink` in input order. `on_line` is called for every line consumed.
    pub fn run<R, S, F>(
        &self,
        reader: R,
        range: LineRange,
        sink: &mut S,
        mut on_line: F,
    ) -> Result<RunReport>
    where
        R: BufRead,
        S: DecisionSink + ?Sized,
        F: FnMut(usize),
    {
        let mut report = RunReport::new(self.options.strategy);
        sink.begin(range, self.options.strategy)?;

        for (idx, bytes) in reader.split(b'\n').enumerate() {
            let number = idx + 1;
            let bytes = bytes?;
            on_line(number);
            if number < range.start {
                continue;
            }

            report.lines_read += 1;
            let line = String::from_utf8_lossy(&bytes);
            if let Some(decision) = self.process_line(&line, &mut report) {
                log::debug!(
                    "Line {}: {} survivor(s), ambiguous={}",
                    number,
                    decision.survivors.len(),
                    decision.ambiguous
                );
                report.decisions += 1;
                sink.decision(&GroupDecision {
                    line: number,
                    decision,
                })?;
            }

            if number >= range.end {
                break;
            }
        }

        log::info!(
            "Read {} line(s): {} decision(s), {} ambiguous, {} resolved, {} kept whole, {} discarded",
            report.lines_read,
            report.decisions,
            report.ambiguous_count,
            report.resolved_count,
            report.kept_all_count,
            report.discarded.len()
        );
        sink.finish(range, &report)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rec(id: u64, width: u32, height: u32, size: u64) -> ImageRecord {
        ImageRecord::new(id, width, height, size)
    }

    fn engine(strategy: Strategy) -> Engine {
        Engine::new(EngineOptions {
            strategy,
            on_malformed: MalformedPolicy::Drop,
        })
    }

    fn run(strategy: Strategy, input: &str, start: usize, end: usize) -> (Vec<GroupDecision>, RunReport) {
        let mut decisions = Vec::new();
        let report = engine(strategy)
            .run(
                Cursor::new(input.as_bytes()),
                LineRange::new(start, end).unwrap(),
                &mut decisions,
                |_| {},
            )
            .unwrap();
        (decisions, report)
    }

    #[test]
    fn test_line_range_validation() {
        assert_eq!(LineRange::new(0, 3), Err(RangeError::ZeroStart { start: 0 }));
        assert_eq!(LineRange::new(4, 3), Err(RangeError::Inverted { start: 4, end: 3 }));
        let range = LineRange::new(2, 2).unwrap();
        assert_eq!((range.start, range.end), (2, 2));
    }

    #[test]
    fn test_pruning_clear_winner_is_resolved() {
        let mut report = RunReport::new(Strategy::DominancePruning);
        let decision = engine(Strategy::DominancePruning)
            .decide(&[rec(1, 800, 600, 50_000), rec(2, 1600, 1200, 60_000)], &mut report)
            .unwrap();
        assert_eq!(decision, Decision::resolved());
        assert_eq!(report.ambiguous_count, 0);
        assert_eq!(report.resolved_count, 1);
        assert_eq!(report.discarded, vec![1]);
    }

    #[test]
    fn test_pruning_non_dominant_pair_is_ambiguous() {
        let group = [rec(1, 2000, 1000, 300_000), rec(2, 1600, 1250, 300_000)];
        let mut report = RunReport::new(Strategy::DominancePruning);
        let decision = engine(Strategy::DominancePruning)
            .decide(&group, &mut report)
            .unwrap();
        assert!(decision.ambiguous);
        assert_eq!(decision.survivors, group.to_vec());
        assert_eq!(report.ambiguous_count, 1);
        assert_eq!(report.summary_line(), "#CHECK=1");
    }

    #[test]
    fn test_winner_mode() {
        let mut report = RunReport::new(Strategy::SingleWinnerSelection);
        let winner_engine = engine(Strategy::SingleWinnerSelection);

        let decision = winner_engine
            .decide(&[rec(1, 1920, 1080, 200_000), rec(2, 1920, 1080, 210_000)], &mut report)
            .unwrap();
        assert_eq!(decision, Decision::resolved());

        let split = [rec(3, 2000, 1000, 500_000), rec(4, 1800, 1200, 500_000)];
        let decision = winner_engine.decide(&split, &mut report).unwrap();
        assert!(decision.ambiguous);
        assert_eq!(decision.survivors, split.to_vec());

        assert_eq!(report.resolved_count, 1);
        assert_eq!(report.ambiguous_count, 1);
        assert_eq!(report.summary_line(), "#WINNER=1");
    }

    #[test]
    fn test_keep_all_skips_comparison() {
        // Pruning alone would eliminate 1 by rule 1.
        let group = [rec(1, 2000, 2000, 100_000), rec(2, 4000, 3000, 900_000)];
        for strategy in [Strategy::DominancePruning, Strategy::SingleWinnerSelection] {
            let mut report = RunReport::new(strategy);
            let decision = engine(strategy).decide(&group, &mut report).unwrap();
            assert_eq!(decision, Decision::resolved());
            assert_eq!(report.kept_all_count, 1);
            assert_eq!(report.headline_count(), 0);
            assert!(report.discarded.is_empty());
        }
    }

    #[test]
    fn test_pass_through_keeps_everything() {
        let group = [rec(1, 800, 600, 50_000), rec(2, 600, 2400, 60_000)];
        let mut report = RunReport::new(Strategy::PassThrough);
        let decision = engine(Strategy::PassThrough).decide(&group, &mut report).unwrap();
        assert_eq!(decision, Decision::review(group.to_vec()));
        assert!(report.discarded.is_empty());
    }

    #[test]
    fn test_banner_only_group_yields_nothing() {
        let mut report = RunReport::new(Strategy::DominancePruning);
        let decision = engine(Strategy::DominancePruning)
            .decide(&[rec(7, 700, 2800, 10_000)], &mut report);
        assert_eq!(decision, None);
        assert_eq!(report.discarded, vec![7]);
    }

    #[test]
    fn test_run_skips_blank_lines() {
        let input = "\
1((800, 600),50000)/2((1600, 1200),60000)/

3((2000, 1000),300000)/4((1600, 1250),300000)/
";
        let (decisions, report) = run(Strategy::DominancePruning, input, 1, 10);
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].line, 1);
        assert!(!decisions[0].decision.ambiguous);
        assert_eq!(decisions[1].line, 3);
        assert!(decisions[1].decision.ambiguous);
        assert_eq!(report.lines_read, 3);
        assert_eq!(report.decisions, 2);
        assert_eq!(report.ambiguous_count, 1);
        assert_eq!(report.resolved_count, 1);
    }

    #[test]
    fn test_run_honours_line_range() {
        let input = "\
1((2000, 1000),300000)/2((1600, 1250),300000)
3((2000, 1000),300000)/4((1600, 1250),300000)
5((2000, 1000),300000)/6((1600, 1250),300000)
7((2000, 1000),300000)/8((1600, 1250),300000)
";
        let mut consumed = Vec::new();
        let mut decisions = Vec::new();
        let report = engine(Strategy::DominancePruning)
            .run(
                Cursor::new(input.as_bytes()),
                LineRange::new(2, 3).unwrap(),
                &mut decisions,
                |n| consumed.push(n),
            )
            .unwrap();
        assert_eq!(decisions.iter().map(|d| d.line).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(decisions[0].decision.survivors[0].id, 3);
        assert_eq!(consumed, vec![1, 2, 3]);
        assert_eq!(report.lines_read, 2);
        assert_eq!(report.ambiguous_count, 2);
    }

    #[test]
    fn test_run_range_past_end_of_input() {
        let (decisions, report) = run(
            Strategy::DominancePruning,
            "1((2000, 1000),300000)/2((1600, 1250),300000)",
            5,
            9,
        );
        assert!(decisions.is_empty());
        assert_eq!(report.lines_read, 0);
    }

    #[test]
    fn test_rejected_lines_are_counted_not_decided() {
        let mut decisions = Vec::new();
        let report = Engine::new(EngineOptions {
            strategy: Strategy::DominancePruning,
            on_malformed: MalformedPolicy::RejectLine,
        })
        .run(
            Cursor::new("1((800, 600),50000)/broken\n".as_bytes()),
            LineRange::new(1, 1).unwrap(),
            &mut decisions,
            |_| {},
        )
        .unwrap();
        assert!(decisions.is_empty());
        assert_eq!(report.rejected_lines, 1);
        assert_eq!(report.headline_count(), 0);
    }

    #[test]
    fn test_zero_fill_does_not_poison_group() {
        let mut decisions = Vec::new();
        Engine::new(EngineOptions {
            strategy: Strategy::DominancePruning,
            on_malformed: MalformedPolicy::ZeroFill,
        })
        .run(
            Cursor::new("junk/1((2000, 1000),300000)/2((1600, 1250),300000)\n".as_bytes()),
            LineRange::new(1, 1).unwrap(),
            &mut decisions,
            |_| {},
        )
        .unwrap();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].decision.survivors.len(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut input = b"1((2000, 1000),300000)/2((1600, 1250),300000)/\xff\n".to_vec();
        input.extend_from_slice(b"\r\n");
        let mut decisions = Vec::new();
        let report = engine(Strategy::DominancePruning)
            .run(Cursor::new(input), LineRange::new(1, 2).unwrap(), &mut decisions, |_| {})
            .unwrap();
        assert_eq!(decisions.len(), 1);
        assert!(decisions[0].decision.ambiguous);
        assert_eq!(report.lines_read, 2);
    }

    #[test]
    fn test_pruning_is_repeatable() {
        let group = [
            rec(1, 640, 480, 20_000),
            rec(2, 2000, 1000, 300_000),
            rec(3, 1600, 1250, 300_000),
        ];
        let first = engine(Strategy::DominancePruning).decide(&group, &mut RunReport::default());
        for _ in 0..5 {
            let again =
                engine(Strategy::DominancePruning).decide(&group, &mut RunReport::default());
            assert_eq!(again, first);
        }
    }

    struct FailingSink;

    impl DecisionSink for FailingSink {
        fn decision(&mut self, _decision: &GroupDecision) -> Result<()> {
            Err(crate::SamelistError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_sink_error_stops_the_run() {
        let input = "1((2000, 1000),300000)/2((1600, 1250),300000)\n\
                     3((2000, 1000),300000)/4((1600, 1250),300000)\n";
        let mut seen = Vec::new();
        let result = engine(Strategy::DominancePruning).run(
            Cursor::new(input.as_bytes()),
            LineRange::new(1, 2).unwrap(),
            &mut FailingSink,
            |line| seen.push(line),
        );
        assert!(matches!(result, Err(crate::SamelistError::Io(_))));
        assert_eq!(seen, vec![1]);
    }
}
