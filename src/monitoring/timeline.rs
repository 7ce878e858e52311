//! Execution Timeline
//!
//! Records when each node started and finished, for timing reports and
//! Gantt charts.

use std::time::{Duration, Instant};

/// Timing of one node execution, relative to the start of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpan {
    pub node_id: String,
    pub start: Duration,
    /// Unset while the node is still running
    pub end: Option<Duration>,
    pub success: bool,
}

impl NodeSpan {
    /// Time the node ran for, if it has finished.
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end.saturating_sub(self.start))
    }
}

/// Tracks the execution timeline of a run.
#[derive(Debug, Clone)]
pub struct ExecutionTimeline {
    origin: Instant,
    spans: Vec<NodeSpan>,
}

impl ExecutionTimeline {
    /// Creates a new timeline starting now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            spans: Vec::new(),
        }
    }

    /// Marks a node as started.
    pub fn start(&mut self, node_id: impl Into<String>) {
        self.spans.push(NodeSpan {
            node_id: node_id.into(),
            start: self.origin.elapsed(),
            end: None,
            success: false,
        });
    }

    /// Marks the most recent open span of a node as finished.
    ///
    /// Finishing a node that was never started is ignored.
    pub fn finish(&mut self, node_id: &str, success: bool) {
        let now = self.origin.elapsed();
        if let Some(span) = self
            .spans
            .iter_mut()
            .rev()
            .find(|s| s.node_id == node_id && s.end.is_none())
        {
            span.end = Some(now);
            span.success = success;
        }
    }

    /// All spans in start order.
    pub fn spans(&self) -> &[NodeSpan] {
        &self.spans
    }

    /// Time elapsed since the timeline was created.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Durations of finished nodes, in start order.
    pub fn durations(&self) -> Vec<(&str, Duration)> {
        self.spans
            .iter()
            .filter_map(|s| s.duration().map(|d| (s.node_id.as_str(), d)))
            .collect()
    }

    /// Renders an ASCII Gantt chart, 50 columns wide.
    ///
    /// Successful nodes are drawn with `#`, failed ones with `x`. Nodes that
    /// never finished are omitted. Times are shown in microseconds when the
    /// whole run took less than a millisecond.
    pub fn gantt_chart(&self) -> String {
        const WIDTH: f64 = 50.0;

        let mut output = String::from("\nExecution Timeline:\n\n");

        let Some(last_end) = self.spans.iter().filter_map(|s| s.end).max() else {
            return output;
        };

        let micros = last_end.as_millis() == 0;
        let unit = if micros { "us" } else { "ms" };
        let ticks = |d: Duration| if micros { d.as_micros() } else { d.as_millis() };
        let total = ticks(last_end).max(1);
        let scale = WIDTH / total as f64;

        for span in &self.spans {
            let Some(end) = span.end else { continue };
            let start = ticks(span.start);
            let end = ticks(end);

            let offset = (start as f64 * scale) as usize;
            let length = (((end - start) as f64) * scale).max(1.0) as usize;
            let mark = if span.success { "#" } else { "x" };

            output.push_str(&format!(
                "{} |{}{}| ({} {})\n",
                label(&span.node_id, 12),
                " ".repeat(offset),
                mark.repeat(length),
                end - start,
                unit
            ));
        }

        output.push_str(&format!("\nTotal: {} {}\n", total, unit));
        output
    }
}

impl Default for ExecutionTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Pads or truncates a label to exactly `width` characters.
fn label(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        format!("{:width$}", s, width = width)
    } else {
        let head: String = s.chars().take(width - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_timeline_creation() {
        let timeline = ExecutionTimeline::new();
        assert!(timeline.spans().is_empty());
        assert!(timeline.durations().is_empty());
    }

    #[test]
    fn test_start_and_finish() {
        let mut timeline = ExecutionTimeline::new();
        timeline.start("n1");
        thread::sleep(Duration::from_millis(30));
        timeline.finish("n1", true);

        let durations = timeline.durations();
        assert_eq!(durations.len(), 1);
        assert_eq!(durations[0].0, "n1");
        assert!(durations[0].1 >= Duration::from_millis(30));
        assert!(timeline.spans()[0].success);
    }

    #[test]
    fn test_unfinished_span_has_no_duration() {
        let mut timeline = ExecutionTimeline::new();
        timeline.start("n1");

        assert!(timeline.spans()[0].duration().is_none());
        assert!(timeline.durations().is_empty());
    }

    #[test]
    fn test_finish_unknown_node_is_ignored() {
        let mut timeline = ExecutionTimeline::new();
        timeline.finish("ghost", true);
        assert!(timeline.spans().is_empty());
    }

    #[test]
    fn test_durations_keep_start_order() {
        let mut timeline = ExecutionTimeline::new();
        for id in ["b", "a", "c"] {
            timeline.start(id);
            timeline.finish(id, true);
        }

        let order: Vec<_> = timeline.durations().into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_gantt_chart_generation() {
        let mut timeline = ExecutionTimeline::new();

        timeline.start("upload");
        thread::sleep(Duration::from_millis(20));
        timeline.finish("upload", true);

        timeline.start("docking");
        thread::sleep(Duration::from_millis(20));
        timeline.finish("docking", false);

        let chart = timeline.gantt_chart();
        let bar = |id: &str| -> String {
            let line = chart.lines().find(|l| l.contains(id)).unwrap();
            line.split('|').nth(1).unwrap().to_string()
        };

        assert!(bar("upload").contains('#'));
        assert!(bar("docking").contains('x'));
        assert!(!bar("docking").contains('#'));
        assert!(chart.contains("Total:"));
    }

    #[test]
    fn test_gantt_chart_empty() {
        let chart = ExecutionTimeline::new().gantt_chart();
        assert!(chart.contains("Timeline"));
        assert!(!chart.contains("Total:"));
    }

    #[test]
    fn test_gantt_chart_sub_millisecond_nodes() {
        let mut timeline = ExecutionTimeline::new();
        timeline.start("n1");
        timeline.finish("n1", true);
        timeline.start("n2");
        timeline.finish("n2", false);

        let chart = timeline.gantt_chart();
        let line = chart.lines().find(|l| l.starts_with("n1")).unwrap();

        assert!(line.split('|').nth(1).unwrap().contains('#'));
        assert!(chart.lines().any(|l| l.starts_with("n2") && l.contains('x')));
        assert!(chart.contains("Total:"));
    }

    #[test]
    fn test_label() {
        assert_eq!(label("n1", 5), "n1   ");
        assert_eq!(label("vina-docking-long", 8), "vina-...");
    }
}
