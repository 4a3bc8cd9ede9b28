//! Chart models
//!
//! A chart here is only its data: a label axis plus one series per load.
//! Drawing is left to whatever front-end consumes the view.

use serde::{Deserialize, Serialize};

use super::model::{LoadId, LogPeriod, LOAD_COUNT};

/// Kind of chart to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
}

/// One data series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    /// Values already formatted with two decimals
    pub data: Vec<String>,
}

/// Labels and per-load series derived from one log snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: [Vec<String>; LOAD_COUNT],
}

/// A chart's current content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartView {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Bumped on every redraw
    pub revision: u64,
}

impl ChartView {
    /// Empty bar chart for a usage log, one dataset per load
    pub fn usage(period: LogPeriod) -> Self {
        Self {
            kind: ChartKind::Bar,
            title: period.title().to_string(),
            labels: Vec::new(),
            datasets: LoadId::all()
                .map(|id| Dataset {
                    label: id.to_string(),
                    data: Vec::new(),
                })
                .collect(),
            revision: 0,
        }
    }

    /// The date-range line chart. It has no datasets and nothing feeds it.
    pub fn range() -> Self {
        Self {
            kind: ChartKind::Line,
            title: String::new(),
            labels: Vec::new(),
            datasets: Vec::new(),
            revision: 0,
        }
    }

    /// Replace labels and every dataset wholesale, then mark redrawn
    pub fn apply(&mut self, series: ChartSeries) {
        self.labels = series.labels;
        for (dataset, data) in self.datasets.iter_mut().zip(series.data) {
            dataset.data = data;
        }
        self.revision += 1;
    }
}

/// The three usage charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageCharts {
    pub daily: ChartView,
    pub weekly: ChartView,
    pub monthly: ChartView,
}

impl UsageCharts {
    pub fn get(&self, period: LogPeriod) -> &ChartView {
        match period {
            LogPeriod::Daily => &self.daily,
            LogPeriod::Weekly => &self.weekly,
            LogPeriod::Monthly => &self.monthly,
        }
    }

    pub fn get_mut(&mut self, period: LogPeriod) -> &mut ChartView {
        match period {
            LogPeriod::Daily => &mut self.daily,
            LogPeriod::Weekly => &mut self.weekly,
            LogPeriod::Monthly => &mut self.monthly,
        }
    }
}

impl Default for UsageCharts {
    fn default() -> Self {
        Self {
            daily: ChartView::usage(LogPeriod::Daily),
            weekly: ChartView::usage(LogPeriod::Weekly),
            monthly: ChartView::usage(LogPeriod::Monthly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_chart_shape() {
        let chart = ChartView::usage(LogPeriod::Monthly);
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.title, "Monthly Usage (Wh)");
        let labels: Vec<_> = chart.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Load 1", "Load 2", "Load 3", "Load 4"]);
    }

    #[test]
    fn test_apply_replaces_everything() {
        let mut chart = ChartView::usage(LogPeriod::Daily);
        chart.apply(ChartSeries {
            labels: vec!["a".into(), "b".into()],
            data: [
                vec!["1.00".into(), "2.00".into()],
                vec!["0.00".into(), "0.00".into()],
                vec!["0.00".into(), "0.00".into()],
                vec!["0.00".into(), "0.00".into()],
            ],
        });
        chart.apply(ChartSeries {
            labels: vec!["c".into()],
            data: [
                vec!["3.00".into()],
                vec!["0.00".into()],
                vec!["0.00".into()],
                vec!["0.00".into()],
            ],
        });

        assert_eq!(chart.labels, vec!["c"]);
        assert_eq!(chart.datasets[0].data, vec!["3.00"]);
        assert_eq!(chart.revision, 2);
    }

    #[test]
    fn test_range_chart_is_empty_line() {
        let chart = ChartView::range();
        assert_eq!(chart.kind, ChartKind::Line);
        assert!(chart.datasets.is_empty());
    }
}
