//! Status, risk and confidence of questions, sections and assessments.

use super::{
    ADJUSTER_RED, ADJUSTER_YELLOW, MULTIPLIER_RED, MULTIPLIER_YELLOW, WEIGHT_GREEN, WEIGHT_RED,
    WEIGHT_UNKNOWN, WEIGHT_YELLOW,
};
use crate::model::{Assessment, CategorizedTag, Question, Risk, Section, Status};

impl Question {
    /// Risk of the selected answer, `unknown` when nothing is selected.
    pub fn risk(&self) -> Risk {
        self.answers
            .iter()
            .find(|a| a.selected)
            .map(|a| a.risk)
            .unwrap_or(Risk::Unknown)
    }

    pub fn answered(&self) -> bool {
        self.answers.iter().any(|a| a.selected)
    }

    /// Whether a user (not auto-answering) picked an answer.
    pub fn started(&self) -> bool {
        self.answers.iter().any(|a| a.selected && !a.auto_answered)
    }

    /// Tags applied by the selected answer.
    pub fn tags(&self) -> &[CategorizedTag] {
        self.answers
            .iter()
            .find(|a| a.selected)
            .map(|a| a.apply_tags.as_slice())
            .unwrap_or(&[])
    }
}

impl Section {
    pub fn complete(&self) -> bool {
        self.questions.iter().all(Question::answered)
    }

    pub fn started(&self) -> bool {
        self.questions.iter().any(Question::started)
    }

    pub fn risks(&self) -> impl Iterator<Item = Risk> + '_ {
        self.questions.iter().map(Question::risk)
    }

    pub fn tags(&self) -> impl Iterator<Item = &CategorizedTag> + '_ {
        self.questions.iter().flat_map(|q| q.tags().iter())
    }
}

/// Per-label tallies over a sequence of risks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskCounts {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
    pub unknown: u32,
}

impl RiskCounts {
    pub fn add(&mut self, risk: Risk) {
        match risk {
            Risk::Red => self.red += 1,
            Risk::Yellow => self.yellow += 1,
            Risk::Green => self.green += 1,
            Risk::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.red + self.yellow + self.green + self.unknown
    }
}

impl FromIterator<Risk> for RiskCounts {
    fn from_iter<I: IntoIterator<Item = Risk>>(iter: I) -> Self {
        let mut counts = RiskCounts::default();
        for risk in iter {
            counts.add(risk);
        }
        counts
    }
}

impl Assessment {
    pub fn status(&self) -> Status {
        if self.complete() {
            Status::Complete
        } else if self.started() {
            Status::Started
        } else {
            Status::Empty
        }
    }

    /// Every section complete. Vacuously true with no sections.
    pub fn complete(&self) -> bool {
        self.sections.iter().all(Section::complete)
    }

    pub fn started(&self) -> bool {
        self.sections.iter().any(Section::started)
    }

    pub fn risk_counts(&self) -> RiskCounts {
        self.sections.iter().flat_map(|s| s.risks()).collect()
    }

    /// Risk by threshold, checked red, then yellow, then unknown.
    pub fn risk(&self) -> Risk {
        let counts = self.risk_counts();
        let n = f64::from(counts.total());
        if counts.total() == 0 {
            return Risk::Unknown;
        }
        let reaches = |count: u32, percent: u32| f64::from(count) / n >= f64::from(percent) / 100.0;
        if reaches(counts.red, self.thresholds.red) {
            Risk::Red
        } else if reaches(counts.yellow, self.thresholds.yellow) {
            Risk::Yellow
        } else if reaches(counts.unknown, self.thresholds.unknown) {
            Risk::Unknown
        } else {
            Risk::Green
        }
    }

    /// Confidence score in `0..=100`.
    pub fn confidence(&self) -> u32 {
        confidence_of(self.risk_counts())
    }
}

pub(crate) fn confidence_of(counts: RiskCounts) -> u32 {
    let total = counts.total();
    if total == 0 {
        return 0;
    }
    let mut adjuster = 1.0_f64;
    if counts.red > 0 {
        adjuster *= ADJUSTER_RED.powi(counts.red as i32);
    }
    if counts.yellow > 0 {
        adjuster *= ADJUSTER_YELLOW.powi(counts.yellow as i32);
    }

    let mut confidence = 0.0_f64;
    for _ in 0..counts.red {
        confidence = confidence * MULTIPLIER_RED + WEIGHT_RED * adjuster;
    }
    for _ in 0..counts.yellow {
        confidence = confidence * MULTIPLIER_YELLOW + WEIGHT_YELLOW * adjuster;
    }
    confidence += f64::from(counts.green) * WEIGHT_GREEN * adjuster;
    confidence += f64::from(counts.unknown) * WEIGHT_UNKNOWN * adjuster;

    let max = WEIGHT_GREEN * f64::from(total);
    let score = (confidence / max * 100.0).floor();
    score.clamp(0.0, 100.0) as u32
}
