//! Health report assembly.
//!
//! Lab integration does not exist yet, so the analysis section is the fixed
//! demonstration result from [`AnalysisResult::demo`]. Profile and activity
//! sections come from the user's own data.

use askama::Template;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::activity::ActivityLog;
use crate::models::ProfileFields;

/// Report rendering failures.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// How a biomarker compares to its normal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomarkerStatus {
    High,
    Low,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Biomarker {
    pub name: String,
    /// Display level, e.g. "Elevated".
    pub level: String,
    pub result: String,
    pub normal_range: String,
    pub status: BiomarkerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Screening result for one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub diagnosis_risk: String,
    /// Percent.
    pub risk_level: u8,
    /// Percent.
    pub confidence: u8,
    pub biomarkers: Vec<Biomarker>,
    pub insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub laboratory: String,
    pub method: String,
}

fn biomarker(name: &str, level: &str, result: &str, normal: &str, status: BiomarkerStatus) -> Biomarker {
    Biomarker {
        name: name.to_string(),
        level: level.to_string(),
        result: result.to_string(),
        normal_range: normal.to_string(),
        status,
    }
}

fn recommendation(title: &str, description: &str, priority: Priority) -> Recommendation {
    Recommendation {
        title: title.to_string(),
        description: description.to_string(),
        priority,
    }
}

impl AnalysisResult {
    /// The demonstration result shown until lab results are wired in.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            diagnosis_risk: "Moderate Risk".to_string(),
            risk_level: 65,
            confidence: 87,
            biomarkers: vec![
                biomarker("Cortisol", "Elevated", "28 ng/mL", "10-20 ng/mL", BiomarkerStatus::High),
                biomarker("Serotonin", "Low", "35 ng/mL", "50-200 ng/mL", BiomarkerStatus::Low),
                biomarker("GABA", "Normal", "5.2 ng/mL", "2-8 ng/mL", BiomarkerStatus::Normal),
                biomarker("Dopamine", "Low", "22 ng/mL", "30-100 ng/mL", BiomarkerStatus::Low),
            ],
            insights: [
                "Stress hormone levels suggest chronic stress response",
                "Neurotransmitter imbalance indicates potential mood regulation issues",
                "Inflammatory markers show elevated oxidative stress",
                "Amino acid profile suggests altered protein metabolism",
            ]
            .map(String::from)
            .to_vec(),
            recommendations: vec![
                recommendation(
                    "Consult Healthcare Provider",
                    "Schedule an appointment to discuss these results with a mental health professional",
                    Priority::High,
                ),
                recommendation(
                    "Stress Management",
                    "Begin stress reduction techniques such as meditation, yoga, or deep breathing exercises",
                    Priority::Medium,
                ),
                recommendation(
                    "Lifestyle Modifications",
                    "Focus on regular sleep schedule, exercise, and balanced nutrition",
                    Priority::Medium,
                ),
            ],
            laboratory: "ASU Mass Spectrometry Facility".to_string(),
            method: "LC-MS/MS Metabolomics".to_string(),
        }
    }
}

/// Everything that goes into a report.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub generated_on: NaiveDate,
    pub sample_id: Option<String>,
    pub profile: Option<ProfileFields>,
    pub activities: ActivityLog,
    pub analysis: AnalysisResult,
}

impl HealthReport {
    /// Report for today with the demonstration analysis and no user data.
    #[must_use]
    pub fn new(generated_on: NaiveDate) -> Self {
        Self {
            generated_on,
            sample_id: None,
            profile: None,
            activities: ActivityLog::new(),
            analysis: AnalysisResult::demo(),
        }
    }

    #[must_use]
    pub fn with_sample_id(mut self, sample_id: impl Into<String>) -> Self {
        self.sample_id = Some(sample_id.into());
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: ProfileFields) -> Self {
        self.profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_activities(mut self, activities: ActivityLog) -> Self {
        self.activities = activities;
        self
    }

    /// Attachment filename, `MindWell_Report_<YYYY-MM-DD>.pdf`.
    #[must_use]
    pub fn filename(&self) -> String {
        format!("MindWell_Report_{}.pdf", self.generated_on.format("%Y-%m-%d"))
    }
}

/// Turns a [`HealthReport`] into attachment bytes.
pub trait ReportRenderer: Send + Sync {
    /// Render the report document.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if rendering fails.
    fn render(&self, report: &HealthReport) -> Result<Vec<u8>, ReportError>;

    /// MIME type of the rendered bytes.
    fn content_type(&self) -> &'static str;
}

struct ProfileLine {
    label: &'static str,
    value: String,
}

#[derive(Template)]
#[template(path = "report.txt")]
struct TextReport<'a> {
    generated_on: String,
    sample_id: &'a str,
    analysis: &'a AnalysisResult,
    patient_lines: Vec<ProfileLine>,
    activity_lines: Vec<String>,
    mood_improvement: String,
}

fn profile_lines(profile: &ProfileFields) -> Vec<ProfileLine> {
    let mut lines = vec![ProfileLine {
        label: "Name",
        value: profile.full_name.clone(),
    }];
    let optional = [
        ("Age", profile.age.map(|a| a.to_string())),
        ("Email", profile.email.as_ref().map(ToString::to_string)),
        ("Gender", profile.gender.clone()),
        ("Medical History", profile.medical_history.clone()),
        ("Current Medications", profile.current_medications.clone()),
    ];
    lines.extend(
        optional
            .into_iter()
            .filter_map(|(label, value)| value.map(|value| ProfileLine { label, value })),
    );
    lines
}

/// Plain text renderer.
///
/// Produces the text body that stands in for the PDF attachment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, report: &HealthReport) -> Result<Vec<u8>, ReportError> {
        let activity_lines = report
            .activities
            .entries()
            .iter()
            .map(|e| {
                let mut line = format!(
                    "{} {} ({}, {} min): mood {} -> {}",
                    e.date,
                    e.activity,
                    e.category.label(),
                    e.duration_minutes,
                    e.mood_before.label(),
                    e.mood_after.label()
                );
                if !e.notes.is_empty() {
                    line.push_str(" - ");
                    line.push_str(&e.notes);
                }
                line
            })
            .collect();

        let text = TextReport {
            generated_on: report.generated_on.format("%Y-%m-%d").to_string(),
            sample_id: report.sample_id.as_deref().unwrap_or("Not assigned"),
            analysis: &report.analysis,
            patient_lines: report.profile.as_ref().map(profile_lines).unwrap_or_default(),
            activity_lines,
            mood_improvement: format!("{:+.1}", report.activities.average_mood_improvement()),
        }
        .render()?;
        Ok(text.into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "text/plain"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mindwell_core::{AlertPreferences, Email};

    use super::*;
    use crate::activity::{ActivityCategory, ActivityDraft, Mood};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 9).unwrap()
    }

    fn render(report: &HealthReport) -> String {
        String::from_utf8(TextRenderer.render(report).unwrap()).unwrap()
    }

    #[test]
    fn test_filename() {
        assert_eq!(HealthReport::new(date()).filename(), "MindWell_Report_2025-06-09.pdf");
    }

    #[test]
    fn test_demo_analysis_sections() {
        let text = render(&HealthReport::new(date()).with_sample_id("MW-2041"));
        assert!(text.contains("Analysis Date: 2025-06-09"));
        assert!(text.contains("Sample ID: MW-2041"));
        assert!(text.contains("DIAGNOSIS RISK: Moderate Risk"));
        assert!(text.contains("Risk Level: 65%"));
        assert!(text.contains("- Cortisol: Elevated (28 ng/mL, Normal: 10-20 ng/mL)"));
        assert!(text.contains("- Consult Healthcare Provider [high]"));
        assert!(text.contains("Laboratory: ASU Mass Spectrometry Facility"));
        assert!(text.contains("No activities logged."));
        assert!(!text.contains("PATIENT PROFILE"));
    }

    #[test]
    fn test_profile_and_activity_sections() {
        let profile = ProfileFields {
            full_name: "Alex Kim".to_string(),
            age: Some(29),
            email: Some(Email::parse("alex@x.com").unwrap()),
            gender: None,
            medical_history: Some("Seasonal allergies".to_string()),
            current_medications: None,
            alert_preferences: AlertPreferences::default(),
            onboarding_completed: true,
        };
        let mut log = ActivityLog::new();
        log.add(
            ActivityDraft {
                activity: "Morning yoga".to_string(),
                category: Some(ActivityCategory::Exercise),
                duration: "30".to_string(),
                mood_before: Some(Mood::new(2).unwrap()),
                mood_after: Some(Mood::new(4).unwrap()),
                notes: "Felt centered".to_string(),
            },
            date(),
        )
        .unwrap();

        let text = render(
            &HealthReport::new(date())
                .with_profile(profile)
                .with_activities(log),
        );
        assert!(text.contains("Name: Alex Kim"));
        assert!(text.contains("Age: 29"));
        assert!(text.contains("Medical History: Seasonal allergies"));
        assert!(!text.contains("Gender:"));
        assert!(text.contains(
            "- 2025-06-09 Morning yoga (Exercise, 30 min): mood Low -> Good - Felt centered"
        ));
        assert!(text.contains("Average mood improvement: +2.0"));
    }

    #[test]
    fn test_demo_shape() {
        let analysis = AnalysisResult::demo();
        assert_eq!(analysis.biomarkers.len(), 4);
        assert_eq!(analysis.insights.len(), 4);
        assert_eq!(analysis.recommendations.len(), 3);
        assert_eq!(analysis.confidence, 87);
    }
}
