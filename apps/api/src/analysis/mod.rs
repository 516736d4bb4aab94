//! Resume analysis: scoring an extracted resume against job criteria.

pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use self::prompts::{ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_ROLE};

/// The screening form: what the role needs, straight from the recruiter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobCriteria {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub must_haves: String,
    #[serde(default)]
    pub nice_to_haves: String,
    #[serde(default)]
    pub deal_breakers: String,
}

/// Per-candidate analysis result.
///
/// The list fields default to empty so a model response that omits one
/// still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvAnalysis {
    pub candidate_name: String,
    pub summary: String,
    /// Compatibility score, 0–100.
    pub score: u8,
    #[serde(default)]
    pub advantages: Vec<String>,
    #[serde(default)]
    pub disadvantages: Vec<String>,
    #[serde(default)]
    pub interview_questions: Vec<String>,
}

impl CvAnalysis {
    /// Zero-score result for a file that yielded no readable text.
    pub fn unreadable() -> Self {
        CvAnalysis {
            candidate_name: "Unknown".to_string(),
            summary: "Analysis could not be performed as the content could not be read."
                .to_string(),
            score: 0,
            advantages: vec![],
            disadvantages: vec![
                "Could not extract readable text from the resume file.".to_string()
            ],
            interview_questions: vec![],
        }
    }

    /// Zero-score result for a file whose processing failed outright.
    /// `reason` is the user-facing diagnostic chosen by the caller.
    pub fn failed(reason: impl Into<String>) -> Self {
        CvAnalysis {
            candidate_name: "Unknown".to_string(),
            summary: "Analysis could not be performed for this file.".to_string(),
            score: 0,
            advantages: vec![],
            disadvantages: vec![reason.into()],
            interview_questions: vec![],
        }
    }

    /// The model is instructed to stay in 0–100 but is not trusted to.
    fn clamp_score(mut self) -> Self {
        self.score = self.score.min(100);
        self
    }
}

/// Verdict band for a score, shown next to each ranked candidate.
pub fn score_label(score: u8) -> &'static str {
    match score {
        90.. => "Perfect Match 🔥",
        75..=89 => "Great Candidate 🌟",
        60..=74 => "Good Candidate 👍",
        45..=59 => "Fair Candidate 🤔",
        25..=44 => "Weak Fit 😔",
        _ => "Not a Fit 💀",
    }
}

/// The analyzer seam. Carried in `AppState` as `Arc<dyn CvAnalyzer>` so
/// handlers never know which backend scored the candidate.
#[async_trait]
pub trait CvAnalyzer: Send + Sync {
    async fn analyze(&self, cv_text: &str, criteria: &JobCriteria)
        -> Result<CvAnalysis, AppError>;
}

/// Claude-backed analyzer.
pub struct LlmCvAnalyzer {
    llm: LlmClient,
}

impl LlmCvAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl CvAnalyzer for LlmCvAnalyzer {
    async fn analyze(
        &self,
        cv_text: &str,
        criteria: &JobCriteria,
    ) -> Result<CvAnalysis, AppError> {
        // An unreadable file is not an error: it scores zero with an
        // explicit gap note and the batch moves on.
        if cv_text.trim().is_empty() {
            return Ok(CvAnalysis::unreadable());
        }

        let system = format!("{ANALYSIS_ROLE} {JSON_ONLY_SYSTEM}");
        let prompt = build_analysis_prompt(criteria, cv_text);

        let analysis = self
            .llm
            .call_json::<CvAnalysis>(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("resume analysis failed: {e}")))?;

        Ok(analysis.clamp_score())
    }
}

/// Fills the analysis template. Free-standing so tests can check the
/// substitution without an LLM.
fn build_analysis_prompt(criteria: &JobCriteria, cv_text: &str) -> String {
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{job_title}", &criteria.title)
        .replace("{job_description}", &criteria.description)
        .replace("{must_haves}", &criteria.must_haves)
        .replace("{nice_to_haves}", &criteria.nice_to_haves)
        .replace("{deal_breakers}", &criteria.deal_breakers)
        .replace("{cv_text}", cv_text)
}
