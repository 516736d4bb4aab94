use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{score_label, CvAnalysis, JobCriteria};
use crate::errors::AppError;
use crate::extraction::{ExtractionError, UploadedDocument};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ScreeningResponse {
    pub screening_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub job_title: String,
    pub candidates: Vec<RankedCandidate>,
}

/// One candidate in the ranked list, highest score first.
#[derive(Debug, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub original_file_name: String,
    pub verdict: String,
    pub analysis: CvAnalysis,
}

/// POST /api/v1/screenings
///
/// Multipart form: text fields `job_title` (required), `job_description`,
/// `must_haves`, `nice_to_haves`, `deal_breakers`, plus one or more
/// `files` parts (PDF, PNG or JPG resumes). Files are processed one at a
/// time; a file that cannot be read appears in the ranking with a zero
/// score instead of failing the batch.
pub async fn handle_create_screening(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScreeningResponse>, AppError> {
    let (criteria, documents) = read_screening_form(multipart).await?;

    if criteria.title.trim().is_empty() {
        return Err(AppError::Validation("job_title is required".to_string()));
    }
    if documents.is_empty() {
        return Err(AppError::Validation(
            "at least one resume file is required".to_string(),
        ));
    }

    info!(job_title = %criteria.title, files = documents.len(), "screening started");

    let mut scored = Vec::with_capacity(documents.len());
    for document in documents {
        let file_name = document.name.clone();
        let analysis = process_document(&state, document, &criteria).await;
        scored.push((file_name, analysis));
    }

    Ok(Json(ScreeningResponse {
        screening_id: Uuid::new_v4(),
        created_at: Utc::now(),
        job_title: criteria.title.clone(),
        candidates: rank_candidates(scored),
    }))
}

/// Runs extraction and analysis for one file, converting every failure
/// into a zero-score analysis so the batch always continues.
async fn process_document(
    state: &AppState,
    document: UploadedDocument,
    criteria: &JobCriteria,
) -> CvAnalysis {
    let file_name = document.name.clone();
    let extractor = Arc::clone(&state.extractor);

    // Extraction is synchronous (subprocess and CPU bound), so it runs
    // off the async runtime. A panicked task surfaces as a JoinError and
    // is contained like any other per-file failure.
    let extracted = tokio::task::spawn_blocking(move || extractor.extract(&document)).await;

    let text = match extracted {
        Ok(Ok(text)) => text,
        Ok(Err(error)) => {
            warn!(file = %file_name, %error, "extraction failed");
            return CvAnalysis::failed(extraction_message(&file_name, &error));
        }
        Err(join_error) => {
            warn!(file = %file_name, %join_error, "extraction task died");
            return CvAnalysis::failed(format!("The file '{file_name}' could not be processed."));
        }
    };

    match state.analyzer.analyze(&text, criteria).await {
        Ok(analysis) => analysis,
        Err(error) => {
            warn!(file = %file_name, %error, "analysis failed");
            CvAnalysis::failed(format!("An error occurred while analyzing '{file_name}'."))
        }
    }
}

/// Maps extraction failure kinds to the message shown on the candidate
/// card. This is the single place failure kinds become user-facing text.
fn extraction_message(file_name: &str, error: &ExtractionError) -> String {
    match error {
        ExtractionError::UnsupportedFormat => {
            format!("'{file_name}' has an unsupported file format. Upload PDF, PNG or JPG.")
        }
        ExtractionError::OcrEngineMissing => {
            "The OCR engine (tesseract) is not installed on the server, so scanned documents cannot be read."
                .to_string()
        }
        ExtractionError::ImageProcessing(_) => {
            format!("The image '{file_name}' could not be processed.")
        }
        ExtractionError::Failed { .. } => {
            format!("The file '{file_name}' could not be processed.")
        }
    }
}

/// Sorts by score, highest first, and assigns 1-based ranks. The sort is
/// stable: candidates with equal scores keep their upload order.
fn rank_candidates(scored: Vec<(String, CvAnalysis)>) -> Vec<RankedCandidate> {
    let mut scored = scored;
    scored.sort_by(|a, b| b.1.score.cmp(&a.1.score));
    scored
        .into_iter()
        .enumerate()
        .map(|(index, (original_file_name, analysis))| RankedCandidate {
            rank: index + 1,
            original_file_name,
            verdict: score_label(analysis.score).to_string(),
            analysis,
        })
        .collect()
}

/// Pulls criteria fields and resume files out of the multipart form.
async fn read_screening_form(
    mut multipart: Multipart,
) -> Result<(JobCriteria, Vec<UploadedDocument>), AppError> {
    let mut criteria = JobCriteria::default();
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read multipart form: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_title" => criteria.title = read_text(field, &name).await?,
            "job_description" => criteria.description = read_text(field, &name).await?,
            "must_haves" => criteria.must_haves = read_text(field, &name).await?,
            "nice_to_haves" => criteria.nice_to_haves = read_text(field, &name).await?,
            "deal_breakers" => criteria.deal_breakers = read_text(field, &name).await?,
            "files" => {
                let file_name = field.file_name().unwrap_or("unknown").to_string();
                let content = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("failed to read file '{file_name}': {e}"))
                })?;
                tracing::debug!(file = %file_name, bytes = content.len(), "resume received");
                documents.push(UploadedDocument {
                    name: file_name,
                    content,
                });
            }
            other => {
                warn!(field = %other, "ignoring unknown multipart field");
            }
        }
    }

    Ok((criteria, documents))
}

async fn read_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read field '{name}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(score: u8) -> CvAnalysis {
        CvAnalysis {
            candidate_name: format!("Candidate {score}"),
            summary: String::new(),
            score,
            advantages: vec![],
            disadvantages: vec![],
            interview_questions: vec![],
        }
    }

    #[test]
    fn test_rank_candidates_sorts_descending() {
        let ranked = rank_candidates(vec![
            ("low.pdf".to_string(), analysis(20)),
            ("high.pdf".to_string(), analysis(95)),
            ("mid.pdf".to_string(), analysis(60)),
        ]);

        let order: Vec<_> = ranked
            .iter()
            .map(|c| (c.rank, c.original_file_name.as_str(), c.analysis.score))
            .collect();
        assert_eq!(
            order,
            vec![(1, "high.pdf", 95), (2, "mid.pdf", 60), (3, "low.pdf", 20)]
        );
    }

    #[test]
    fn test_rank_candidates_ties_keep_upload_order() {
        let ranked = rank_candidates(vec![
            ("first.pdf".to_string(), analysis(50)),
            ("second.pdf".to_string(), analysis(50)),
        ]);

        assert_eq!(ranked[0].original_file_name, "first.pdf");
        assert_eq!(ranked[1].original_file_name, "second.pdf");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_rank_candidates_attaches_verdict() {
        let ranked = rank_candidates(vec![("cv.pdf".to_string(), analysis(95))]);
        assert_eq!(ranked[0].verdict, "Perfect Match 🔥");
    }

    #[test]
    fn test_extraction_message_names_the_file() {
        let msg = extraction_message("cv.docx", &ExtractionError::UnsupportedFormat);
        assert!(msg.contains("cv.docx"));
        assert!(msg.contains("unsupported"));
    }

    #[test]
    fn test_extraction_message_engine_missing_is_operator_actionable() {
        let msg = extraction_message("scan.pdf", &ExtractionError::OcrEngineMissing);
        assert!(msg.contains("tesseract"));
    }

    #[test]
    fn test_extraction_message_generic_failure_hides_internals() {
        let msg = extraction_message(
            "cv.pdf",
            &ExtractionError::Failed {
                file: "cv.pdf".to_string(),
                reason: "broken xref table at offset 1337".to_string(),
            },
        );
        assert!(msg.contains("cv.pdf"));
        assert!(!msg.contains("xref"));
    }
}
