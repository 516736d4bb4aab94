// Prompt constants for resume analysis. The cross-cutting JSON-only
// fragment lives in llm_client::prompts and is appended at call time.

/// Role half of the analysis system prompt.
pub const ANALYSIS_ROLE: &str =
    "You are an expert HR technology specialist. You analyze a candidate's resume text \
    against a job description and its criteria with nuance and context, \
    giving partial credit for related skills.";

/// Analysis prompt template. Replace {job_title}, {job_description},
/// {must_haves}, {nice_to_haves}, {deal_breakers} and {cv_text} before
/// sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the candidate's resume against the job description and criteria below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "candidate_name": "Jane Doe",
  "summary": "1-2 sentence summary of the candidate's profile and fit.",
  "score": 72,
  "advantages": ["Top 3-4 key strengths for this role"],
  "disadvantages": ["Top 3-4 key gaps or disadvantages"],
  "interview_questions": ["3 insightful questions probing the gaps"]
}

SCORING GUIDELINES (be fair; consider related skills):
- 90-100 (Perfect Match): meets all must-haves and most nice-to-haves; clear evidence of success in similar roles.
- 75-89 (Great Candidate): meets all must-haves but has some gaps in nice-to-haves; a very strong contender.
- 60-74 (Good Candidate): meets the core must-haves but has noticeable gaps; has potential.
- 45-59 (Fair Candidate): partially meets must-haves; significant gaps or missing key experience.
- 25-44 (Weak Fit): lacks the primary skills for the role but shows relevant domain knowledge; give partial credit.
- 0-24 (Not a Fit): completely unrelated background and skills.

STEPS:
1. Identify the candidate's full name (use "Unknown" if absent).
2. Write the 1-2 sentence summary of their profile and fit.
3. Assign a score from 0 to 100 using the guidelines above.
4. List the top 3-4 key advantages.
5. List the top 3-4 key disadvantages or gaps.
6. Write 3 insightful interview questions based on the disadvantages.

JOB POSITION: {job_title}

JOB DESCRIPTION:
{job_description}

MUST-HAVE SKILLS: {must_haves}
NICE-TO-HAVE SKILLS: {nice_to_haves}
DEAL-BREAKERS: {deal_breakers}

CANDIDATE RESUME TEXT:
{cv_text}"#;
