#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;

use anyhow::Result;

use super::prompts::EMPTY_RESPONSE_FALLBACK;
use crate::domain::models::AnalysisKind;
use crate::domain::models::Author;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendPrompt;
use crate::domain::models::PromptTurn;

const ATS_SCORE_PROMPT: &str = "You are an applicant tracking system auditor. Score the provided resume text for ATS compatibility from 0 to 100, then list the specific issues found (formatting that parsers drop, missing keywords, vague bullets) and one concrete fix for each. Start the reply with 'Score: N/100'.";

const JOB_BREAKDOWN_PROMPT: &str = "You are a job-description analyst. Break the provided job posting into: must-have requirements, nice-to-have requirements, hidden expectations implied by the wording, and the five keywords most likely used to screen applicants. Keep each section to short bullets.";

fn instruction(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::AtsScore => return ATS_SCORE_PROMPT,
        AnalysisKind::JobBreakdown => return JOB_BREAKDOWN_PROMPT,
    }
}

/// One-shot payload: the analysis instruction plus the pasted text as a
/// single user turn. No conversation history is attached.
pub fn build_analysis_prompt(kind: AnalysisKind, input: &str) -> BackendPrompt {
    return BackendPrompt::new(
        instruction(kind),
        vec![PromptTurn::new(Author::User, input)],
    );
}

pub async fn run_analysis(backend: &BackendBox, kind: AnalysisKind, input: &str) -> Result<String> {
    let res = backend.get_completion(build_analysis_prompt(kind, input)).await?;
    if res.text.trim().is_empty() {
        return Ok(EMPTY_RESPONSE_FALLBACK.to_string());
    }

    return Ok(res.text);
}
