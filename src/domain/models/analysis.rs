use anyhow::bail;
use anyhow::Result;
use strum::EnumIter;
use strum::EnumVariantNames;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum AnalysisKind {
    AtsScore,
    JobBreakdown,
}

impl AnalysisKind {
    pub fn parse(text: &str) -> Result<AnalysisKind> {
        if text == "ats-score" || text == "ats" {
            return Ok(AnalysisKind::AtsScore);
        }
        if text == "job-breakdown" || text == "breakdown" {
            return Ok(AnalysisKind::JobBreakdown);
        }

        bail!(format!("{text} is not a valid analysis."))
    }
}
