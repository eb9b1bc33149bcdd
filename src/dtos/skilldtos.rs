use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::skillmodel::SubmissionDecision;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_has_evidence"))]
pub struct SubmitSkillDto {
    #[validate(
        length(min = 1, max = 100, message = "Skill name is required"),
        custom = "validate_skill_name"
    )]
    pub skill_name: String,

    #[validate(url(message = "Proof link must be a valid URL"))]
    pub proof_link: Option<String>,

    pub proof_file: Option<String>,

    pub description: Option<String>,
}

fn validate_skill_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut error = ValidationError::new("blank_skill_name");
        error.message = Some("Skill name is required".into());
        return Err(error);
    }
    Ok(())
}

fn validate_has_evidence(dto: &SubmitSkillDto) -> Result<(), ValidationError> {
    let present = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());

    if present(&dto.proof_link) || present(&dto.proof_file) || present(&dto.description) {
        Ok(())
    } else {
        let mut error = ValidationError::new("missing_evidence");
        error.message = Some("Provide a link, a file or a description as evidence".into());
        Err(error)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecideSubmissionDto {
    pub decision: SubmissionDecision,
}
