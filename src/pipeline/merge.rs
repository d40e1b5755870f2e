//! Grade resolution for voted validity/quality feedback.
//!
//! Confidence-based downgrades happen here, before hint scrubbing. Every
//! field-shape problem is reported as a [`MergeError`] so the caller can fall
//! back to the `"-"` record instead of failing the request.

use crate::error::MergeError;
use crate::parser::record::{
    OVERALL_GRADE, QUALITY_CONFIDENCE, QUALITY_GRADE, VALIDITY_CONFIDENCE, VALIDITY_GRADE,
};
use crate::parser::FeedbackRecord;
use crate::vote::parse_percent;
use tracing::warn;

pub const VALIDITY_DOWNGRADE_BELOW: i64 = 75;
pub const QUALITY_DOWNGRADE_BELOW: i64 = 80;

/// Grades as voted, before any downgrade
#[derive(Debug, Clone, PartialEq)]
pub struct VotedGrades {
    pub validity: String,
    pub quality: Option<String>,
}

fn required_grade(record: &FeedbackRecord, key: &'static str) -> Result<String, MergeError> {
    record
        .get_str(key)
        .map(str::to_string)
        .ok_or(MergeError::MissingField(key))
}

fn required_percent(record: &FeedbackRecord, key: &'static str) -> Result<i64, MergeError> {
    let text = record.get_str(key).ok_or(MergeError::MissingField(key))?;
    parse_percent(text).ok_or_else(|| MergeError::BadPercentage {
        field: key,
        value: text.to_string(),
    })
}

fn downgrade(record: &mut FeedbackRecord, key: &str, label: &str, percent: i64) {
    warn!("Downgrading {} grade A to B (confidence {}%)", label, percent);
    record.insert(key, "B");
}

/// Read voted grades and apply confidence downgrades in place.
///
/// Checks run in this exact order, all against the grades as voted:
/// 1. validity A with validity confidence < 75
/// 2. quality A with validity confidence < 75
/// 3. validity A with validity confidence < 75 (repeat of 1)
/// 4. quality A with quality confidence < 80
///
/// Nothing is modified when an error is returned.
pub fn apply_downgrades(
    validity: &mut FeedbackRecord,
    quality: Option<&mut FeedbackRecord>,
) -> Result<VotedGrades, MergeError> {
    let validity_grade = required_grade(validity, VALIDITY_GRADE)?;
    let validity_percent = required_percent(validity, VALIDITY_CONFIDENCE)?;

    let Some(quality) = quality else {
        if validity_grade == "A" && validity_percent < VALIDITY_DOWNGRADE_BELOW {
            downgrade(validity, VALIDITY_GRADE, "validity", validity_percent);
        }
        return Ok(VotedGrades {
            validity: validity_grade,
            quality: None,
        });
    };

    let quality_grade = required_grade(quality, QUALITY_GRADE)?;
    let quality_percent = required_percent(quality, QUALITY_CONFIDENCE)?;

    if validity_grade == "A" && validity_percent < VALIDITY_DOWNGRADE_BELOW {
        downgrade(validity, VALIDITY_GRADE, "validity", validity_percent);
    }
    if quality_grade == "A" && validity_percent < VALIDITY_DOWNGRADE_BELOW {
        downgrade(quality, QUALITY_GRADE, "quality", validity_percent);
    }
    if validity_grade == "A" && validity_percent < VALIDITY_DOWNGRADE_BELOW {
        downgrade(validity, VALIDITY_GRADE, "validity", validity_percent);
    }
    if quality_grade == "A" && quality_percent < QUALITY_DOWNGRADE_BELOW {
        downgrade(quality, QUALITY_GRADE, "quality", quality_percent);
    }

    Ok(VotedGrades {
        validity: validity_grade,
        quality: Some(quality_grade),
    })
}

/// Shallow-merge final validity and quality records and stamp the overall
/// grade: both letters concatenated, or the validity letter alone.
pub fn combine(validity: FeedbackRecord, quality: Option<FeedbackRecord>) -> FeedbackRecord {
    let validity_grade = validity.get_str(VALIDITY_GRADE).unwrap_or("-").to_string();
    let overall = match &quality {
        Some(q) => format!(
            "{}{}",
            validity_grade,
            q.get_str(QUALITY_GRADE).unwrap_or("-")
        ),
        None => validity_grade,
    };

    let mut merged = validity;
    if let Some(quality) = quality {
        merged.merge(quality);
    }
    merged.insert(OVERALL_GRADE, overall);
    merged
}

/// Record returned when grades cannot be resolved: both grades forced to
/// `"-"` and the unscrubbed records merged as they are.
pub fn fallback(mut validity: FeedbackRecord, quality: Option<FeedbackRecord>) -> FeedbackRecord {
    validity.insert(VALIDITY_GRADE, "-");
    if let Some(mut quality) = quality {
        quality.insert(QUALITY_GRADE, "-");
        validity.merge(quality);
    }
    validity.insert(OVERALL_GRADE, "-");
    validity
}
