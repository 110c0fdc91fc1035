//! Room photo analysis: the assessment record, response parsing and score bands

use std::fmt;

use async_trait::async_trait;
use roomiex_store::Blob;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AnalysisError;

pub const MAX_SCORE: f64 = 10.0;

/// Instructions sent alongside the photo
pub const ANALYSIS_PROMPT: &str = r#"You are an expert room quality inspector. Analyze this room image and provide a detailed assessment.

Rate the following aspects on a scale of 0-10:
1. Lighting (natural light, brightness, lamp quality)
2. Cleanliness (tidiness, maintenance, hygiene)
3. Space (room size, organization, storage)
4. Ventilation (windows, air flow, freshness)
5. Furnishing (furniture quality, comfort, aesthetics)

Also provide:
- Overall score (average of all categories)
- Brief summary of the room
- 3-5 specific improvement suggestions

Return ONLY a valid JSON object with this structure (no markdown, no backticks):
{
  "overallScore": 7.5,
  "lighting": { "score": 8, "feedback": "Good natural light from large windows..." },
  "cleanliness": { "score": 7, "feedback": "Room is generally clean but..." },
  "space": { "score": 7, "feedback": "Adequate space for a single person..." },
  "ventilation": { "score": 8, "feedback": "Good airflow with windows..." },
  "furnishing": { "score": 7, "feedback": "Basic furniture in decent condition..." },
  "summary": "A comfortable, well-lit room suitable for...",
  "improvements": [
    "Add more storage solutions",
    "Consider a fresh coat of paint",
    "Improve cable management"
  ]
}"#;

/// Image analysis collaborator
#[async_trait]
pub trait RoomAnalyzer: Send + Sync {
    async fn analyze(&self, photo: &Blob) -> Result<RoomAnalysis, AnalysisError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub feedback: String,
}

/// Structured quality assessment of one room photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAnalysis {
    pub overall_score: f64,
    pub lighting: CategoryScore,
    pub cleanliness: CategoryScore,
    pub space: CategoryScore,
    pub ventilation: CategoryScore,
    pub furnishing: CategoryScore,
    pub summary: String,
    #[serde(default)]
    pub improvements: Vec<String>,
}

impl RoomAnalysis {
    /// Category name and score pairs, in prompt order
    pub fn categories(&self) -> [(&'static str, &CategoryScore); 5] {
        [
            ("lighting", &self.lighting),
            ("cleanliness", &self.cleanliness),
            ("space", &self.space),
            ("ventilation", &self.ventilation),
            ("furnishing", &self.furnishing),
        ]
    }

    /// Reject any score outside 0-10
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let overall = std::iter::once(("overall", self.overall_score));
        let scored = self.categories().map(|(name, category)| (name, category.score));

        for (category, score) in overall.chain(scored) {
            if !(0.0..=MAX_SCORE).contains(&score) {
                return Err(AnalysisError::InvalidScore {
                    category: category.to_string(),
                    score,
                });
            }
        }
        Ok(())
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::of(self.overall_score)
    }

    pub fn to_value(&self) -> Result<Value, AnalysisError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    NeedsWork,
}

impl ScoreBand {
    pub fn of(score: f64) -> Self {
        if score >= 9.0 {
            ScoreBand::Excellent
        } else if score >= 7.0 {
            ScoreBand::Good
        } else {
            ScoreBand::NeedsWork
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBand::Excellent => write!(f, "Excellent"),
            ScoreBand::Good => write!(f, "Good"),
            ScoreBand::NeedsWork => write!(f, "Needs Improvement"),
        }
    }
}

/// Parse the model's text answer, tolerating a Markdown code fence around it
pub fn parse_analysis_text(text: &str) -> Result<RoomAnalysis, AnalysisError> {
    let trimmed = text.trim();
    let json = if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    };

    let analysis: RoomAnalysis = serde_json::from_str(json)?;
    analysis.validate()?;
    Ok(analysis)
}

/// Extract `candidates[0].content.parts[0].text` and parse it
pub fn parse_response(body: &Value) -> Result<RoomAnalysis, AnalysisError> {
    let text = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .ok_or(AnalysisError::EmptyResponse)?;

    parse_analysis_text(text)
}
