use crate::types::{Assessment, PurificationMethod, RiskLevel};

pub const DEFAULT_MAX_SAFE: usize = 10;
pub const DEFAULT_HIGH_RISK: usize = 50;

/// Rule-based mapping from particle count to a potability verdict.
///
/// Both cut points are inclusive on the lower bucket: `max_safe` itself is
/// still potable and `high_risk` itself is still moderate. If `max_safe`
/// exceeds `high_risk` the moderate bucket is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    pub max_safe: usize,
    pub high_risk: usize,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            max_safe: DEFAULT_MAX_SAFE,
            high_risk: DEFAULT_HIGH_RISK,
        }
    }
}

impl Classifier {
    pub fn new(max_safe: usize, high_risk: usize) -> Self {
        Self { max_safe, high_risk }
    }

    pub fn classify(&self, object_count: usize) -> Assessment {
        if object_count <= self.max_safe {
            Assessment {
                potable: true,
                risk_level: RiskLevel::Low,
                purification_method: PurificationMethod::None,
            }
        } else if object_count <= self.high_risk {
            Assessment {
                potable: false,
                risk_level: RiskLevel::Moderate,
                purification_method: PurificationMethod::BoilOrChlorinate,
            }
        } else {
            Assessment {
                potable: false,
                risk_level: RiskLevel::High,
                purification_method: PurificationMethod::FilterUvOrRo,
            }
        }
    }
}
