use crate::config::RiskThresholds;
use crate::model::RiskLabel;

/// Classifies a relative gap against the market mean. Both bounds are inclusive.
pub fn classify(gap_pct_vs_mean: Option<f64>, thresholds: &RiskThresholds) -> RiskLabel {
    match gap_pct_vs_mean {
        None => RiskLabel::SemDado,
        Some(gap) if gap >= thresholds.high => RiskLabel::AltoRisco,
        Some(gap) if gap <= thresholds.low => RiskLabel::AbaixoMercado,
        Some(_) => RiskLabel::Alinhado,
    }
}
