use crate::analyzer::classifier::classify;
use crate::config::RiskThresholds;
use crate::loader::records::is_attribute;
use crate::model::{
    CompetitorSummary, GapMetrics, JoinedRow, MonitorColumn, MonitorRow, MonitorTable,
};

/// Leading output columns, in display order. Absent ones are skipped.
pub const PREFERRED_COLUMNS: [&str; 16] = [
    "date",
    "store_id",
    "sku_id",
    "cluster",
    "category",
    "brand",
    "own_price",
    "comp_price_mean",
    "comp_price_min",
    "comp_price_max",
    "comp_n_obs",
    "gap_abs_vs_mean",
    "gap_pct_vs_mean",
    "comp_range_pct",
    "comp_cv",
    "risk_label",
];

const DERIVED_COLUMNS: [MonitorColumn; 11] = [
    MonitorColumn::CompPriceMean,
    MonitorColumn::CompPriceMin,
    MonitorColumn::CompPriceMax,
    MonitorColumn::CompPriceStd,
    MonitorColumn::CompNObs,
    MonitorColumn::GapAbsVsMean,
    MonitorColumn::GapPctVsMean,
    MonitorColumn::CompRange,
    MonitorColumn::CompRangePct,
    MonitorColumn::CompCv,
    MonitorColumn::RiskLabel,
];

/// Derives gap and dispersion metrics per row and classifies risk.
/// `header` is the own-price header; `attribute_columns` its pass-through subset.
pub fn compute_metrics(
    joined: Vec<JoinedRow>,
    header: &[String],
    attribute_columns: &[String],
    thresholds: &RiskThresholds,
) -> MonitorTable {
    let rows = joined
        .into_iter()
        .map(|row| {
            let metrics = gap_metrics(row.record.own_price, row.summary.as_ref());
            MonitorRow {
                risk_label: classify(metrics.gap_pct_vs_mean, thresholds),
                record: row.record,
                summary: row.summary,
                metrics,
            }
        })
        .collect();

    MonitorTable {
        columns: output_columns(header, attribute_columns),
        attribute_columns: attribute_columns.to_vec(),
        rows,
    }
}

pub fn gap_metrics(own_price: Option<f64>, summary: Option<&CompetitorSummary>) -> GapMetrics {
    let Some(s) = summary else {
        return GapMetrics::default();
    };
    let mean = s.comp_price_mean;
    // Undefined relative to a zero or negative market level.
    let relative = |value: f64| (mean > 0.0).then(|| value / mean);

    let gap_abs_vs_mean = own_price.map(|p| p - mean);
    let comp_range = s.comp_price_max - s.comp_price_min;
    GapMetrics {
        gap_abs_vs_mean,
        gap_pct_vs_mean: gap_abs_vs_mean.and_then(relative),
        comp_range: Some(comp_range),
        comp_range_pct: relative(comp_range),
        comp_cv: relative(s.comp_price_std),
    }
}

/// Preferred columns first, then everything else in natural order: own-price header,
/// then the competitor and derived columns.
pub fn output_columns(header: &[String], attribute_columns: &[String]) -> Vec<MonitorColumn> {
    let mut natural = Vec::with_capacity(header.len() + DERIVED_COLUMNS.len());
    let mut next_attribute = 0;
    for name in header {
        let column = match name.as_str() {
            "date" => MonitorColumn::Date,
            "store_id" => MonitorColumn::StoreId,
            "sku_id" => MonitorColumn::SkuId,
            "own_price" => MonitorColumn::OwnPrice,
            other if is_attribute(other) => {
                next_attribute += 1;
                MonitorColumn::Attribute(next_attribute - 1)
            }
            // Replaced by the computed column of the same name.
            _ => continue,
        };
        natural.push(column);
    }
    natural.extend(DERIVED_COLUMNS);

    let mut ordered: Vec<MonitorColumn> = PREFERRED_COLUMNS
        .iter()
        .filter_map(|p| {
            natural
                .iter()
                .find(|c| c.name(attribute_columns) == *p)
                .copied()
        })
        .collect();
    for column in natural {
        if !ordered.contains(&column) {
            ordered.push(column);
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OwnPriceRecord, PriceKey, RiskLabel};

    fn summary(mean: f64, min: f64, max: f64, std: f64) -> CompetitorSummary {
        CompetitorSummary {
            key: PriceKey::new("2026-01-01", "1", "10"),
            comp_price_mean: mean,
            comp_price_min: min,
            comp_price_max: max,
            comp_price_std: std,
            comp_n_obs: 2,
        }
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn gap_zero_when_price_equals_mean() {
        let m = gap_metrics(Some(10.0), Some(&summary(10.0, 9.0, 11.0, 2f64.sqrt())));
        assert_eq!(m.gap_abs_vs_mean, Some(0.0));
        assert_eq!(m.gap_pct_vs_mean, Some(0.0));
        assert_eq!(m.comp_range, Some(2.0));
        assert_eq!(m.comp_range_pct, Some(0.2));
        assert!((m.comp_cv.unwrap() - 2f64.sqrt() / 10.0).abs() < 1e-12);
    }

    #[test]
    fn relative_metrics_missing_for_non_positive_mean() {
        let m = gap_metrics(Some(1.0), Some(&summary(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(m.gap_abs_vs_mean, Some(1.0));
        assert_eq!(m.gap_pct_vs_mean, None);
        assert_eq!(m.comp_range_pct, None);
        assert_eq!(m.comp_cv, None);
    }

    #[test]
    fn no_match_has_no_metrics() {
        assert_eq!(gap_metrics(Some(5.0), None), GapMetrics::default());
    }

    #[test]
    fn classifies_with_given_thresholds() {
        let joined = vec![JoinedRow {
            record: OwnPriceRecord {
                key: PriceKey::new("2026-01-01", "1", "10"),
                own_price: Some(11.0),
                attributes: vec![],
            },
            summary: Some(summary(10.0, 10.0, 10.0, 0.0)),
        }];
        let header = headers(&["date", "store_id", "sku_id", "own_price"]);
        let strict = compute_metrics(joined.clone(), &header, &[], &RiskThresholds::default());
        assert_eq!(strict.rows[0].risk_label, RiskLabel::AltoRisco);
        let loose = RiskThresholds { high: 0.2, low: -0.2 };
        let relaxed = compute_metrics(joined, &header, &[], &loose);
        assert_eq!(relaxed.rows[0].risk_label, RiskLabel::Alinhado);
    }

    #[test]
    fn column_order_puts_preferred_first() {
        let header = headers(&[
            "date", "store_id", "sku_id", "own_price", "cluster", "category", "brand",
        ]);
        let attributes = headers(&["cluster", "category", "brand"]);
        let columns = output_columns(&header, &attributes);
        let names: Vec<&str> = columns.iter().map(|c| c.name(&attributes)).collect();
        let mut expected = PREFERRED_COLUMNS.to_vec();
        expected.extend(["comp_price_std", "comp_range"]);
        assert_eq!(names, expected);
    }

    #[test]
    fn computed_column_replaces_own_column_of_same_name() {
        let header = headers(&["date", "store_id", "sku_id", "own_price", "comp_range", "brand"]);
        let attributes = headers(&["brand"]);
        let columns = output_columns(&header, &attributes);
        let names: Vec<&str> = columns.iter().map(|c| c.name(&attributes)).collect();
        assert_eq!(names.iter().filter(|n| **n == "comp_range").count(), 1);
        assert_eq!(names.len(), 5 + DERIVED_COLUMNS.len());
        assert!(columns.contains(&MonitorColumn::CompRange));
    }

    #[test]
    fn extra_columns_follow_in_header_order() {
        let header = headers(&["region", "sku_id", "store_id", "date", "own_price", "channel"]);
        let attributes = headers(&["region", "channel"]);
        let columns = output_columns(&header, &attributes);
        let names: Vec<&str> = columns.iter().map(|c| c.name(&attributes)).collect();
        assert_eq!(&names[..4], &["date", "store_id", "sku_id", "own_price"]);
        assert_eq!(
            &names[names.len() - 4..],
            &["region", "channel", "comp_price_std", "comp_range"]
        );
        assert_eq!(names.len(), 6 + DERIVED_COLUMNS.len());
    }
}
