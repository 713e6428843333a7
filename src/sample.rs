// Seeded sample-data generator for own prices and competitor observations
use crate::config::SampleConfig;
use crate::model::{MonitorError, Result};
use crate::utils::{parse_date, round2};
use chrono::{Days, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

const CLUSTERS: [&str; 2] = ["A", "B"];
const CATEGORIES: [&str; 3] = ["Bebidas", "Snacks", "Higiene"];
const BRANDS: [&str; 3] = ["Marca_X", "Marca_Y", "Marca_Z"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnPriceRow {
    pub date: String,
    pub store_id: String,
    pub sku_id: String,
    pub own_price: f64,
    pub cluster: String,
    pub category: String,
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorPriceRow {
    pub date: String,
    pub store_id: String,
    pub sku_id: String,
    pub competitor: String,
    pub comp_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SampleData {
    pub own: Vec<OwnPriceRow>,
    pub competitors: Vec<CompetitorPriceRow>,
}

fn end_date(cfg: &SampleConfig) -> Result<NaiveDate> {
    match &cfg.end_date {
        Some(text) => parse_date(text)
            .ok_or_else(|| MonitorError::Config(format!("invalid sample end_date: {:?}", text))),
        None => Ok(Local::now().date_naive()),
    }
}

/// Generates `n_days` x `n_stores` x `n_skus` own prices and one observation per
/// competitor around a noisy market reference. Same config gives the same data.
pub fn generate(cfg: &SampleConfig) -> Result<SampleData> {
    let end = end_date(cfg)?;
    let start = end
        .checked_sub_days(Days::new(u64::from(cfg.n_days.saturating_sub(1))))
        .ok_or_else(|| MonitorError::Config("sample date range out of bounds".into()))?;

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let stores: Vec<String> = (1..=cfg.n_stores).map(|i| format!("S{:03}", i)).collect();
    let skus: Vec<String> = (1..=cfg.n_skus).map(|i| format!("SKU{:04}", i)).collect();

    let mut data = SampleData::default();
    for day in start.iter_days().take(cfg.n_days as usize) {
        let date = day.format("%Y-%m-%d").to_string();
        for store in &stores {
            for sku in &skus {
                let base = rng.random_range(3.0..30.0);
                let own_price = round2(base * rng.random_range(0.95..1.05));
                data.own.push(OwnPriceRow {
                    date: date.clone(),
                    store_id: store.clone(),
                    sku_id: sku.clone(),
                    own_price,
                    cluster: pick(&mut rng, &CLUSTERS),
                    category: pick(&mut rng, &CATEGORIES),
                    brand: pick(&mut rng, &BRANDS),
                });

                let market_ref = own_price * rng.random_range(0.92..1.08);
                for competitor in &cfg.competitors {
                    data.competitors.push(CompetitorPriceRow {
                        date: date.clone(),
                        store_id: store.clone(),
                        sku_id: sku.clone(),
                        competitor: competitor.clone(),
                        comp_price: round2(market_ref * rng.random_range(0.95..1.05)),
                    });
                }
            }
        }
    }
    Ok(data)
}

fn pick(rng: &mut StdRng, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

/// Writes both sample CSVs, creating parent directories.
pub fn write_sample(data: &SampleData, own_path: &Path, competitor_path: &Path) -> Result<()> {
    write_rows(&data.own, own_path)?;
    write_rows(&data.competitors, competitor_path)?;
    info!(
        "Own rows: {} | Competitor rows: {}",
        data.own.len(),
        data.competitors.len()
    );
    Ok(())
}

fn write_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}
