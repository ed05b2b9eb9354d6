//! Historical order data feeding the fitter and the cost model
//!
//! Only the columns the risk model needs are read; any other columns in the
//! order export are ignored.

use crate::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io;
use std::path::Path;

/// Cost per disruption used when history gives no usable figure
pub const DEFAULT_BASELINE_COST: f64 = 150.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderRecord {
    pub date_orders: NaiveDate,
    pub late_delivery_risk: u8,
    pub order_profit_per_order: f64,
}

impl OrderRecord {
    pub fn is_disruptive(&self) -> bool {
        self.late_delivery_risk != 0
    }

    /// Loss carried by the order, zero when it made a profit
    pub fn loss(&self) -> f64 {
        self.order_profit_per_order.min(0.0).abs()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderHistory {
    records: Vec<OrderRecord>,
}

impl OrderHistory {
    pub fn new(records: Vec<OrderRecord>) -> Self {
        OrderHistory { records }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let history = Self::from_reader(std::fs::File::open(path)?)?;
        tracing::info!(path = %path.display(), orders = history.len(), "loaded order history");
        Ok(history)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let records = csv_reader
            .deserialize()
            .collect::<std::result::Result<Vec<OrderRecord>, csv::Error>>()?;
        Ok(OrderHistory { records })
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn inter_arrival_times(&self) -> Vec<f64> {
        let dates: Vec<NaiveDate> = self.records.iter().map(|r| r.date_orders).collect();
        inter_arrival_times(&dates)
    }

    pub fn baseline_cost(&self) -> f64 {
        baseline_cost(&self.records)
    }
}

/// Whole-day gaps between consecutive dates, keeping only positive gaps
///
/// Dates are sorted first, so same-day orders collapse into one arrival.
pub fn inter_arrival_times(dates: &[NaiveDate]) -> Vec<f64> {
    if dates.len() < 2 {
        return Vec::new();
    }
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .filter(|days| *days > 0)
        .map(|days| days as f64)
        .collect()
}

/// Mean loss over disruptive orders, or the default when there are none
pub fn baseline_cost(records: &[OrderRecord]) -> f64 {
    let losses: Vec<f64> = records
        .iter()
        .filter(|r| r.is_disruptive())
        .map(OrderRecord::loss)
        .collect();

    let cost = losses.iter().sum::<f64>() / losses.len() as f64;
    if losses.is_empty() || !cost.is_finite() {
        tracing::warn!(
            default = DEFAULT_BASELINE_COST,
            "no disruptive orders with a usable loss, using default baseline cost"
        );
        DEFAULT_BASELINE_COST
    } else {
        cost
    }
}
