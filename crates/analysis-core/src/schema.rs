//! Ingestion boundary: maps provider-shaped JSON onto the internal records.
//!
//! Statement lists are read either bare or wrapped as `{"quarterlyReports": [...]}`.
//! Monthly prices are read either as canonical records or as a provider
//! time-series object, through an explicit per-schema field table.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::AnalysisError;
use crate::stats::safe_number;
use crate::types::{CompanyFinancials, MonthlyPricePoint};

/// Serde adapter: read any JSON value through [`safe_number`].
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(safe_number(&value))
}

/// Field names for one provider's monthly price records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFieldMap {
    pub open: &'static str,
    pub high: &'static str,
    pub low: &'static str,
    pub close: &'static str,
    pub adjusted_close: Option<&'static str>,
    pub volume: &'static str,
    pub dividend: Option<&'static str>,
}

/// Known shapes of a raw monthly time-series payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSchema {
    /// `TIME_SERIES_MONTHLY_ADJUSTED`, keyed by `"Monthly Adjusted Time Series"`.
    MonthlyAdjustedV1,
    /// `TIME_SERIES_MONTHLY`, keyed by `"Monthly Time Series"`.
    MonthlyV1,
}

impl PriceSchema {
    pub const ALL: [PriceSchema; 2] = [PriceSchema::MonthlyAdjustedV1, PriceSchema::MonthlyV1];

    pub fn series_key(&self) -> &'static str {
        match self {
            PriceSchema::MonthlyAdjustedV1 => "Monthly Adjusted Time Series",
            PriceSchema::MonthlyV1 => "Monthly Time Series",
        }
    }

    pub fn fields(&self) -> PriceFieldMap {
        match self {
            PriceSchema::MonthlyAdjustedV1 => PriceFieldMap {
                open: "1. open",
                high: "2. high",
                low: "3. low",
                close: "4. close",
                adjusted_close: Some("5. adjusted close"),
                volume: "6. volume",
                dividend: Some("7. dividend amount"),
            },
            PriceSchema::MonthlyV1 => PriceFieldMap {
                open: "1. open",
                high: "2. high",
                low: "3. low",
                close: "4. close",
                adjusted_close: None,
                volume: "5. volume",
                dividend: None,
            },
        }
    }

    /// First schema whose series key is present in `payload`.
    pub fn detect(payload: &Value) -> Option<PriceSchema> {
        Self::ALL
            .into_iter()
            .find(|schema| payload.get(schema.series_key()).is_some())
    }

    /// Map a provider payload to ascending, date-unique price points.
    pub fn parse(&self, payload: &Value) -> Result<Vec<MonthlyPricePoint>, AnalysisError> {
        let series = payload
            .get(self.series_key())
            .and_then(Value::as_object)
            .ok_or_else(|| {
                AnalysisError::InvalidData(format!("missing \"{}\" object", self.series_key()))
            })?;

        let fields = self.fields();
        let read = |record: &Value, key: Option<&str>| {
            key.and_then(|k| record.get(k)).map_or(0.0, safe_number)
        };

        let mut by_date = BTreeMap::new();
        for (raw_date, record) in series {
            let date = parse_date(raw_date)?;
            let close = read(record, Some(fields.close));
            let adjusted = read(record, fields.adjusted_close);
            by_date.insert(
                date,
                MonthlyPricePoint {
                    date,
                    open: read(record, Some(fields.open)),
                    high: read(record, Some(fields.high)),
                    low: read(record, Some(fields.low)),
                    close,
                    adjusted_close: if adjusted != 0.0 { adjusted } else { close },
                    volume: read(record, Some(fields.volume)),
                    dividend: read(record, fields.dividend),
                },
            );
        }
        Ok(by_date.into_values().collect())
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AnalysisError::InvalidData(format!("bad date {raw:?}: {e}")))
}

/// Read a statement list that is either a bare array or `{"quarterlyReports": [...]}`.
pub fn statement_list<T: DeserializeOwned>(value: Option<&Value>) -> Result<Vec<T>, AnalysisError> {
    let list = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(v @ Value::Array(_)) => v,
        Some(v) => match v.get("quarterlyReports") {
            Some(inner) => inner,
            None => {
                return Err(AnalysisError::InvalidData(
                    "statement list must be an array or contain \"quarterlyReports\"".to_string(),
                ))
            }
        },
    };
    Ok(Vec::<T>::deserialize(list)?)
}

/// Read monthly prices as canonical records or a known provider payload.
pub fn price_list(value: Option<&Value>) -> Result<Vec<MonthlyPricePoint>, AnalysisError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v @ Value::Array(_)) => {
            let points = Vec::<MonthlyPricePoint>::deserialize(v)?;
            let by_date: BTreeMap<NaiveDate, MonthlyPricePoint> =
                points.into_iter().map(|p| (p.date, p)).collect();
            Ok(by_date.into_values().collect())
        }
        Some(v) => {
            if let Some(inner) = v.get("monthlyPrices") {
                return price_list(Some(inner));
            }
            let schema = PriceSchema::detect(v).ok_or_else(|| {
                AnalysisError::InvalidData("unrecognized monthly price payload".to_string())
            })?;
            schema.parse(v)
        }
    }
}

impl CompanyFinancials {
    /// Build a bundle from a JSON document with `incomeStatements`,
    /// `cashFlowStatements`, `balanceSheets` and `monthlyPrices` entries.
    pub fn from_value(value: &Value) -> Result<Self, AnalysisError> {
        if !value.is_object() {
            return Err(AnalysisError::InvalidData(
                "statement bundle must be a JSON object".to_string(),
            ));
        }
        Ok(Self {
            symbol: value
                .get("symbol")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_uppercase()),
            income_statements: statement_list(value.get("incomeStatements"))?,
            cash_flow_statements: statement_list(value.get("cashFlowStatements"))?,
            balance_sheets: statement_list(value.get("balanceSheets"))?,
            monthly_prices: price_list(value.get("monthlyPrices"))?,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AnalysisError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value)
    }
}
