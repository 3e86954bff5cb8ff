//! Pay structures for job postings and their display strings.
//!
//! A posting stores both the structured numbers (`pay_min`/`pay_max`) and the
//! human-readable `pay_range` string; both are derived here from the
//! employer's form input so they can never drift apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayStructure {
    Hourly,
    Salary,
    HourlyTips,
}

impl PayStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayStructure::Hourly => "hourly",
            PayStructure::Salary => "salary",
            PayStructure::HourlyTips => "hourly_tips",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PayError {
    #[error("pay range requires both a minimum and a maximum")]
    MissingRange,
    #[error("pay minimum must be positive and below the maximum")]
    InvalidRange,
    #[error("base hourly rate is required and must be positive")]
    MissingBaseRate,
}

/// The validated compensation for a posting: the display string plus the
/// structured numbers that get persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PayDetails {
    pub pay_range: String,
    pub pay_min: Option<f64>,
    pub pay_max: Option<f64>,
}

/// Validates the fields for the chosen structure and renders the display
/// string. `hourly_tips` stores the base rate as `pay_min` and leaves
/// `pay_max` unset.
pub fn build_pay_details(
    structure: PayStructure,
    pay_min: Option<f64>,
    pay_max: Option<f64>,
    base_hourly: Option<f64>,
    estimated_tips: Option<f64>,
) -> Result<PayDetails, PayError> {
    match structure {
        PayStructure::Hourly | PayStructure::Salary => {
            let (min, max) = match (pay_min, pay_max) {
                (Some(min), Some(max)) => (min, max),
                _ => return Err(PayError::MissingRange),
            };
            if min <= 0.0 || min >= max {
                return Err(PayError::InvalidRange);
            }
            let pay_range = if structure == PayStructure::Hourly {
                format!("${}-{}/hr", format_amount(min), format_amount(max))
            } else {
                format!("${}-${}/yr", format_amount(min), format_amount(max))
            };
            Ok(PayDetails {
                pay_range,
                pay_min: Some(min),
                pay_max: Some(max),
            })
        }
        PayStructure::HourlyTips => {
            let base = match base_hourly {
                Some(base) if base > 0.0 => base,
                _ => return Err(PayError::MissingBaseRate),
            };
            let pay_range = match estimated_tips {
                Some(tips) if tips > 0.0 => format!(
                    "${}/hr + tips (avg ${}/hr in tips)",
                    format_amount(base),
                    format_amount(tips)
                ),
                _ => format!("${}/hr + tips", format_amount(base)),
            };
            Ok(PayDetails {
                pay_range,
                pay_min: Some(base),
                pay_max: None,
            })
        }
    }
}

/// Renders a dollar amount the way the job cards show it: no trailing `.00`,
/// thousands separators for salary-sized figures, cents kept when present.
fn format_amount(value: f64) -> String {
    let rendered = if value.fract().abs() < f64::EPSILON {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    };

    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((int_part, frac_part)) => (int_part.to_string(), Some(frac_part.to_string())),
        None => (rendered, None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }

    match frac_part {
        Some(frac) => format!("{grouped}.{frac}"),
        None => grouped,
    }
}
