//! DTOs for decoding accrual service responses.
//!
//! Amounts arrive as JSON decimals and are converted to minor units here, so
//! nothing past this module ever sees a fractional value.

use serde::Deserialize;

use crate::domain::ports::AccrualLookup;
use crate::domain::{Money, OrderNumber};

#[derive(Debug, Deserialize)]
pub(super) struct AccrualResponseDto {
    pub(super) order: String,
    pub(super) status: AccrualStatusDto,
    #[serde(default)]
    pub(super) accrual: Option<serde_json::Number>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum AccrualStatusDto {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl AccrualResponseDto {
    pub(super) fn into_lookup(self, requested: &OrderNumber) -> Result<AccrualLookup, String> {
        if self.order != requested.as_ref() {
            return Err(format!(
                "response describes order {} instead of {requested}",
                self.order
            ));
        }

        match self.status {
            AccrualStatusDto::Registered => Ok(AccrualLookup::Unknown),
            AccrualStatusDto::Processing => Ok(AccrualLookup::Processing),
            AccrualStatusDto::Invalid => Ok(AccrualLookup::Invalid),
            AccrualStatusDto::Processed => {
                let accrual = match self.accrual {
                    Some(raw) => Money::from_decimal(&raw.to_string())
                        .map_err(|err| format!("invalid accrual for order {requested}: {err}"))?,
                    None => Money::ZERO,
                };
                if accrual.is_negative() {
                    return Err(format!("negative accrual {accrual} for order {requested}"));
                }
                Ok(AccrualLookup::Processed { accrual })
            }
        }
    }
}
