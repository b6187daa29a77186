//! Domain records stored in the baskets keyspace.

use cdrs_tokio::frame::TryFromUdt;
use cdrs_tokio::query::QueryValues;
use cdrs_tokio::query_values;
use cdrs_tokio::types::list::List;
use cdrs_tokio::types::rows::Row;
use cdrs_tokio::types::udt::Udt;
use cdrs_tokio::types::{AsRustType, IntoRustByName};
use cdrs_tokio_helpers_derive::{IntoCdrsValue, TryFromUdt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accessor::{Record, RecordKind};
use crate::error::{StorageError, StorageResult};

/// One line of a basket, mapped onto the `basket_item` user-defined type.
///
/// Field order matches the UDT declaration and must not be reordered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, IntoCdrsValue, TryFromUdt)]
pub struct BasketItem {
    /// Quantity of the product in the basket.
    pub product_qty: i32,
    /// Total amount paid for this line.
    pub amount_paid: f64,
    /// Product identifier.
    pub product_code: String,
}

/// Processing state of a basket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasketStatus {
    /// The basket is still being filled.
    Open,
    /// The basket is waiting to be processed.
    Pending,
    /// The basket was checked out.
    Finished,
    /// The basket was abandoned or voided.
    Canceled,
}

impl BasketStatus {
    /// The wire/storage representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            BasketStatus::Open => "Open",
            BasketStatus::Pending => "Pending",
            BasketStatus::Finished => "Finished",
            BasketStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for BasketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BasketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(BasketStatus::Open),
            "Pending" => Ok(BasketStatus::Pending),
            "Finished" => Ok(BasketStatus::Finished),
            "Canceled" => Ok(BasketStatus::Canceled),
            other => Err(format!("unknown basket status: {other}")),
        }
    }
}

/// A customer basket: the primary record of this service.
///
/// Serialized field names are the public JSON contract and match the
/// column names of the `baskets.baskets` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    /// Row key. Generated when absent on ingest.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Store that produced the basket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_code: Option<String>,

    /// Processing state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basket_status: Option<BasketStatus>,

    /// When the basket was processed, millisecond precision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_date: Option<DateTime<Utc>>,

    /// Basket lines. A missing column reads back as an empty list.
    #[serde(default)]
    pub items: Vec<BasketItem>,
}

impl Basket {
    /// Decodes a CQL row into a basket.
    fn decode(row: Row) -> StorageResult<Self> {
        const TABLE: &str = "baskets.baskets";
        let invalid = |message: String| StorageError::InvalidRow {
            table: TABLE,
            message,
        };

        let id: Uuid = row
            .get_r_by_name("id")
            .map_err(|e| invalid(format!("id: {e}")))?;
        let store_code: Option<String> = row
            .get_by_name("store_code")
            .map_err(|e| invalid(format!("store_code: {e}")))?;
        let basket_status = IntoRustByName::<String>::get_by_name(&row, "basket_status")
            .map_err(|e| invalid(format!("basket_status: {e}")))?
            .map(|s| s.parse::<BasketStatus>().map_err(invalid))
            .transpose()?;
        let processing_date = IntoRustByName::<i64>::get_by_name(&row, "processing_date")
            .map_err(|e| invalid(format!("processing_date: {e}")))?
            .and_then(DateTime::from_timestamp_millis);

        let items = match IntoRustByName::<List>::get_by_name(&row, "items")
            .map_err(|e| invalid(format!("items: {e}")))?
        {
            Some(list) => {
                let udts: Vec<Udt> = list
                    .as_r_type()
                    .map_err(|e| invalid(format!("items: {e}")))?;
                udts.into_iter()
                    .map(|udt| {
                        BasketItem::try_from_udt(udt).map_err(|e| invalid(format!("items: {e}")))
                    })
                    .collect::<StorageResult<Vec<_>>>()?
            }
            None => Vec::new(),
        };

        Ok(Basket {
            id,
            store_code,
            basket_status,
            processing_date,
            items,
        })
    }
}

impl Record for Basket {
    const KIND: RecordKind = RecordKind::Basket;
    const TABLE: &'static str = "baskets.baskets";

    type Key = Uuid;

    fn try_from_row(row: Row) -> StorageResult<Self> {
        Self::decode(row)
    }

    fn insert_cql() -> &'static str {
        "INSERT INTO baskets.baskets (id, store_code, basket_status, processing_date, items) \
         VALUES (?, ?, ?, ?, ?)"
    }

    fn insert_values(&self) -> QueryValues {
        let status: Option<String> = self.basket_status.map(|s| s.as_str().to_string());
        let processing_date: Option<i64> = self.processing_date.map(|d| d.timestamp_millis());
        query_values!(
            self.id,
            self.store_code.clone(),
            status,
            processing_date,
            self.items.clone()
        )
    }
}
