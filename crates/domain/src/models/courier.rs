//! Courier status change events.
//!
//! A change event carries the courier-related columns of a sale before and
//! after a write. Only the columns the trigger publishes are present; missing
//! ones decode as `None`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::notice::Notice;
use super::query_key::QueryKey;

/// Notification channel the `sales` trigger publishes on.
pub const COURIER_STATUS_CHANNEL: &str = "sales_courier_status";

/// Courier columns of one sale row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourierSnapshot {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub courier_status: Option<String>,
    #[serde(default)]
    pub consignment_id: Option<String>,
}

/// A row-change notification for `sales.courier_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierStatusChange {
    #[serde(default)]
    pub old: CourierSnapshot,
    pub new: CourierSnapshot,
}

/// A courier status that actually moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub sale_id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl CourierStatusChange {
    /// Returns the transition if the status changed and the sale is known.
    pub fn transition(&self) -> Option<StatusTransition> {
        if self.old.courier_status == self.new.courier_status {
            return None;
        }

        let sale_id = self.new.id.or(self.old.id)?;
        let invoice_number = self
            .new
            .invoice_number
            .clone()
            .or_else(|| self.old.invoice_number.clone())
            .unwrap_or_else(|| "unknown invoice".to_string());
        let customer_name = self
            .new
            .customer_name
            .clone()
            .or_else(|| self.old.customer_name.clone())
            .unwrap_or_else(|| "unknown customer".to_string());

        Some(StatusTransition {
            sale_id,
            invoice_number,
            customer_name,
            from: self.old.courier_status.clone(),
            to: self.new.courier_status.clone(),
        })
    }
}

impl StatusTransition {
    /// Human-readable `OLD → NEW`.
    pub fn summary(&self) -> String {
        format!(
            "{} → {}",
            self.from.as_deref().unwrap_or("N/A"),
            self.to.as_deref().unwrap_or("N/A")
        )
    }

    pub fn notice(&self) -> Notice {
        Notice::info(
            "Courier status updated",
            format!(
                "Invoice {} for {}: {}",
                self.invoice_number,
                self.customer_name,
                self.summary()
            ),
        )
    }

    /// Cached queries made stale by this transition.
    pub fn invalidation_keys(&self) -> Vec<QueryKey> {
        vec![QueryKey::sales(), QueryKey::sale(self.sale_id)]
    }
}
