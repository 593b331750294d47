//! Schema grounding context.
//!
//! Holds the static natural-language description of the analytics schema
//! that is embedded in every generation and refinement prompt. The content
//! is opaque to the rest of the system; it is passed through verbatim.

use crate::error::{Result, ScoutError};
use std::path::Path;

/// Built-in description of the analytics tracker schema.
///
/// Can be replaced wholesale via [`SchemaContext::from_file`] when pointing
/// the assistant at a different database.
const BUILTIN_SCHEMA: &str = r#"This is the schema of a user interaction tracking system. All activity is
session-based: every table links back to the sessions table through
sessionId, and most tables carry a timestamp for event timing. Primary keys
are UUIDs.

Table: sessions (central table)
  Columns: id, trackingId, entryPage, exitPage, timeSpent, utm_source,
  utm_medium, utm_campaign_name, utm_campaign_id, utm_term, utm_content,
  os, device, browser, longitude, latitude, city, country, createdAt,
  updatedAt.
  One row per website visit. trackingId identifies a visitor across
  sessions; UTM columns attribute the visit to a marketing campaign;
  os/device/browser and the geo columns describe the client. Indexed on
  trackingId and createdAt.

Table: signup
  Columns: id, sessionId, userId, timestamp.
  One row per user registration, attributed to the session it happened in.

Table: search_bar
  Columns: id, sessionId, userId, searchTerm, timestamp.
  One row per search performed on the site.

Table: add_to_cart
  Columns: id, sessionId, productId, productCost, currency, productName,
  userId, timestamp.
  First step of the buying journey; one row per product added to the cart.

Table: proceed_to_checkout
  Columns: id, sessionId, productIds, cartValue, currency, productName,
  userId, timestamp.
  Second-to-last step of the buying journey; cartValue is the cart total
  at checkout.

Table: proceed_to_payment
  Columns: id, sessionId, productIds, cartValue, currency, productName,
  userId, timestamp, createdAt, updatedAt.
  Final step before purchase completion.

Table: feature_products
  Columns: id, sessionId, productId, productCost, currency, productName,
  userId, timestamp.
  One row per featured-product impression.

Table: add_to_favourites
  Columns: id, sessionId, userId, pageUrl, productName, productId,
  timestamp.
  Wishlist actions.

Table: events
  Columns: id, sessionId, eventName, eventType, additionalData, timestamp,
  createdAt, updatedAt.
  General activity log; additionalData holds JSON metadata. Indexed on
  sessionId and timestamp.

Table: conversions
  Columns: id, sessionId, conversionType, conversionValue, timestamp,
  createdAt, updatedAt.
  User-defined conversion events with an assigned value. Indexed on
  sessionId and timestamp.

Relationships: every table joins to sessions via sessionId. The
product-related tables (add_to_cart, proceed_to_checkout,
proceed_to_payment, feature_products) share the same product columns.
User-level analysis joins on userId where present."#;

/// Static grounding text describing tables, columns, and relationships.
///
/// Pure data; no behavior beyond loading.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    text: String,
}

impl SchemaContext {
    /// Returns the built-in analytics tracker schema description.
    pub fn builtin() -> Self {
        Self {
            text: BUILTIN_SCHEMA.to_string(),
        }
    }

    /// Creates a context from an arbitrary description blob.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Loads a schema description from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScoutError::config(format!(
                "Failed to read schema context file {}: {e}",
                path.display()
            ))
        })?;

        if text.trim().is_empty() {
            return Err(ScoutError::config(format!(
                "Schema context file {} is empty",
                path.display()
            )));
        }

        Ok(Self { text })
    }

    /// Returns the grounding text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self::builtin()
    }
}
