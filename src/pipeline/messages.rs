//! Chat message templates (Telegram Markdown).

use std::time::Duration;

use crate::models::{ChangeReport, Product};
use crate::services::LinkButton;
use crate::utils::product_link;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━";

/// Backticks would terminate the inline code spans below.
fn code_span(text: &str) -> String {
    text.replace('`', "'")
}

fn name_or<'a>(product: &'a Product, fallback: &'a str) -> &'a str {
    product.name().unwrap_or(fallback)
}

/// Alert for a newly detected product.
pub fn drop_alert(product: &Product) -> String {
    format!(
        "🚀 **NEW DROP DETECTED!** 🚀\n\
         {RULE}\n\
         📦 **Item:** `{}`\n\
         🏷 **ID:** `{}`\n\
         💰 **Price:** `{}`\n\
         {RULE}\n\
         💎 *Monitoring catalog for instant drops*",
        code_span(name_or(product, "New Item")),
        code_span(product.code().unwrap_or("N/A")),
        code_span(product.alert_price().unwrap_or("N/A")),
    )
}

/// Product card for the manual check command.
pub fn product_card(product: &Product) -> String {
    format!(
        "{RULE}\n\
         🔥 **CATALOG ITEM** 🔥\n\
         {RULE}\n\n\
         📌 **Name:** {}\n\
         💵 **Price:** {}",
        name_or(product, "Unknown Product"),
        product.display_price().unwrap_or("N/A"),
    )
}

/// Summary of one reportable audit.
pub fn summary(report: &ChangeReport) -> String {
    [
        "📢 **Catalog Update**".to_string(),
        RULE.to_string(),
        format!("📦 **Previous Total:** `{}`", report.previous_count),
        format!("🆕 **Items Added:** `+{}`", report.added_count()),
        if report.removed_count > 0 {
            format!("📉 **Items Removed:** `-{}`", report.removed_count)
        } else {
            "📉 **Items Removed:** `0`".to_string()
        },
        format!("📈 **Current Total:** `{}`", report.current_count),
        RULE.to_string(),
    ]
    .join("\n")
}

/// Readiness notice sent once at startup.
pub fn startup_notice(poll_interval: Duration) -> String {
    format!(
        "🛰 **CATALOG MONITOR ONLINE**\n\
         {RULE}\n\
         ⏱ **Interval:** {}ms\n\
         🎯 **Target:** additions and removals\n\
         {RULE}\n\
         🚀 *Tracking changes...*",
        poll_interval.as_millis()
    )
}

/// Reply to `/start`.
pub fn welcome(endpoint: &str, poll_interval: Duration) -> String {
    format!(
        "🚀 **Catalog monitor is active!**\n\nChecking `{}` every {}ms.",
        code_span(endpoint),
        poll_interval.as_millis()
    )
}

pub const MANUAL_CHECK_RUNNING: &str = "🔎 Running manual check...";
pub const MANUAL_CHECK_EMPTY: &str = "❌ No products found or error occurred.";

/// Button linking to the product page.
pub fn shop_button(base_origin: &str, product: &Product) -> LinkButton {
    LinkButton::new(
        "🛒 SHOP NOW",
        product_link(base_origin, product.relative_url()),
    )
}
