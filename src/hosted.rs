//! Links to the pages Spreedly hosts for subscribers. No request is made.

use crate::config::DEFAULT_HOST;

/// Percent-encodes everything but ASCII letters, digits and `_.-`.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Page where `customer_id` signs up for `plan_id`, then goes back to `return_url`.
pub fn subscribe_url(
    site_name: &str,
    customer_id: &str,
    token: &str,
    plan_id: i64,
    return_url: &str,
) -> String {
    format!(
        "https://{}/{}/subscribers/{}/{}/subscribe/{}?return_url={}",
        DEFAULT_HOST,
        site_name,
        customer_id,
        token,
        plan_id,
        quote(return_url)
    )
}

/// Page where the subscriber identified by `token` manages their subscription.
pub fn change_subscription_url(site_name: &str, token: &str, return_url: &str) -> String {
    format!(
        "https://{}/{}/subscriber_accounts/{}?return_url={}",
        DEFAULT_HOST,
        site_name,
        token,
        quote(return_url)
    )
}
