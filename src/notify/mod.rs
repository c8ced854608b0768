//! Run-summary notifications
//!
//! The coordinator hands a single free-text summary to whatever transport is
//! configured. Delivery failure is logged by the caller, never escalated.

use crate::archive::RunSummary;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound transport for the end-of-run summary
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<()>;
}

/// Telegram bot transport
pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Ok(Self {
            http,
            bot_token,
            chat_id,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        self.http
            .get(&url)
            .query(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Render the run summary for notification, or `None` when nothing happened.
pub fn format_summary(summary: &RunSummary) -> Option<String> {
    if summary.successes.is_empty() && summary.failures.is_empty() {
        return None;
    }

    let mut text = String::from("Archive run summary\n");
    text.push_str(&format!("Success: {}\n", summary.successes.len()));
    text.push_str(&format!("Failed: {}\n", summary.failures.len()));

    if !summary.successes.is_empty() {
        text.push_str("\nDownloaded:\n");
        for name in &summary.successes {
            text.push_str(&format!("- {}\n", name));
        }
    }
    if !summary.failures.is_empty() {
        text.push_str("\nFailed:\n");
        for name in &summary.failures {
            text.push_str(&format!("- {}\n", name));
        }
    }

    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_produces_no_notification() {
        assert_eq!(format_summary(&RunSummary::default()), None);
    }

    #[test]
    fn summary_lists_counts_and_names() {
        let summary = RunSummary {
            successes: vec!["Foo - Bar (01-2023)_dQw4w9Wg.webm".to_string()],
            failures: vec!["Broken Video".to_string()],
        };
        let text = format_summary(&summary).unwrap();

        assert!(text.contains("Success: 1"));
        assert!(text.contains("Failed: 1"));
        assert!(text.contains("- Foo - Bar (01-2023)_dQw4w9Wg.webm"));
        assert!(text.contains("- Broken Video"));
    }
}
