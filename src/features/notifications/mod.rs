//! Status change notifications.
//!
//! Delivery is simulated: the message is emitted as a structured log event
//! instead of being sent through an email provider.

use crate::features::reports::models::Report;
use crate::features::users::models::UserProfile;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusNotification {
    pub recipient: String,
    pub message: String,
}

pub fn status_update_message(issue_type: &str, reference: &str, status_label: &str) -> String {
    format!(
        "Hello, this is a notification that your report regarding '{}' (ID: {}) has been updated to '{}'.",
        issue_type, reference, status_label
    )
}

/// Notification for the report's submitter, if their profile accepts email
pub fn status_notification(
    report: &Report,
    submitter: Option<&UserProfile>,
) -> Option<StatusNotification> {
    let recipient = submitter?.notification_email()?;
    Some(StatusNotification {
        recipient: recipient.to_string(),
        message: status_update_message(
            &report.issue_type,
            &report.reference_number,
            report.status.label(),
        ),
    })
}

/// Simulated delivery
pub fn dispatch(notification: &StatusNotification) {
    tracing::info!(
        target: "notifications",
        recipient = %notification.recipient,
        message = %notification.message,
        "Simulated email notification sent"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reports::models::ReportStatus;
    use crate::shared::test_helpers::{profile_fixture, report_fixture};

    #[test]
    fn test_message_names_issue_reference_and_status() {
        assert_eq!(
            status_update_message("Pothole", "RPT-2024-0000007", "In Progress"),
            "Hello, this is a notification that your report regarding 'Pothole' (ID: RPT-2024-0000007) has been updated to 'In Progress'."
        );
    }

    #[test]
    fn test_notification_requires_email_opt_in() {
        let mut report = report_fixture("citizen-1", &["pothole"]);
        report.status = ReportStatus::Resolved;

        let mut profile = profile_fixture("citizen-1");
        profile.email = Some("citizen@example.com".to_string());
        profile.notify_email = false;
        assert_eq!(status_notification(&report, Some(&profile)), None);

        profile.notify_email = true;
        let notification = status_notification(&report, Some(&profile)).unwrap();
        assert_eq!(notification.recipient, "citizen@example.com");
        assert!(notification.message.contains("'Resolved'"));
        assert!(notification.message.contains(&report.reference_number));

        profile.email = None;
        assert_eq!(status_notification(&report, Some(&profile)), None);
        assert_eq!(status_notification(&report, None), None);
    }
}
