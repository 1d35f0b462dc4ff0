// src/services/email_service.rs

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::Config;

/// Outbound transactional mail. Sends are best-effort: callers spawn them off
/// the request path and a failed send never fails the primary mutation.
#[derive(Clone)]
pub struct Mailer {
    transport: SmtpTransport,
    from: String,
    pub app_url: String,
    pub company_name: String,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let creds = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );
        // STARTTLS relay with a socket timeout so a stalled provider cannot
        // hold a send task indefinitely.
        let transport = SmtpTransport::starttls_relay(&config.smtp_server)?
            .port(config.smtp_port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Mailer {
            transport,
            from: config.email_from.clone(),
            app_url: config.app_url.clone(),
            company_name: config.company_name.clone(),
        })
    }

    /// Sends one HTML email, retrying a single time on a transport failure.
    pub fn send(&self, to: &str, subject: &str, html: String) -> Result<(), Box<dyn std::error::Error>> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        if let Err(first) = self.transport.send(&message) {
            log::warn!("Email to {} failed, retrying once: {:?}", to, first);
            self.transport.send(&message)?;
        }
        Ok(())
    }
}

/// Spawns a fire-and-forget send. Failures are logged and swallowed.
pub fn send_in_background(mailer: Mailer, to: String, subject: String, html: String) {
    actix_web::rt::spawn(async move {
        if let Err(e) = mailer.send(&to, &subject, html) {
            log::error!("Failed to send \"{}\" to {}: {}", subject, to, e);
        }
    });
}

fn wrap_body(company: &str, heading: &str, inner: &str) -> String {
    format!(
        "<!DOCTYPE html>\
         <html><body style=\"font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto;\">\
         <h1 style=\"color: #2563eb;\">{company}</h1>\
         <h2>{heading}</h2>\
         {inner}\
         <hr><p style=\"font-size: 14px; color: #64748b;\">Regards,<br>The {company} Team</p>\
         </body></html>"
    )
}

/// Body for the signup / resend verification code email.
pub fn otp_email(company: &str, otp: &str) -> String {
    wrap_body(
        company,
        "Verify your email address",
        &format!(
            "<p>Enter the code below on the verification page to complete your registration:</p>\
             <p style=\"font-size: 34px; letter-spacing: 8px;\"><b>{otp}</b></p>\
             <p>This code expires in 10 minutes.</p>\
             <p>If you didn't request this verification, please ignore this message.</p>"
        ),
    )
}

/// Body for the password reset email.
pub fn password_reset_email(company: &str, reset_link: &str) -> String {
    wrap_body(
        company,
        "Reset your password",
        &format!(
            "<p>We received a request to reset your password. Click the link below to set a new one:</p>\
             <p><a href=\"{reset_link}\">Reset Password</a></p>\
             <p>This link expires in 1 hour. If you did not request a reset, you can ignore this \
              email and your password will remain unchanged.</p>"
        ),
    )
}

/// Body for the seller notification on a listing status change.
pub fn listing_status_email(
    company: &str,
    listing_title: &str,
    new_status: &str,
    note: Option<&str>,
) -> String {
    let note_block = match note {
        Some(n) => format!("<p>Moderator note: {n}</p>"),
        None => String::new(),
    };
    wrap_body(
        company,
        "Listing status update",
        &format!(
            "<p>Your listing <b>{listing_title}</b> is now <b>{new_status}</b>.</p>{note_block}"
        ),
    )
}

/// Body for the seller notification when a new bid arrives.
pub fn new_bid_email(company: &str, listing_title: &str, bidder_name: &str, amount: f64) -> String {
    wrap_body(
        company,
        "You received a new bid",
        &format!(
            "<p><b>{bidder_name}</b> placed a bid of <b>${amount}</b> on your listing \
             <b>{listing_title}</b>.</p>\
             <p>Log in to your dashboard to review it.</p>"
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_contains_the_code() {
        let body = otp_email("AssetHub", "482913");
        assert!(body.contains("482913"));
        assert!(body.contains("AssetHub"));
        assert!(body.contains("10 minutes"));
    }

    #[test]
    fn reset_email_contains_the_link() {
        let link = "http://localhost:3000/reset-password?token=abc&email=a@b.c";
        let body = password_reset_email("AssetHub", link);
        assert!(body.contains(link));
        assert!(body.contains("1 hour"));
    }

    #[test]
    fn status_email_names_listing_and_status() {
        let body = listing_status_email("AssetHub", "Tech blog", "active", None);
        assert!(body.contains("Tech blog"));
        assert!(body.contains("active"));
        assert!(!body.contains("Moderator note"));

        let with_note = listing_status_email("AssetHub", "Tech blog", "rejected", Some("bad images"));
        assert!(with_note.contains("bad images"));
    }

    #[test]
    fn bid_email_names_bidder_and_amount() {
        let body = new_bid_email("AssetHub", "Tech blog", "Bea", 1100.0);
        assert!(body.contains("Bea"));
        assert!(body.contains("1100"));
        assert!(body.contains("Tech blog"));
    }
}
