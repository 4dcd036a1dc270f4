//! Configuration management for Lambda functions.

use chrono_tz::Tz;
use std::env;

use crate::{Error, Result};

/// SES template names for the customer-facing emails.
#[derive(Debug, Clone)]
pub struct TemplateNames {
    /// Sent once the salon confirms a booking
    pub confirmation: String,
    /// Sent once the deposit is received
    pub paid: String,
    /// Sent by the 48-hour reminder sweep
    pub reminder: String,
    /// Sent when a booking is cancelled
    pub cancellation: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: String,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// AWS region
    pub aws_region: String,
    /// Time zone the salon books appointments in
    pub timezone: Tz,
    /// Address emails are sent from
    pub sender_email: String,
    /// Display name emails are sent from
    pub sender_name: String,
    /// Staff inbox that receives new-booking summaries
    pub staff_email: Option<String>,
    pub templates: TemplateNames,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            db_host: required("DATABASE_HOST")?,
            db_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "salon_bookings".to_string()),
            db_secret_arn: required("DATABASE_URL_SECRET_ARN")?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-west-2".to_string()),
            timezone: parse_timezone(
                &env::var("SALON_TIMEZONE").unwrap_or_else(|_| "America/Los_Angeles".to_string()),
            )?,
            sender_email: env::var("SENDER_EMAIL")
                .unwrap_or_else(|_| "hello@winniexnails.com".to_string()),
            sender_name: env::var("SENDER_NAME").unwrap_or_else(|_| "winniexnails".to_string()),
            staff_email: env::var("STAFF_EMAIL").ok().filter(|s| !s.is_empty()),
            templates: TemplateNames {
                confirmation: env::var("CONFIRMATION_TEMPLATE")
                    .unwrap_or_else(|_| "booking-confirmation".to_string()),
                paid: env::var("PAID_TEMPLATE").unwrap_or_else(|_| "booking-paid".to_string()),
                reminder: env::var("REMINDER_TEMPLATE")
                    .unwrap_or_else(|_| "booking-reminder".to_string()),
                cancellation: env::var("CANCELLATION_TEMPLATE")
                    .unwrap_or_else(|_| "booking-cancellation".to_string()),
            },
        })
    }

    /// `From` header value, e.g. `winniexnails <hello@winniexnails.com>`.
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender_email)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::Config(format!("{} not set", key)))
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| Error::Config(format!("Invalid SALON_TIMEZONE {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("America/Los_Angeles").unwrap(), chrono_tz::America::Los_Angeles);
        assert!(matches!(parse_timezone("Mars/Olympus"), Err(Error::Config(_))));
    }
}
