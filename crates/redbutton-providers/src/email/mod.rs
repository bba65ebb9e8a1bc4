//! Outbound mail

mod smtp;

pub use smtp::SmtpMailer;
