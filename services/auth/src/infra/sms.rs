use anyhow::Context as _;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::domain::repository::OtpSender;
use crate::error::AuthServiceError;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender phone number in E.164 form.
    pub from_number: String,
}

/// Sends OTPs as SMS through the Twilio Messages API.
#[derive(Clone)]
pub struct TwilioOtpSender {
    client: Client,
    options: TwilioOptions,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

impl TwilioOtpSender {
    pub fn new(client: Client, options: TwilioOptions) -> Self {
        Self::with_base_url(client, options, TWILIO_API_BASE)
    }

    pub fn with_base_url(client: Client, options: TwilioOptions, base_url: &str) -> Self {
        Self {
            client,
            options,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url, self.options.account_sid
        )
    }
}

pub fn otp_message_body(otp: &str) -> String {
    format!("Your login code is {otp}. It expires in 5 minutes. Do not share it with anyone.")
}

impl OtpSender for TwilioOtpSender {
    async fn send(&self, destination: &str, otp: &str) -> Result<(), AuthServiceError> {
        let body = otp_message_body(otp);
        let form = [
            ("To", destination),
            ("From", self.options.from_number.as_str()),
            ("Body", body.as_str()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form)
            .send()
            .await
            .context("send twilio message request")
            .map_err(AuthServiceError::DeliveryFailed)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AuthServiceError::DeliveryFailed(anyhow::anyhow!(
                "twilio returned {status}: {detail}"
            )));
        }

        let message: MessageResponse = response
            .json()
            .await
            .context("decode twilio message response")
            .map_err(AuthServiceError::DeliveryFailed)?;
        info!(message_sid = %message.sid, "otp sms accepted");
        Ok(())
    }
}
