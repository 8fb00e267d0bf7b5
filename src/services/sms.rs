use crate::config::Config;

/// Twilio REST sender.
///
/// When the Twilio credentials are absent the sender runs in mock mode:
/// messages are logged instead of delivered, so local development works
/// without an account.
pub struct SmsSender {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl SmsSender {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_phone_number.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_number.is_empty()
    }

    pub async fn send(&self, to: &str, body: &str) -> Result<(), anyhow::Error> {
        if !self.is_configured() {
            tracing::info!(to = to, body = body, "SMS not configured, mock send");
            return Ok(());
        }

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", self.from_number.as_str()),
                ("To", to),
                ("Body", body),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio error {}: {}", status, detail);
        }

        let message: serde_json::Value = response.json().await?;
        tracing::info!(sid = message["sid"].as_str().unwrap_or(""), to = to, "SMS sent");
        Ok(())
    }
}
