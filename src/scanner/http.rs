use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Redeemer, ScannerError};

#[derive(Serialize)]
struct MarkRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct MarkReply {
    message: String,
}

/// Posts scanned tokens to `/api/attendance/mark` as the signed-in student.
pub struct HttpRedeemer {
    client: reqwest::Client,
    endpoint: String,
    credential: String,
}

impl HttpRedeemer {
    pub fn new(base_url: &str, credential: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, credential)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, credential: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/attendance/mark", base_url.trim_end_matches('/')),
            credential: credential.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Redeemer for HttpRedeemer {
    async fn redeem(&self, token: &str) -> Result<String, ScannerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.credential)
            .json(&MarkRequest { token })
            .send()
            .await?;

        let status = response.status();
        let reply = response.json::<MarkReply>().await;

        match (status.is_success(), reply) {
            (true, Ok(reply)) => Ok(reply.message),
            (false, Ok(reply)) => Err(ScannerError::Rejected(reply.message)),
            (_, Err(e)) => {
                tracing::warn!("Unreadable reply from attendance service ({}): {}", status, e);
                Err(ScannerError::Rejected(format!(
                    "Attendance service returned {}.",
                    status.as_u16()
                )))
            }
        }
    }
}
