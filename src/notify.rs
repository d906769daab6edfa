use async_trait::async_trait;
use tracing::info;

/// Outbound channel for password-reset tokens. Mail delivery lives behind
/// this trait; the flows only hand over the recipient and the token.
#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_password_reset(&self, email: &str, reset_token: &str) -> anyhow::Result<()>;
}

/// Stand-in notifier that logs instead of sending mail. Useful for local
/// runs until a real mailer is wired in.
pub struct LogNotifier;

#[async_trait]
impl ResetNotifier for LogNotifier {
    async fn send_password_reset(&self, email: &str, reset_token: &str) -> anyhow::Result<()> {
        info!(%email, token_len = reset_token.len(), "password reset issued");
        Ok(())
    }
}
