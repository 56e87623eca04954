use std::time::Duration;

use common::cache::KeyValueCache;
use rand::Rng;

use crate::config::OtpConfig;
use crate::error::AppError;

fn code_key(mobile: &str) -> String {
    format!("otp:{mobile}")
}

fn attempts_key(mobile: &str) -> String {
    format!("otp_attempts:{mobile}")
}

fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

/// Issue a fresh 6-digit code for `mobile`.
///
/// A code that was issued within the last fifth of the TTL window is
/// considered fresh; asking again during that window is rate-limited.
pub async fn issue(
    cache: &dyn KeyValueCache,
    cfg: &OtpConfig,
    mobile: &str,
) -> Result<String, AppError> {
    let key = code_key(mobile);
    let resend_threshold = cfg.ttl_secs - cfg.ttl_secs / 5;

    if let Some(remaining) = cache.remaining_ttl(&key).await?
        && remaining.as_secs() > resend_threshold
    {
        return Err(AppError::RateLimited {
            retry_after: remaining.as_secs() - resend_threshold,
        });
    }

    let code = generate_code();
    cache
        .set_with_ttl(&key, &code, Duration::from_secs(cfg.ttl_secs))
        .await?;

    Ok(code)
}

/// Verify a submitted code for `mobile`, consuming it on success.
///
/// Every attempt bumps `otp_attempts:<mobile>` atomically; crossing
/// `max_attempts` invalidates the code and locks the number out until the
/// counter expires, even for a correct code.
pub async fn verify(
    cache: &dyn KeyValueCache,
    cfg: &OtpConfig,
    mobile: &str,
    code: &str,
) -> Result<(), AppError> {
    let code_key = code_key(mobile);
    let attempts_key = attempts_key(mobile);

    let attempts = cache
        .increment_with_ttl(&attempts_key, Duration::from_secs(cfg.lockout_secs))
        .await?;

    if attempts > cfg.max_attempts {
        cache.delete(&code_key).await?;
        let retry_after = cache
            .remaining_ttl(&attempts_key)
            .await?
            .map(|d| d.as_secs())
            .unwrap_or(cfg.lockout_secs);
        return Err(AppError::RateLimited { retry_after });
    }

    let stored = cache
        .get(&code_key)
        .await?
        .ok_or_else(|| AppError::Validation("OTP has expired or was not requested".into()))?;

    if stored != code {
        let remaining = (cfg.max_attempts - attempts).max(0);
        return Err(AppError::Validation(format!(
            "Incorrect OTP. {remaining} attempts remaining"
        )));
    }

    // One-time use: clear the code and the attempt counter together.
    cache.delete(&code_key).await?;
    cache.delete(&attempts_key).await?;

    Ok(())
}
