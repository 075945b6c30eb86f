//! Login security gate: pre-credential checks and post-attempt bookkeeping.
//!
//! [`LoginSecurity::check_login_allowed`] consults the IP lockout track, then
//! the email track, then the IP-wide failure count, stopping at the first
//! block. [`LoginSecurity::log_attempt`] appends to the audit log and then
//! moves the lockout counters: failures increment, a success resets.
//!
//! Bookkeeping failures never change the login response. They are logged at
//! `error` level and the request carries on.

use chrono::Utc;
use sqlx::PgPool;
use taskguard_core::alert::SecurityAlert;
use taskguard_core::lockout::LockoutKind;
use taskguard_core::login_security::{
    global_threshold_block, lockout_block, should_alert, FailureReason, GateDecision,
    GLOBAL_WINDOW_MINUTES,
};
use taskguard_db::models::login_attempt::CreateLoginAttempt;
use taskguard_db::repositories::{LockoutRepo, LoginAttemptRepo};

use crate::config::SecurityConfig;
use crate::middleware::client::ClientInfo;
use crate::notifications::AlertBus;

/// The gate, bound to one request's store and policy.
pub struct LoginSecurity<'a> {
    pool: &'a PgPool,
    config: &'a SecurityConfig,
    alerts: &'a AlertBus,
    client: &'a ClientInfo,
}

impl<'a> LoginSecurity<'a> {
    pub fn new(
        pool: &'a PgPool,
        config: &'a SecurityConfig,
        alerts: &'a AlertBus,
        client: &'a ClientInfo,
    ) -> Self {
        Self {
            pool,
            config,
            alerts,
            client,
        }
    }

    /// Decide whether a login for `email` from this client may proceed.
    ///
    /// Store errors propagate: the gate never allows a login it could not
    /// evaluate.
    pub async fn check_login_allowed(&self, email: &str) -> Result<GateDecision, sqlx::Error> {
        let now = Utc::now();
        let ip = self.client.ip_string();

        if self.config.track_by_ip {
            let record = LockoutRepo::get_or_create(self.pool, &ip, LockoutKind::Ip).await?;
            if let Some(block) = lockout_block(LockoutKind::Ip, record.locked_until, now) {
                return Ok(GateDecision::Blocked(block));
            }
        }

        if self.config.track_by_email {
            let record = LockoutRepo::get_or_create(self.pool, email, LockoutKind::Email).await?;
            if let Some(block) = lockout_block(LockoutKind::Email, record.locked_until, now) {
                return Ok(GateDecision::Blocked(block));
            }
        }

        let recent_failures =
            LoginAttemptRepo::count_recent_failed_by_ip(self.pool, &ip, GLOBAL_WINDOW_MINUTES)
                .await?;
        if let Some(block) = global_threshold_block(recent_failures, self.config.global_threshold)
        {
            return Ok(GateDecision::Blocked(block));
        }

        Ok(GateDecision::Allowed)
    }

    /// Record a completed login attempt and update the lockout counters.
    ///
    /// `failure_reason` is `None` for a successful login.
    pub async fn log_attempt(&self, email: &str, failure_reason: Option<FailureReason>) {
        self.append(email, failure_reason).await;

        match failure_reason {
            Some(_) => self.handle_failed_attempt(email).await,
            None => self.handle_successful_attempt(email).await,
        }
    }

    /// Record an attempt refused by the gate. Counters are left alone so a
    /// lock is not extended by the attempts it blocks.
    pub async fn log_blocked_attempt(&self, email: &str) {
        self.append(email, Some(FailureReason::AccountLocked)).await;
    }

    async fn append(&self, email: &str, failure_reason: Option<FailureReason>) {
        let input = CreateLoginAttempt {
            email: Some(email.to_string()),
            ip_address: self.client.ip_string(),
            user_agent: self.client.user_agent.clone(),
            successful: failure_reason.is_none(),
            failure_reason,
            metadata: Some(self.client.audit_metadata()),
        };

        if let Err(e) = LoginAttemptRepo::create(self.pool, &input).await {
            tracing::error!(error = %e, %email, "Failed to record login attempt");
        }
    }

    async fn handle_failed_attempt(&self, email: &str) {
        let max_attempts = self.config.max_attempts;
        let lockout_minutes = self.config.lockout_minutes;

        if self.config.track_by_ip {
            let ip = self.client.ip_string();
            match LockoutRepo::increment_attempts(
                self.pool,
                &ip,
                LockoutKind::Ip,
                max_attempts,
                lockout_minutes,
            )
            .await
            {
                Ok(record) if record.is_locked() => {
                    tracing::warn!(
                        %ip,
                        attempts = record.attempts,
                        locked_for_secs = record.remaining_seconds(),
                        "IP locked out"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, %ip, "Failed to update IP lockout"),
            }
        }

        if self.config.track_by_email {
            match LockoutRepo::increment_attempts(
                self.pool,
                email,
                LockoutKind::Email,
                max_attempts,
                lockout_minutes,
            )
            .await
            {
                Ok(record) => {
                    if record.is_locked() {
                        tracing::warn!(
                            %email,
                            attempts = record.attempts,
                            locked_for_secs = record.remaining_seconds(),
                            "Email locked out"
                        );
                    }
                    if should_alert(record.attempts, self.config.alert_threshold) {
                        self.alerts.publish(SecurityAlert {
                            email: email.to_string(),
                            attempts: record.attempts,
                            ip_address: self.client.ip_string(),
                            user_agent: self.client.user_agent.clone(),
                            raised_at: Utc::now(),
                        });
                    }
                }
                Err(e) => tracing::error!(error = %e, %email, "Failed to update email lockout"),
            }
        }
    }

    async fn handle_successful_attempt(&self, email: &str) {
        let ip = self.client.ip_string();
        if let Err(e) = LockoutRepo::reset(self.pool, &ip, LockoutKind::Ip).await {
            tracing::error!(error = %e, %ip, "Failed to reset IP lockout");
        }
        if let Err(e) = LockoutRepo::reset(self.pool, email, LockoutKind::Email).await {
            tracing::error!(error = %e, %email, "Failed to reset email lockout");
        }
    }
}
