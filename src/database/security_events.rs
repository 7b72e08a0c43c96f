// ABOUTME: Security event database operations
// ABOUTME: Stores the audit trail written by the security monitor

use sqlx::Row;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid, Database};
use crate::errors::AppResult;
use crate::security::SecurityEvent;

impl Database {
    /// Create the security_events table
    pub(super) async fn migrate_security_events(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS security_events (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                event_type TEXT NOT NULL,
                event_data TEXT,
                ip_address TEXT,
                user_agent TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_security_events_user ON security_events(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a security event
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn record_security_event(&self, event: &SecurityEvent) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO security_events (id, user_id, event_type, event_data, ip_address, user_agent, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(event.id.to_string())
        .bind(event.user_id.map(|id| id.to_string()))
        .bind(event.event_type.as_str())
        .bind(event.event_data.as_ref().map(ToString::to_string))
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List a user's security events, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_security_events(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<SecurityEvent>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, event_type, event_data, ip_address, user_agent, created_at
            FROM security_events
            WHERE user_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_security_event).collect()
    }

    /// Convert a database row to a SecurityEvent struct
    fn row_to_security_event(row: &sqlx::sqlite::SqliteRow) -> AppResult<SecurityEvent> {
        let id: String = row.try_get("id")?;
        let user_id: Option<String> = row.try_get("user_id")?;
        let event_type: String = row.try_get("event_type")?;
        let event_data: Option<String> = row.try_get("event_data")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(SecurityEvent {
            id: parse_uuid(&id, "security_events.id")?,
            user_id: user_id
                .as_deref()
                .map(|v| parse_uuid(v, "security_events.user_id"))
                .transpose()?,
            event_type: event_type.parse()?,
            event_data: event_data.and_then(|s| serde_json::from_str(&s).ok()),
            ip_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            created_at: parse_timestamp(&created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurityEventType;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn events_round_trip_with_full_detail() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user_id = Uuid::new_v4();

        let event = SecurityEvent::new(SecurityEventType::PotentialXssAttempt)
            .with_user_id(user_id)
            .with_event_data(serde_json::json!({ "field": "bio" }))
            .with_ip_address("192.0.2.44".to_owned())
            .with_user_agent("Mozilla/5.0".to_owned());
        db.record_security_event(&event).await.unwrap();

        let events = db.list_security_events(user_id, 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, event.id);
        assert_eq!(events[0].event_type, SecurityEventType::PotentialXssAttempt);
        assert_eq!(events[0].event_data.as_ref().unwrap()["field"], "bio");
        assert_eq!(events[0].ip_address.as_deref(), Some("192.0.2.44"));
        assert_eq!(events[0].user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_per_user() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user_id = Uuid::new_v4();
        let someone_else = Uuid::new_v4();

        let kinds = [
            SecurityEventType::SessionStart,
            SecurityEventType::SessionActive,
            SecurityEventType::SessionEnd,
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            let mut event = SecurityEvent::new(kind).with_user_id(user_id);
            event.created_at = Utc::now() - Duration::minutes(10 - i64::try_from(i).unwrap());
            db.record_security_event(&event).await.unwrap();
        }
        let unrelated = SecurityEvent::new(SecurityEventType::Logout).with_user_id(someone_else);
        db.record_security_event(&unrelated).await.unwrap();

        let events = db.list_security_events(user_id, 2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, SecurityEventType::SessionEnd);
        assert_eq!(events[1].event_type, SecurityEventType::SessionActive);

        let all = db.list_security_events(user_id, 50).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn anonymous_events_are_stored_but_not_listed_per_user() {
        let db = Database::new("sqlite::memory:").await.unwrap();

        let event = SecurityEvent::new(SecurityEventType::SuspiciousActivity);
        db.record_security_event(&event).await.unwrap();

        let events = db.list_security_events(Uuid::new_v4(), 10).await.unwrap();
        assert!(events.is_empty());
    }
}
