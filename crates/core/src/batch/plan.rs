//! Batch plan files.
//!
//! A plan lists the meetings to provision:
//!
//! ```toml
//! [sessions]
//! "1" = "2020-04-26T14:00:00Z"
//!
//! [[meeting]]
//! id = "BAICS_12"
//! topic = "Talk A"
//! session = "1"
//! duration = 60
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::password::derive_password;
use crate::reconciler::{MeetingConfig, MeetingIdentifier};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Plan file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read plan: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse plan: {0}")]
    ParseError(String),

    #[error("Invalid plan: {0}")]
    Invalid(String),
}

/// How a meeting's password is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordPolicy {
    /// The configured shared password.
    #[default]
    Shared,
    /// Derived from the topic and the configured salt.
    Derived,
}

/// A batch of meetings to reconcile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchPlan {
    /// Named start times meetings can refer to.
    #[serde(default)]
    pub sessions: BTreeMap<String, DateTime<Utc>>,
    #[serde(default, rename = "meeting")]
    pub meetings: Vec<PlannedMeeting>,
}

/// One meeting entry of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannedMeeting {
    pub id: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Duration in minutes.
    pub duration: u32,
    #[serde(default = "default_waiting_room")]
    pub waiting_room: bool,
    #[serde(default)]
    pub password: PasswordPolicy,
    /// Index substituted into the host email template. Defaults to the
    /// lowest slot not yet taken by meetings with the same start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_slot: Option<usize>,
}

fn default_waiting_room() -> bool {
    true
}

/// A plan entry with everything the reconciler needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMeeting {
    pub identifier: MeetingIdentifier,
    pub owner_email: String,
    pub config: MeetingConfig,
}

/// Load and validate a plan file.
pub fn load_plan(path: &Path) -> Result<BatchPlan, PlanError> {
    if !path.exists() {
        return Err(PlanError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    parse_plan(&contents)
}

/// Parse and validate a plan from TOML.
pub fn parse_plan(toml_str: &str) -> Result<BatchPlan, PlanError> {
    let plan: BatchPlan =
        toml::from_str(toml_str).map_err(|e| PlanError::ParseError(e.to_string()))?;
    plan.validate()?;
    Ok(plan)
}

impl BatchPlan {
    /// Check ids are valid and unique, every start time resolves and no two
    /// meetings at the same start time claim the same host slot.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        let mut claimed: HashMap<DateTime<Utc>, HashSet<usize>> = HashMap::new();

        for meeting in &self.meetings {
            MeetingIdentifier::new(meeting.id.as_str())
                .map_err(|e| PlanError::Invalid(format!("meeting {:?}: {}", meeting.id, e)))?;

            if !seen.insert(meeting.id.as_str()) {
                return Err(PlanError::Invalid(format!(
                    "duplicate meeting id {:?}",
                    meeting.id
                )));
            }

            let start_time = self.start_time_of(meeting)?;

            if let Some(slot) = meeting.host_slot {
                if !claimed.entry(start_time).or_default().insert(slot) {
                    return Err(PlanError::Invalid(format!(
                        "meeting {:?} claims host slot {} already taken at {}",
                        meeting.id, slot, start_time
                    )));
                }
            }
        }

        Ok(())
    }

    fn start_time_of(&self, meeting: &PlannedMeeting) -> Result<DateTime<Utc>, PlanError> {
        match (&meeting.session, meeting.start_time) {
            (Some(session), None) => self.sessions.get(session).copied().ok_or_else(|| {
                PlanError::Invalid(format!(
                    "meeting {:?} refers to unknown session {:?}",
                    meeting.id, session
                ))
            }),
            (None, Some(start_time)) => Ok(start_time),
            (Some(_), Some(_)) => Err(PlanError::Invalid(format!(
                "meeting {:?} sets both session and start_time",
                meeting.id
            ))),
            (None, None) => Err(PlanError::Invalid(format!(
                "meeting {:?} needs a session or start_time",
                meeting.id
            ))),
        }
    }

    /// Resolve owner emails, start times and passwords.
    pub fn resolve(&self, config: &Config) -> Result<Vec<ResolvedMeeting>, PlanError> {
        // Explicit slots are reserved before implicit ones are handed out.
        let mut claimed: HashMap<DateTime<Utc>, HashSet<usize>> = HashMap::new();
        for meeting in &self.meetings {
            if let Some(slot) = meeting.host_slot {
                claimed
                    .entry(self.start_time_of(meeting)?)
                    .or_default()
                    .insert(slot);
            }
        }

        let mut next_slot: HashMap<DateTime<Utc>, usize> = HashMap::new();
        let mut resolved = Vec::with_capacity(self.meetings.len());

        for meeting in &self.meetings {
            let start_time = self.start_time_of(meeting)?;

            let slot = match meeting.host_slot {
                Some(slot) => slot,
                None => {
                    let taken = claimed.entry(start_time).or_default();
                    let next = next_slot.entry(start_time).or_insert(0);
                    while taken.contains(&*next) {
                        *next += 1;
                    }
                    let slot = *next;
                    *next += 1;
                    slot
                }
            };

            let password = match meeting.password {
                PasswordPolicy::Shared => config.passwords.shared.clone(),
                PasswordPolicy::Derived => derive_password(
                    &meeting.topic,
                    &config.passwords.salt,
                    config.passwords.derived_length,
                ),
            };

            let identifier = MeetingIdentifier::new(meeting.id.as_str())
                .map_err(|e| PlanError::Invalid(format!("meeting {:?}: {}", meeting.id, e)))?;

            resolved.push(ResolvedMeeting {
                identifier,
                owner_email: config.hosts.email_for_slot(slot),
                config: MeetingConfig {
                    topic: meeting.topic.clone(),
                    start_time,
                    duration: meeting.duration,
                    password,
                    waiting_room: meeting.waiting_room,
                },
            });
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use chrono::TimeZone;

    fn config() -> Config {
        load_config_from_str(
            r#"
[api]
token = "t"

[hosts]
email_template = "host+{}@example.com"

[passwords]
shared = "shared1"
salt = "salt"
"#,
        )
        .unwrap()
    }

    const PLAN: &str = r#"
[sessions]
"1" = "2020-04-26T14:00:00Z"
"2" = "2020-04-26T21:00:00Z"

[[meeting]]
id = "BAICS_1"
topic = "Talk A"
session = "1"
duration = 60

[[meeting]]
id = "BAICS_2"
topic = "Talk B"
session = "1"
duration = 60

[[meeting]]
id = "BAICS_3"
topic = "Talk C"
session = "2"
duration = 60

[[meeting]]
id = "meet_and_greet_0"
topic = "Meet-and-Greet: Ada and Grace"
start_time = "2020-04-26T13:00:00Z"
duration = 30
waiting_room = false
password = "derived"
host_slot = 7
"#;

    #[test]
    fn test_parse_plan() {
        let plan = parse_plan(PLAN).unwrap();
        assert_eq!(plan.sessions.len(), 2);
        assert_eq!(plan.meetings.len(), 4);
        assert!(plan.meetings[0].waiting_room);
        assert_eq!(plan.meetings[0].password, PasswordPolicy::Shared);
        assert_eq!(plan.meetings[3].password, PasswordPolicy::Derived);
    }

    #[test]
    fn test_resolve_assigns_host_slots_per_start_time() {
        let resolved = parse_plan(PLAN).unwrap().resolve(&config()).unwrap();

        let emails: Vec<_> = resolved.iter().map(|m| m.owner_email.as_str()).collect();
        assert_eq!(
            emails,
            vec![
                "host+0@example.com",
                "host+1@example.com",
                "host+0@example.com",
                "host+7@example.com",
            ]
        );
        assert_eq!(
            resolved[2].config.start_time,
            Utc.with_ymd_and_hms(2020, 4, 26, 21, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_resolve_passwords() {
        let resolved = parse_plan(PLAN).unwrap().resolve(&config()).unwrap();

        assert_eq!(resolved[0].config.password, "shared1");
        assert_eq!(
            resolved[3].config.password,
            derive_password("Meet-and-Greet: Ada and Grace", "salt", 10)
        );
        assert!(!resolved[3].config.waiting_room);
        assert_eq!(resolved[3].config.duration, 30);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let plan = r#"
[[meeting]]
id = "A"
topic = "x"
start_time = "2020-04-26T14:00:00Z"
duration = 60

[[meeting]]
id = "A"
topic = "y"
start_time = "2020-04-26T14:00:00Z"
duration = 60
"#;
        assert!(matches!(parse_plan(plan), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn test_implicit_slots_skip_explicit_ones() {
        let plan = r#"
[[meeting]]
id = "A"
topic = "a"
start_time = "2020-04-26T14:00:00Z"
duration = 60
host_slot = 1

[[meeting]]
id = "B"
topic = "b"
start_time = "2020-04-26T14:00:00Z"
duration = 60

[[meeting]]
id = "C"
topic = "c"
start_time = "2020-04-26T14:00:00Z"
duration = 60
"#;
        let resolved = parse_plan(plan).unwrap().resolve(&config()).unwrap();

        let emails: Vec<_> = resolved.iter().map(|m| m.owner_email.as_str()).collect();
        assert_eq!(
            emails,
            vec![
                "host+1@example.com",
                "host+0@example.com",
                "host+2@example.com",
            ]
        );
    }

    #[test]
    fn test_explicit_slot_collision_rejected() {
        let plan = r#"
[[meeting]]
id = "A"
topic = "a"
start_time = "2020-04-26T14:00:00Z"
duration = 60
host_slot = 3

[[meeting]]
id = "B"
topic = "b"
start_time = "2020-04-26T14:00:00Z"
duration = 60
host_slot = 3
"#;
        assert!(matches!(parse_plan(plan), Err(PlanError::Invalid(_))));

        // Same slot at different start times is fine.
        let plan = plan.replacen("14:00:00Z", "18:00:00Z", 1);
        assert!(parse_plan(&plan).is_ok());
    }

    #[test]
    fn test_unknown_session_rejected() {
        let plan = r#"
[[meeting]]
id = "A"
topic = "x"
session = "9"
duration = 60
"#;
        assert!(matches!(parse_plan(plan), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn test_missing_start_rejected() {
        let plan = r#"
[[meeting]]
id = "A"
topic = "x"
duration = 60
"#;
        assert!(matches!(parse_plan(plan), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn test_reserved_id_rejected() {
        let plan = r#"
[[meeting]]
id = "users"
topic = "x"
start_time = "2020-04-26T14:00:00Z"
duration = 60
"#;
        assert!(matches!(parse_plan(plan), Err(PlanError::Invalid(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let plan = r#"
[[meeting]]
id = "A"
topic = "x"
start_time = "2020-04-26T14:00:00Z"
duration = 60
hots_slot = 1
"#;
        assert!(matches!(parse_plan(plan), Err(PlanError::ParseError(_))));
    }

    #[test]
    fn test_load_plan_missing_file() {
        let err = load_plan(Path::new("/nonexistent/plan.toml")).unwrap_err();
        assert!(matches!(err, PlanError::FileNotFound(_)));
    }
}
