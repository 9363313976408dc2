//! Core types for download-tracker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Defines an `i64`-backed identifier newtype with the conversions and sqlx
/// bindings every row id in this crate needs.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Create a new identifier
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the inner i64 value
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl PartialEq<i64> for $name {
            fn eq(&self, other: &i64) -> bool {
                self.0 == *other
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
            }

            fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
                <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                Ok(Self(id))
            }
        }
    };
}

row_id! {
    /// Unique identifier for a download job
    JobId
}

row_id! {
    /// Unique identifier for a registered user (the owner of jobs)
    UserId
}

/// Job status
///
/// Transitions only move forward: `Pending → Processing → {Completed | Failed}`.
/// A pending job may also fail directly if it cannot be started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Accepted and waiting for the engine to claim it
    Pending,
    /// Claimed by the engine, progress advancing
    Processing,
    /// Finished successfully, result location recorded
    Completed,
    /// Finished with an error, diagnostic recorded
    Failed,
}

impl Status {
    /// All statuses in lifecycle order
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Processing,
        Status::Completed,
        Status::Failed,
    ];

    /// Convert integer status code to Status enum
    pub fn from_i32(status: i32) -> Self {
        match status {
            0 => Status::Pending,
            1 => Status::Processing,
            2 => Status::Completed,
            3 => Status::Failed,
            _ => Status::Failed, // Default to Failed for unknown status
        }
    }

    /// Convert Status enum to integer status code
    pub fn to_i32(&self) -> i32 {
        match self {
            Status::Pending => 0,
            Status::Processing => 1,
            Status::Completed => 2,
            Status::Failed => 3,
        }
    }

    /// Lowercase name, as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    /// Whether moving from `self` to `next` is a legal forward transition
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Processing)
                | (Status::Pending, Status::Failed)
                | (Status::Processing, Status::Completed)
                | (Status::Processing, Status::Failed)
        )
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single state transition applied by the job store
///
/// Each variant carries exactly the fields its target status populates, so a
/// completed job can never be written with a diagnostic or vice versa.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusUpdate {
    /// `pending → processing`, progress reset to 0
    Start,
    /// `processing → completed`, progress fixed at 100
    Complete {
        /// Where the result can be fetched from
        result_location: String,
    },
    /// `pending | processing → failed`
    Fail {
        /// Message of the condition that stopped the job
        diagnostic: String,
    },
}

impl StatusUpdate {
    /// Status the job ends up in after this update
    pub fn target(&self) -> Status {
        match self {
            StatusUpdate::Start => Status::Processing,
            StatusUpdate::Complete { .. } => Status::Completed,
            StatusUpdate::Fail { .. } => Status::Failed,
        }
    }
}

/// Job information as exposed to clients
///
/// Wire names follow the front end's existing contract (`url`, `filename`,
/// `file_path`, `error_message`).
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobInfo {
    /// Unique job identifier
    pub id: JobId,

    /// Owning user
    #[serde(rename = "user_id")]
    pub owner: UserId,

    /// What is to be fetched
    #[serde(rename = "url")]
    pub source_locator: String,

    /// Human-readable label derived from the locator
    #[serde(rename = "filename")]
    pub display_name: String,

    /// Current status
    pub status: Status,

    /// Progress percentage (0 to 100)
    pub progress: u8,

    /// Result location (completed jobs only)
    #[serde(rename = "file_path")]
    pub result_location: Option<String>,

    /// Failure message (failed jobs only)
    #[serde(rename = "error_message")]
    pub diagnostic: Option<String>,

    /// When the job was created
    pub created_at: DateTime<Utc>,

    /// When the engine claimed the job
    pub started_at: Option<DateTime<Utc>>,

    /// When the job reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-status job counts for one owner
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobStats {
    /// Total number of jobs (sum of the four status counts)
    pub total: usize,
    /// Jobs waiting to start
    pub pending: usize,
    /// Jobs currently advancing
    pub processing: usize,
    /// Successfully finished jobs
    pub completed: usize,
    /// Failed jobs
    pub failed: usize,
}

impl JobStats {
    /// Count jobs per status in a single pass
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a Status>) -> Self {
        statuses
            .into_iter()
            .fold(JobStats::default(), |mut stats, status| {
                stats.record(*status);
                stats
            })
    }

    fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Pending => self.pending += 1,
            Status::Processing => self.processing += 1,
            Status::Completed => self.completed += 1,
            Status::Failed => self.failed += 1,
        }
    }
}

/// Jobs of one owner together with counts describing exactly those jobs
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobList {
    /// Jobs, most recently created first
    #[serde(rename = "downloads")]
    pub jobs: Vec<JobInfo>,
    /// Counts over `jobs`
    pub stats: JobStats,
}

/// Handle to the result of a completed job
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ResultHandle {
    /// Job the result belongs to
    pub id: JobId,
    /// Suggested file name for the client
    pub file_name: String,
    /// Location recorded when the job completed
    pub location: String,
}

/// Registered user as exposed to clients
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    /// User ID
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login email (lower-cased)
    pub email: String,
}

/// Issued login session
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    /// When the token stops being accepted
    pub expires_at: DateTime<Utc>,
    /// The logged-in user
    pub user: UserInfo,
}

/// Event emitted during the job lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted in pending state
    Created {
        /// Job ID
        id: JobId,
        /// Owning user
        owner: UserId,
        /// Display name
        name: String,
    },

    /// Engine claimed the job
    Processing {
        /// Job ID
        id: JobId,
        /// Owning user
        owner: UserId,
    },

    /// Progress advanced
    Progress {
        /// Job ID
        id: JobId,
        /// Owning user
        owner: UserId,
        /// Progress percentage (0 to 100)
        percent: u8,
    },

    /// Job completed
    Completed {
        /// Job ID
        id: JobId,
        /// Owning user
        owner: UserId,
        /// Result location
        result_location: String,
    },

    /// Job failed
    Failed {
        /// Job ID
        id: JobId,
        /// Owning user
        owner: UserId,
        /// Failure message
        diagnostic: String,
    },

    /// Tracker is shutting down
    Shutdown,
}

impl Event {
    /// Owner the event concerns (`None` for broadcast events)
    pub fn owner(&self) -> Option<UserId> {
        match self {
            Event::Created { owner, .. }
            | Event::Processing { owner, .. }
            | Event::Progress { owner, .. }
            | Event::Completed { owner, .. }
            | Event::Failed { owner, .. } => Some(*owner),
            Event::Shutdown => None,
        }
    }

    /// Whether `user` may see this event
    pub fn is_visible_to(&self, user: UserId) -> bool {
        self.owner().is_none_or(|owner| owner == user)
    }

    /// SSE event name
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Created { .. } => "created",
            Event::Processing { .. } => "processing",
            Event::Progress { .. } => "progress",
            Event::Completed { .. } => "completed",
            Event::Failed { .. } => "failed",
            Event::Shutdown => "shutdown",
        }
    }
}
