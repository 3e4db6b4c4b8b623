use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::StoreError;

/// Kanban lane of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Interviewing,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    /// All lanes in board order.
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
    ];

    /// Position of the lane on the board; listing sorts by this, not by the stored name.
    pub fn lane_rank(self) -> u8 {
        match self {
            ApplicationStatus::Applied => 0,
            ApplicationStatus::Interviewing => 1,
            ApplicationStatus::Offer => 2,
            ApplicationStatus::Rejected => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::Offer => "Offer",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status '{s}'")))
    }
}

/// A job application owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobApplication {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub company_name: String,
    pub position_title: String,
    pub status: ApplicationStatus,
    pub interview_stage: Option<String>,
    pub rejection_stage: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub application_date: OffsetDateTime,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub order_index: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields supplied on creation; the store assigns id, order_index and timestamps.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub company_name: String,
    pub position_title: String,
    pub status: ApplicationStatus,
    pub interview_stage: Option<String>,
    pub rejection_stage: Option<String>,
    pub application_date: OffsetDateTime,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Merge patch. `None` leaves a field as is; for nullable fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub company_name: Option<String>,
    pub position_title: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub interview_stage: Option<Option<String>>,
    pub rejection_stage: Option<Option<String>>,
    pub application_date: Option<OffsetDateTime>,
    pub salary_range: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub order_index: Option<i32>,
}

impl ApplicationPatch {
    pub fn apply_to(self, app: &mut JobApplication) {
        if let Some(v) = self.company_name {
            app.company_name = v;
        }
        if let Some(v) = self.position_title {
            app.position_title = v;
        }
        if let Some(v) = self.status {
            app.status = v;
        }
        if let Some(v) = self.interview_stage {
            app.interview_stage = v;
        }
        if let Some(v) = self.rejection_stage {
            app.rejection_stage = v;
        }
        if let Some(v) = self.application_date {
            app.application_date = v;
        }
        if let Some(v) = self.salary_range {
            app.salary_range = v;
        }
        if let Some(v) = self.location {
            app.location = v;
        }
        if let Some(v) = self.notes {
            app.notes = v;
        }
        if let Some(v) = self.order_index {
            app.order_index = v;
        }
    }
}

/// Drop target of a drag-and-drop move.
#[derive(Debug, Clone)]
pub struct MoveTarget {
    pub status: ApplicationStatus,
    pub order_index: i32,
    pub interview_stage: Option<String>,
    pub rejection_stage: Option<String>,
}

/// Raw `job_applications` row; status is stored by name.
#[derive(Debug, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub position_title: String,
    pub status: String,
    pub interview_stage: Option<String>,
    pub rejection_stage: Option<String>,
    pub application_date: OffsetDateTime,
    pub salary_range: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub order_index: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ApplicationRow> for JobApplication {
    type Error = StoreError;

    fn try_from(r: ApplicationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            company_name: r.company_name,
            position_title: r.position_title,
            status: r.status.parse()?,
            interview_stage: r.interview_stage,
            rejection_stage: r.rejection_stage,
            application_date: r.application_date,
            salary_range: r.salary_range,
            location: r.location,
            notes: r.notes,
            order_index: r.order_index,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
