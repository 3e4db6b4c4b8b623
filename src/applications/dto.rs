use serde::{Deserialize, Deserializer};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use super::repo_types::{ApplicationPatch, ApplicationStatus, MoveTarget, NewApplication};
use super::services::MAX_ORDER_INDEX;
use crate::auth::dto::present;
use crate::error::AppError;

const NAME_MAX: usize = 255;
const STAGE_MAX: usize = 100;
const LOCATION_MAX: usize = 255;

/// `GET /applications?status=Interviewing`
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status: Option<ApplicationStatus>,
}

/// Request body for `POST /applications`. The board decides the slot, so a
/// submitted `order_index` is accepted and ignored.
#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub company_name: String,
    pub position_title: String,
    #[serde(default = "default_status")]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub interview_stage: Option<String>,
    #[serde(default)]
    pub rejection_stage: Option<String>,
    #[serde(deserialize_with = "datetime")]
    pub application_date: OffsetDateTime,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub order_index: Option<i32>,
}

fn default_status() -> ApplicationStatus {
    ApplicationStatus::Applied
}

impl CreateApplicationRequest {
    pub fn validate(self) -> Result<NewApplication, AppError> {
        check_len("company_name", &self.company_name, 1, NAME_MAX)?;
        check_len("position_title", &self.position_title, 1, NAME_MAX)?;
        check_optional("interview_stage", self.interview_stage.as_deref(), STAGE_MAX)?;
        check_optional("rejection_stage", self.rejection_stage.as_deref(), STAGE_MAX)?;
        check_optional("salary_range", self.salary_range.as_deref(), STAGE_MAX)?;
        check_optional("location", self.location.as_deref(), LOCATION_MAX)?;
        if let Some(index) = self.order_index {
            check_index(index)?;
        }

        Ok(NewApplication {
            company_name: self.company_name,
            position_title: self.position_title,
            status: self.status,
            interview_stage: self.interview_stage,
            rejection_stage: self.rejection_stage,
            application_date: self.application_date,
            salary_range: self.salary_range,
            location: self.location,
            notes: self.notes,
        })
    }
}

/// Request body for `PUT /applications/:id`: a merge patch. Absent fields are
/// kept; `null` clears the optional text fields.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplicationRequest {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub position_title: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default, deserialize_with = "present")]
    pub interview_stage: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub rejection_stage: Option<Option<String>>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub application_date: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "present")]
    pub salary_range: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub order_index: Option<i32>,
}

impl UpdateApplicationRequest {
    pub fn validate(self) -> Result<ApplicationPatch, AppError> {
        if let Some(name) = &self.company_name {
            check_len("company_name", name, 1, NAME_MAX)?;
        }
        if let Some(title) = &self.position_title {
            check_len("position_title", title, 1, NAME_MAX)?;
        }
        check_optional("interview_stage", inner(&self.interview_stage), STAGE_MAX)?;
        check_optional("rejection_stage", inner(&self.rejection_stage), STAGE_MAX)?;
        check_optional("salary_range", inner(&self.salary_range), STAGE_MAX)?;
        check_optional("location", inner(&self.location), LOCATION_MAX)?;
        if let Some(index) = self.order_index {
            check_index(index)?;
        }

        Ok(ApplicationPatch {
            company_name: self.company_name,
            position_title: self.position_title,
            status: self.status,
            interview_stage: self.interview_stage,
            rejection_stage: self.rejection_stage,
            application_date: self.application_date,
            salary_range: self.salary_range,
            location: self.location,
            notes: self.notes,
            order_index: self.order_index,
        })
    }
}

/// Request body for `PATCH /applications/:id/move`.
#[derive(Debug, Deserialize)]
pub struct MoveApplicationRequest {
    pub status: ApplicationStatus,
    pub order_index: i32,
    #[serde(default)]
    pub interview_stage: Option<String>,
    #[serde(default)]
    pub rejection_stage: Option<String>,
}

impl MoveApplicationRequest {
    pub fn validate(self) -> Result<MoveTarget, AppError> {
        check_index(self.order_index)?;
        check_optional("interview_stage", self.interview_stage.as_deref(), STAGE_MAX)?;
        check_optional("rejection_stage", self.rejection_stage.as_deref(), STAGE_MAX)?;
        Ok(MoveTarget {
            status: self.status,
            order_index: self.order_index,
            interview_stage: self.interview_stage,
            rejection_stage: self.rejection_stage,
        })
    }
}

fn inner(field: &Option<Option<String>>) -> Option<&str> {
    field.as_ref().and_then(|v| v.as_deref())
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn check_optional(field: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

fn check_index(index: i32) -> Result<(), AppError> {
    if !(0..=MAX_ORDER_INDEX).contains(&index) {
        return Err(AppError::Validation(format!(
            "order_index must be between 0 and {MAX_ORDER_INDEX}"
        )));
    }
    Ok(())
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD` taken as UTC.
fn parse_datetime(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt);
    }
    let naive = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ];
    for format in naive {
        if let Ok(dt) = PrimitiveDateTime::parse(raw, format) {
            return Some(dt.assume_utc());
        }
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.midnight().assume_utc())
}

fn datetime<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime '{raw}'")))
}

fn optional_datetime<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid datetime '{raw}'"))),
    }
}
