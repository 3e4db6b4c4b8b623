use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::repo_types::{
    ApplicationPatch, ApplicationRow, ApplicationStatus, JobApplication, MoveTarget,
    NewApplication,
};
use super::services::{next_order_index, plan_move, reconcile_stages};
use crate::db::StoreError;

/// Persistence for job applications. Every method is scoped to the owner:
/// an id belonging to someone else behaves exactly like a missing one.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// All of the user's applications, board order (lane rank, then index).
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<JobApplication>, StoreError>;

    /// One lane in index order.
    async fn list_lane(
        &self,
        user_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Vec<JobApplication>, StoreError>;

    async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<JobApplication>, StoreError>;

    /// Appends to the end of the lane.
    async fn create(
        &self,
        user_id: Uuid,
        new: NewApplication,
    ) -> Result<JobApplication, StoreError>;

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<Option<JobApplication>, StoreError>;

    /// Removes the card without renumbering its lane.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;

    /// Drag-and-drop: changes lane and/or slot and shifts siblings, atomically.
    async fn move_to(
        &self,
        id: Uuid,
        user_id: Uuid,
        target: MoveTarget,
    ) -> Result<Option<JobApplication>, StoreError>;

    async fn max_order_index_in_lane(
        &self,
        user_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<i32>, StoreError>;

    /// Number of applications per lane; lanes without cards may be absent.
    async fn status_counts(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(ApplicationStatus, i64)>, StoreError>;

    /// Applications per `YYYY-MM` of their application date, ascending.
    async fn monthly_counts(&self, user_id: Uuid) -> Result<Vec<(String, i64)>, StoreError>;

    async fn application_dates(
        &self,
        user_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Vec<OffsetDateTime>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

macro_rules! application_columns {
    () => {
        "id, user_id, company_name, position_title, status, interview_stage, rejection_stage, \
         application_date, salary_range, location, notes, order_index, created_at, updated_at"
    };
}

pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_applications(rows: Vec<ApplicationRow>) -> Result<Vec<JobApplication>, StoreError> {
    rows.into_iter().map(JobApplication::try_from).collect()
}

/// Serializes lane-changing writes of one user.
async fn lock_owner(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> Result<(), StoreError> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(())
}

async fn lane_max<'e, E>(
    executor: E,
    user_id: Uuid,
    status: ApplicationStatus,
) -> Result<Option<i32>, StoreError>
where
    E: sqlx::PgExecutor<'e>,
{
    let max = sqlx::query_scalar(
        "SELECT MAX(order_index) FROM job_applications WHERE user_id = $1 AND status = $2",
    )
    .bind(user_id)
    .bind(status.as_str())
    .fetch_one(executor)
    .await?;
    Ok(max)
}

async fn fetch_for_update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<JobApplication>, StoreError> {
    let row = sqlx::query_as::<_, ApplicationRow>(concat!(
        "SELECT ",
        application_columns!(),
        " FROM job_applications WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;
    row.map(JobApplication::try_from).transpose()
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<JobApplication>, StoreError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(concat!(
            "SELECT ",
            application_columns!(),
            " FROM job_applications WHERE user_id = $1 ORDER BY order_index, created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let mut apps = into_applications(rows)?;
        apps.sort_by_key(|a| (a.status.lane_rank(), a.order_index));
        Ok(apps)
    }

    async fn list_lane(
        &self,
        user_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Vec<JobApplication>, StoreError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(concat!(
            "SELECT ",
            application_columns!(),
            " FROM job_applications WHERE user_id = $1 AND status = $2 \
             ORDER BY order_index, created_at"
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        into_applications(rows)
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<JobApplication>, StoreError> {
        let row = sqlx::query_as::<_, ApplicationRow>(concat!(
            "SELECT ",
            application_columns!(),
            " FROM job_applications WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(JobApplication::try_from).transpose()
    }

    async fn create(
        &self,
        user_id: Uuid,
        new: NewApplication,
    ) -> Result<JobApplication, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        let order_index = next_order_index(lane_max(&mut *tx, user_id, new.status).await?)?;

        let row = sqlx::query_as::<_, ApplicationRow>(concat!(
            "INSERT INTO job_applications \
             (id, user_id, company_name, position_title, status, interview_stage, \
              rejection_stage, application_date, salary_range, location, notes, order_index) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING ",
            application_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&new.company_name)
        .bind(&new.position_title)
        .bind(new.status.as_str())
        .bind(&new.interview_stage)
        .bind(&new.rejection_stage)
        .bind(new.application_date)
        .bind(&new.salary_range)
        .bind(&new.location)
        .bind(&new.notes)
        .bind(order_index)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<Option<JobApplication>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let Some(mut app) = fetch_for_update(&mut tx, id, user_id).await? else {
            return Ok(None);
        };
        patch.apply_to(&mut app);

        let row = sqlx::query_as::<_, ApplicationRow>(concat!(
            "UPDATE job_applications \
                SET company_name = $3, position_title = $4, status = $5, \
                    interview_stage = $6, rejection_stage = $7, application_date = $8, \
                    salary_range = $9, location = $10, notes = $11, order_index = $12, \
                    updated_at = now() \
              WHERE id = $1 AND user_id = $2 \
             RETURNING ",
            application_columns!()
        ))
        .bind(id)
        .bind(user_id)
        .bind(&app.company_name)
        .bind(&app.position_title)
        .bind(app.status.as_str())
        .bind(&app.interview_stage)
        .bind(&app.rejection_stage)
        .bind(app.application_date)
        .bind(&app.salary_range)
        .bind(&app.location)
        .bind(&app.notes)
        .bind(app.order_index)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into().map(Some)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn move_to(
        &self,
        id: Uuid,
        user_id: Uuid,
        target: MoveTarget,
    ) -> Result<Option<JobApplication>, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;
        let Some(current) = fetch_for_update(&mut tx, id, user_id).await? else {
            return Ok(None);
        };

        if let Some(shift) = plan_move(
            current.status,
            current.order_index,
            target.status,
            target.order_index,
        ) {
            sqlx::query(
                "SELECT id FROM job_applications \
                 WHERE user_id = $1 AND status = $2 AND id <> $3 FOR UPDATE",
            )
            .bind(user_id)
            .bind(shift.status.as_str())
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            let shifted = sqlx::query(
                "UPDATE job_applications SET order_index = order_index + $4 \
                 WHERE user_id = $1 AND status = $2 AND id <> $3 \
                   AND order_index >= $5 AND ($6::INT4 IS NULL OR order_index <= $6)",
            )
            .bind(user_id)
            .bind(shift.status.as_str())
            .bind(id)
            .bind(shift.delta)
            .bind(shift.lower)
            .bind(shift.upper)
            .execute(&mut *tx)
            .await?;
            debug!(
                application_id = %id,
                lane = %shift.status,
                shifted = shifted.rows_affected(),
                delta = shift.delta,
                "siblings shifted"
            );
        }

        let (interview_stage, rejection_stage) = reconcile_stages(
            target.status,
            target.interview_stage,
            target.rejection_stage,
        );
        let row = sqlx::query_as::<_, ApplicationRow>(concat!(
            "UPDATE job_applications \
                SET status = $3, order_index = $4, interview_stage = $5, \
                    rejection_stage = $6, updated_at = now() \
              WHERE id = $1 AND user_id = $2 \
             RETURNING ",
            application_columns!()
        ))
        .bind(id)
        .bind(user_id)
        .bind(target.status.as_str())
        .bind(target.order_index)
        .bind(interview_stage)
        .bind(rejection_stage)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into().map(Some)
    }

    async fn max_order_index_in_lane(
        &self,
        user_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<i32>, StoreError> {
        lane_max(&self.pool, user_id, status).await
    }

    async fn status_counts(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(ApplicationStatus, i64)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM job_applications WHERE user_id = $1 GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(status, count)| Ok((status.parse()?, count)))
            .collect()
    }

    async fn monthly_counts(&self, user_id: Uuid) -> Result<Vec<(String, i64)>, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT to_char(application_date AT TIME ZONE 'UTC', 'YYYY-MM') AS month, COUNT(*)
            FROM job_applications
            WHERE user_id = $1
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn application_dates(
        &self,
        user_id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Vec<OffsetDateTime>, StoreError> {
        let dates = sqlx::query_scalar(
            "SELECT application_date FROM job_applications WHERE user_id = $1 AND status = $2",
        )
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(dates)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
