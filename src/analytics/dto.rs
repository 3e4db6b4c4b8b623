use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationsByStatus {
    pub applied: i64,
    pub interviewing: i64,
    pub offer: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub date: String,
    pub count: i64,
}

/// Mean whole days since the application date, per lane.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AverageTimePerStage {
    pub applied: f64,
    pub interviewing: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsResponse {
    pub total_applications: i64,
    pub by_status: ApplicationsByStatus,
    pub applications_over_time: Vec<MonthlyCount>,
    pub average_time_per_stage: AverageTimePerStage,
    pub success_rate: f64,
}
