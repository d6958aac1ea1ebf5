use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;

// ---------- Facility taxonomy ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Division {
    pub id: i64,
    pub name: String,
    pub spv_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Floor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub floor_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct AssetCategory {
    pub id: i64,
    pub name: String,
}

// ---------- Assets ----------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub location: String,
    pub category_id: i64,
    pub floor_id: Option<i64>,
    pub zone_id: Option<i64>,
    pub division_id: i64,
}

/// The supervisor-editable part of an asset. The division is never taken from input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AssetInput {
    #[validate(length(min = 1, message = "Asset name is required"))]
    pub name: String,
    pub description: String,
    pub location: String,
    pub category_id: i64,
    pub floor_id: Option<i64>,
    pub zone_id: Option<i64>,
}

// ---------- Checklists ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Visual,
    Measurement,
    Functional,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Visual => "visual",
            InputType::Measurement => "measurement",
            InputType::Functional => "functional",
        }
    }
}

impl FromStr for InputType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visual" => Ok(InputType::Visual),
            "measurement" => Ok(InputType::Measurement),
            "functional" => Ok(InputType::Functional),
            other => Err(AppError::Validation(format!("Unknown task input type: {}", other))),
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub position: i64,
    pub description: String,
    pub input_type: InputType,
    pub expected_unit: String,
    pub actual_value: Option<String>,
    pub note: String,
    pub material_used: String,
    pub status: String,
    pub photos: Vec<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTask {
    pub id: Option<i64>,
    pub position: Option<i64>,
    pub description: Option<String>,
    pub input_type: Option<String>,
    pub expected_unit: Option<String>,
    pub actual_value: Option<String>,
    pub note: Option<String>,
    pub material_used: Option<String>,
    pub status: Option<String>,
    pub photos: Option<String>,
}

impl TryFrom<DbTask> for Task {
    type Error = AppError;

    fn try_from(task: DbTask) -> Result<Self, Self::Error> {
        let photos = match task.photos.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Vec::new(),
        };

        Ok(Self {
            id: task.id.unwrap_or_default(),
            position: task.position.unwrap_or_default(),
            description: task.description.unwrap_or_default(),
            input_type: task.input_type.unwrap_or_default().parse()?,
            expected_unit: task.expected_unit.unwrap_or_default(),
            actual_value: task.actual_value,
            note: task.note.unwrap_or_default(),
            material_used: task.material_used.unwrap_or_default(),
            status: task.status.unwrap_or_else(|| "pending".to_string()),
            photos,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTask {
    #[validate(length(min = 1, message = "Task description is required"))]
    pub description: String,
    pub input_type: InputType,
    pub expected_unit: String,
    pub actual_value: Option<String>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChecklistInput {
    #[validate(length(min = 1, message = "Checklist title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "A checklist needs at least one task"))]
    #[validate(nested)]
    pub tasks: Vec<NewTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checklist {
    pub id: i64,
    pub title: String,
    pub tasks: Vec<Task>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub order: i64,
}

// ---------- Assignments & submissions ----------

/// One task's submitted result. The description is captured at submission time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskResponse {
    pub description: String,
    pub value: Option<String>,
    pub photos: Vec<String>,
}

pub type Responses = BTreeMap<String, TaskResponse>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistAssignment {
    pub id: i64,
    pub checklist_id: i64,
    pub asset_id: i64,
    /// Copied from the asset when the row is written, so history keeps its
    /// division after the asset is deleted.
    pub division_id: Option<i64>,
    pub assigned_at: DateTime<Utc>,
    pub is_template: bool,
    pub responses: Option<Responses>,
    pub completed_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistSummary {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetSummary {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub division_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
}

/// An assignment row populated with its checklist, asset and submitter.
/// Any of the three may be gone if the referenced row was deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentView {
    pub assignment: ChecklistAssignment,
    pub checklist: Option<ChecklistSummary>,
    pub asset: Option<AssetSummary>,
    pub submitter: Option<UserSummary>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbAssignmentRow {
    pub id: Option<i64>,
    pub checklist_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub division_id: Option<i64>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub is_template: Option<bool>,
    pub responses: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<i64>,
    pub checklist_title: Option<String>,
    pub asset_name: Option<String>,
    pub asset_location: Option<String>,
    pub asset_division_id: Option<i64>,
    pub submitter_name: Option<String>,
}

impl TryFrom<DbAssignmentRow> for AssignmentView {
    type Error = AppError;

    fn try_from(row: DbAssignmentRow) -> Result<Self, Self::Error> {
        let responses = match row.responses.as_deref() {
            Some(raw) => Some(serde_json::from_str::<Responses>(raw)?),
            None => None,
        };

        let checklist_id = row.checklist_id.unwrap_or_default();
        let asset_id = row.asset_id.unwrap_or_default();

        Ok(Self {
            checklist: row.checklist_title.map(|title| ChecklistSummary {
                id: checklist_id,
                title,
            }),
            asset: row.asset_name.map(|name| AssetSummary {
                id: asset_id,
                name,
                location: row.asset_location.unwrap_or_default(),
                division_id: row.asset_division_id.unwrap_or_default(),
            }),
            submitter: match (row.submitted_by, row.submitter_name) {
                (Some(id), Some(name)) => Some(UserSummary { id, name }),
                _ => None,
            },
            assignment: ChecklistAssignment {
                id: row.id.unwrap_or_default(),
                checklist_id,
                asset_id,
                division_id: row.division_id,
                assigned_at: row.assigned_at.unwrap_or_else(Utc::now),
                is_template: row.is_template.unwrap_or_default(),
                responses,
                completed_at: row.completed_at,
                submitted_by: row.submitted_by,
            },
        })
    }
}
