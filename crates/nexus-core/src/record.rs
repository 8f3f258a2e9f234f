//! Alumni records: the unit of the directory snapshot.
//!
//! The wire shape uses camelCase field names. Older payloads carry the
//! identifier as `_id`; it is accepted as an alias so records are normalised
//! once, at deserialisation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Schools ─────────────────────────────────────────────────────────────────

/// Outcome of an application to a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolStatus {
  Accepted,
  Rejected,
}

/// One entry of [`AlumniRecord::schools_applied`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolApplication {
  pub name:   String,
  pub status: SchoolStatus,
}

impl SchoolApplication {
  pub fn accepted(name: impl Into<String>) -> Self {
    Self { name: name.into(), status: SchoolStatus::Accepted }
  }

  pub fn rejected(name: impl Into<String>) -> Self {
    Self { name: name.into(), status: SchoolStatus::Rejected }
  }

  pub fn is_accepted(&self) -> bool { self.status == SchoolStatus::Accepted }
}

// ─── Grades ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
  pub subject: String,
  pub value:   f64,
}

// ─── AlumniRecord ────────────────────────────────────────────────────────────

/// A single alumni profile as served by `GET /api/alumni`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlumniRecord {
  #[serde(alias = "_id")]
  pub id:              Uuid,
  /// The account that owns this profile, if it was created by a user.
  #[serde(default)]
  pub user_id:         Option<Uuid>,
  pub name:            String,
  #[serde(default)]
  pub degree:          String,
  #[serde(default)]
  pub position:        String,
  /// Domain tags, e.g. `["Physique", "Chimie"]`.
  #[serde(default)]
  pub field:           Vec<String>,
  #[serde(default)]
  pub avatar:          String,
  #[serde(default)]
  pub color:           Option<String>,
  #[serde(default)]
  pub gradient:        Option<String>,
  #[serde(default)]
  pub hidden:          bool,
  #[serde(default)]
  pub is_admin:        bool,
  /// Position 0 is the undergraduate institution, position 1 the current
  /// one.
  #[serde(default)]
  pub schools_applied: Vec<SchoolApplication>,
  #[serde(default)]
  pub grades:          Vec<Grade>,
  #[serde(default)]
  pub future_goals:    Option<String>,
  #[serde(default)]
  pub annee_fin_l3:    Option<String>,
  #[serde(default)]
  pub nationalities:   Option<String>,
  #[serde(default)]
  pub linkedin:        Option<String>,
  #[serde(default)]
  pub email:           Option<String>,
  #[serde(default)]
  pub created_at:      Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at:      Option<DateTime<Utc>>,
}

impl AlumniRecord {
  /// A visible, non-admin record with only `id` and `name` set.
  pub fn new(id: Uuid, name: impl Into<String>) -> Self {
    Self {
      id,
      user_id: None,
      name: name.into(),
      degree: String::new(),
      position: String::new(),
      field: Vec::new(),
      avatar: String::new(),
      color: None,
      gradient: None,
      hidden: false,
      is_admin: false,
      schools_applied: Vec::new(),
      grades: Vec::new(),
      future_goals: None,
      annee_fin_l3: None,
      nationalities: None,
      linkedin: None,
      email: None,
      created_at: None,
      updated_at: None,
    }
  }

  pub fn undergraduate_school(&self) -> Option<&SchoolApplication> {
    self.schools_applied.first()
  }

  pub fn current_school(&self) -> Option<&SchoolApplication> {
    self.schools_applied.get(1)
  }

  /// Names of the schools that accepted this alumnus, in application order.
  pub fn accepted_schools(&self) -> impl Iterator<Item = &str> {
    self
      .schools_applied
      .iter()
      .filter(|s| s.is_accepted())
      .map(|s| s.name.as_str())
  }
}

// ─── AlumniProfile ───────────────────────────────────────────────────────────

/// The editable part of a record: input to profile create/update.
/// `id`, `user_id`, `is_admin` and timestamps are assigned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlumniProfile {
  pub name:            String,
  pub degree:          String,
  pub position:        String,
  pub field:           Vec<String>,
  pub avatar:          String,
  pub color:           Option<String>,
  pub gradient:        Option<String>,
  pub hidden:          bool,
  pub schools_applied: Vec<SchoolApplication>,
  pub grades:          Vec<Grade>,
  pub future_goals:    Option<String>,
  pub annee_fin_l3:    Option<String>,
  pub nationalities:   Option<String>,
  pub linkedin:        Option<String>,
  pub email:           Option<String>,
}

impl AlumniProfile {
  /// Overwrite the editable fields of `record` with this profile.
  pub fn apply_to(self, record: &mut AlumniRecord) {
    record.name = self.name;
    record.degree = self.degree;
    record.position = self.position;
    record.field = self.field;
    record.avatar = self.avatar;
    record.color = self.color;
    record.gradient = self.gradient;
    record.hidden = self.hidden;
    record.schools_applied = self.schools_applied;
    record.grades = self.grades;
    record.future_goals = self.future_goals;
    record.annee_fin_l3 = self.annee_fin_l3;
    record.nationalities = self.nationalities;
    record.linkedin = self.linkedin;
    record.email = self.email;
  }
}

impl From<&AlumniRecord> for AlumniProfile {
  fn from(r: &AlumniRecord) -> Self {
    Self {
      name:            r.name.clone(),
      degree:          r.degree.clone(),
      position:        r.position.clone(),
      field:           r.field.clone(),
      avatar:          r.avatar.clone(),
      color:           r.color.clone(),
      gradient:        r.gradient.clone(),
      hidden:          r.hidden,
      schools_applied: r.schools_applied.clone(),
      grades:          r.grades.clone(),
      future_goals:    r.future_goals.clone(),
      annee_fin_l3:    r.annee_fin_l3.clone(),
      nationalities:   r.nationalities.clone(),
      linkedin:        r.linkedin.clone(),
      email:           r.email.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn underscore_id_is_accepted() {
    let json = r#"{
      "_id": "00000000-0000-0000-0000-000000000007",
      "name": "Marie",
      "isAdmin": true,
      "schoolsApplied": [
        {"name": "Sorbonne Université", "status": "accepted"},
        {"name": "ENS", "status": "rejected"}
      ]
    }"#;
    let record: AlumniRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.id, Uuid::from_u128(7));
    assert!(record.is_admin);
    assert!(!record.hidden);
    assert_eq!(record.undergraduate_school().unwrap().name, "Sorbonne Université");
    assert_eq!(record.current_school().unwrap().status, SchoolStatus::Rejected);
    assert_eq!(record.accepted_schools().collect::<Vec<_>>(), ["Sorbonne Université"]);
  }

  #[test]
  fn profile_apply_keeps_identity() {
    let mut record = AlumniRecord::new(Uuid::from_u128(1), "Old");
    record.is_admin = true;
    let profile = AlumniProfile {
      name: "New".into(),
      hidden: true,
      field: vec!["Physique".into()],
      ..Default::default()
    };
    profile.apply_to(&mut record);
    assert_eq!(record.id, Uuid::from_u128(1));
    assert_eq!(record.name, "New");
    assert!(record.hidden);
    assert!(record.is_admin);
  }
}
