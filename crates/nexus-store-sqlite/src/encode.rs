//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Domain tags are stored as a compact JSON
//! array.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use nexus_core::{
  account::{Session, User},
  bookmark::{Bookmark, BookmarkItemType},
  library::{Link, Resource},
  record::{AlumniRecord, Grade, SchoolApplication, SchoolStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision [`encode_dt`] keeps, so a value handed
/// back to the caller equals the one read from the row later.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Fixed-width so that lexical order in SQL matches chronological order.
pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_school_status(s: SchoolStatus) -> &'static str {
  match s {
    SchoolStatus::Accepted => "accepted",
    SchoolStatus::Rejected => "rejected",
  }
}

pub fn decode_school_status(s: &str) -> Result<SchoolStatus> {
  match s {
    "accepted" => Ok(SchoolStatus::Accepted),
    "rejected" => Ok(SchoolStatus::Rejected),
    other => Err(Error::Decode(format!("unknown school status: {other:?}"))),
  }
}

pub fn encode_item_type(t: BookmarkItemType) -> &'static str { t.into() }

pub fn decode_item_type(s: &str) -> Result<BookmarkItemType> {
  Ok(BookmarkItemType::parse(s)?)
}

// ─── Domain tags ─────────────────────────────────────────────────────────────

pub fn encode_fields(fields: &[String]) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_fields(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw columns of an `alumni_profiles` row, without its child rows.
pub struct RawAlumni {
  pub alumni_id:     String,
  pub user_id:       Option<String>,
  pub name:          String,
  pub degree:        String,
  pub position:      String,
  pub fields_json:   String,
  pub avatar:        String,
  pub color:         Option<String>,
  pub gradient:      Option<String>,
  pub hidden:        bool,
  pub is_admin:      bool,
  pub future_goals:  Option<String>,
  pub annee_fin_l3:  Option<String>,
  pub nationalities: Option<String>,
  pub linkedin:      Option<String>,
  pub email:         Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

/// Column list matching [`RawAlumni::from_row`].
pub const ALUMNI_COLUMNS: &str = "alumni_id, user_id, name, degree, position, fields_json, \
   avatar, color, gradient, hidden, is_admin, future_goals, annee_fin_l3, \
   nationalities, linkedin, email, created_at, updated_at";

impl RawAlumni {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      alumni_id:     row.get(0)?,
      user_id:       row.get(1)?,
      name:          row.get(2)?,
      degree:        row.get(3)?,
      position:      row.get(4)?,
      fields_json:   row.get(5)?,
      avatar:        row.get(6)?,
      color:         row.get(7)?,
      gradient:      row.get(8)?,
      hidden:        row.get(9)?,
      is_admin:      row.get(10)?,
      future_goals:  row.get(11)?,
      annee_fin_l3:  row.get(12)?,
      nationalities: row.get(13)?,
      linkedin:      row.get(14)?,
      email:         row.get(15)?,
      created_at:    row.get(16)?,
      updated_at:    row.get(17)?,
    })
  }

  pub fn into_record(
    self,
    schools: Vec<RawSchool>,
    grades: Vec<RawGrade>,
  ) -> Result<AlumniRecord> {
    Ok(AlumniRecord {
      id:              decode_uuid(&self.alumni_id)?,
      user_id:         self.user_id.as_deref().map(decode_uuid).transpose()?,
      name:            self.name,
      degree:          self.degree,
      position:        self.position,
      field:           decode_fields(&self.fields_json)?,
      avatar:          self.avatar,
      color:           self.color,
      gradient:        self.gradient,
      hidden:          self.hidden,
      is_admin:        self.is_admin,
      schools_applied: schools
        .into_iter()
        .map(RawSchool::into_school)
        .collect::<Result<_>>()?,
      grades:          grades.into_iter().map(RawGrade::into_grade).collect(),
      future_goals:    self.future_goals,
      annee_fin_l3:    self.annee_fin_l3,
      nationalities:   self.nationalities,
      linkedin:        self.linkedin,
      email:           self.email,
      created_at:      Some(decode_dt(&self.created_at)?),
      updated_at:      Some(decode_dt(&self.updated_at)?),
    })
  }
}

/// A `schools_applied` row.
pub struct RawSchool {
  pub alumni_id: String,
  pub name:      String,
  pub status:    String,
}

impl RawSchool {
  pub fn into_school(self) -> Result<SchoolApplication> {
    Ok(SchoolApplication {
      name:   self.name,
      status: decode_school_status(&self.status)?,
    })
  }
}

/// A `grades` row.
pub struct RawGrade {
  pub alumni_id: String,
  pub subject:   String,
  pub value:     f64,
}

impl RawGrade {
  pub fn into_grade(self) -> Grade { Grade { subject: self.subject, value: self.value } }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub is_admin:      bool,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      is_admin:      row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      is_admin:      self.is_admin,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

pub struct RawLink {
  pub link_id:     String,
  pub title:       String,
  pub url:         String,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub created_at:  String,
}

impl RawLink {
  pub fn into_link(self) -> Result<Link> {
    Ok(Link {
      link_id:     decode_uuid(&self.link_id)?,
      title:       self.title,
      url:         self.url,
      description: self.description,
      category:    self.category,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawResource {
  pub resource_id: String,
  pub title:       String,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub file_url:    String,
  pub created_at:  String,
}

impl RawResource {
  pub fn into_resource(self) -> Result<Resource> {
    Ok(Resource {
      resource_id: decode_uuid(&self.resource_id)?,
      title:       self.title,
      description: self.description,
      category:    self.category,
      file_url:    self.file_url,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawBookmark {
  pub bookmark_id: String,
  pub user_id:     String,
  pub item_id:     String,
  pub item_type:   String,
  pub created_at:  String,
}

impl RawBookmark {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bookmark_id: row.get(0)?,
      user_id:     row.get(1)?,
      item_id:     row.get(2)?,
      item_type:   row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_bookmark(self) -> Result<Bookmark> {
    Ok(Bookmark {
      bookmark_id: decode_uuid(&self.bookmark_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      item_id:     decode_uuid(&self.item_id)?,
      item_type:   decode_item_type(&self.item_type)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}
