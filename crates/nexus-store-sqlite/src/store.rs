//! [`SqliteStore`]: the SQLite implementation of [`DirectoryStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::{OptionalExtension as _, ToSql};
use uuid::Uuid;

use nexus_core::{
  account::{NewUser, Session, User},
  bookmark::{Bookmark, BookmarkItemType, NewBookmark},
  library::{Link, NewLink, NewResource, Resource},
  record::{AlumniProfile, AlumniRecord},
  store::DirectoryStore,
};

use crate::{
  Error, Result,
  encode::{
    ALUMNI_COLUMNS, RawAlumni, RawBookmark, RawGrade, RawLink, RawResource,
    RawSchool, RawSession, RawUser, encode_dt, encode_fields, encode_item_type,
    encode_school_status, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A SorboNexus store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load profiles matching `condition` (a `WHERE` clause over
  /// `alumni_profiles`, or empty) together with their child rows.
  async fn query_alumni(
    &self,
    condition: &'static str,
    param: Option<String>,
  ) -> Result<Vec<AlumniRecord>> {
    let rows = self
      .conn
      .call(move |conn| {
        let params: Vec<&dyn ToSql> = match &param {
          Some(p) => vec![p as &dyn ToSql],
          None => Vec::new(),
        };

        let sql = format!(
          "SELECT {ALUMNI_COLUMNS} FROM alumni_profiles {condition} \
           ORDER BY created_at, rowid"
        );
        let profiles = conn
          .prepare(&sql)?
          .query_map(params.as_slice(), RawAlumni::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        if profiles.is_empty() {
          return Ok(Vec::new());
        }

        // Children are restricted with the same condition so a single-record
        // lookup does not scan every profile's schools.
        let scope = format!("SELECT alumni_id FROM alumni_profiles {condition}");

        let mut schools: HashMap<String, Vec<RawSchool>> = HashMap::new();
        let mut stmt = conn.prepare(&format!(
          "SELECT alumni_id, name, status FROM schools_applied
           WHERE alumni_id IN ({scope}) ORDER BY alumni_id, position"
        ))?;
        let iter = stmt.query_map(params.as_slice(), |r| {
          Ok(RawSchool { alumni_id: r.get(0)?, name: r.get(1)?, status: r.get(2)? })
        })?;
        for school in iter {
          let school = school?;
          schools.entry(school.alumni_id.clone()).or_default().push(school);
        }

        let mut grades: HashMap<String, Vec<RawGrade>> = HashMap::new();
        let mut stmt = conn.prepare(&format!(
          "SELECT alumni_id, subject, value FROM grades
           WHERE alumni_id IN ({scope}) ORDER BY alumni_id, position"
        ))?;
        let iter = stmt.query_map(params.as_slice(), |r| {
          Ok(RawGrade { alumni_id: r.get(0)?, subject: r.get(1)?, value: r.get(2)? })
        })?;
        for grade in iter {
          let grade = grade?;
          grades.entry(grade.alumni_id.clone()).or_default().push(grade);
        }

        Ok(
          profiles
            .into_iter()
            .map(|p| {
              let s = schools.remove(&p.alumni_id).unwrap_or_default();
              let g = grades.remove(&p.alumni_id).unwrap_or_default();
              (p, s, g)
            })
            .collect::<Vec<_>>(),
        )
      })
      .await?;

    rows
      .into_iter()
      .map(|(p, s, g)| p.into_record(s, g))
      .collect()
  }

  async fn find_bookmark(
    &self,
    user_id: Uuid,
    item_id: Uuid,
    item_type: BookmarkItemType,
  ) -> Result<Option<Bookmark>> {
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);
    let type_str = encode_item_type(item_type);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT bookmark_id, user_id, item_id, item_type, created_at
               FROM bookmarks
               WHERE user_id = ?1 AND item_id = ?2 AND item_type = ?3",
              rusqlite::params![user_str, item_str, type_str],
              RawBookmark::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBookmark::into_bookmark).transpose()
  }
}

/// Rewrite the child rows of one profile. Runs inside the caller's
/// transaction.
fn write_children(
  conn: &rusqlite::Connection,
  alumni_id: &str,
  profile: &AlumniProfile,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM schools_applied WHERE alumni_id = ?1",
    rusqlite::params![alumni_id],
  )?;
  conn.execute("DELETE FROM grades WHERE alumni_id = ?1", rusqlite::params![alumni_id])?;

  let mut stmt = conn.prepare(
    "INSERT INTO schools_applied (alumni_id, position, name, status)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for (i, school) in profile.schools_applied.iter().enumerate() {
    stmt.execute(rusqlite::params![
      alumni_id,
      i as i64,
      school.name,
      encode_school_status(school.status),
    ])?;
  }

  let mut stmt = conn.prepare(
    "INSERT INTO grades (alumni_id, position, subject, value) VALUES (?1, ?2, ?3, ?4)",
  )?;
  for (i, grade) in profile.grades.iter().enumerate() {
    stmt.execute(rusqlite::params![alumni_id, i as i64, grade.subject, grade.value])?;
  }
  Ok(())
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    if self.find_user_by_email(input.email.clone()).await?.is_some() {
      return Err(Error::DuplicateEmail(input.email));
    }

    let user = User {
      user_id:       Uuid::new_v4(),
      email:         input.email,
      password_hash: input.password_hash,
      is_admin:      input.is_admin,
      created_at:    now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let email     = user.email.clone();
    let hash      = user.password_hash.clone();
    let is_admin  = user.is_admin;
    let at_str    = encode_dt(user.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, email, password_hash, is_admin, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, hash, is_admin, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, is_admin, created_at
               FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: String) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| {
        // `email` is declared COLLATE NOCASE.
        Ok(
          conn
            .query_row(
              "SELECT user_id, email, password_hash, is_admin, created_at
               FROM users WHERE email = ?1",
              rusqlite::params![email.trim()],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, session: Session) -> Result<()> {
    let user_str    = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_session(&self, token_hash: String) -> Result<Option<Session>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT token_hash, user_id, created_at, expires_at
               FROM sessions WHERE token_hash = ?1",
              rusqlite::params![token_hash],
              |r| {
                Ok(RawSession {
                  token_hash: r.get(0)?,
                  user_id:    r.get(1)?,
                  created_at: r.get(2)?,
                  expires_at: r.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Alumni ────────────────────────────────────────────────────────────────

  async fn list_alumni(&self) -> Result<Vec<AlumniRecord>> {
    self.query_alumni("", None).await
  }

  async fn get_alumni(&self, alumni_id: Uuid) -> Result<Option<AlumniRecord>> {
    let mut found = self
      .query_alumni("WHERE alumni_id = ?1", Some(encode_uuid(alumni_id)))
      .await?;
    Ok(found.pop())
  }

  async fn find_alumni_by_user(&self, user_id: Uuid) -> Result<Option<AlumniRecord>> {
    let mut found = self
      .query_alumni("WHERE user_id = ?1", Some(encode_uuid(user_id)))
      .await?;
    Ok(found.pop())
  }

  async fn create_alumni(
    &self,
    user_id: Option<Uuid>,
    profile: AlumniProfile,
    is_admin: bool,
  ) -> Result<AlumniRecord> {
    if let Some(uid) = user_id
      && self.find_alumni_by_user(uid).await?.is_some()
    {
      return Err(Error::ProfileExists(uid));
    }

    let at = now();
    let mut record = AlumniRecord::new(Uuid::new_v4(), String::new());
    record.user_id = user_id;
    record.is_admin = is_admin;
    record.created_at = Some(at);
    record.updated_at = Some(at);

    let id_str      = encode_uuid(record.id);
    let user_str    = user_id.map(encode_uuid);
    let fields_json = encode_fields(&profile.field)?;
    let at_str      = encode_dt(at);
    let row         = profile.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO alumni_profiles (
             alumni_id, user_id, name, degree, position, fields_json, avatar,
             color, gradient, hidden, is_admin, future_goals, annee_fin_l3,
             nationalities, linkedin, email, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?17)",
          rusqlite::params![
            id_str,
            user_str,
            row.name,
            row.degree,
            row.position,
            fields_json,
            row.avatar,
            row.color,
            row.gradient,
            row.hidden,
            is_admin,
            row.future_goals,
            row.annee_fin_l3,
            row.nationalities,
            row.linkedin,
            row.email,
            at_str,
          ],
        )?;
        write_children(&tx, &id_str, &row)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    profile.apply_to(&mut record);
    Ok(record)
  }

  async fn update_alumni(
    &self,
    alumni_id: Uuid,
    profile: AlumniProfile,
  ) -> Result<Option<AlumniRecord>> {
    let id_str      = encode_uuid(alumni_id);
    let fields_json = encode_fields(&profile.field)?;
    let at_str      = encode_dt(now());

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE alumni_profiles SET
             name = ?2, degree = ?3, position = ?4, fields_json = ?5,
             avatar = ?6, color = ?7, gradient = ?8, hidden = ?9,
             future_goals = ?10, annee_fin_l3 = ?11, nationalities = ?12,
             linkedin = ?13, email = ?14, updated_at = ?15
           WHERE alumni_id = ?1",
          rusqlite::params![
            id_str,
            profile.name,
            profile.degree,
            profile.position,
            fields_json,
            profile.avatar,
            profile.color,
            profile.gradient,
            profile.hidden,
            profile.future_goals,
            profile.annee_fin_l3,
            profile.nationalities,
            profile.linkedin,
            profile.email,
            at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        write_children(&tx, &id_str, &profile)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !updated {
      return Ok(None);
    }
    self.get_alumni(alumni_id).await
  }

  async fn delete_alumni(&self, alumni_id: Uuid) -> Result<bool> {
    let id_str   = encode_uuid(alumni_id);
    let type_str = encode_item_type(BookmarkItemType::Alumni);

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM bookmarks WHERE item_type = ?1 AND item_id = ?2",
          rusqlite::params![type_str, id_str],
        )?;
        // schools_applied and grades cascade.
        let changed = tx.execute(
          "DELETE FROM alumni_profiles WHERE alumni_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Library ───────────────────────────────────────────────────────────────

  async fn list_links(&self) -> Result<Vec<Link>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT link_id, title, url, description, category, created_at
           FROM links ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map([], |r| {
            Ok(RawLink {
              link_id:     r.get(0)?,
              title:       r.get(1)?,
              url:         r.get(2)?,
              description: r.get(3)?,
              category:    r.get(4)?,
              created_at:  r.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawLink::into_link).collect()
  }

  async fn add_link(&self, input: NewLink) -> Result<Link> {
    let link = Link {
      link_id:     Uuid::new_v4(),
      title:       input.title,
      url:         input.url,
      description: input.description,
      category:    input.category,
      created_at:  now(),
    };

    let id_str = encode_uuid(link.link_id);
    let at_str = encode_dt(link.created_at);
    let row    = link.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO links (link_id, title, url, description, category, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, row.title, row.url, row.description, row.category, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(link)
  }

  async fn list_resources(&self) -> Result<Vec<Resource>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT resource_id, title, description, category, file_url, created_at
           FROM resources ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map([], |r| {
            Ok(RawResource {
              resource_id: r.get(0)?,
              title:       r.get(1)?,
              description: r.get(2)?,
              category:    r.get(3)?,
              file_url:    r.get(4)?,
              created_at:  r.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawResource::into_resource).collect()
  }

  async fn add_resource(&self, input: NewResource) -> Result<Resource> {
    let resource = Resource {
      resource_id: Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      category:    input.category,
      file_url:    input.file_url,
      created_at:  now(),
    };

    let id_str = encode_uuid(resource.resource_id);
    let at_str = encode_dt(resource.created_at);
    let row    = resource.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO resources (
             resource_id, title, description, category, file_url, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str,
            row.title,
            row.description,
            row.category,
            row.file_url,
            at_str
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(resource)
  }

  // ── Bookmarks ─────────────────────────────────────────────────────────────

  async fn add_bookmark(&self, user_id: Uuid, input: NewBookmark) -> Result<Bookmark> {
    let id_str   = encode_uuid(Uuid::new_v4());
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(input.item_id);
    let type_str = encode_item_type(input.item_type);
    let at_str   = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO bookmarks (
             bookmark_id, user_id, item_id, item_type, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, user_str, item_str, type_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    self
      .find_bookmark(user_id, input.item_id, input.item_type)
      .await?
      .ok_or_else(|| Error::Decode(format!("bookmark on {} vanished", input.item_id)))
  }

  async fn remove_bookmark(
    &self,
    user_id: Uuid,
    item_id: Uuid,
    item_type: BookmarkItemType,
  ) -> Result<bool> {
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);
    let type_str = encode_item_type(item_type);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM bookmarks WHERE user_id = ?1 AND item_id = ?2 AND item_type = ?3",
          rusqlite::params![user_str, item_str, type_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn list_bookmarks(
    &self,
    user_id: Uuid,
    item_type: Option<BookmarkItemType>,
  ) -> Result<Vec<Bookmark>> {
    let user_str = encode_uuid(user_id);
    let type_str = item_type.map(encode_item_type);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT bookmark_id, user_id, item_id, item_type, created_at
           FROM bookmarks
           WHERE user_id = ?1 AND (?2 IS NULL OR item_type = ?2)
           ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, type_str], RawBookmark::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawBookmark::into_bookmark).collect()
  }
}
