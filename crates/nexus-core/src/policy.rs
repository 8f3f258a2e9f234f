//! Visibility and ordering policy for the directory.
//!
//! Default order, highest priority first:
//!
//! 1. the viewer's own record;
//! 2. the designated site-owner record (unless it is the viewer's own);
//! 3. other administrators, in backend order;
//! 4. everyone else, in backend order.
//!
//! The shuffle variant keeps 1 and 2 pinned and permutes the rest uniformly.

use rand::{Rng, seq::SliceRandom as _};
use serde::Deserialize;
use uuid::Uuid;

use crate::{record::AlumniRecord, session::ViewerContext};

/// Whether `viewer` may see `record` at all. Hidden records are shown only to
/// their owner and to administrators.
pub fn is_visible(record: &AlumniRecord, viewer: Option<&ViewerContext>) -> bool {
  if !record.hidden {
    return true;
  }
  viewer.is_some_and(|v| v.is_admin || v.owns(record))
}

/// Ordering configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DirectoryPolicy {
  /// The record representing the site's primary maintainer.
  pub site_owner: Option<Uuid>,
}

/// Records split by ordering tier.
struct Tiers<'a> {
  own:    Option<&'a AlumniRecord>,
  owner:  Option<&'a AlumniRecord>,
  admins: Vec<&'a AlumniRecord>,
  rest:   Vec<&'a AlumniRecord>,
}

impl DirectoryPolicy {
  pub fn new(site_owner: Option<Uuid>) -> Self { Self { site_owner } }

  fn is_site_owner(&self, record: &AlumniRecord) -> bool {
    self.site_owner == Some(record.id)
  }

  fn tiers<'a>(
    &self,
    records: impl IntoIterator<Item = &'a AlumniRecord>,
    viewer: Option<&ViewerContext>,
  ) -> Tiers<'a> {
    let mut tiers = Tiers { own: None, owner: None, admins: Vec::new(), rest: Vec::new() };
    for record in records {
      if tiers.own.is_none() && viewer.is_some_and(|v| v.owns(record)) {
        tiers.own = Some(record);
      } else if tiers.owner.is_none() && self.is_site_owner(record) {
        tiers.owner = Some(record);
      } else if record.is_admin {
        tiers.admins.push(record);
      } else {
        tiers.rest.push(record);
      }
    }
    tiers
  }

  /// Deterministic order. Stable within the admin and remaining tiers.
  pub fn order<'a>(
    &self,
    records: impl IntoIterator<Item = &'a AlumniRecord>,
    viewer: Option<&ViewerContext>,
  ) -> Vec<&'a AlumniRecord> {
    let Tiers { own, owner, admins, rest } = self.tiers(records, viewer);
    own
      .into_iter()
      .chain(owner)
      .chain(admins)
      .chain(rest)
      .collect()
  }

  /// Fisher–Yates shuffle of everything except the viewer's own record and
  /// the site owner, which stay in front.
  pub fn shuffle<'a, R>(
    &self,
    records: impl IntoIterator<Item = &'a AlumniRecord>,
    viewer: Option<&ViewerContext>,
    rng: &mut R,
  ) -> Vec<&'a AlumniRecord>
  where
    R: Rng + ?Sized,
  {
    let Tiers { own, owner, admins, rest } = self.tiers(records, viewer);
    let mut tail: Vec<_> = admins.into_iter().chain(rest).collect();
    tail.shuffle(rng);
    own.into_iter().chain(owner).chain(tail).collect()
  }
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng as _, rngs::StdRng};

  use super::*;

  fn rec(id: u128, hidden: bool, is_admin: bool) -> AlumniRecord {
    let mut r = AlumniRecord::new(Uuid::from_u128(id), format!("alum {id}"));
    r.hidden = hidden;
    r.is_admin = is_admin;
    r
  }

  fn ids(records: &[&AlumniRecord]) -> Vec<u128> {
    records.iter().map(|r| r.id.as_u128()).collect()
  }

  fn viewer(alumni: u128, is_admin: bool) -> ViewerContext {
    ViewerContext {
      viewer_id: Uuid::from_u128(1000 + alumni),
      alumni_id: Some(Uuid::from_u128(alumni)),
      is_admin,
    }
  }

  #[test]
  fn hidden_records_need_owner_or_admin() {
    let hidden = rec(2, true, false);
    assert!(!is_visible(&hidden, None));
    assert!(!is_visible(&hidden, Some(&viewer(5, false))));
    assert!(is_visible(&hidden, Some(&viewer(2, false))));
    assert!(is_visible(&hidden, Some(&viewer(5, true))));
    assert!(is_visible(&rec(1, false, false), None));
  }

  #[test]
  fn anonymous_scenario_promotes_admin() {
    let records = [rec(1, false, false), rec(2, true, false), rec(3, false, true)];
    let visible = records.iter().filter(|r| is_visible(r, None));
    let ordered = DirectoryPolicy::default().order(visible, None);
    assert_eq!(ids(&ordered), [3, 1]);
  }

  #[test]
  fn full_priority_order() {
    let records = [
      rec(1, false, false),
      rec(2, false, true),
      rec(3, false, false),
      rec(4, false, true),
      rec(5, false, false),
      rec(6, false, false),
    ];
    let policy = DirectoryPolicy::new(Some(Uuid::from_u128(6)));
    let ordered = policy.order(&records, Some(&viewer(5, false)));
    assert_eq!(ids(&ordered), [5, 6, 2, 4, 1, 3]);

    let anonymous = policy.order(&records, None);
    assert_eq!(ids(&anonymous), [6, 2, 4, 1, 3, 5]);
  }

  #[test]
  fn viewer_who_is_site_owner_is_not_duplicated() {
    let records = [rec(1, false, false), rec(6, false, true)];
    let policy = DirectoryPolicy::new(Some(Uuid::from_u128(6)));
    let ordered = policy.order(&records, Some(&viewer(6, false)));
    assert_eq!(ids(&ordered), [6, 1]);
  }

  #[test]
  fn shuffle_pins_self_and_owner() {
    let records: Vec<_> = (1..=20).map(|i| rec(i, false, i % 4 == 0)).collect();
    let policy = DirectoryPolicy::new(Some(Uuid::from_u128(9)));
    let me = viewer(14, false);
    let mut rng = StdRng::seed_from_u64(7);

    let shuffled = policy.shuffle(&records, Some(&me), &mut rng);
    assert_eq!(shuffled.len(), records.len());
    assert_eq!(shuffled[0].id.as_u128(), 14);
    assert_eq!(shuffled[1].id.as_u128(), 9);

    let mut tail = ids(&shuffled[2..]);
    let mut expected: Vec<u128> =
      (1..=20).filter(|i| *i != 14 && *i != 9).collect();
    assert_ne!(tail, expected, "seeded shuffle should move something");
    tail.sort_unstable();
    expected.sort_unstable();
    assert_eq!(tail, expected);
  }

  #[test]
  fn shuffle_without_viewer_pins_owner_only() {
    let records: Vec<_> = (1..=10).map(|i| rec(i, false, false)).collect();
    let policy = DirectoryPolicy::new(Some(Uuid::from_u128(4)));
    let mut rng = StdRng::seed_from_u64(1);
    let shuffled = policy.shuffle(&records, None, &mut rng);
    assert_eq!(shuffled[0].id.as_u128(), 4);
    assert_eq!(shuffled.len(), 10);
  }
}
