use crate::model::{ProductId, LOCAL_ID_PREFIX};
use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;

const SUFFIX_LEN: usize = 9;

/// Issues `local_<millis>_<suffix>` ids.
///
/// The millisecond part never repeats within one generator (it advances past the last
/// issued or seeded value), so uniqueness does not rest on the random suffix alone.
#[derive(Debug, Default)]
pub(crate) struct LocalIdGenerator {
    last_millis: i64,
}

impl LocalIdGenerator {
    /// Advances past every timestamp found in `ids`.
    ///
    /// Timestamps in the future are clamped to now; the `taken` check in [`next`](Self::next)
    /// still keeps those ids from being reissued.
    pub fn seed<'a>(&mut self, ids: impl IntoIterator<Item = &'a ProductId>) {
        self.seed_at(Utc::now().timestamp_millis(), ids);
    }

    fn seed_at<'a>(&mut self, now_millis: i64, ids: impl IntoIterator<Item = &'a ProductId>) {
        for millis in ids.into_iter().filter_map(embedded_millis) {
            self.last_millis = self.last_millis.max(millis.min(now_millis));
        }
    }

    pub fn next(&mut self, taken: impl Fn(&ProductId) -> bool) -> ProductId {
        self.next_at(Utc::now().timestamp_millis(), taken)
    }

    fn next_at(&mut self, now_millis: i64, taken: impl Fn(&ProductId) -> bool) -> ProductId {
        loop {
            let millis = now_millis.max(self.last_millis.saturating_add(1));
            self.last_millis = millis;
            let id = ProductId::new(format!("{LOCAL_ID_PREFIX}{millis}_{}", random_suffix()));
            if !taken(&id) {
                return id;
            }
        }
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

fn embedded_millis(id: &ProductId) -> Option<i64> {
    id.as_str()
        .strip_prefix(LOCAL_ID_PREFIX)?
        .split('_')
        .next()?
        .parse()
        .ok()
}
