//! Per-tab session token.
//!
//! The token is generated on the client and stored in session storage. It
//! correlates log lines from one visit and carries no authority.

use chrono::Utc;
use rand::Rng;

use crate::storage::{KeyValueStore, StorageError, keys};

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Returns the stored session id, creating one on first use.
pub fn session_id(session: &dyn KeyValueStore) -> Result<String, StorageError> {
    if let Some(existing) = session.get(keys::SESSION_ID)?.filter(|id| !id.is_empty()) {
        return Ok(existing);
    }
    let id = new_session_id(&mut rand::thread_rng(), Utc::now().timestamp_millis());
    session.set(keys::SESSION_ID, &id)?;
    tracing::debug!(session_id = %id, "created session id");
    Ok(id)
}

/// Builds `sess_<unix-ms>_<9 base36 chars>`.
pub fn new_session_id<R: Rng + ?Sized>(rng: &mut R, unix_ms: i64) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("sess_{unix_ms}_{suffix}")
}
