//! Key derivation and SQLCipher transcoding.
//!
//! The messaging app keys its database with the first seven hex characters
//! of `MD5(IMEI || UIN)`. Decryption exports a keyed database into an
//! unkeyed attachment; encryption does the reverse. HMAC is disabled on
//! both paths to match the app's cipher settings.

use std::path::Path;

use md5::{Digest, Md5};

use crate::domain::models::DERIVED_KEY_LEN;
use crate::domain::{AppError, DerivedKey, Result};
use crate::infrastructure::CipherDatabase;

use super::reporter::Reporter;

/// Attachment alias for the plaintext output of [`Transcoder::decrypt`].
const DECRYPTED_ALIAS: &str = "wechatdecrypted";

/// Attachment alias for the keyed output of [`Transcoder::encrypt`].
const ENCRYPTED_ALIAS: &str = "encrypted";

/// Derives the database key from two device identifiers.
///
/// `first` is hashed immediately followed by `second`, with no separator;
/// for this app that is the IMEI followed by the UIN.
#[must_use]
pub fn derive_key(first: &str, second: &str) -> DerivedKey {
    let mut hasher = Md5::new();
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());
    let digest = hex::encode(hasher.finalize());

    DerivedKey::from_digest_prefix(&digest[..DERIVED_KEY_LEN])
}

/// Runs the attach/export/detach pipelines.
pub struct Transcoder<'a> {
    compatibility: Option<u8>,
    reporter: &'a dyn Reporter,
}

impl<'a> Transcoder<'a> {
    #[must_use]
    pub const fn new(compatibility: Option<u8>, reporter: &'a dyn Reporter) -> Self {
        Self {
            compatibility,
            reporter,
        }
    }

    /// Writes an unencrypted copy of the keyed database `source`.
    ///
    /// # Errors
    /// Returns a transcode error if any step fails; `destination` is then
    /// left in an unspecified state.
    pub fn decrypt(&self, key: &DerivedKey, source: &Path, destination: &Path) -> Result<()> {
        self.reporter.step("Decrypting, hang on...");
        remove_file_if_exists(destination)?;

        let db = CipherDatabase::open(source)?;
        self.apply_compatibility(&db)?;
        db.disable_default_hmac()?;
        db.unlock(key)?;
        db.attach(destination, DECRYPTED_ALIAS, None)?;
        db.export_to(DECRYPTED_ALIAS)?;
        db.detach(DECRYPTED_ALIAS)?;
        db.close()?;

        tracing::info!(
            source = %source.display(),
            destination = %destination.display(),
            "Decrypted database"
        );

        Ok(())
    }

    /// Writes a copy of the unencrypted database `source` keyed with `key`.
    ///
    /// # Errors
    /// Returns a transcode error if any step fails; `destination` is then
    /// left in an unspecified state.
    pub fn encrypt(&self, key: &DerivedKey, source: &Path, destination: &Path) -> Result<()> {
        self.reporter.step("Encrypting, hang on...");
        remove_file_if_exists(destination)?;

        let db = CipherDatabase::open(source)?;
        self.apply_compatibility(&db)?;
        db.disable_default_hmac()?;
        db.attach(destination, ENCRYPTED_ALIAS, Some(key))?;
        db.disable_hmac_on(ENCRYPTED_ALIAS)?;
        db.export_to(ENCRYPTED_ALIAS)?;
        db.detach(ENCRYPTED_ALIAS)?;
        db.close()?;

        tracing::info!(
            source = %source.display(),
            destination = %destination.display(),
            "Encrypted database"
        );

        Ok(())
    }

    fn apply_compatibility(&self, db: &CipherDatabase) -> Result<()> {
        match self.compatibility {
            Some(version) => db.set_default_compatibility(version),
            None => Ok(()),
        }
    }
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed previous output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::transcode_io("Failed to remove previous output", path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingReporter;
    use rusqlite::Connection;
    use tempfile::tempdir;

    fn create_plain_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE message (msgId INTEGER PRIMARY KEY, talker TEXT, content TEXT);
             CREATE INDEX message_talker ON message (talker);
             INSERT INTO message VALUES (1, 'wxid_a', 'hello');
             INSERT INTO message VALUES (2, 'wxid_b', 'world');
             INSERT INTO message VALUES (3, 'wxid_a', NULL);",
        )
        .unwrap();
    }

    fn snapshot(path: &Path, key: Option<&DerivedKey>) -> (Vec<String>, Vec<(i64, String, Option<String>)>) {
        let conn = Connection::open(path).unwrap();
        if let Some(key) = key {
            conn.execute_batch("PRAGMA cipher_default_use_hmac = OFF;").unwrap();
            conn.pragma_update(None, "key", key.as_str()).unwrap();
        }

        let schema = conn
            .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap();

        let rows = conn
            .prepare("SELECT msgId, talker, content FROM message ORDER BY msgId")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();

        (schema, rows)
    }

    #[test]
    fn test_derive_key_known_value() {
        // MD5("1234567890123451234567890") = 9bed8bc3f4d541efa25f39d8a0c7bf98
        assert_eq!(derive_key("123456789012345", "1234567890").as_str(), "9bed8bc");
    }

    #[test]
    fn test_derive_key_is_deterministic_and_order_sensitive() {
        let a = derive_key("864394010012345", "-1234567890");
        let b = derive_key("864394010012345", "-1234567890");
        assert_eq!(a, b);

        assert_ne!(a, derive_key("864394010012346", "-1234567890"));
        assert_ne!(a, derive_key("864394010012345", "-1234567891"));
        assert_ne!(
            derive_key("123456789012345", "1234567890"),
            derive_key("1234567890", "123456789012345")
        );
    }

    #[test]
    fn test_derive_key_shape() {
        for (first, second) in [("", ""), ("imei", "uin"), ("ü", "∑"), ("1", "")] {
            let key = derive_key(first, second);
            assert_eq!(key.as_str().len(), 7);
            assert!(key
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_encrypt_then_decrypt_round_trip() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("plain.db");
        let encrypted = dir.path().join("EnMicroMsg.db");
        let decrypted = dir.path().join("decrypted.db");
        create_plain_db(&original);

        let key = derive_key("123456789012345", "1234567890");
        let reporter = RecordingReporter::default();
        let transcoder = Transcoder::new(None, &reporter);

        transcoder.encrypt(&key, &original, &encrypted).unwrap();
        transcoder.decrypt(&key, &encrypted, &decrypted).unwrap();

        assert_eq!(snapshot(&decrypted, None), snapshot(&original, None));
        assert_eq!(snapshot(&encrypted, Some(&key)), snapshot(&original, None));
    }

    #[test]
    fn test_decrypt_then_encrypt_round_trip_with_compatibility() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain.db");
        let first = dir.path().join("first.db");
        let decrypted = dir.path().join("decrypted.db");
        let second = dir.path().join("second.db");
        create_plain_db(&plain);

        let key = derive_key("864394010012345", "-1234567890");
        let reporter = RecordingReporter::default();
        let transcoder = Transcoder::new(Some(1), &reporter);

        transcoder.encrypt(&key, &plain, &first).unwrap();
        transcoder.decrypt(&key, &first, &decrypted).unwrap();
        transcoder.encrypt(&key, &decrypted, &second).unwrap();

        let reread = dir.path().join("reread.db");
        transcoder.decrypt(&key, &second, &reread).unwrap();
        assert_eq!(snapshot(&reread, None), snapshot(&plain, None));
    }

    #[test]
    fn test_existing_destination_is_replaced() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain.db");
        let encrypted = dir.path().join("encrypted.db");
        let output = dir.path().join("output.db");
        create_plain_db(&plain);
        std::fs::write(&output, b"stale bytes that are not a database").unwrap();

        let key = derive_key("a", "b");
        let reporter = RecordingReporter::default();
        let transcoder = Transcoder::new(None, &reporter);

        transcoder.encrypt(&key, &plain, &encrypted).unwrap();
        transcoder.decrypt(&key, &encrypted, &output).unwrap();

        assert_eq!(snapshot(&output, None), snapshot(&plain, None));
    }

    #[test]
    fn test_undeletable_destination_is_transcode_error() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain.db");
        let destination = dir.path().join("outdir");
        create_plain_db(&plain);
        std::fs::create_dir(&destination).unwrap();

        let reporter = RecordingReporter::default();
        let transcoder = Transcoder::new(None, &reporter);
        let key = derive_key("a", "b");

        let err = transcoder.encrypt(&key, &plain, &destination).unwrap_err();
        assert!(matches!(err, AppError::Transcode { source: Some(_), .. }));

        let err = transcoder.decrypt(&key, &plain, &destination).unwrap_err();
        assert!(matches!(err, AppError::Transcode { .. }));
        assert!(destination.is_dir());
    }

    #[test]
    fn test_wrong_key_is_transcode_error() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("plain.db");
        let encrypted = dir.path().join("encrypted.db");
        let output = dir.path().join("output.db");
        create_plain_db(&plain);

        let reporter = RecordingReporter::default();
        let transcoder = Transcoder::new(None, &reporter);
        transcoder
            .encrypt(&derive_key("a", "b"), &plain, &encrypted)
            .unwrap();

        let err = transcoder
            .decrypt(&derive_key("a", "c"), &encrypted, &output)
            .unwrap_err();
        assert!(matches!(err, AppError::Transcode { .. }));
    }

    #[test]
    fn test_missing_source_is_transcode_error() {
        let dir = tempdir().unwrap();
        let reporter = RecordingReporter::default();

        let err = Transcoder::new(None, &reporter)
            .decrypt(
                &derive_key("a", "b"),
                &dir.path().join("absent.db"),
                &dir.path().join("out.db"),
            )
            .unwrap_err();

        assert!(matches!(err, AppError::Transcode { .. }));
    }
}
