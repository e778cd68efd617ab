//! File-backed append-only record collection.

use crate::codec::RecordCodec;
use crate::error::{StoreError, StoreResult};
use crate::record::{RecordPrefix, RECORD_TERMINATOR};
use crate::retry::{retry_bounded, retry_until_success, IO_RETRY_DELAY, RETRY_LOG_INTERVAL};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;

/// Attempts made to create the temp file before giving up.
const TEMP_CREATE_ATTEMPTS: u64 = 10;

/// How many times the rename loop tolerates the temp file having vanished
/// (taken by another process or a scanner) before surfacing the error.
const RENAME_MISSING_TEMP_LIMIT: u64 = 10;

/// A crash-safe file-backed collection of add/remove records.
///
/// The file's logical content is a sequence of records, each framed as
/// `[prefix][payload][4-byte zero terminator]`, parseable from offset 0 to
/// EOF after any successful [`load`](Self::load). A record missing its
/// terminator at EOF is a torn write from an interrupted append and is
/// truncated away before the file is used again.
///
/// Two write disciplines exist:
///
/// - **append mode** — the file handle stays open for the store's lifetime
///   and [`append`](Self::append) writes through it directly;
/// - **replace mode** — all writes go through
///   [`rewrite_all`](Self::rewrite_all)'s temp-file + atomic-rename cycle.
///
/// # Thread Safety
///
/// A single internal mutex serializes every operation on one store
/// instance. Other OS processes may still touch the same path; the retry
/// policies exist to tolerate that, not to prevent it.
pub struct RecordStore<C: RecordCodec> {
    codec: C,
    path: PathBuf,
    tmp_path: PathBuf,
    append_mode: bool,
    file: Mutex<Option<File>>,
}

impl<C: RecordCodec> RecordStore<C> {
    /// Creates a store for the given data file.
    ///
    /// Does not touch the disk; the file is opened by [`load`](Self::load).
    pub fn open(path: impl Into<PathBuf>, append_mode: bool, codec: C) -> Self {
        let path = path.into();
        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");
        Self {
            codec,
            tmp_path: PathBuf::from(tmp),
            path,
            append_mode,
            file: Mutex::new(None),
        }
    }

    /// Returns the path of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens (creating if missing) and replays the data file.
    ///
    /// Under the store lock: ensures the parent directory exists, opens or
    /// creates the data file (single attempt — failures propagate), runs
    /// `prepare` while still holding the lock, repairs a torn trailing
    /// record when in append mode, then replays every record from offset 0
    /// through `on_add` / `on_remove`.
    ///
    /// `prepare` lets a caller change its own state atomically with the
    /// replay; anything it observes before the lock releases happened
    /// strictly before any concurrent append.
    ///
    /// In append mode the handle is kept open for future appends; otherwise
    /// this is a one-shot parse and the handle is closed on return.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if any record fails to parse — an
    /// unknown prefix byte, a payload decode failure, or a terminator that
    /// is present but not all zero. The torn-tail case does not reach here;
    /// it is truncated by the repair step.
    pub fn load<P, FA, FR>(&self, prepare: P, mut on_add: FA, mut on_remove: FR) -> StoreResult<()>
    where
        P: FnOnce(),
        FA: FnMut(C::Entry),
        FR: FnMut(C::Entry),
    {
        let mut guard = self.file.lock();

        if guard.is_none() {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.path)?;
            *guard = Some(file);
        }

        prepare();

        let Some(file) = guard.as_mut() else {
            return Err(StoreError::invalid_operation("store handle unavailable"));
        };

        let mut result = if self.append_mode {
            self.repair_trailing_record(file)
        } else {
            Ok(())
        };
        if result.is_ok() {
            result = self.replay_records(file, &mut on_add, &mut on_remove);
        }

        // A corrupt store is left closed, not partially usable; a
        // replace-mode load is a one-shot parse either way.
        if result.is_err() || !self.append_mode {
            *guard = None;
        }

        result
    }

    fn replay_records<FA, FR>(
        &self,
        file: &mut File,
        on_add: &mut FA,
        on_remove: &mut FR,
    ) -> StoreResult<()>
    where
        FA: FnMut(C::Entry),
        FR: FnMut(C::Entry),
    {
        file.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(&mut *file);
        let mut line: u64 = 0;

        loop {
            let mut prefix_byte = [0u8; 1];
            if reader.read(&mut prefix_byte)? == 0 {
                break;
            }
            line += 1;

            let prefix = RecordPrefix::from_byte(prefix_byte[0]).ok_or_else(|| {
                self.corrupt(line, format!("unknown record prefix 0x{:02x}", prefix_byte[0]))
            })?;

            let entry = match prefix {
                RecordPrefix::Add => self.codec.decode_add(&mut reader),
                RecordPrefix::Remove => self.codec.decode_remove(&mut reader),
            }
            .map_err(|err| self.corrupt(line, err.to_string()))?;

            let mut terminator = [0u8; 4];
            reader
                .read_exact(&mut terminator)
                .map_err(|err| self.corrupt(line, format!("missing record terminator: {err}")))?;
            if terminator != RECORD_TERMINATOR {
                return Err(self.corrupt(line, "record terminator mismatch"));
            }

            match prefix {
                RecordPrefix::Add => on_add(entry),
                RecordPrefix::Remove => on_remove(entry),
            }
        }

        Ok(())
    }

    /// Appends one record and flushes it to the OS.
    ///
    /// `under_lock` runs while the store lock is held, before the disk
    /// write, so callers can update in-memory counters atomically with the
    /// append.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidOperation`] if the store is not in
    /// append mode or has not been loaded — both caller bugs, never
    /// retried.
    pub fn append<F>(&self, prefix: RecordPrefix, entry: &C::Entry, under_lock: F) -> StoreResult<()>
    where
        F: FnOnce(),
    {
        if !self.append_mode {
            return Err(StoreError::invalid_operation(
                "append requires an append-mode store",
            ));
        }

        let mut guard = self.file.lock();
        let Some(file) = guard.as_mut() else {
            return Err(StoreError::invalid_operation("append called before load"));
        };

        under_lock();

        let mut buf = Vec::with_capacity(64);
        buf.push(prefix.as_byte());
        match prefix {
            RecordPrefix::Add => self.codec.encode_add(entry, &mut buf)?,
            RecordPrefix::Remove => self.codec.encode_remove(entry, &mut buf)?,
        }
        buf.extend_from_slice(&RECORD_TERMINATOR);

        file.seek(SeekFrom::End(0))?;
        file.write_all(&buf)?;
        file.flush()?;
        Ok(())
    }

    /// Regenerates the data file from the generator's output.
    ///
    /// Under the store lock: closes the live handle, streams the generated
    /// records into `<path>.tmp`, fsyncs, and atomically renames the temp
    /// file over the data file. In append mode the live handle is then
    /// reopened, retrying until it succeeds — a store that silently lost
    /// its handle would drop every future append.
    ///
    /// The generator runs while the temp file is being written and may be
    /// long-running; its side effects (such as draining a pending-change
    /// buffer) happen during iteration, still under the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created, written, or
    /// renamed within the retry budgets, or if an entry fails to encode.
    pub fn rewrite_all<G, I>(&self, generate: G) -> StoreResult<()>
    where
        G: FnOnce() -> I,
        I: IntoIterator<Item = (RecordPrefix, C::Entry)>,
    {
        let mut guard = self.file.lock();

        // The rename below cannot replace a file we still hold open.
        *guard = None;

        let result = self.write_temp_and_swap(generate);

        if self.append_mode {
            let file = retry_until_success("reopen data file after rewrite", || {
                OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&self.path)
            });
            *guard = Some(file);
        }

        result
    }

    /// Flushes buffered writes to stable storage.
    ///
    /// No-op for a store that is not in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    pub fn force_flush(&self) -> StoreResult<()> {
        if !self.append_mode {
            return Ok(());
        }
        let mut guard = self.file.lock();
        if let Some(file) = guard.as_mut() {
            file.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }

    fn write_temp_and_swap<G, I>(&self, generate: G) -> StoreResult<()>
    where
        G: FnOnce() -> I,
        I: IntoIterator<Item = (RecordPrefix, C::Entry)>,
    {
        let tmp = retry_bounded("create temp file", TEMP_CREATE_ATTEMPTS, IO_RETRY_DELAY, || {
            File::create(&self.tmp_path)
        })?;
        let mut writer = BufWriter::new(tmp);

        let mut buf = Vec::with_capacity(128);
        for (prefix, entry) in generate() {
            buf.clear();
            buf.push(prefix.as_byte());
            match prefix {
                RecordPrefix::Add => self.codec.encode_add(&entry, &mut buf)?,
                RecordPrefix::Remove => self.codec.encode_remove(&entry, &mut buf)?,
            }
            buf.extend_from_slice(&RECORD_TERMINATOR);
            writer.write_all(&buf)?;
        }

        let tmp = writer
            .into_inner()
            .map_err(|err| StoreError::Io(err.into()))?;
        tmp.sync_all()?;
        drop(tmp);

        self.rename_temp_into_place()
    }

    /// Renames the temp file over the data file, retrying transient
    /// failures with a short delay. Disappearance of the temp file is
    /// tolerated a bounded number of times before the error surfaces.
    fn rename_temp_into_place(&self) -> StoreResult<()> {
        let mut attempt: u64 = 0;
        let mut missing_temp: u64 = 0;
        loop {
            match fs::rename(&self.tmp_path, &self.path) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if !self.tmp_path.exists() {
                        missing_temp += 1;
                        if missing_temp >= RENAME_MISSING_TEMP_LIMIT {
                            return Err(err.into());
                        }
                    }
                    attempt += 1;
                    if attempt % RETRY_LOG_INTERVAL == 0 {
                        tracing::warn!(
                            path = %self.path.display(),
                            attempt,
                            error = %err,
                            "rename of rewritten data file still failing"
                        );
                    }
                    thread::sleep(IO_RETRY_DELAY);
                }
            }
        }
    }

    /// Truncates the file to the last complete record.
    ///
    /// A record whose payload or terminator runs out of bytes at EOF is a
    /// torn write from an interrupted append; everything from the start of
    /// that record onward is discarded. Damage that is not a clean
    /// truncation (an unknown prefix, a decode error with bytes left, a
    /// present-but-nonzero terminator) is left in place for the replay
    /// pass to report as corruption.
    fn repair_trailing_record(&self, file: &mut File) -> StoreResult<()> {
        file.seek(SeekFrom::Start(0))?;
        let mut reader = CountingReader::new(BufReader::new(&mut *file));
        let mut last_good: u64 = 0;
        let mut torn = false;

        loop {
            let mut prefix_byte = [0u8; 1];
            if reader.read(&mut prefix_byte)? == 0 {
                break;
            }
            let Some(prefix) = RecordPrefix::from_byte(prefix_byte[0]) else {
                break;
            };

            let decoded = match prefix {
                RecordPrefix::Add => self.codec.decode_add(&mut reader),
                RecordPrefix::Remove => self.codec.decode_remove(&mut reader),
            };
            match decoded {
                Ok(_) => {}
                Err(StoreError::Io(err)) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    torn = true;
                    break;
                }
                Err(_) => break,
            }

            let mut terminator = [0u8; 4];
            match reader.read_exact(&mut terminator) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    torn = true;
                    break;
                }
                Err(err) => return Err(err.into()),
            }
            if terminator != RECORD_TERMINATOR {
                break;
            }

            last_good = reader.count;
        }
        drop(reader);

        if torn {
            tracing::warn!(
                path = %self.path.display(),
                truncate_to = last_good,
                "discarding torn trailing record"
            );
            file.set_len(last_good)?;
            file.sync_all()?;
        }

        Ok(())
    }

    fn corrupt(&self, line: u64, reason: impl Into<String>) -> StoreError {
        StoreError::corrupt(Self::entry_type_name(), line, reason)
    }

    fn entry_type_name() -> &'static str {
        let full = std::any::type_name::<C::Entry>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

impl<C: RecordCodec> std::fmt::Debug for RecordStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("path", &self.path)
            .field("append_mode", &self.append_mode)
            .finish_non_exhaustive()
    }
}

/// Counts logical bytes delivered to the decoder so record boundaries can
/// be located without the codec reporting sizes.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> CountingReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{read_string, write_string};
    use tempfile::tempdir;

    /// Test codec: entries are plain strings for both prefixes.
    struct PathCodec;

    impl RecordCodec for PathCodec {
        type Entry = String;

        fn encode_add(&self, entry: &String, buf: &mut Vec<u8>) -> StoreResult<()> {
            write_string(buf, entry);
            Ok(())
        }

        fn encode_remove(&self, entry: &String, buf: &mut Vec<u8>) -> StoreResult<()> {
            write_string(buf, entry);
            Ok(())
        }

        fn decode_add(&self, reader: &mut dyn Read) -> StoreResult<String> {
            Ok(read_string(reader)?)
        }

        fn decode_remove(&self, reader: &mut dyn Read) -> StoreResult<String> {
            Ok(read_string(reader)?)
        }
    }

    fn replay_ordered(store: &RecordStore<PathCodec>) -> Vec<(RecordPrefix, String)> {
        use std::cell::RefCell;
        let seen = RefCell::new(Vec::new());
        store
            .load(
                || {},
                |e| seen.borrow_mut().push((RecordPrefix::Add, e)),
                |e| seen.borrow_mut().push((RecordPrefix::Remove, e)),
            )
            .unwrap();
        seen.into_inner()
    }

    #[test]
    fn load_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.dat");
        let store = RecordStore::open(&path, true, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn append_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), true, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();

        store
            .append(RecordPrefix::Add, &"a/one.txt".to_string(), || {})
            .unwrap();
        store
            .append(RecordPrefix::Add, &"b/two.txt".to_string(), || {})
            .unwrap();
        store
            .append(RecordPrefix::Remove, &"a/one.txt".to_string(), || {})
            .unwrap();

        let seen = replay_ordered(&store);
        assert_eq!(
            seen,
            vec![
                (RecordPrefix::Add, "a/one.txt".to_string()),
                (RecordPrefix::Add, "b/two.txt".to_string()),
                (RecordPrefix::Remove, "a/one.txt".to_string()),
            ]
        );
    }

    #[test]
    fn append_requires_append_mode() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), false, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();
        let err = store
            .append(RecordPrefix::Add, &"x".to_string(), || {})
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation { .. }));
    }

    #[test]
    fn append_before_load_fails() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), true, PathCodec);
        let err = store
            .append(RecordPrefix::Add, &"x".to_string(), || {})
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation { .. }));
    }

    #[test]
    fn under_lock_callback_runs() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), true, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();

        let mut ran = false;
        store
            .append(RecordPrefix::Add, &"x".to_string(), || ran = true)
            .unwrap();
        assert!(ran);
    }

    #[test]
    fn torn_trailing_record_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");
        let store = RecordStore::open(&path, true, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();
        store
            .append(RecordPrefix::Add, &"keep.txt".to_string(), || {})
            .unwrap();
        drop(store);

        // Simulate a crash mid-append: a second record missing most of its
        // payload and all of its terminator.
        let mut torn = Vec::new();
        torn.push(RecordPrefix::Add.as_byte());
        write_string(&mut torn, "torn-away.txt");
        torn.truncate(4);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&torn).unwrap();
        drop(file);

        let store = RecordStore::open(&path, true, PathCodec);
        let seen = replay_ordered(&store);
        assert_eq!(seen, vec![(RecordPrefix::Add, "keep.txt".to_string())]);

        // The file is whole again: a new append parses cleanly.
        store
            .append(RecordPrefix::Add, &"after.txt".to_string(), || {})
            .unwrap();
        let seen = replay_ordered(&store);
        assert_eq!(
            seen,
            vec![
                (RecordPrefix::Add, "keep.txt".to_string()),
                (RecordPrefix::Add, "after.txt".to_string()),
            ]
        );
    }

    #[test]
    fn torn_terminator_is_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");
        let store = RecordStore::open(&path, true, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();
        store
            .append(RecordPrefix::Add, &"keep.txt".to_string(), || {})
            .unwrap();
        drop(store);

        // Payload complete, terminator cut to two of four bytes.
        let mut torn = Vec::new();
        torn.push(RecordPrefix::Remove.as_byte());
        write_string(&mut torn, "half-gone.txt");
        torn.extend_from_slice(&[0, 0]);
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&torn).unwrap();
        drop(file);

        let store = RecordStore::open(&path, true, PathCodec);
        let seen = replay_ordered(&store);
        assert_eq!(seen, vec![(RecordPrefix::Add, "keep.txt".to_string())]);
    }

    #[test]
    fn mid_file_terminator_mismatch_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");

        let mut bytes = Vec::new();
        bytes.push(RecordPrefix::Add.as_byte());
        write_string(&mut bytes, "first.txt");
        bytes.extend_from_slice(&[0, 0, 1, 0]); // damaged terminator
        bytes.push(RecordPrefix::Add.as_byte());
        write_string(&mut bytes, "second.txt");
        bytes.extend_from_slice(&RECORD_TERMINATOR);
        fs::write(&path, &bytes).unwrap();

        let store = RecordStore::open(&path, true, PathCodec);
        let err = store.load(|| {}, |_: String| {}, |_| {}).unwrap_err();
        match err {
            StoreError::Corrupt { line, .. } => assert_eq!(line, 1),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn unknown_prefix_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");

        let mut bytes = Vec::new();
        bytes.push(RecordPrefix::Add.as_byte());
        write_string(&mut bytes, "good.txt");
        bytes.extend_from_slice(&RECORD_TERMINATOR);
        bytes.push(0x7F); // no such prefix
        write_string(&mut bytes, "bad.txt");
        bytes.extend_from_slice(&RECORD_TERMINATOR);
        fs::write(&path, &bytes).unwrap();

        let store = RecordStore::open(&path, true, PathCodec);
        let err = store.load(|| {}, |_: String| {}, |_| {}).unwrap_err();
        match err {
            StoreError::Corrupt { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("prefix"));
            }
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_message_names_type_and_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");
        fs::write(&path, [RecordPrefix::Add.as_byte(), 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap();

        let store = RecordStore::open(&path, false, PathCodec);
        let err = store.load(|| {}, |_: String| {}, |_| {}).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("String is corrupt on line 1"), "{message}");
    }

    #[test]
    fn rewrite_all_replaces_contents() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), true, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();
        for i in 0..5 {
            store
                .append(RecordPrefix::Add, &format!("old-{i}.txt"), || {})
                .unwrap();
        }

        store
            .rewrite_all(|| {
                vec![
                    (RecordPrefix::Add, "new-a.txt".to_string()),
                    (RecordPrefix::Add, "new-b.txt".to_string()),
                    (RecordPrefix::Remove, "new-a.txt".to_string()),
                ]
            })
            .unwrap();

        let seen = replay_ordered(&store);
        assert_eq!(
            seen,
            vec![
                (RecordPrefix::Add, "new-a.txt".to_string()),
                (RecordPrefix::Add, "new-b.txt".to_string()),
                (RecordPrefix::Remove, "new-a.txt".to_string()),
            ]
        );
    }

    #[test]
    fn append_still_works_after_rewrite() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), true, PathCodec);
        store.load(|| {}, |_: String| {}, |_| {}).unwrap();

        store
            .rewrite_all(|| vec![(RecordPrefix::Add, "base.txt".to_string())])
            .unwrap();
        store
            .append(RecordPrefix::Add, &"appended.txt".to_string(), || {})
            .unwrap();

        let seen = replay_ordered(&store);
        assert_eq!(
            seen,
            vec![
                (RecordPrefix::Add, "base.txt".to_string()),
                (RecordPrefix::Add, "appended.txt".to_string()),
            ]
        );
    }

    #[test]
    fn rewrite_all_on_replace_mode_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.dat");
        let store = RecordStore::open(&path, false, PathCodec);
        store
            .rewrite_all(|| vec![(RecordPrefix::Add, "only.txt".to_string())])
            .unwrap();

        let seen = replay_ordered(&store);
        assert_eq!(seen, vec![(RecordPrefix::Add, "only.txt".to_string())]);
        assert!(!path.with_extension("dat.tmp").exists());
    }

    #[test]
    fn force_flush_is_noop_without_append_mode() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), false, PathCodec);
        store.force_flush().unwrap();
    }

    #[test]
    fn empty_file_loads_cleanly() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path().join("data.dat"), true, PathCodec);
        assert!(replay_ordered(&store).is_empty());
    }
}
