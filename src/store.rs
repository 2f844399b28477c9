// ---------------------------------------------------------------------------
// SortedKeyStore -- binary search over byte offsets of a sorted flat file
// ---------------------------------------------------------------------------
//
// The backing file holds one record per line and is pre-sorted by normalized
// key (see `key::normalize_key`); that ordering is a caller-guaranteed
// precondition, not something the store verifies.  Lookups seek to the
// midpoint of the remaining byte range, scan backward to the start of the
// line containing it, and three-way compare the line's key against the
// target.  No secondary index exists or is built.
//
// A lookup mutates the handle's seek position, so `lookup` takes `&mut self`
// and concurrent use of one store requires external serialization.
// ---------------------------------------------------------------------------

use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::CategoryError;
use crate::key::normalize_key;

// ---------------------------------------------------------------------------
// Probed line
// ---------------------------------------------------------------------------

/// One line discovered by the backward line-start probe.
///
/// `start` is the byte offset of the line's first character, `end` the offset
/// just past its terminating newline (or the file end), and `text` the line
/// contents without the newline.
#[derive(Debug)]
struct ProbedLine {
	start: u64,
	end: u64,
	text: String,
}

// ---------------------------------------------------------------------------
// SortedKeyStore
// ---------------------------------------------------------------------------

pub struct SortedKeyStore {
	file: File,
	len: u64,
}

impl SortedKeyStore {
	/// Open a sorted backing file read-only.
	pub fn open(path: impl AsRef<Path>) -> Result<Self, CategoryError> {
		let file = File::open(path.as_ref())?;
		let len = file.metadata()?.len();
		Ok(Self { file, len })
	}

	/// File length in bytes.
	pub fn len_bytes(&self) -> u64 {
		self.len
	}

	/// Look up a record by an already-normalized key.
	///
	/// Returns the full raw record line (without its newline) on a hit, or
	/// `None` when the key is absent -- a normal negative result.  Any I/O
	/// failure while probing is fatal and propagated.
	pub fn lookup(&mut self, key: &str) -> Result<Option<String>, CategoryError> {
		let mut min_loc: u64 = 0;
		let mut max_loc: u64 = self.len;

		// Invariant: any matching record lies in [min_loc, max_loc), and the
		// range shrinks every iteration.
		while min_loc < max_loc {
			let mid = (min_loc + max_loc) / 2;
			let probe = self.read_line_at(mid)?;
			let probe_key = normalize_key(&probe.text);

			match probe_key.as_str().cmp(key) {
				Ordering::Equal => return Ok(Some(probe.text)),
				// Target is strictly after the probed line.
				Ordering::Less => min_loc = probe.end,
				// Target is at or before the probed line; exclude it entirely.
				// A midpoint on a newline probes the line after it, whose
				// start is mid + 1; clamp to mid so the range still shrinks.
				Ordering::Greater => max_loc = probe.start.min(mid),
			}
		}

		Ok(None)
	}

	/// Look up a record by raw title, normalizing it first.
	pub fn lookup_title(&mut self, title: &str) -> Result<Option<String>, CategoryError> {
		let key = normalize_key(title);
		self.lookup(&key)
	}

	// ── Probing helpers ──────────────────────────────────────────────────

	/// Read the full line containing `offset`.
	///
	/// Scans backward one byte at a time until a newline or offset 0, then
	/// reads forward to the next newline or the file end.  The backward scan
	/// is bounded by the line length and never underflows at offset 0.
	fn read_line_at(&mut self, offset: u64) -> io::Result<ProbedLine> {
		let start = self.line_start_from(offset)?;

		self.file.seek(SeekFrom::Start(start))?;
		let mut text = Vec::new();
		let mut end = start;
		let mut buf = [0u8; 256];
		'read: loop {
			let n = self.file.read(&mut buf)?;
			if n == 0 {
				break; // file end: last line has no newline
			}
			for &byte in &buf[..n] {
				end += 1;
				if byte == b'\n' {
					break 'read;
				}
				text.push(byte);
			}
		}

		Ok(ProbedLine {
			start,
			end,
			text: String::from_utf8_lossy(&text).into_owned(),
		})
	}

	/// Offset of the start of the line containing `offset`.
	///
	/// A newline at `offset` itself delimits the previous line, so the line
	/// "containing" it starts one byte later.
	fn line_start_from(&mut self, offset: u64) -> io::Result<u64> {
		let mut pos = offset;
		loop {
			if self.byte_at(pos)? == b'\n' {
				return Ok(pos + 1);
			}
			if pos == 0 {
				return Ok(0);
			}
			pos -= 1;
		}
	}

	fn byte_at(&mut self, offset: u64) -> io::Result<u8> {
		self.file.seek(SeekFrom::Start(offset))?;
		let mut buf = [0u8; 1];
		self.file.read_exact(&mut buf)?;
		Ok(buf[0])
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
