//! Trace lexer (§4.1): a streaming, line-oriented reader that turns raw
//! trace text into typed [`Record`]s.
//!
//! Blank lines and `#`-prefixed comment lines are always skipped.
//! Unknown tags are always skipped with an advisory — they are never
//! fatal, strict mode or not. A malformed line with a *known* tag is
//! fatal in strict mode and skipped-with-advisory in lenient mode.
//!
//! `M`/`E`/`X`/`T`/`H` records may carry one extra trailing field when
//! reading back an augmented trace (§6): the clock value the engine
//! stamped on them. The lexer accepts but ignores it — clock is always
//! recomputed by the engine, never trusted off the wire.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use recon_model::{
    AllocRecord, ClassId, ExceptionalTag, ExitKind, FieldId, MethodEntryRecord, MethodExitRecord,
    MethodId, ObjectId, Record, SiteId, ThreadId, TypeId, UpdateRecord, WitnessRecord,
};

use crate::error::{Advisory, ReconError};

/// One lexed line: either a typed record or a passed-through comment.
#[derive(Debug, Clone)]
pub enum LineItem {
    Record(Record),
    Comment(String),
}

pub struct Lexer<R> {
    reader: R,
    line_no: u64,
    strict: bool,
    pub unknown_tags_skipped: u64,
    pub malformed_skipped: u64,
}

impl Lexer<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, strict: bool) -> Result<Self, ReconError> {
        let file = File::open(path)?;
        Ok(Lexer::new(BufReader::new(file), strict))
    }
}

impl<R: BufRead> Lexer<R> {
    pub fn new(reader: R, strict: bool) -> Self {
        Self {
            reader,
            line_no: 0,
            strict,
            unknown_tags_skipped: 0,
            malformed_skipped: 0,
        }
    }

    /// Read the next well-formed record, skipping blank lines, comments,
    /// unknown tags, and — in lenient mode — malformed known-tag lines.
    pub fn next_record(&mut self) -> Result<Option<Record>, ReconError> {
        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match self.parse_line(trimmed) {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => continue,
                Err(err) => {
                    if self.strict {
                        return Err(err);
                    }
                    let reason = err.to_string();
                    self.malformed_skipped += 1;
                    crate::error::log_advisory(&Advisory::MalformedRecordSkipped {
                        line_no: self.line_no,
                        reason,
                    });
                    continue;
                }
            }
        }
    }

    /// Parse one trimmed, non-comment, non-blank line. `Ok(None)` means
    /// an unknown tag (always tolerated, never counts as malformed).
    fn parse_line(&mut self, line: &str) -> Result<Option<Record>, ReconError> {
        let mut fields = line.split_whitespace();
        let tag = fields
            .next()
            .ok_or_else(|| ReconError::malformed(self.line_no, "empty line after trim"))?;
        let rest: Vec<&str> = fields.collect();

        let record = match tag {
            "N" | "A" => self.parse_alloc(tag == "A", &rest)?,
            "U" => self.parse_update(&rest)?,
            "W" => self.parse_witness(&rest)?,
            "M" => self.parse_method_entry(&rest)?,
            "E" => self.parse_method_exit(ExitKind::Normal, &rest)?,
            "X" => self.parse_method_exit(ExitKind::Exceptional(ExceptionalTag::X), &rest)?,
            "T" => self.parse_method_exit(ExitKind::Exceptional(ExceptionalTag::T), &rest)?,
            "H" => self.parse_method_exit(ExitKind::Exceptional(ExceptionalTag::H), &rest)?,
            "D" => self.parse_death(&rest)?,
            other => {
                self.unknown_tags_skipped += 1;
                crate::error::log_advisory(&Advisory::UnknownTagSkipped {
                    line_no: self.line_no,
                    tag: other.to_string(),
                });
                return Ok(None);
            }
        };
        Ok(Some(record))
    }

    fn field(&self, rest: &[&str], idx: usize, name: &str) -> Result<u64, ReconError> {
        rest.get(idx)
            .ok_or_else(|| ReconError::malformed(self.line_no, format!("missing field '{name}'")))?
            .parse::<u64>()
            .map_err(|_| ReconError::malformed(self.line_no, format!("field '{name}' is not an integer")))
    }

    fn parse_alloc(&self, is_array: bool, rest: &[&str]) -> Result<Record, ReconError> {
        let object = ObjectId::new(self.field(rest, 0, "object")?);
        let size = self.field(rest, 1, "size")?;
        let type_id = TypeId::new(self.field(rest, 2, "type")?);
        let site = SiteId::new(self.field(rest, 3, "site")?);
        let length = self.field(rest, 4, "length")?;
        let thread = ThreadId::new(self.field(rest, 5, "thread")?);
        Ok(Record::Alloc(AllocRecord {
            object,
            size,
            type_id,
            site,
            length,
            thread,
            is_array,
        }))
    }

    fn parse_update(&self, rest: &[&str]) -> Result<Record, ReconError> {
        let receiver = ObjectId::new(self.field(rest, 0, "receiver")?);
        let target = ObjectId::new(self.field(rest, 1, "target")?);
        let field = FieldId::new(self.field(rest, 2, "field")?);
        let thread = ThreadId::new(self.field(rest, 3, "thread")?);
        Ok(Record::Update(UpdateRecord {
            receiver,
            target,
            field,
            thread,
        }))
    }

    fn parse_witness(&self, rest: &[&str]) -> Result<Record, ReconError> {
        let object = ObjectId::new(self.field(rest, 0, "object")?);
        let class = ClassId::new(self.field(rest, 1, "class")?);
        let thread = ThreadId::new(self.field(rest, 2, "thread")?);
        Ok(Record::Witness(WitnessRecord {
            object,
            class,
            thread,
        }))
    }

    fn parse_method_entry(&self, rest: &[&str]) -> Result<Record, ReconError> {
        let method = MethodId::new(self.field(rest, 0, "method")?);
        let receiver = ObjectId::new(self.field(rest, 1, "receiver")?);
        let thread = ThreadId::new(self.field(rest, 2, "thread")?);
        // An optional trailing clock field (augmented trace re-read) is
        // accepted and ignored.
        Ok(Record::MethodEntry(MethodEntryRecord {
            method,
            receiver,
            thread,
        }))
    }

    fn parse_method_exit(&self, kind: ExitKind, rest: &[&str]) -> Result<Record, ReconError> {
        let method = MethodId::new(self.field(rest, 0, "method")?);
        let thread = ThreadId::new(self.field(rest, 1, "thread")?);
        Ok(Record::MethodExit(MethodExitRecord {
            method,
            thread,
            kind,
        }))
    }

    fn parse_death(&self, rest: &[&str]) -> Result<Record, ReconError> {
        let object = ObjectId::new(self.field(rest, 0, "object")?);
        let thread = ThreadId::new(self.field(rest, 1, "thread")?);
        let clock = self.field(rest, 2, "clock")?;
        Ok(Record::Death(recon_model::DeathRecord::new(object, thread, clock)))
    }
}
