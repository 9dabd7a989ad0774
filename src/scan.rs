//! Cursor/pattern-based keyspace iteration requests.
//!
//! A [`ScanFilter`] is parsed from an untrusted argument vector and handed to a
//! shard-local iterator, which consumes the pattern, limit, type filter and resume
//! bucket and produces matched names plus a continuation cursor. The bucket id is
//! opaque to this module; `None` means "scan all partitions, not one".

use nonmax::NonMaxU32;

use crate::base::{ObjType, OpResult, OpStatus};

/// Default number of names one scan step returns.
pub const DEFAULT_SCAN_LIMIT: usize = 10;

/// Hard upper bound for a caller-provided `COUNT`.
const MAX_SCAN_LIMIT: usize = 4096;

/// A hash-partition id inside one shard, used as a scan resume cursor.
///
/// `NonMax` so that the "unrestricted" sentinel is just `Option::None` without
/// costing an extra word.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{_0}")]
pub struct BucketId(NonMaxU32);

impl BucketId {
    pub fn new(id: u32) -> Option<Self> {
        NonMaxU32::new(id).map(Self)
    }

    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

/// One parsed scan request.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    /// Glob pattern applied to key names. Empty matches everything.
    pub pattern: String,
    pub limit: usize,
    /// Restricts matches to keys holding this object type.
    pub type_filter: Option<ObjType>,
    /// Resume cursor into the shard's internal partitioning. `None` scans all
    /// partitions from the start.
    pub bucket: Option<BucketId>,
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            limit: DEFAULT_SCAN_LIMIT,
            type_filter: None,
            bucket: None,
        }
    }
}

impl ScanFilter {
    /// Parses `COUNT n`, `MATCH p`, `TYPE t` and `BUCKET b` option pairs from an
    /// untrusted argument vector. Option names are matched case-insensitively.
    ///
    /// Rejections are structured statuses, never unstructured failures:
    /// dangling or unknown options are a [`OpStatus::SyntaxErr`], malformed or
    /// non-positive numbers are a [`OpStatus::InvalidInt`].
    pub fn try_from_args(args: &[String]) -> OpResult<Self> {
        let mut filter = ScanFilter::default();

        for i in (0..args.len()).step_by(2) {
            let opt = args[i].to_ascii_uppercase();
            let Some(value) = args.get(i + 1) else {
                return Err(OpStatus::SyntaxErr);
            };

            match opt.as_str() {
                "COUNT" => {
                    let count: i64 = value.parse().map_err(|_| OpStatus::InvalidInt)?;
                    if count <= 0 {
                        return Err(OpStatus::InvalidInt);
                    }
                    filter.limit = (count as usize).min(MAX_SCAN_LIMIT);
                }
                "MATCH" => {
                    // a bare `*` matches everything, same as no pattern at all
                    filter.pattern = if value == "*" {
                        String::new()
                    } else {
                        value.clone()
                    };
                }
                "TYPE" => {
                    let name = value.to_ascii_lowercase();
                    filter.type_filter =
                        Some(ObjType::from_name(&name).ok_or(OpStatus::SyntaxErr)?);
                }
                "BUCKET" => {
                    let id: u32 = value.parse().map_err(|_| OpStatus::InvalidInt)?;
                    filter.bucket = Some(BucketId::new(id).ok_or(OpStatus::InvalidInt)?);
                }
                _ => return Err(OpStatus::SyntaxErr),
            }
        }

        Ok(filter)
    }

    /// Case-sensitive glob match of the pattern against `name`.
    pub fn matches(&self, name: &[u8]) -> bool {
        if self.pattern.is_empty() {
            return true;
        }
        glob_match(self.pattern.as_bytes(), name)
    }
}

/// Byte-wise glob matching: `*`, `?`, `[...]` classes with ranges and `^`
/// negation, `\` escapes the next pattern byte.
pub(crate) fn glob_match(pattern: &[u8], name: &[u8]) -> bool {
    glob_match_inner(pattern, name, 0, 0)
}

fn glob_match_inner(pat: &[u8], txt: &[u8], mut pi: usize, mut ti: usize) -> bool {
    while pi < pat.len() {
        match pat[pi] {
            b'*' => {
                while pi < pat.len() && pat[pi] == b'*' {
                    pi += 1;
                }
                if pi >= pat.len() {
                    return true;
                }
                for start in ti..=txt.len() {
                    if glob_match_inner(pat, txt, pi, start) {
                        return true;
                    }
                }
                return false;
            }
            b'?' => {
                if ti >= txt.len() {
                    return false;
                }
                pi += 1;
                ti += 1;
            }
            b'[' => {
                if ti >= txt.len() {
                    return false;
                }
                pi += 1;
                let negate = pi < pat.len() && pat[pi] == b'^';
                if negate {
                    pi += 1;
                }
                let mut found = false;
                let mut first = true;
                while pi < pat.len() && (first || pat[pi] != b']') {
                    first = false;
                    if pi + 2 < pat.len() && pat[pi + 1] == b'-' && pat[pi + 2] != b']' {
                        let lo = pat[pi];
                        let hi = pat[pi + 2];
                        if txt[ti] >= lo && txt[ti] <= hi {
                            found = true;
                        }
                        pi += 3;
                    } else {
                        if txt[ti] == pat[pi] {
                            found = true;
                        }
                        pi += 1;
                    }
                }
                if pi < pat.len() && pat[pi] == b']' {
                    pi += 1;
                }
                if found == negate {
                    return false;
                }
                ti += 1;
            }
            escape_or_literal => {
                let literal = if escape_or_literal == b'\\' && pi + 1 < pat.len() {
                    pi += 1;
                    pat[pi]
                } else {
                    escape_or_literal
                };
                if ti >= txt.len() || txt[ti] != literal {
                    return false;
                }
                pi += 1;
                ti += 1;
            }
        }
    }
    ti >= txt.len()
}
