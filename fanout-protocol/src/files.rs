//! Sentinel file naming
//!
//! File names are `<zero-padded id><suffix>`; discovery is a directory
//! listing plus suffix match, so no separate index file exists.

/// Minimum zero-pad width for job ids in file names
pub const MIN_ID_WIDTH: usize = 4;

/// The four sentinel files a job can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFile {
    /// Serialized arguments, written once at dispatch time
    Input,
    /// Created by the worker when execution begins
    Started,
    /// Completion signal; always the last file a worker writes
    Done,
    /// Serialized return value; visible at or before `Done`
    Output,
}

impl JobFile {
    /// File name suffix for this sentinel
    pub fn suffix(&self) -> &'static str {
        match self {
            JobFile::Input => "-in",
            JobFile::Started => "-started",
            JobFile::Done => "-done",
            JobFile::Output => "-out",
        }
    }

    /// Short tag for diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            JobFile::Input => "input",
            JobFile::Started => "started",
            JobFile::Done => "done",
            JobFile::Output => "output",
        }
    }

    /// All sentinels, in deletion order
    pub fn all() -> [JobFile; 4] {
        [JobFile::Input, JobFile::Started, JobFile::Output, JobFile::Done]
    }
}

/// Pad width sufficient for the largest id in a batch of `n_jobs`
pub fn pad_width(n_jobs: u64) -> usize {
    let digits = if n_jobs == 0 {
        1
    } else {
        (n_jobs.ilog10() + 1) as usize
    };
    digits.max(MIN_ID_WIDTH)
}

/// Zero-padded file id for a job index
pub fn file_id(id: u64, width: usize) -> String {
    format!("{:0width$}", id, width = width)
}

/// Parse `<padded id><suffix>` back into an id when `name` carries `kind`'s
/// suffix; `None` for foreign files in the directory
pub fn parse_name(name: &str, kind: JobFile) -> Option<u64> {
    let stem = name.strip_suffix(kind.suffix())?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_width() {
        assert_eq!(pad_width(0), MIN_ID_WIDTH);
        assert_eq!(pad_width(9), MIN_ID_WIDTH);
        assert_eq!(pad_width(9_999), MIN_ID_WIDTH);
        assert_eq!(pad_width(10_000), 5);
        assert_eq!(pad_width(123_456), 6);
    }

    #[test]
    fn test_file_id_padding() {
        assert_eq!(file_id(7, 4), "0007");
        assert_eq!(file_id(123, 6), "000123");
        assert_eq!(file_id(99_999, 4), "99999");
    }

    #[test]
    fn test_parse_name_roundtrip() {
        for kind in JobFile::all() {
            let name = format!("{}{}", file_id(42, 4), kind.suffix());
            assert_eq!(parse_name(&name, kind), Some(42));
        }
    }

    #[test]
    fn test_parse_name_rejects_foreign_files() {
        assert_eq!(parse_name("0042-in", JobFile::Done), None);
        assert_eq!(parse_name("checkpoint.json", JobFile::Done), None);
        assert_eq!(parse_name("-done", JobFile::Done), None);
        assert_eq!(parse_name("abc-done", JobFile::Done), None);
    }
}
