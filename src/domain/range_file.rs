//! On-disk format of the persisted counter range.
//!
//! The file holds two whitespace-separated unsigned integers, `current end`.
//! Anything else is rejected: continuing with a guessed range could hand out
//! slugs that already exist.

use std::path::Path;

use crate::domain::allocator::{AllocatorError, CounterRange};

/// Parses the file body.
pub fn parse(content: &str) -> Result<CounterRange, String> {
    let mut fields = content.split_whitespace();

    let (Some(current), Some(end), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err("expected exactly two integers: `current end`".to_string());
    };

    let current: u64 = current
        .parse()
        .map_err(|e| format!("invalid current value {:?}: {}", current, e))?;
    let end: u64 = end
        .parse()
        .map_err(|e| format!("invalid end value {:?}: {}", end, e))?;

    if current > end {
        return Err(format!("current {} is past end {}", current, end));
    }

    Ok(CounterRange::new(current, end))
}

/// Formats a range for writing.
pub fn format(range: CounterRange) -> String {
    format!("{} {}", range.current, range.end)
}

/// Reads and validates a range file without removing it.
pub async fn read(path: &Path) -> Result<CounterRange, AllocatorError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AllocatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    parse(&content).map_err(|reason| AllocatorError::MalformedRange {
        path: path.to_path_buf(),
        reason,
    })
}

/// Reads a range file and deletes it before returning the range.
///
/// A file that cannot be removed is an error: leaving it behind would let
/// the next start reload a range this process is about to issue from.
pub async fn take(path: &Path) -> Result<CounterRange, AllocatorError> {
    let range = read(path).await?;

    tokio::fs::remove_file(path)
        .await
        .map_err(|source| AllocatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(range)
}

/// Writes a range file, replacing any existing one.
///
/// Goes through a sibling temp file and a rename so a crash mid-write never
/// leaves a truncated file behind.
pub async fn write(path: &Path, range: CounterRange) -> Result<(), AllocatorError> {
    let tmp = path.with_extension("tmp");
    let io_err = |source| AllocatorError::Io {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::write(&tmp, format(range)).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse("100 200").unwrap(), CounterRange::new(100, 200));
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_eq!(parse("  100\t200\n").unwrap(), CounterRange::new(100, 200));
    }

    #[test]
    fn test_parse_exhausted_range() {
        assert_eq!(parse("200 200").unwrap(), CounterRange::new(200, 200));
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_single_value() {
        assert!(parse("100").is_err());
    }

    #[test]
    fn test_parse_extra_value() {
        assert!(parse("100 200 300").is_err());
    }

    #[test]
    fn test_parse_negative() {
        assert!(parse("-1 200").is_err());
    }

    #[test]
    fn test_parse_not_a_number() {
        let err = parse("100 abc").unwrap_err();
        assert!(err.contains("end"));
    }

    #[test]
    fn test_parse_current_past_end() {
        assert!(parse("300 200").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format(CounterRange::new(100, 200)), "100 200");
    }

    #[tokio::test]
    async fn test_take_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("range.dat");
        write(&path, CounterRange::new(100, 200)).await.unwrap();

        let range = take(&path).await.unwrap();

        assert_eq!(range, CounterRange::new(100, 200));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_read_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("range.dat");
        write(&path, CounterRange::new(7, 9)).await.unwrap();

        assert_eq!(read(&path).await.unwrap(), CounterRange::new(7, 9));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_take_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = take(&dir.path().join("missing.dat")).await;

        assert!(matches!(result, Err(AllocatorError::Io { .. })));
    }

    #[tokio::test]
    async fn test_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("range.dat");
        write(&path, CounterRange::new(1, 2)).await.unwrap();

        assert!(!path.with_extension("tmp").exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1 2");
    }
}
