use crate::error::{AppError, Result};
use byte_unit::Byte;
use log;
use std::convert::TryInto;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub number: usize,
    pub content: String,
}

impl Part {
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

pub fn parse_size(size_str: &str) -> Result<usize> {
    let byte_value = Byte::from_str(size_str.trim()).map_err(|e| {
        AppError::Chunking(format!(
            "Invalid part size format '{}': {}. Use bytes, KB, MB, etc.",
            size_str, e
        ))
    })?;
    let bytes: u128 = byte_value.into();
    let bytes: usize = bytes.try_into().map_err(|_| {
        AppError::Chunking("Part size exceeds maximum usize value on this platform.".to_string())
    })?;
    if bytes == 0 {
        return Err(AppError::Chunking(
            "Part size must be greater than 0 bytes".to_string(),
        ));
    }
    Ok(bytes)
}

/// Splits `buffer` into parts of at most `max_bytes` UTF-8 bytes, cutting
/// only after a newline.
///
/// Lines are added greedily until the next one would overflow the current
/// part. A line longer than `max_bytes` on its own becomes a part by itself.
/// A trailing part containing only whitespace is dropped; otherwise the
/// parts concatenate back to `buffer` exactly.
pub fn split_into_parts(buffer: String, max_bytes: usize) -> Result<Vec<Part>> {
    if max_bytes == 0 {
        return Err(AppError::Chunking(
            "Part size must be greater than 0 bytes".to_string(),
        ));
    }

    if buffer.len() <= max_bytes {
        log::debug!("Buffer fits a single part ({} bytes).", buffer.len());
        return Ok(finish(vec![buffer]));
    }

    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in buffer.split_inclusive('\n') {
        if line.len() > max_bytes {
            log::trace!(
                "Line of {} bytes exceeds part size ({}), keeping it whole in its own part.",
                line.len(),
                max_bytes
            );
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
            parts.push(line.to_string());
            continue;
        }

        if !current.is_empty() && current.len().saturating_add(line.len()) > max_bytes {
            parts.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        parts.push(current);
    }

    let parts = finish(parts);
    log::info!("Split content into {} parts.", parts.len());
    Ok(parts)
}

fn finish(mut contents: Vec<String>) -> Vec<Part> {
    if contents.last().is_some_and(|last| last.trim().is_empty()) {
        log::trace!("Dropping whitespace-only trailing part.");
        contents.pop();
    }
    contents
        .into_iter()
        .enumerate()
        .map(|(i, content)| Part {
            number: i + 1,
            content,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn joined(parts: &[Part]) -> String {
        parts.iter().map(|p| p.content.as_str()).collect()
    }

    #[test]
    fn small_buffer_is_one_part() {
        let parts = split_into_parts("a\nb\n".to_string(), 100).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].number, 1);
        assert_eq!(parts[0].content, "a\nb\n");
    }

    #[test]
    fn greedy_fill_on_line_boundaries() {
        let buffer = "aaa\nbbb\nccc\nddd\n".to_string();
        let parts = split_into_parts(buffer.clone(), 8).unwrap();

        let contents: Vec<&str> = parts.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["aaa\nbbb\n", "ccc\nddd\n"]);
        assert_eq!(joined(&parts), buffer);
    }

    #[test]
    fn oversized_line_gets_its_own_part() {
        let buffer = "ab\nthis line is far too long\ncd\n".to_string();
        let parts = split_into_parts(buffer.clone(), 6).unwrap();

        let contents: Vec<&str> = parts.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["ab\n", "this line is far too long\n", "cd\n"]
        );
        assert_eq!(joined(&parts), buffer);
        for part in &parts {
            assert!(part.size() <= 6 || !part.content.trim_end_matches('\n').contains('\n'));
        }
    }

    #[test]
    fn last_line_without_newline_is_kept() {
        let buffer = "one\ntwo\nthree".to_string();
        let parts = split_into_parts(buffer.clone(), 8).unwrap();
        assert_eq!(joined(&parts), buffer);
        assert!(parts.iter().all(|p| p.size() <= 8));
    }

    #[test]
    fn whitespace_only_trailing_part_is_dropped() {
        let buffer = format!("{}\n{}", "x".repeat(9), " ".repeat(5));
        let parts = split_into_parts(buffer, 10).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].content, format!("{}\n", "x".repeat(9)));
    }

    #[test]
    fn never_splits_inside_multibyte_characters() {
        let buffer = "é\n".repeat(50);
        let parts = split_into_parts(buffer.clone(), 7).unwrap();
        assert_eq!(joined(&parts), buffer);
        assert!(parts.iter().all(|p| p.size() <= 7));
    }

    #[test]
    fn two_million_bytes_at_nine_hundred_thousand_is_three_parts() {
        let line = format!("{}\n", "x".repeat(99));
        let buffer = line.repeat(20_000);
        assert_eq!(buffer.len(), 2_000_000);

        let parts = split_into_parts(buffer.clone(), 900_000).unwrap();

        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.size() <= 900_000));
        assert_eq!(parts[2].number, 3);
        assert_eq!(joined(&parts), buffer);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        assert!(matches!(
            split_into_parts("x".to_string(), 0),
            Err(AppError::Chunking(_))
        ));
    }

    #[test]
    fn parses_human_sizes() {
        assert_eq!(parse_size("900000").unwrap(), 900_000);
        assert_eq!(parse_size("900KB").unwrap(), 900_000);
        assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
        assert!(parse_size("0").is_err());
        assert!(parse_size("lots").is_err());
    }
}
