//! Line-based correspondence lists
//!
//! One match per line, `cam_u,cam_v,proj_u,proj_v`. Blank lines and lines
//! starting with `#` are ignored.

use log::warn;

use crate::models::Match;

/// Matches read from a correspondence list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCorrespondences {
    /// Well-formed records, in file order
    pub matches: Vec<Match>,
    /// Data lines that could not be parsed
    pub rejected_lines: usize,
}

fn parse_record(line: &str) -> Option<Match> {
    let mut fields = line.split(',').map(|f| f.trim().parse::<f64>());
    let record = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(Ok(cu)), Some(Ok(cv)), Some(Ok(pu)), Some(Ok(pv))) => Match::new(cu, cv, pu, pv),
        _ => return None,
    };
    if fields.next().is_some() {
        return None;
    }
    Some(record)
}

/// Parse correspondence text; malformed lines are logged and counted, not fatal
pub fn parse_correspondences(text: &str) -> ParsedCorrespondences {
    let mut parsed = ParsedCorrespondences::default();
    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_record(line) {
            Some(record) => parsed.matches.push(record),
            None => {
                warn!("skipping malformed correspondence on line {}: {:?}", line_no + 1, line);
                parsed.rejected_lines += 1;
            }
        }
    }
    parsed
}
