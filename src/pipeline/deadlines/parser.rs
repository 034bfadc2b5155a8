use super::types::{DeadlineCandidate, SkipReason, SkippedLine};
use crate::pipeline::inference::ReplyFormat;

/// Candidates and rejects from a concatenated model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub candidates: Vec<DeadlineCandidate>,
    pub skipped: Vec<SkippedLine>,
    /// Non-blank lines examined.
    pub lines_seen: usize,
}

/// Split every non-blank line on its last delimiter.
///
/// Malformed lines are recorded and skipped; they never stop the rest of the
/// reply from being read. Output order follows line order.
pub fn parse_reply(reply: &str, format: ReplyFormat) -> ParsedReply {
    let mut parsed = ParsedReply::default();

    for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
        parsed.lines_seen += 1;
        match parse_line(line, format) {
            Ok(candidate) => parsed.candidates.push(candidate),
            Err(reason) => {
                tracing::debug!(line, reason = reason.as_str(), "Reply line skipped");
                parsed.skipped.push(SkippedLine {
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    tracing::debug!(
        lines = parsed.lines_seen,
        candidates = parsed.candidates.len(),
        skipped = parsed.skipped.len(),
        "Reply parsed"
    );
    parsed
}

fn parse_line(line: &str, format: ReplyFormat) -> Result<DeadlineCandidate, SkipReason> {
    let (title, date) = line
        .rsplit_once(format.delimiter())
        .ok_or(SkipReason::NoDelimiter)?;

    let title = strip_leading_quote(title.trim()).trim();
    let date = strip_trailing_quote(date.trim()).trim();

    if title.is_empty() {
        return Err(SkipReason::EmptyTitle);
    }
    if date.is_empty() {
        return Err(SkipReason::EmptyDate);
    }

    Ok(DeadlineCandidate {
        raw_title: title.to_string(),
        raw_date_text: date.to_string(),
        line: line.to_string(),
    })
}

fn strip_leading_quote(s: &str) -> &str {
    s.strip_prefix(['\'', '"']).unwrap_or(s)
}

/// Models sometimes echo the quoted example; drop the closing quote too.
fn strip_trailing_quote(s: &str) -> &str {
    s.strip_suffix(['\'', '"']).unwrap_or(s)
}
