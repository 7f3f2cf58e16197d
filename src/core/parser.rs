//! Filename parser module.
//!
//! Splits a rip filename into the fields of a [`RipDescriptor`]:
//! - Title (cleaned, case-folded, diacritics preserved)
//! - Release year
//! - Quality (resolution marker)
//! - Release info (source, codecs, audio) and release group
//!
//! Scene names put the year right after the title and the group at the very
//! end, so every ambiguous split prefers the rightmost candidate.

use crate::models::rip::RipDescriptor;
use crate::utils::{fs::strip_video_extension, text::clean_title};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Resolution markers.
static QUALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[\s._\-\[(])(2160p|1440p|1080p|1080i|720p|576p|480p|4k|uhd)(?:$|[\s._\-\])])")
        .expect("quality pattern")
});

/// Source and encoding markers, used when no resolution is present.
static RELEASE_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[\s._\-\[(])(blu-?ray|bdrip|brrip|bdremux|remux|web-?dl|web-?rip|hdrip|dvdrip|dvdscr|hdtv|x264|x265|h\.?264|h\.?265|hevc|xvid)(?:$|[\s._\-\])])",
    )
    .expect("release type pattern")
});

/// Year-like token; boundaries are checked by hand so adjacent years can
/// share a separator.
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:18|19|20)\d{2}").expect("year pattern"));

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | '_' | '-')
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(is_separator)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Token located by [`locate_marker`].
///
/// `start..end` is the token itself; `outer_start..outer_end` also covers a
/// bracket pair wrapped directly around it.
struct Marker {
    start: usize,
    end: usize,
    outer_start: usize,
    outer_end: usize,
    is_quality: bool,
}

impl Marker {
    fn new(name: &str, start: usize, end: usize, is_quality: bool) -> Self {
        let closer = match name[..start].chars().next_back() {
            Some('[') => Some(']'),
            Some('(') => Some(')'),
            _ => None,
        };
        let (outer_start, outer_end) = match closer {
            Some(closer) if name[end..].starts_with(closer) => (start - 1, end + 1),
            _ => (start, end),
        };
        Self {
            start,
            end,
            outer_start,
            outer_end,
            is_quality,
        }
    }
}

/// Find the quality token, falling back to the release-type token.
fn locate_marker(name: &str) -> Option<Marker> {
    if let Some(m) = QUALITY_RE.captures(name).and_then(|c| c.get(1)) {
        return Some(Marker::new(name, m.start(), m.end(), true));
    }
    RELEASE_TYPE_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| Marker::new(name, m.start(), m.end(), false))
}

/// Start offsets (including an opening bracket) and text of every year-like
/// token in `segment`, left to right.
fn year_candidates(segment: &str) -> Vec<(usize, &str)> {
    let mut found = Vec::new();

    for m in YEAR_RE.find_iter(segment) {
        let before = &segment[..m.start()];
        let after = &segment[m.end()..];

        // A bracket is a boundary of its own.
        let (start, left_ok) = match before.strip_suffix(|c: char| c == '(' || c == '[') {
            Some(rest) => (rest.len(), true),
            None => (m.start(), before.chars().next_back().map_or(true, is_separator)),
        };
        let right_ok = after.starts_with(|c: char| c == ')' || c == ']')
            || after.chars().next().map_or(true, is_separator);

        if left_ok && right_ok {
            found.push((start, m.as_str()));
        }
    }

    found
}

/// Split the title+date segment, taking the rightmost admissible year.
fn split_title_and_date(segment: &str) -> (String, Option<String>) {
    for (start, year) in year_candidates(segment).into_iter().rev() {
        let title = clean_title(&segment[..start]);
        if !title.is_empty() {
            return (title, Some(year.to_string()));
        }
    }
    (clean_title(segment), None)
}

/// Byte range of the last whitespace or dot outside any bracket pair.
fn last_top_level_delimiter(segment: &str) -> Option<(usize, usize)> {
    let mut depth = 0i32;
    let mut last = None;
    for (i, c) in segment.char_indices() {
        match c {
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth -= 1,
            c if depth <= 0 && (c.is_whitespace() || c == '.') => last = Some((i, i + c.len_utf8())),
            _ => {}
        }
    }
    last
}

/// Split the release-info+group segment.
fn split_release_info(segment: &str) -> (Option<String>, Option<String>) {
    let segment = segment.trim();
    if segment.is_empty() {
        return (None, None);
    }

    if let Some(idx) = segment.rfind('-') {
        let info = trim_separators(&segment[..idx]);
        let group = segment[idx + 1..].trim();
        return (non_empty(info), non_empty(group));
    }

    let enclosed = matches!(segment.chars().next(), Some('[' | '{'))
        && matches!(segment.chars().next_back(), Some(']' | '}'));
    if enclosed {
        return (Some(segment.to_string()), None);
    }

    match last_top_level_delimiter(segment) {
        Some((start, end)) => {
            let info = trim_separators(&segment[..start]);
            let group = segment[end..].trim();
            (non_empty(info), non_empty(group))
        }
        None => (Some(segment.to_string()), None),
    }
}

/// Parse a rip filename into a descriptor.
///
/// Fails only when nothing usable is left for the title.
pub fn parse_filename(filename: &str) -> Result<RipDescriptor> {
    let name = strip_video_extension(filename.trim());

    let (title_segment, quality, rest) = match locate_marker(name) {
        Some(marker) if marker.is_quality => (
            &name[..marker.outer_start],
            Some(name[marker.start..marker.end].to_string()),
            trim_separators(&name[marker.outer_end..]),
        ),
        Some(marker) => (
            &name[..marker.outer_start],
            None,
            trim_separators(&name[marker.outer_start..]),
        ),
        None => (name, None, ""),
    };

    let (title, date) = split_title_and_date(title_segment);
    if title.is_empty() {
        return Err(Error::Parse(filename.to_string()));
    }

    let (info, group) = split_release_info(rest);

    tracing::debug!(
        "Parsed '{}' -> title='{}' date={:?} quality={:?} info={:?} group={:?}",
        filename,
        title,
        date,
        quality,
        info,
        group
    );

    Ok(RipDescriptor {
        file_name: filename.to_string(),
        parsed_title: title,
        parsed_release_date: date,
        parsed_quality: quality,
        parsed_release_info: info,
        parsed_group: group,
        movie: None,
    })
}

/// Parse multiple filenames, keeping failures alongside successes.
pub fn parse_filenames(filenames: &[String]) -> Vec<(String, Result<RipDescriptor>)> {
    filenames
        .iter()
        .map(|f| (f.clone(), parse_filename(f)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_candidates_share_separator() {
        let years: Vec<_> = year_candidates("2001 2012 ").into_iter().map(|(_, y)| y).collect();
        assert_eq!(years, vec!["2001", "2012"]);
    }

    #[test]
    fn test_year_candidates_need_boundaries() {
        assert!(year_candidates("Ocean12001 ").is_empty());
        assert!(year_candidates("THX1138 ").is_empty());
        let found = year_candidates("Movie (1999) ");
        assert_eq!(found, vec![(6, "1999")]);
    }

    #[test]
    fn test_split_title_and_date_rightmost() {
        let (title, date) = split_title_and_date("Blade Runner 2049 2017 ");
        assert_eq!(title, "blade runner 2049");
        assert_eq!(date.as_deref(), Some("2017"));
    }

    #[test]
    fn test_split_title_and_date_year_only() {
        let (title, date) = split_title_and_date("1917.");
        assert_eq!(title, "1917");
        assert_eq!(date, None);
    }

    #[test]
    fn test_split_release_info() {
        assert_eq!(
            split_release_info("BluRay x264 AC3-JYK"),
            (Some("BluRay x264 AC3".into()), Some("JYK".into()))
        );
        assert_eq!(split_release_info("{5.1}"), (Some("{5.1}".into()), None));
        assert_eq!(
            split_release_info("BluRay x264 GRP"),
            (Some("BluRay x264".into()), Some("GRP".into()))
        );
        assert_eq!(split_release_info("BluRay"), (Some("BluRay".into()), None));
        assert_eq!(split_release_info(""), (None, None));
    }

    #[test]
    fn test_year_candidates_bracket_is_boundary() {
        assert_eq!(year_candidates("Heat(1995) "), vec![(4, "1995")]);
        assert_eq!(year_candidates("Heat [1995]1080p"), vec![(5, "1995")]);
    }

    #[test]
    fn test_split_release_info_wide_space() {
        assert_eq!(
            split_release_info("BluRay\u{a0}GRP"),
            (Some("BluRay".into()), Some("GRP".into()))
        );
        assert_eq!(
            split_release_info("BluRay x264\u{3000}GRP"),
            (Some("BluRay x264".into()), Some("GRP".into()))
        );
    }

    #[test]
    fn test_marker_consumes_brackets() {
        let marker = locate_marker("Movie [1080p] x").unwrap();
        assert_eq!((marker.start, marker.end), (7, 12));
        assert_eq!((marker.outer_start, marker.outer_end), (6, 13));

        let marker = locate_marker("Movie [1080p x").unwrap();
        assert_eq!((marker.outer_start, marker.outer_end), (7, 12));
    }

    #[test]
    fn test_delimiter_ignores_brackets() {
        assert_eq!(
            split_release_info("BluRay {5.1}"),
            (Some("BluRay".into()), Some("{5.1}".into()))
        );
    }
}
