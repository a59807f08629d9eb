//! Minimal PGN reader: tag pairs and mainline SAN moves.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{AnalysisError, Result};

const READER_BUF_CAP: usize = 64 * 1024;

/// One game of a PGN stream, mainline only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnGame {
    pub headers: BTreeMap<String, String>,
    /// SAN tokens as written, with annotation glyphs removed.
    pub moves: Vec<String>,
}

impl PgnGame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.moves.is_empty()
    }
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r#"^\[\s*([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\s*\]\s*$"#)
            .unwrap_or_else(|e| panic!("tag pattern does not compile: {}", e))
    })
}

fn move_number_pattern() -> &'static Regex {
    static MOVE_NUMBER: OnceLock<Regex> = OnceLock::new();
    MOVE_NUMBER.get_or_init(|| {
        Regex::new(r"^\d+\.+").unwrap_or_else(|e| panic!("move number pattern does not compile: {}", e))
    })
}

/// Parses every game in a PGN stream.
pub fn read_games<R: BufRead>(reader: R) -> Result<Vec<PgnGame>> {
    let mut games = Vec::new();
    let mut current = PgnGame::default();
    let mut movetext = String::new();
    // A blank line after the tag section ends it, even if no moves follow.
    let mut tags_closed = false;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if let Some(caps) = tag_pattern().captures(trimmed) {
            if tags_closed || !movetext.trim().is_empty() {
                current.moves = parse_movetext(&movetext);
                movetext.clear();
                games.push(std::mem::take(&mut current));
                tags_closed = false;
            }
            let value = caps[2].replace("\\\"", "\"").replace("\\\\", "\\");
            current.headers.insert(caps[1].to_string(), value);
        } else if trimmed.is_empty() {
            tags_closed = !current.headers.is_empty();
            movetext.push('\n');
        } else if !trimmed.starts_with('%') {
            movetext.push_str(trimmed);
            movetext.push('\n');
        }
    }

    current.moves = parse_movetext(&movetext);
    if !current.is_empty() {
        games.push(current);
    }

    if games.is_empty() {
        return Err(AnalysisError::EmptyPgn);
    }
    log::debug!("read {} game(s) from PGN", games.len());
    Ok(games)
}

/// Opens a PGN file, gunzipping it when the extension is `.gz`.
pub fn open_games<P: AsRef<Path>>(path: P) -> Result<Vec<PgnGame>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

    let source: Box<dyn Read> = if is_gzip {
        Box::new(flate2::read::GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    read_games(BufReader::with_capacity(READER_BUF_CAP, source))
}

/// Drops comments, variations and line comments, keeping the mainline text.
fn strip_annotations(movetext: &str) -> String {
    let mut out = String::with_capacity(movetext.len());
    let mut chars = movetext.chars();
    let mut variation_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                }
                out.push(' ');
            }
            ';' => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
                out.push(' ');
            }
            '(' => variation_depth += 1,
            ')' => {
                variation_depth = variation_depth.saturating_sub(1);
                out.push(' ');
            }
            _ if variation_depth > 0 => {}
            _ => out.push(c),
        }
    }
    out
}

fn is_result(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

fn parse_movetext(movetext: &str) -> Vec<String> {
    let stripped = strip_annotations(movetext);
    let mut moves = Vec::new();

    for token in stripped.split_whitespace() {
        if token.starts_with('$') || is_result(token) {
            continue;
        }
        let token = move_number_pattern().replace(token, "");
        let san = token.trim_end_matches(['!', '?']);
        if !san.is_empty() {
            moves.push(san.to_string());
        }
    }
    moves
}
