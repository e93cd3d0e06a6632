//! Parser for Java-style `.properties` text, used to build property sources.
//!
//! Supports `#`/`!` comments, `=`/`:`/whitespace separators, backslash line continuations
//! and the standard escapes including `\uXXXX`. Later duplicates of a key win when the
//! entries are collected into a map, mirroring `java.util.Properties::load`.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
    /// 1-based line on which the logical line starts.
    pub line: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertiesFile {
    pub entries: Vec<PropertyEntry>,
}

impl PropertiesFile {
    /// Last value declared for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Entries with duplicates collapsed: first occurrence fixes the position, the last
    /// occurrence fixes the value.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            match out.iter_mut().find(|(k, _)| *k == entry.key) {
                Some(slot) => slot.1 = entry.value,
                None => out.push((entry.key, entry.value)),
            }
        }
        out
    }
}

struct LogicalLine {
    chars: Vec<char>,
    line: usize,
}

/// Parse `.properties` text into ordered entries.
#[must_use]
pub fn parse(text: &str) -> PropertiesFile {
    let physical: Vec<&str> = text.lines().collect();
    let mut entries = Vec::new();
    let mut idx = 0usize;

    while idx < physical.len() {
        let logical = read_logical_line(&physical, &mut idx);
        if let Some((key, value)) = parse_logical_line(&logical.chars) {
            entries.push(PropertyEntry {
                key,
                value,
                line: logical.line,
            });
        }
    }

    PropertiesFile { entries }
}

fn read_logical_line(physical: &[&str], idx: &mut usize) -> LogicalLine {
    let line = *idx + 1;
    let mut chars = Vec::new();
    let mut first = true;

    while *idx < physical.len() {
        let raw = physical[*idx];
        *idx += 1;

        // Comment lines never continue, even when they end in a backslash.
        let segment = if first {
            raw
        } else {
            raw.trim_start_matches([' ', '\t', '\x0C'])
        };
        if first && is_comment(segment) {
            return LogicalLine { chars, line };
        }
        first = false;

        let continues = ends_with_unescaped_backslash(segment);
        let content = if continues {
            &segment[..segment.len() - 1]
        } else {
            segment
        };
        chars.extend(content.chars());

        if !continues {
            break;
        }
    }

    LogicalLine { chars, line }
}

fn is_comment(segment: &str) -> bool {
    matches!(
        segment.trim_start_matches([' ', '\t', '\x0C']).chars().next(),
        Some('#') | Some('!')
    )
}

fn ends_with_unescaped_backslash(segment: &str) -> bool {
    segment.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn parse_logical_line(chars: &[char]) -> Option<(String, String)> {
    let mut i = 0usize;
    while i < chars.len() && is_whitespace(chars[i]) {
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }

    let key_start = i;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '=' | ':' => break,
            c if is_whitespace(c) => break,
            _ => i += 1,
        }
    }
    let key_end = i.min(chars.len());

    while i < chars.len() && is_whitespace(chars[i]) {
        i += 1;
    }
    if i < chars.len() && (chars[i] == '=' || chars[i] == ':') {
        i += 1;
    }
    while i < chars.len() && is_whitespace(chars[i]) {
        i += 1;
    }

    Some((unescape(&chars[key_start..key_end]), unescape(&chars[i..])))
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

fn unescape(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(&escaped) = chars.get(i) else {
            break;
        };
        i += 1;
        match escaped {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\x0C'),
            'u' => {
                let hex: String = chars.iter().skip(i).take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        i += 4;
                    }
                    _ => out.push('u'),
                }
            }
            other => out.push(other),
        }
    }

    out
}
