//! Signature scanner: classifies raw bytes as malicious or safe.
//!
//! Runs on every upload before any transcoding trusts the bytes; declared and
//! sniffed MIME types play no part here. Deterministic over the first 512
//! bytes plus a 200-byte text window.

/// Bytes of the header considered for magic-number matching.
const HEADER_WINDOW: usize = 512;
/// Window for case-insensitive marker text not aligned to offset 0.
const EARLY_TEXT_WINDOW: usize = 100;
/// Window for XSS / SQL heuristics.
const HEURISTIC_WINDOW: usize = 200;

/// One known-dangerous signature. `magic` is matched as an exact byte prefix;
/// `text` additionally matches case-insensitively anywhere in the first
/// 100 bytes.
struct SignatureRule {
    name: &'static str,
    description: &'static str,
    magic: &'static [u8],
    text: Option<&'static str>,
}

// Order is the tie-break policy: the first matching rule names the verdict.
const SIGNATURE_RULES: &[SignatureRule] = &[
    SignatureRule {
        name: "Windows Executable",
        description: "PE/DOS executable header",
        magic: b"MZ",
        text: None,
    },
    SignatureRule {
        name: "ELF Executable",
        description: "ELF binary header",
        magic: &[0x7F, 0x45, 0x4C, 0x46],
        text: None,
    },
    SignatureRule {
        name: "Mach-O Executable",
        description: "Mach-O binary header (32-bit)",
        magic: &[0xFE, 0xED, 0xFA, 0xCE],
        text: None,
    },
    SignatureRule {
        name: "Mach-O Executable",
        description: "Mach-O binary header (64-bit)",
        magic: &[0xFE, 0xED, 0xFA, 0xCF],
        text: None,
    },
    SignatureRule {
        name: "Mach-O Executable",
        description: "Mach-O universal binary header",
        magic: &[0xCA, 0xFE, 0xBA, 0xBE],
        text: None,
    },
    SignatureRule {
        name: "Script Interpreter",
        description: "Shebang interpreter line",
        magic: b"#!",
        text: None,
    },
    SignatureRule {
        name: "PHP Script",
        description: "PHP opening tag",
        magic: b"<?php",
        text: Some("<?php"),
    },
    SignatureRule {
        name: "HTML Document",
        description: "HTML doctype declaration",
        magic: b"<!DOCTYPE html",
        text: Some("<!doctype html"),
    },
    SignatureRule {
        name: "HTML Document",
        description: "HTML document opener",
        magic: b"<html",
        text: Some("<html"),
    },
    SignatureRule {
        name: "HTML Script Tag",
        description: "Inline script element",
        magic: b"<script",
        text: Some("<script"),
    },
    SignatureRule {
        name: "HTML Iframe",
        description: "Inline frame element",
        magic: b"<iframe",
        text: Some("<iframe"),
    },
    SignatureRule {
        name: "HTML Object",
        description: "Embedded object element",
        magic: b"<object",
        text: Some("<object"),
    },
    SignatureRule {
        name: "ZIP Archive",
        description: "ZIP archive header (possible polyglot)",
        magic: &[0x50, 0x4B, 0x03, 0x04],
        text: None,
    },
    SignatureRule {
        name: "RAR Archive",
        description: "RAR archive header (possible polyglot)",
        magic: &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07],
        text: None,
    },
    SignatureRule {
        name: "GZIP Archive",
        description: "GZIP archive header (possible polyglot)",
        magic: &[0x1F, 0x8B],
        text: None,
    },
    SignatureRule {
        name: "7-Zip Archive",
        description: "7-Zip archive header (possible polyglot)",
        magic: &[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C],
        text: None,
    },
];

const XSS_EVENT_HANDLERS: &[&str] = &[
    "onerror=",
    "onload=",
    "onclick=",
    "onmouseover=",
    "onfocus=",
];

const SQL_KEYWORD_PAIRS: &[(&str, &str)] = &[
    ("union", "select"),
    ("select", "from"),
    ("insert", "into"),
    ("delete", "from"),
    ("update", "set"),
    ("drop", "table"),
];

const SQL_KEYWORDS: &[&str] = &["select", "insert", "update", "delete", "drop", "union"];

/// Scan verdict: safe, or the first matched rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecurityVerdict {
    Safe,
    Flagged {
        name: &'static str,
        description: &'static str,
    },
}

impl SecurityVerdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, SecurityVerdict::Safe)
    }
}

fn flagged(rule: &SignatureRule) -> SecurityVerdict {
    SecurityVerdict::Flagged {
        name: rule.name,
        description: rule.description,
    }
}

/// True when the buffer opens with a recognized image header. Used to
/// suppress the comment-token heuristic on binary image data.
fn starts_with_image_header(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8, 0xFF])
        || data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
        || data.starts_with(b"GIF87a")
        || data.starts_with(b"GIF89a")
        || (data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP")
}

fn window_lowercase(data: &[u8], len: usize) -> String {
    String::from_utf8_lossy(&data[..data.len().min(len)]).to_lowercase()
}

/// Classify raw upload bytes.
pub fn scan(data: &[u8]) -> SecurityVerdict {
    if data.is_empty() {
        return SecurityVerdict::Flagged {
            name: "Empty File",
            description: "Zero-length upload payload",
        };
    }

    let header = &data[..data.len().min(HEADER_WINDOW)];
    for rule in SIGNATURE_RULES {
        if header.starts_with(rule.magic) {
            return flagged(rule);
        }
    }

    let early = window_lowercase(data, EARLY_TEXT_WINDOW);
    for rule in SIGNATURE_RULES {
        if let Some(text) = rule.text {
            if early.contains(text) {
                return flagged(rule);
            }
        }
    }

    heuristic_scan(data)
}

fn heuristic_scan(data: &[u8]) -> SecurityVerdict {
    let text = window_lowercase(data, HEURISTIC_WINDOW);

    if text.contains("javascript:") {
        return SecurityVerdict::Flagged {
            name: "Cross-Site Scripting",
            description: "javascript: URI in payload",
        };
    }
    for handler in XSS_EVENT_HANDLERS {
        if text.contains(handler) {
            return SecurityVerdict::Flagged {
                name: "Cross-Site Scripting",
                description: "HTML event handler attribute in payload",
            };
        }
    }

    for (left, right) in SQL_KEYWORD_PAIRS {
        if text.contains(left) && text.contains(right) {
            return SecurityVerdict::Flagged {
                name: "SQL Injection",
                description: "SQL keyword combination in payload",
            };
        }
    }

    // A lone comment-opening token is only suspicious next to a query
    // keyword, and never inside data that opens with an image header.
    if (text.contains("--") || text.contains("/*"))
        && !starts_with_image_header(data)
        && SQL_KEYWORDS.iter().any(|kw| text.contains(kw))
    {
        return SecurityVerdict::Flagged {
            name: "SQL Injection",
            description: "SQL comment token next to a query keyword",
        };
    }

    SecurityVerdict::Safe
}
