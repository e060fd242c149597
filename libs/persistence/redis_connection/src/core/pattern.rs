//! Redis-style glob patterns over cache keys.
//!
//! Supports `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\` escapes, the same
//! dialect `KEYS` and `SCAN MATCH` accept, so the in-memory backend selects
//! exactly the keys Redis would.

/// Returns true when `key` matches the glob `pattern`.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0, 0);
    // position of the last `*` seen and the key index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() {
            match pattern[p] {
                '*' => {
                    backtrack = Some((p, k));
                    p += 1;
                    continue;
                }
                '?' => {
                    p += 1;
                    k += 1;
                    continue;
                }
                '[' => {
                    if let Some((matched, next)) =
                        match_class(&pattern, p, key[k])
                    {
                        if matched {
                            p = next;
                            k += 1;
                            continue;
                        }
                    }
                }
                '\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == key[k] {
                        p += 2;
                        k += 1;
                        continue;
                    }
                }
                c => {
                    if c == key[k] {
                        p += 1;
                        k += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star, tried)) => {
                p = star + 1;
                k = tried + 1;
                backtrack = Some((star, tried + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// Evaluates the bracket expression starting at `pattern[start] == '['`.
/// Returns whether `c` is in the class and the index just past `]`, or
/// `None` when the bracket is never closed.
fn match_class(pattern: &[char], start: usize, c: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = matches!(pattern.get(i), Some('^'));
    if negated {
        i += 1;
    }

    let mut matched = false;
    while i < pattern.len() && pattern[i] != ']' {
        let lo = if pattern[i] == '\\' && i + 1 < pattern.len() {
            i += 1;
            pattern[i]
        }
        else {
            pattern[i]
        };

        if i + 2 < pattern.len() && pattern[i + 1] == '-' && pattern[i + 2] != ']'
        {
            let hi = pattern[i + 2];
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            if lo <= c && c <= hi {
                matched = true;
            }
            i += 3;
        }
        else {
            if lo == c {
                matched = true;
            }
            i += 1;
        }
    }

    if i >= pattern.len() {
        return None;
    }

    Some((matched != negated, i + 1))
}

/// Escapes glob metacharacters so `key` matches only itself.
pub fn escape(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The namespace a pattern addresses: everything before the first `:`.
/// `blogs:*` and `blogs:rust:` both live in `blogs`; `blog:42` in `blog`.
pub fn namespace(pattern: &str) -> &str {
    pattern.split(':').next().unwrap_or(pattern)
}
