//! Brace expansion `{a,b,c}` / `{1..5}` / `{a..z..2}`.
//!
//! Purely lexical and happens before any `$`-substitution, so it runs over
//! the raw word text while tracking quote state just enough to avoid
//! expanding braces that appear inside quotes.

pub fn expand(raw: &str) -> Vec<String> {
    match find_top_level_brace(raw) {
        Some((start, end, body)) => {
            let prefix = &raw[..start];
            let suffix = &raw[end + 1..];
            let items = split_items(&body);
            if items.len() <= 1 {
                if let Some(range) = items.first().and_then(|i| expand_range(i)) {
                    return range
                        .into_iter()
                        .flat_map(|mid| expand(&format!("{prefix}{mid}{suffix}")))
                        .collect();
                }
                return vec![raw.to_string()];
            }
            items
                .into_iter()
                .flat_map(|item| expand(&format!("{prefix}{item}{suffix}")))
                .collect()
        }
        None => vec![raw.to_string()],
    }
}

fn find_top_level_brace(raw: &str) -> Option<(usize, usize, String)> {
    let chars: Vec<char> = raw.chars().collect();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '{' if !in_single && !in_double => {
                if let Some(end) = matching_brace(&chars, i) {
                    let body: String = chars[i + 1..end].iter().collect();
                    if has_comma_or_range(&body) {
                        return Some((i, end, body));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn matching_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut in_single = false;
    let mut in_double = false;
    for (i, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '{' if !in_single && !in_double => depth += 1,
            '}' if !in_single && !in_double => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn has_comma_or_range(body: &str) -> bool {
    split_items(body).len() > 1 || body.contains("..")
}

/// Split on top-level commas (depth-aware for nested braces).
fn split_items(body: &str) -> Vec<String> {
    let chars: Vec<char> = body.chars().collect();
    let mut items = Vec::new();
    let mut depth = 0;
    let mut start = 0;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            ',' if depth == 0 => {
                items.push(chars[start..i].iter().collect());
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(chars[start..].iter().collect());
    items
}

fn expand_range(item: &str) -> Option<Vec<String>> {
    let parts: Vec<&str> = item.split("..").collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let step: i64 = parts.get(2).map(|s| s.parse().ok()).flatten().unwrap_or(1).abs().max(1);

    if let (Ok(start), Ok(end)) = (parts[0].parse::<i64>(), parts[1].parse::<i64>()) {
        let width = parts[0].trim_start_matches('-').len().max(parts[1].trim_start_matches('-').len());
        let zero_pad = parts[0].starts_with('0') || parts[1].starts_with('0');
        let mut out = Vec::new();
        let mut n = start;
        if start <= end {
            while n <= end {
                out.push(format_num(n, width, zero_pad));
                n += step;
            }
        } else {
            while n >= end {
                out.push(format_num(n, width, zero_pad));
                n -= step;
            }
        }
        return Some(out);
    }

    if parts[0].chars().count() == 1 && parts[1].chars().count() == 1 {
        let start = parts[0].chars().next().unwrap() as u32;
        let end = parts[1].chars().next().unwrap() as u32;
        let mut out = Vec::new();
        let mut n = start as i64;
        let end = end as i64;
        if start <= end as u32 {
            while n <= end {
                if let Some(c) = char::from_u32(n as u32) {
                    out.push(c.to_string());
                }
                n += step;
            }
        } else {
            while n >= end {
                if let Some(c) = char::from_u32(n as u32) {
                    out.push(c.to_string());
                }
                n -= step;
            }
        }
        return Some(out);
    }

    None
}

fn format_num(n: i64, width: usize, zero_pad: bool) -> String {
    if zero_pad {
        let sign = if n < 0 { "-" } else { "" };
        format!("{sign}{:0width$}", n.abs(), width = width.saturating_sub(sign.len()))
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_comma_list() {
        assert_eq!(expand("{a,b,c}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn expands_with_prefix_suffix() {
        assert_eq!(expand("file{1,2}.txt"), vec!["file1.txt", "file2.txt"]);
    }

    #[test]
    fn expands_numeric_range() {
        assert_eq!(expand("{1..3}"), vec!["1", "2", "3"]);
    }

    #[test]
    fn expands_descending_range() {
        assert_eq!(expand("{3..1}"), vec!["3", "2", "1"]);
    }

    #[test]
    fn expands_char_range() {
        assert_eq!(expand("{a..c}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn expands_range_with_step() {
        assert_eq!(expand("{0..10..5}"), vec!["0", "5", "10"]);
    }

    #[test]
    fn zero_pads_when_source_is_padded() {
        assert_eq!(expand("{01..03}"), vec!["01", "02", "03"]);
    }

    #[test]
    fn leaves_quoted_braces_untouched() {
        assert_eq!(expand("'{a,b}'"), vec!["'{a,b}'"]);
    }

    #[test]
    fn no_brace_returns_original() {
        assert_eq!(expand("plain"), vec!["plain"]);
    }

    #[test]
    fn nested_braces_expand_outer_then_inner() {
        let mut result = expand("{a,b{1,2}}");
        result.sort();
        assert_eq!(result, vec!["a", "b1", "b2"]);
    }
}
